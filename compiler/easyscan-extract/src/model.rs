//! The structural model handed to the code generator.

use std::path::PathBuf;

/// A named struct member and its raw tag.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    /// The tag literal exactly as written, quotes included. Empty if the member has no tag.
    pub tag: String,
}

/// A struct declaration selected for extraction.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDescription {
    pub name: String,
    /// Members in declaration order. This is the default column order of the generated scanner.
    pub fields: Vec<Field>,
}

/// An array or slice declaration over a record, such as `type Users []User`.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListDescription {
    pub type_name: String,
    pub element_name: String,
}

/// Everything extracted from one input path.
///
/// Records and lists are kept in the order they were found. Nothing is deduplicated.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclarationStore {
    pub package_name: String,
    /// The directory generated code is placed in.
    pub package_dir: PathBuf,
    pub records: Vec<RecordDescription>,
    pub lists: Vec<ListDescription>,
}

impl DeclarationStore {
    pub fn new(package_dir: impl Into<PathBuf>) -> Self {
        Self {
            package_dir: package_dir.into(),
            ..Default::default()
        }
    }

    /// Record the package name of a visited file. The last name seen wins.
    ///
    /// Returns the previous name if it was replaced by a different one.
    pub fn set_package_name(&mut self, name: &str) -> Option<String> {
        if self.package_name == name {
            return None;
        }
        let previous = std::mem::replace(&mut self.package_name, name.to_owned());
        Some(previous).filter(|previous| !previous.is_empty())
    }

    pub fn add_record(&mut self, record: RecordDescription) {
        self.records.push(record);
    }

    pub fn add_list(&mut self, list: ListDescription) {
        self.lists.push(list);
    }

    /// Determine if no declaration was extracted.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.lists.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{DeclarationStore, ListDescription};

    #[test]
    fn test_package_name_last_write_wins() {
        let mut store = DeclarationStore::new("models");
        assert_eq!(store.set_package_name("models"), None);
        assert_eq!(store.set_package_name("models"), None);
        assert_eq!(store.set_package_name("other"), Some("models".to_owned()));
        assert_eq!(store.package_name, "other");
    }

    #[test]
    fn test_store_keeps_duplicates_in_order() {
        let mut store = DeclarationStore::new(".");
        assert!(store.is_empty());
        let list = ListDescription {
            type_name: "Users".to_owned(),
            element_name: "User".to_owned(),
        };
        store.add_list(list.clone());
        store.add_list(list.clone());
        assert_eq!(store.lists, vec![list.clone(), list]);
        assert!(!store.is_empty());
    }
}
