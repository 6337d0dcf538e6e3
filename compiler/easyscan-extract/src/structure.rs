//! Structural extraction of single type declarations.
//!
//! Nothing here is type checked. Records are read off the member list as written, and list
//! elements are resolved against the names declared in the same file, the same way the Go parser
//! resolves identifiers without a type checker.

use crate::model::{Field, ListDescription, RecordDescription};
use easyscan_span::Span;
use easyscan_syntax::{AstArrayType, AstField, AstStructType, AstType, AstTypeSpec, FileScope};
use std::fmt;

/// A record together with the members that had to be dropped from it.
#[derive(Debug)]
pub struct RecordExtraction {
    pub record: RecordDescription,
    /// Spans of the members without a name.
    pub unnamed: Vec<Span>,
}

/// Read the members of a struct declaration.
///
/// Every member slot contributes one field named after its first name. Embedded members have no
/// name and are dropped, the remaining members are kept in order.
pub fn extract_record(name: &str, ty: &AstStructType) -> RecordExtraction {
    let mut fields = Vec::with_capacity(ty.fields.len());
    let mut unnamed = Vec::new();
    for member in &ty.fields {
        match extract_field(member) {
            Some(field) => fields.push(field),
            None => unnamed.push(member.span),
        }
    }
    RecordExtraction {
        record: RecordDescription {
            name: name.to_owned(),
            fields,
        },
        unnamed,
    }
}

fn extract_field(member: &AstField) -> Option<Field> {
    let name = member.names.first().filter(|n| !n.name.is_empty())?;
    let tag = member
        .tag
        .as_ref()
        .map(|tag| tag.raw.clone())
        .unwrap_or_default();
    Some(Field {
        name: name.name.clone(),
        tag,
    })
}

/// Why the element of a list declaration could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementFailure {
    /// The element names a type from another package.
    Qualified(String),
    /// The element is a generic type instantiated with arguments.
    Instantiated(String),
    /// The element name is not declared in the file, which includes the predeclared types.
    Unbound(String),
    /// The element is a pointer, array, map or other type literal.
    NotNamed,
}

impl fmt::Display for ElementFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementFailure::Qualified(name) => write!(f, "{name} is declared in another package"),
            ElementFailure::Instantiated(name) => {
                write!(f, "{name} is instantiated with type arguments")
            }
            ElementFailure::Unbound(name) => write!(f, "{name} is not declared in this file"),
            ElementFailure::NotNamed => write!(f, "the element is not a type name"),
        }
    }
}

/// A list declaration whose element could not be resolved.
#[derive(Debug)]
pub struct UnresolvedElement {
    pub reason: ElementFailure,
    pub span: Span,
}

/// Resolve the element of an array or slice declaration.
///
/// The element must be a bare identifier that is either declared at the scope of the file or is
/// a type parameter of the declaration itself.
pub fn extract_list(
    spec: &AstTypeSpec,
    ty: &AstArrayType,
    scope: &FileScope,
) -> Result<ListDescription, UnresolvedElement> {
    let element = ty.element.as_ref();
    let fail = |reason| UnresolvedElement {
        reason,
        span: *element.span(),
    };
    let AstType::Named(named) = element else {
        return Err(fail(ElementFailure::NotNamed));
    };
    let name = named.name.name.as_str();
    if let Some(package) = &named.package {
        return Err(fail(ElementFailure::Qualified(format!(
            "{}.{}",
            package.name, name
        ))));
    }
    if !named.is_plain_identifier() {
        return Err(fail(ElementFailure::Instantiated(name.to_owned())));
    }
    if !scope.declares(name) && !spec.declares_type_parameter(name) {
        return Err(fail(ElementFailure::Unbound(name.to_owned())));
    }
    Ok(ListDescription {
        type_name: spec.name.name.clone(),
        element_name: name.to_owned(),
    })
}
