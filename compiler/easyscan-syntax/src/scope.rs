use crate::ast::{AstDecl, AstSourceFile, AstSpec, AstTypeSpec};
use std::collections::BTreeSet;

/// The names bound at the scope of a single source file.
///
/// This mirrors what the Go resolver binds while parsing one file in isolation: top-level
/// constants, variables, types and functions, but neither methods, `init` functions, the blank
/// identifier nor anything imported. Names from sibling files of the same package are not
/// visible here.
#[derive(Debug, Default)]
pub struct FileScope<'ast> {
    names: BTreeSet<&'ast str>,
}

impl<'ast> FileScope<'ast> {
    pub fn new(file: &'ast AstSourceFile) -> Self {
        let mut names = BTreeSet::new();
        for decl in &file.decls {
            match decl {
                AstDecl::Func(func) => {
                    if func.receiver.is_none() && func.name.name != "init" {
                        names.insert(func.name.name.as_str());
                    }
                }
                AstDecl::Gen(group) => {
                    for spec in &group.specs {
                        match spec {
                            AstSpec::Import(_) => {}
                            AstSpec::Value(value) => {
                                names.extend(value.names.iter().map(|n| n.name.as_str()));
                            }
                            AstSpec::Type(ty) => {
                                names.insert(ty.name.name.as_str());
                            }
                        }
                    }
                }
            }
        }
        names.remove("_");
        Self { names }
    }

    /// Determine if `name` is bound at file scope.
    pub fn declares(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl AstSourceFile {
    /// Collect the names bound at the scope of this file.
    pub fn scope(&self) -> FileScope<'_> {
        FileScope::new(self)
    }
}

impl AstTypeSpec {
    /// Determine if `name` is one of the type parameters of this declaration.
    pub fn declares_type_parameter(&self, name: &str) -> bool {
        self.type_parameters
            .iter()
            .flat_map(|p| p.names.iter())
            .any(|n| n.name == name)
    }
}

#[cfg(test)]
mod tests {
    use crate::{Lexer, Parser};
    use easyscan_macros::assert_ok;

    #[test]
    fn test_file_scope_binds_top_level_names() {
        let source = r#"
package store

import "fmt"

const Limit = 10

var (
    cache, _ = load()
)

type User struct{}

func load() (int, error) { return 0, nil }

func init() {}

func (u User) String() string { return fmt.Sprint(u) }
"#;
        let mut lexer = Lexer::new(source);
        let mut parser = Parser::new(&mut lexer);
        let file = assert_ok!(parser.parse());
        let scope = file.scope();
        assert!(scope.declares("Limit"));
        assert!(scope.declares("cache"));
        assert!(scope.declares("User"));
        assert!(scope.declares("load"));
        assert!(!scope.declares("_"));
        assert!(!scope.declares("init"));
        assert!(!scope.declares("String"));
        assert!(!scope.declares("fmt"));
        assert_eq!(scope.len(), 4);
    }
}
