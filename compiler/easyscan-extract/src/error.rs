use easyscan_macros::declare_error_type;
use easyscan_span::Span;
use easyscan_syntax::ParseError;
use miette::{Diagnostic, NamedSource};
use std::path::PathBuf;
use thiserror::Error;

declare_error_type! {
    #[error("extraction error: {0}")]
    pub enum ExtractError {
        Io(SourceIoError),
        Syntax(SourceSyntaxError),
    }
}

/// Handy type alias for all fatal extraction errors.
pub type ExtractResult<T> = Result<T, ExtractError>;

#[derive(Error, Diagnostic, Debug)]
#[diagnostic(
    code(extract::io),
    help("the input must be a readable Go file or a directory of Go files")
)]
#[error("failed to read {}", .path.display())]
pub struct SourceIoError {
    pub path: PathBuf,
    #[source]
    pub error: std::io::Error,
}

/// A source file failed to parse.
///
/// In directory mode this discards every declaration of the directory.
#[derive(Error, Diagnostic, Debug)]
#[diagnostic(code(extract::syntax))]
#[error("failed to parse {}", .path.display())]
pub struct SourceSyntaxError {
    pub path: PathBuf,
    #[source_code]
    pub source_code: NamedSource<String>,
    #[label("{error}")]
    pub span: Span,
    #[source]
    pub error: ParseError,
}

declare_error_type! {
    #[error("extraction warning: {0}")]
    pub enum ExtractWarning {
        UnnamedField(UnnamedFieldWarning),
        UnresolvedElement(UnresolvedElementWarning),
    }
}

#[derive(Error, Diagnostic, Debug)]
#[diagnostic(
    code(extract::unnamed_field),
    severity(Warning),
    help("embedded fields are not scanned, give the field a name to scan it")
)]
#[error("field of {record} has no name")]
pub struct UnnamedFieldWarning {
    pub record: String,
    #[source_code]
    pub source_code: NamedSource<String>,
    #[label("this field is left out of {record}")]
    pub span: Span,
}

#[derive(Error, Diagnostic, Debug)]
#[diagnostic(
    code(extract::unresolved_element),
    severity(Warning),
    help("the element must be a type declared in the same file, or a type parameter of {list}")
)]
#[error("element type of {list} cannot be resolved")]
pub struct UnresolvedElementWarning {
    pub list: String,
    pub reason: String,
    #[source_code]
    pub source_code: NamedSource<String>,
    #[label("{reason}")]
    pub span: Span,
}
