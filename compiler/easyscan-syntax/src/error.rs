//! Error types for the Go front end.
//!
//! Lexer and parser share a single error type. The lexer is pulled token by token, so it only
//! discovers a malformed token once the parser asks for it, and both layers report through the
//! same channel.
//!
//! Every error here is fatal for the file being parsed. There is no recovery inside the front
//! end, the caller decides what a failed file means for the rest of its inputs.

use crate::Token;
use easyscan_macros::declare_error_type;
use easyscan_span::Span;
use miette::Diagnostic;
use thiserror::Error;

declare_error_type! {
    #[error("parser error: {0}")]
    pub enum ParseError {
        UnexpectedEndOfFile(UnexpectedEndOfFileError),
        UnfinishedToken(UnfinishedTokenError),
        UnexpectedCharacter(UnexpectedCharacterError),
        UnexpectedToken(UnexpectedTokenError),
    }
}

impl ParseError {
    /// Get the span of the source that caused the error.
    pub fn span(&self) -> &Span {
        match self {
            ParseError::UnexpectedEndOfFile(e) => &e.span,
            ParseError::UnfinishedToken(e) => &e.span,
            ParseError::UnexpectedCharacter(e) => &e.span,
            ParseError::UnexpectedToken(e) => &e.span,
        }
    }
}

/// Handy type alias for all parsing-related errors.
pub type ParseResult<T> = Result<T, ParseError>;

/// Signals that the lexer has reached the end of the input stream.
///
/// The lexer produces this error whenever it runs out of input. The parser input layer treats it
/// as the end of the token stream while looking ahead, so it only surfaces to the user when the
/// parser actually requires another token.
#[derive(Error, Diagnostic, Debug)]
#[diagnostic(
    code(syntax::unexpected_end_of_file),
    help("the file ends in the middle of a declaration")
)]
#[error("expected more input after this")]
pub struct UnexpectedEndOfFileError {
    #[label = "required more input to parse"]
    pub span: Span,
}

#[derive(Error, Diagnostic, Debug, PartialEq)]
#[diagnostic(
    code(syntax::unfinished_token),
    help("did you forget to add a closing '{expected}' here?")
)]
#[error("unterminated token, expected a closing '{expected}'")]
pub struct UnfinishedTokenError {
    pub expected: String,
    #[label = "this literal or comment is never closed"]
    pub span: Span,
}

#[derive(Error, Diagnostic, Debug)]
#[diagnostic(code(syntax::unexpected_character))]
#[error("found illegal character during parsing")]
pub struct UnexpectedCharacterError {
    pub ch: char,
    #[label("the character '{ch}' does not parse into any tokens")]
    pub span: Span,
}

#[derive(Error, Diagnostic, Debug)]
#[diagnostic(code(syntax::unexpected_token))]
#[error("found unexpected token during parsing")]
pub struct UnexpectedTokenError {
    pub token: Token,
    #[label("was not expecting to find '{token}' in this position")]
    pub span: Span,
}
