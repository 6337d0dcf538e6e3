mod ast;
mod bracket;
mod error;
mod lexer;
mod parser;
mod scope;
mod tok;

pub use ast::*;
pub use error::*;
pub use lexer::*;
pub use parser::*;
pub use scope::*;
pub use tok::*;
