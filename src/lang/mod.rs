/*!
## Rust Language Module

This Rust module provides lexical analysis of the BASIC language.

*/

#[macro_use]
mod error;
mod lex;
mod token;

pub use error::Error;
pub use error::ErrorCode;
pub use lex::Lexer;
pub use token::{Literal, Operator, Token, Word};
