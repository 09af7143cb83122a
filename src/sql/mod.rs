//! SQL front end for quarrydb
//!
//! Lexer, parser and AST. The rest of the engine consumes the AST and
//! never looks at SQL text.

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod token;

pub use ast::Statement;
pub use lexer::Lexer;
pub use parser::Parser;
pub use token::Token;
