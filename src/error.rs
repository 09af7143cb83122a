//! Error types for quarrydb
//!
//! This module defines all error types used throughout the database engine.

use thiserror::Error;

/// The main error type for quarrydb
#[derive(Error, Debug)]
pub enum Error {
    // ========== Lexer Errors ==========
    #[error("Lexer error: unexpected character '{0}' at position {1}")]
    UnexpectedCharacter(char, usize),

    #[error("Lexer error: unterminated string literal starting at position {0}")]
    UnterminatedString(usize),

    #[error("Lexer error: invalid number format at position {0}")]
    InvalidNumber(usize),

    // ========== Parser Errors ==========
    #[error("Parse error: unexpected token '{found}', expected {expected}")]
    UnexpectedToken { expected: String, found: String },

    #[error("Parse error: unexpected end of input, expected {0}")]
    UnexpectedEof(String),

    // ========== Storage Errors ==========
    /// A slotted page has no room for the requested add or put.
    #[error("{0}")]
    NoRoom(String),

    // ========== Relation Errors ==========
    /// Schema violations: unknown or duplicate tables, columns and
    /// indexes, missing column values, operations a relation refuses.
    #[error("{0}")]
    Relation(String),

    // ========== Execution Errors ==========
    /// SQL the executor recognises but cannot carry out. Relation errors
    /// are re-wrapped into this class at the executor boundary.
    #[error("{0}")]
    Exec(String),

    // ========== I/O Errors ==========
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for quarrydb operations
pub type Result<T> = std::result::Result<T, Error>;
