//! quarrydb - A minimal relational database engine written in Rust
//!
//! This library provides the core components for a small SQL database:
//! - SQL parsing (lexer, parser, AST)
//! - Storage engine (block files, slotted pages, heap tables, B-tree indexes)
//! - Self-describing schema catalog
//! - Query execution (evaluation plans, statement executor)

pub mod catalog;
pub mod error;
pub mod executor;
pub mod sql;
pub mod storage;

pub use error::{Error, Result};
