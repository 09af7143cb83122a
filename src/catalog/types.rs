//! Data types for quarrydb
//!
//! This module defines the SQL data types supported by the database.

use std::fmt;

use crate::error::{Error, Result};

/// SQL data types. Every column carries one of these; the schema (not the
/// stored record) decides how bytes are read back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// Integer (32-bit)
    Int,
    /// Variable-length text (ASCII)
    Text,
    /// Boolean, stored as integer 0/1
    Boolean,
}

impl DataType {
    /// Parse a catalog type name (the `_columns.data_type` encoding).
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "INT" => Ok(DataType::Int),
            "TEXT" => Ok(DataType::Text),
            "BOOLEAN" => Ok(DataType::Boolean),
            other => Err(Error::Relation(format!("unknown data type '{}'", other))),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Int => write!(f, "INT"),
            DataType::Text => write!(f, "TEXT"),
            DataType::Boolean => write!(f, "BOOLEAN"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_round_trip() {
        for dt in [DataType::Int, DataType::Text, DataType::Boolean] {
            assert_eq!(DataType::from_name(&dt.to_string()).unwrap(), dt);
        }
        assert!(DataType::from_name("FLOAT").is_err());
    }
}
