//! System catalog for quarrydb

mod catalog;
mod types;

pub use catalog::{
    bool_value, int_value, is_schema_table, text_value, Catalog, COLUMNS_TABLE, INDICES_TABLE,
    TABLES_TABLE,
};
pub use types::DataType;
