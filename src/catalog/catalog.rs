//! Schema catalog for quarrydb
//!
//! The catalog is three self-describing heap tables. `_tables` lists every
//! relation, `_columns` holds one row per declared column, and `_indices`
//! holds one row per index key column. The schema tables' own schemas are
//! hardcoded (the bootstrap), and on a fresh database the catalog seeds
//! rows describing itself.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::catalog::types::DataType;
use crate::error::{Error, Result};
use crate::storage::{BTreeIndex, HeapTable, Row, Value};

/// Name of the table catalog
pub const TABLES_TABLE: &str = "_tables";
/// Name of the column catalog
pub const COLUMNS_TABLE: &str = "_columns";
/// Name of the index catalog
pub const INDICES_TABLE: &str = "_indices";

/// Whether `name` is one of the schema tables (never user-visible in
/// SHOW TABLES, never droppable).
pub fn is_schema_table(name: &str) -> bool {
    name == TABLES_TABLE || name == COLUMNS_TABLE || name == INDICES_TABLE
}

/// The schema catalog: the three schema tables plus a cache of live user
/// relations.
#[derive(Debug)]
pub struct Catalog {
    dir: PathBuf,
    tables: Arc<Mutex<HeapTable>>,
    columns: Arc<Mutex<HeapTable>>,
    indices: Arc<Mutex<HeapTable>>,
    cache: HashMap<String, Arc<Mutex<HeapTable>>>,
}

impl Catalog {
    /// Open the catalog in `dir`, creating and seeding the schema tables
    /// on first use.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        let fresh = !dir.join(format!("{}.db", TABLES_TABLE)).exists();

        let mut tables = HeapTable::new(
            &dir,
            TABLES_TABLE,
            vec!["table_name".to_string()],
            vec![DataType::Text],
        );
        let mut columns = HeapTable::new(
            &dir,
            COLUMNS_TABLE,
            vec![
                "table_name".to_string(),
                "column_name".to_string(),
                "data_type".to_string(),
            ],
            vec![DataType::Text, DataType::Text, DataType::Text],
        );
        let mut indices = HeapTable::new(
            &dir,
            INDICES_TABLE,
            vec![
                "table_name".to_string(),
                "index_name".to_string(),
                "seq_in_index".to_string(),
                "column_name".to_string(),
                "index_type".to_string(),
                "is_unique".to_string(),
            ],
            vec![
                DataType::Text,
                DataType::Text,
                DataType::Int,
                DataType::Text,
                DataType::Text,
                DataType::Boolean,
            ],
        );
        tables.create_if_not_exists()?;
        columns.create_if_not_exists()?;
        indices.create_if_not_exists()?;

        let mut catalog = Self {
            dir,
            tables: Arc::new(Mutex::new(tables)),
            columns: Arc::new(Mutex::new(columns)),
            indices: Arc::new(Mutex::new(indices)),
            cache: HashMap::new(),
        };
        if fresh {
            tracing::debug!("bootstrapping schema tables");
            catalog.seed_schema_rows()?;
        }
        Ok(catalog)
    }

    /// The `_tables` relation
    pub fn tables(&self) -> Arc<Mutex<HeapTable>> {
        self.tables.clone()
    }

    /// The `_columns` relation
    pub fn columns(&self) -> Arc<Mutex<HeapTable>> {
        self.columns.clone()
    }

    /// The `_indices` relation
    pub fn indices(&self) -> Arc<Mutex<HeapTable>> {
        self.indices.clone()
    }

    /// Whether a `_tables` row exists for `name`.
    pub fn table_exists(&mut self, name: &str) -> Result<bool> {
        if is_schema_table(name) {
            return Ok(true);
        }
        let predicate = name_predicate(name);
        Ok(!self
            .tables
            .lock()
            .unwrap()
            .select_where(&predicate)?
            .is_empty())
    }

    /// Resolve `name` to a live heap table, reading its schema from
    /// `_columns`. Schema tables resolve to the singletons; user tables
    /// are cached for the life of the catalog.
    pub fn get_table(&mut self, name: &str) -> Result<Arc<Mutex<HeapTable>>> {
        match name {
            TABLES_TABLE => return Ok(self.tables.clone()),
            COLUMNS_TABLE => return Ok(self.columns.clone()),
            INDICES_TABLE => return Ok(self.indices.clone()),
            _ => {}
        }
        if let Some(table) = self.cache.get(name) {
            return Ok(table.clone());
        }

        if !self.table_exists(name)? {
            return Err(Error::Relation(format!("table '{}' does not exist", name)));
        }

        let predicate = name_predicate(name);
        let mut column_names = Vec::new();
        let mut column_attributes = Vec::new();
        {
            let mut columns = self.columns.lock().unwrap();
            for handle in columns.select_where(&predicate)? {
                let row = columns.project(handle)?;
                column_names.push(text_value(&row, "column_name")?);
                column_attributes.push(DataType::from_name(&text_value(&row, "data_type")?)?);
            }
        }

        let table = Arc::new(Mutex::new(HeapTable::new(
            &self.dir,
            name,
            column_names,
            column_attributes,
        )));
        self.cache.insert(name.to_string(), table.clone());
        Ok(table)
    }

    /// Forget the cached relation for `name` (after DROP TABLE).
    pub fn evict(&mut self, name: &str) {
        self.cache.remove(name);
    }

    /// Build the index named `index_name` on `table_name` from its
    /// `_indices` rows, key columns in `seq_in_index` order.
    pub fn get_index(&mut self, table_name: &str, index_name: &str) -> Result<BTreeIndex> {
        let mut predicate = name_predicate(table_name);
        predicate.insert(
            "index_name".to_string(),
            Value::Text(index_name.to_string()),
        );

        let mut key_rows = Vec::new();
        {
            let mut indices = self.indices.lock().unwrap();
            for handle in indices.select_where(&predicate)? {
                key_rows.push(indices.project(handle)?);
            }
        }
        if key_rows.is_empty() {
            return Err(Error::Relation(format!(
                "index '{}' does not exist on table '{}'",
                index_name, table_name
            )));
        }

        let mut keyed: Vec<(i32, String)> = Vec::with_capacity(key_rows.len());
        for row in &key_rows {
            keyed.push((
                int_value(row, "seq_in_index")?,
                text_value(row, "column_name")?,
            ));
        }
        keyed.sort_by_key(|(seq, _)| *seq);
        let key_columns: Vec<String> = keyed.into_iter().map(|(_, column)| column).collect();
        let unique = bool_value(&key_rows[0], "is_unique")?;

        let relation = self.get_table(table_name)?;
        BTreeIndex::new(&self.dir, relation, index_name, key_columns, unique)
    }

    /// Distinct index names on `table_name`, in `_indices` iteration
    /// order.
    pub fn get_index_names(&mut self, table_name: &str) -> Result<Vec<String>> {
        let predicate = name_predicate(table_name);
        let mut names = Vec::new();
        let mut indices = self.indices.lock().unwrap();
        for handle in indices.select_where(&predicate)? {
            let row = indices.project(handle)?;
            let name = text_value(&row, "index_name")?;
            if !names.contains(&name) {
                names.push(name);
            }
        }
        Ok(names)
    }

    /// Seed the catalog with rows describing its own three tables.
    fn seed_schema_rows(&mut self) -> Result<()> {
        let schema_columns: [(&str, &[&str]); 3] = [
            (TABLES_TABLE, &["table_name"]),
            (COLUMNS_TABLE, &["table_name", "column_name", "data_type"]),
            (
                INDICES_TABLE,
                &[
                    "table_name",
                    "index_name",
                    "seq_in_index",
                    "column_name",
                    "index_type",
                    "is_unique",
                ],
            ),
        ];
        let data_types: [(&str, &[&str]); 3] = [
            (TABLES_TABLE, &["TEXT"]),
            (COLUMNS_TABLE, &["TEXT", "TEXT", "TEXT"]),
            (
                INDICES_TABLE,
                &["TEXT", "TEXT", "INT", "TEXT", "TEXT", "BOOLEAN"],
            ),
        ];

        for (table_name, _) in &schema_columns {
            let mut row = Row::new();
            row.insert(
                "table_name".to_string(),
                Value::Text(table_name.to_string()),
            );
            self.tables.lock().unwrap().insert(&row)?;
        }
        for ((table_name, column_names), (_, types)) in schema_columns.iter().zip(&data_types) {
            for (column_name, data_type) in column_names.iter().zip(types.iter()) {
                let mut row = Row::new();
                row.insert(
                    "table_name".to_string(),
                    Value::Text(table_name.to_string()),
                );
                row.insert(
                    "column_name".to_string(),
                    Value::Text(column_name.to_string()),
                );
                row.insert("data_type".to_string(), Value::Text(data_type.to_string()));
                self.columns.lock().unwrap().insert(&row)?;
            }
        }
        Ok(())
    }
}

fn name_predicate(table_name: &str) -> Row {
    let mut predicate = Row::new();
    predicate.insert(
        "table_name".to_string(),
        Value::Text(table_name.to_string()),
    );
    predicate
}

/// Extract a TEXT value from a catalog row.
pub fn text_value(row: &Row, column: &str) -> Result<String> {
    match row.get(column) {
        Some(Value::Text(s)) => Ok(s.clone()),
        _ => Err(Error::Relation(format!(
            "catalog row is missing text column '{}'",
            column
        ))),
    }
}

/// Extract an INT value from a catalog row.
pub fn int_value(row: &Row, column: &str) -> Result<i32> {
    match row.get(column) {
        Some(Value::Int(n)) => Ok(*n),
        _ => Err(Error::Relation(format!(
            "catalog row is missing int column '{}'",
            column
        ))),
    }
}

/// Extract a BOOLEAN value from a catalog row.
pub fn bool_value(row: &Row, column: &str) -> Result<bool> {
    match row.get(column) {
        Some(Value::Boolean(b)) => Ok(*b),
        _ => Err(Error::Relation(format!(
            "catalog row is missing boolean column '{}'",
            column
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tables_row(table_name: &str) -> Row {
        let mut row = Row::new();
        row.insert(
            "table_name".to_string(),
            Value::Text(table_name.to_string()),
        );
        row
    }

    fn columns_row(table_name: &str, column_name: &str, data_type: &str) -> Row {
        let mut row = tables_row(table_name);
        row.insert(
            "column_name".to_string(),
            Value::Text(column_name.to_string()),
        );
        row.insert("data_type".to_string(), Value::Text(data_type.to_string()));
        row
    }

    fn indices_row(
        table_name: &str,
        index_name: &str,
        seq: i32,
        column_name: &str,
    ) -> Row {
        let mut row = tables_row(table_name);
        row.insert(
            "index_name".to_string(),
            Value::Text(index_name.to_string()),
        );
        row.insert("seq_in_index".to_string(), Value::Int(seq));
        row.insert(
            "column_name".to_string(),
            Value::Text(column_name.to_string()),
        );
        row.insert("index_type".to_string(), Value::Text("BTREE".to_string()));
        row.insert("is_unique".to_string(), Value::Boolean(true));
        row
    }

    /// Register a table in the catalog and create its heap file, the way
    /// the executor's CREATE TABLE path does.
    fn register_table(catalog: &mut Catalog, name: &str, columns: &[(&str, &str)]) {
        catalog
            .tables()
            .lock()
            .unwrap()
            .insert(&tables_row(name))
            .unwrap();
        for (column_name, data_type) in columns {
            catalog
                .columns()
                .lock()
                .unwrap()
                .insert(&columns_row(name, column_name, data_type))
                .unwrap();
        }
        let table = catalog.get_table(name).unwrap();
        table.lock().unwrap().create().unwrap();
    }

    #[test]
    fn test_bootstrap_seeds_schema_rows() {
        let dir = tempfile::tempdir().unwrap();
        let mut catalog = Catalog::open(dir.path()).unwrap();

        let handles = catalog.tables().lock().unwrap().select().unwrap();
        assert_eq!(handles.len(), 3);
        // 1 + 3 + 6 column rows describing the schema tables themselves
        let handles = catalog.columns().lock().unwrap().select().unwrap();
        assert_eq!(handles.len(), 10);

        // Reopening must not seed again
        drop(catalog);
        let mut catalog = Catalog::open(dir.path()).unwrap();
        let handles = catalog.tables().lock().unwrap().select().unwrap();
        assert_eq!(handles.len(), 3);
    }

    #[test]
    fn test_get_table_unknown() {
        let dir = tempfile::tempdir().unwrap();
        let mut catalog = Catalog::open(dir.path()).unwrap();
        assert!(matches!(
            catalog.get_table("nope"),
            Err(Error::Relation(_))
        ));
    }

    #[test]
    fn test_get_table_reads_schema_from_columns() {
        let dir = tempfile::tempdir().unwrap();
        let mut catalog = Catalog::open(dir.path()).unwrap();
        register_table(
            &mut catalog,
            "foo",
            &[("id", "INT"), ("data", "TEXT")],
        );

        let table = catalog.get_table("foo").unwrap();
        {
            let table = table.lock().unwrap();
            assert_eq!(table.column_names(), ["id", "data"]);
            assert_eq!(
                table.column_attributes(),
                [DataType::Int, DataType::Text]
            );
        }

        // Same cached relation on the second resolution
        let again = catalog.get_table("foo").unwrap();
        assert!(Arc::ptr_eq(&table, &again));
    }

    #[test]
    fn test_get_index_orders_key_columns_by_seq() {
        let dir = tempfile::tempdir().unwrap();
        let mut catalog = Catalog::open(dir.path()).unwrap();
        register_table(
            &mut catalog,
            "g",
            &[("x", "INT"), ("y", "INT"), ("z", "INT")],
        );

        // Inserted out of order on purpose
        let indices = catalog.indices();
        indices
            .lock()
            .unwrap()
            .insert(&indices_row("g", "fx", 2, "y"))
            .unwrap();
        indices
            .lock()
            .unwrap()
            .insert(&indices_row("g", "fx", 1, "x"))
            .unwrap();

        let index = catalog.get_index("g", "fx").unwrap();
        assert_eq!(index.key_columns(), ["x", "y"]);

        assert_eq!(catalog.get_index_names("g").unwrap(), vec!["fx"]);
        assert!(catalog.get_index("g", "missing").is_err());
    }
}
