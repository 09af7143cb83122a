//! Statement executor for quarrydb
//!
//! Dispatches parsed statements to the catalog, heap tables and indexes,
//! and wraps the outcome in a QueryResult. DDL statements that write
//! several catalog rows keep a journal of compensating deletes which is
//! drained in reverse if anything fails, so a failed CREATE leaves no
//! partial rows behind.

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use super::plan::EvalPlan;
use crate::catalog::{self, text_value, Catalog, DataType};
use crate::error::{Error, Result};
use crate::sql::ast::*;
use crate::storage::{BTreeIndex, Handle, HeapTable, Row, Value};

/// Result of executing one statement
#[derive(Debug)]
pub struct QueryResult {
    /// Column names, in projection order
    pub column_names: Option<Vec<String>>,
    /// Column data types, parallel to the names
    pub column_attributes: Option<Vec<DataType>>,
    /// Result rows
    pub rows: Option<Vec<Row>>,
    /// Human-readable outcome
    pub message: String,
}

impl QueryResult {
    /// A result carrying only a message (pure DDL)
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            column_names: None,
            column_attributes: None,
            rows: None,
            message: message.into(),
        }
    }

    /// A result carrying rows plus the usual row-count trailer
    pub fn with_rows(
        column_names: Vec<String>,
        column_attributes: Vec<DataType>,
        rows: Vec<Row>,
    ) -> Self {
        let message = format!("successfully returned {} rows", rows.len());
        Self {
            column_names: Some(column_names),
            column_attributes: Some(column_attributes),
            rows: Some(rows),
            message,
        }
    }
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let (Some(column_names), Some(rows)) = (&self.column_names, &self.rows) {
            for column_name in column_names {
                write!(f, "{} ", column_name)?;
            }
            writeln!(f)?;
            write!(f, "+")?;
            for _ in column_names {
                write!(f, "----------+")?;
            }
            writeln!(f)?;
            for row in rows {
                for column_name in column_names {
                    if let Some(value) = row.get(column_name) {
                        write!(f, "{} ", value)?;
                    }
                }
                writeln!(f)?;
            }
        }
        write!(f, "{}", self.message)
    }
}

/// Compensating actions for a DDL statement in progress. Drained in
/// reverse on failure; each step swallows and logs its own error so the
/// original failure is what the user sees.
struct Journal {
    actions: Vec<(Arc<Mutex<HeapTable>>, Handle)>,
}

impl Journal {
    fn new() -> Self {
        Self {
            actions: Vec::new(),
        }
    }

    /// Remember a catalog row to delete if the statement fails.
    fn record(&mut self, relation: Arc<Mutex<HeapTable>>, handle: Handle) {
        self.actions.push((relation, handle));
    }

    /// Forward progress succeeded; nothing to compensate.
    fn commit(mut self) {
        self.actions.clear();
    }

    /// Undo the recorded inserts in reverse order.
    fn rollback(self) {
        for (relation, handle) in self.actions.into_iter().rev() {
            if let Err(e) = relation.lock().unwrap().del(handle) {
                tracing::warn!(error = %e, "compensating delete failed during rollback");
            }
        }
    }
}

/// Executes statements against one database directory
pub struct SqlExecutor {
    dir: PathBuf,
    /// Opened on first statement execution
    catalog: Option<Catalog>,
}

impl SqlExecutor {
    /// Set up an executor over the given data directory. The catalog is
    /// not touched until the first statement runs.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            catalog: None,
        }
    }

    /// Execute one parsed statement. Relation errors are re-wrapped with
    /// the `DbRelationError: ` prefix at this boundary.
    pub fn execute(&mut self, statement: &Statement) -> Result<QueryResult> {
        self.run(statement).map_err(|e| match e {
            Error::Relation(detail) => Error::Exec(format!("DbRelationError: {}", detail)),
            other => other,
        })
    }

    fn run(&mut self, statement: &Statement) -> Result<QueryResult> {
        match statement {
            Statement::CreateTable(create) => self.create_table(create),
            Statement::DropTable { table_name } => self.drop_table(table_name),
            Statement::CreateIndex(create) => self.create_index(create),
            Statement::DropIndex {
                index_name,
                table_name,
            } => self.drop_index(index_name, table_name),
            Statement::ShowTables => self.show_tables(),
            Statement::ShowColumns { table_name } => self.show_columns(table_name),
            Statement::ShowIndex { table_name } => self.show_index(table_name),
            Statement::Insert(insert) => self.insert(insert),
            Statement::Delete(delete) => self.delete(delete),
            Statement::Select(select) => self.select(select),
        }
    }

    /// The catalog, opened lazily on first use.
    fn catalog(&mut self) -> Result<&mut Catalog> {
        if self.catalog.is_none() {
            self.catalog = Some(Catalog::open(&self.dir)?);
        }
        Ok(self.catalog.as_mut().unwrap())
    }

    // ========== DDL ==========

    fn create_table(&mut self, stmt: &CreateTableStatement) -> Result<QueryResult> {
        if catalog::is_schema_table(&stmt.table_name) {
            return Err(Error::Relation(format!(
                "'{}' is a reserved schema table name",
                stmt.table_name
            )));
        }
        let mut seen = HashSet::new();
        for column in &stmt.columns {
            if !seen.insert(column.name.as_str()) {
                return Err(Error::Relation(format!(
                    "duplicate column {}.{}",
                    stmt.table_name, column.name
                )));
            }
        }

        let catalog = self.catalog()?;
        if catalog.table_exists(&stmt.table_name)? {
            if stmt.if_not_exists {
                return Ok(QueryResult::with_message(format!(
                    "table {} already exists",
                    stmt.table_name
                )));
            }
            return Err(Error::Relation(format!(
                "table '{}' already exists",
                stmt.table_name
            )));
        }

        let mut journal = Journal::new();
        match Self::create_table_rows(catalog, stmt, &mut journal) {
            Ok(()) => {
                journal.commit();
                tracing::debug!(table = %stmt.table_name, "table created");
                Ok(QueryResult::with_message(format!(
                    "created {}",
                    stmt.table_name
                )))
            }
            Err(e) => {
                journal.rollback();
                catalog.evict(&stmt.table_name);
                Err(e)
            }
        }
    }

    /// The forward half of CREATE TABLE: catalog rows first, then the
    /// physical file, so the catalog stays authoritative on a crash.
    fn create_table_rows(
        catalog: &mut Catalog,
        stmt: &CreateTableStatement,
        journal: &mut Journal,
    ) -> Result<()> {
        let tables = catalog.tables();
        let mut row = Row::new();
        row.insert(
            "table_name".to_string(),
            Value::Text(stmt.table_name.clone()),
        );
        let handle = tables.lock().unwrap().insert(&row)?;
        journal.record(tables, handle);

        let columns = catalog.columns();
        for column in &stmt.columns {
            let mut row = Row::new();
            row.insert(
                "table_name".to_string(),
                Value::Text(stmt.table_name.clone()),
            );
            row.insert(
                "column_name".to_string(),
                Value::Text(column.name.clone()),
            );
            row.insert(
                "data_type".to_string(),
                Value::Text(column.data_type.to_string()),
            );
            let handle = columns.lock().unwrap().insert(&row)?;
            journal.record(columns.clone(), handle);
        }

        let table = catalog.get_table(&stmt.table_name)?;
        let mut table = table.lock().unwrap();
        if stmt.if_not_exists {
            table.create_if_not_exists()
        } else {
            table.create()
        }
    }

    fn drop_table(&mut self, table_name: &str) -> Result<QueryResult> {
        if catalog::is_schema_table(table_name) {
            return Err(Error::Relation("cannot drop a schema table".to_string()));
        }
        let catalog = self.catalog()?;
        let table = catalog.get_table(table_name)?;

        // Indexes go first, before the physical file
        for index_name in catalog.get_index_names(table_name)? {
            let mut index = catalog.get_index(table_name, &index_name)?;
            index.drop_index()?;
            Self::delete_matching(
                &catalog.indices(),
                &[
                    ("table_name", Value::Text(table_name.to_string())),
                    ("index_name", Value::Text(index_name.clone())),
                ],
            )?;
        }

        Self::delete_matching(
            &catalog.columns(),
            &[("table_name", Value::Text(table_name.to_string()))],
        )?;

        table.lock().unwrap().drop_table()?;

        Self::delete_matching(
            &catalog.tables(),
            &[("table_name", Value::Text(table_name.to_string()))],
        )?;
        catalog.evict(table_name);
        tracing::debug!(table = %table_name, "table dropped");
        Ok(QueryResult::with_message(format!("dropped {}", table_name)))
    }

    fn create_index(&mut self, stmt: &CreateIndexStatement) -> Result<QueryResult> {
        let catalog = self.catalog()?;
        let table = catalog.get_table(&stmt.table_name)?;
        {
            let table = table.lock().unwrap();
            for column_name in &stmt.columns {
                table.column_attribute(column_name)?;
            }
        }
        if catalog
            .get_index_names(&stmt.table_name)?
            .contains(&stmt.index_name)
        {
            return Err(Error::Relation(format!(
                "index '{}' already exists on table '{}'",
                stmt.index_name, stmt.table_name
            )));
        }

        // Only unique B-trees exist; anything else gets is_unique = false
        // and is refused when the index object is constructed below.
        let is_unique = stmt.index_type == "BTREE";

        let mut journal = Journal::new();
        match Self::create_index_rows(catalog, stmt, is_unique, &mut journal) {
            Ok(()) => {
                journal.commit();
                tracing::debug!(
                    table = %stmt.table_name,
                    index = %stmt.index_name,
                    "index created"
                );
                Ok(QueryResult::with_message(format!(
                    "created index {}",
                    stmt.index_name
                )))
            }
            Err(e) => {
                journal.rollback();
                Err(e)
            }
        }
    }

    /// The forward half of CREATE INDEX: descriptor rows first, then the
    /// tree build from existing rows.
    fn create_index_rows(
        catalog: &mut Catalog,
        stmt: &CreateIndexStatement,
        is_unique: bool,
        journal: &mut Journal,
    ) -> Result<()> {
        let indices = catalog.indices();
        for (seq, column_name) in stmt.columns.iter().enumerate() {
            let mut row = Row::new();
            row.insert(
                "table_name".to_string(),
                Value::Text(stmt.table_name.clone()),
            );
            row.insert(
                "index_name".to_string(),
                Value::Text(stmt.index_name.clone()),
            );
            row.insert("seq_in_index".to_string(), Value::Int(seq as i32 + 1));
            row.insert(
                "column_name".to_string(),
                Value::Text(column_name.clone()),
            );
            row.insert(
                "index_type".to_string(),
                Value::Text(stmt.index_type.clone()),
            );
            row.insert("is_unique".to_string(), Value::Boolean(is_unique));
            let handle = indices.lock().unwrap().insert(&row)?;
            journal.record(indices.clone(), handle);
        }

        let mut index = catalog.get_index(&stmt.table_name, &stmt.index_name)?;
        index.create()
    }

    fn drop_index(&mut self, index_name: &str, table_name: &str) -> Result<QueryResult> {
        let catalog = self.catalog()?;
        let mut index = catalog.get_index(table_name, index_name)?;
        index.drop_index()?;
        Self::delete_matching(
            &catalog.indices(),
            &[
                ("table_name", Value::Text(table_name.to_string())),
                ("index_name", Value::Text(index_name.to_string())),
            ],
        )?;
        Ok(QueryResult::with_message(format!(
            "dropped index {} from {}",
            index_name, table_name
        )))
    }

    /// Delete every row of `relation` matching the equality terms.
    fn delete_matching(
        relation: &Arc<Mutex<HeapTable>>,
        terms: &[(&str, Value)],
    ) -> Result<()> {
        let mut predicate = Row::new();
        for (column, value) in terms {
            predicate.insert(column.to_string(), value.clone());
        }
        let mut relation = relation.lock().unwrap();
        for handle in relation.select_where(&predicate)? {
            relation.del(handle)?;
        }
        Ok(())
    }

    // ========== schema introspection ==========

    fn show_tables(&mut self) -> Result<QueryResult> {
        let catalog = self.catalog()?;
        let column_names = vec!["table_name".to_string()];
        let tables = catalog.tables();
        let mut tables = tables.lock().unwrap();

        let mut rows = Vec::new();
        for handle in tables.select()? {
            let row = tables.project_columns(handle, &column_names)?;
            if !catalog::is_schema_table(&text_value(&row, "table_name")?) {
                rows.push(row);
            }
        }
        Ok(QueryResult::with_rows(
            column_names,
            vec![DataType::Text],
            rows,
        ))
    }

    fn show_columns(&mut self, table_name: &str) -> Result<QueryResult> {
        let catalog = self.catalog()?;
        let column_names = vec![
            "table_name".to_string(),
            "column_name".to_string(),
            "data_type".to_string(),
        ];
        let mut predicate = Row::new();
        predicate.insert(
            "table_name".to_string(),
            Value::Text(table_name.to_string()),
        );

        let columns = catalog.columns();
        let mut columns = columns.lock().unwrap();
        let mut rows = Vec::new();
        for handle in columns.select_where(&predicate)? {
            rows.push(columns.project_columns(handle, &column_names)?);
        }
        Ok(QueryResult::with_rows(
            column_names,
            vec![DataType::Text, DataType::Text, DataType::Text],
            rows,
        ))
    }

    fn show_index(&mut self, table_name: &str) -> Result<QueryResult> {
        let catalog = self.catalog()?;
        let column_names = vec![
            "table_name".to_string(),
            "index_name".to_string(),
            "column_name".to_string(),
            "seq_in_index".to_string(),
            "index_type".to_string(),
            "is_unique".to_string(),
        ];
        let mut predicate = Row::new();
        predicate.insert(
            "table_name".to_string(),
            Value::Text(table_name.to_string()),
        );

        let indices = catalog.indices();
        let mut indices = indices.lock().unwrap();
        let mut rows = Vec::new();
        for handle in indices.select_where(&predicate)? {
            rows.push(indices.project_columns(handle, &column_names)?);
        }
        Ok(QueryResult::with_rows(
            column_names,
            vec![
                DataType::Text,
                DataType::Text,
                DataType::Text,
                DataType::Int,
                DataType::Text,
                DataType::Boolean,
            ],
            rows,
        ))
    }

    // ========== DML / DQL ==========

    fn insert(&mut self, stmt: &InsertStatement) -> Result<QueryResult> {
        let catalog = self.catalog()?;
        let table = catalog.get_table(&stmt.table_name)?;

        let column_names: Vec<String> = match &stmt.columns {
            Some(columns) => {
                let table = table.lock().unwrap();
                for column_name in columns {
                    table.column_attribute(column_name)?;
                }
                columns.clone()
            }
            None => table.lock().unwrap().column_names().to_vec(),
        };
        if column_names.len() != stmt.values.len() {
            return Err(Error::Relation(format!(
                "INSERT names {} columns but supplies {} values",
                column_names.len(),
                stmt.values.len()
            )));
        }
        let mut row = Row::new();
        for (column_name, literal) in column_names.iter().zip(&stmt.values) {
            row.insert(column_name.clone(), literal_value(literal));
        }

        let handle = table.lock().unwrap().insert(&row)?;

        let index_names = catalog.get_index_names(&stmt.table_name)?;
        let mut updated = Vec::new();
        for index_name in &index_names {
            let mut index = catalog.get_index(&stmt.table_name, index_name)?;
            if let Err(e) = index.insert(handle) {
                // Unwind the indexes already updated, then the row itself;
                // each step is best-effort so `e` survives.
                for mut index in updated {
                    undo_step(&mut index, handle);
                }
                if let Err(undo) = table.lock().unwrap().del(handle) {
                    tracing::warn!(error = %undo, "row removal failed while unwinding insert");
                }
                return Err(e);
            }
            updated.push(index);
        }

        Ok(QueryResult::with_message(format!(
            "successfully inserted 1 row into {} and {} indices",
            stmt.table_name,
            index_names.len()
        )))
    }

    fn delete(&mut self, stmt: &DeleteStatement) -> Result<QueryResult> {
        let catalog = self.catalog()?;
        let table = catalog.get_table(&stmt.table_name)?;

        let mut plan = EvalPlan::TableScan {
            table_name: stmt.table_name.clone(),
            relation: table.clone(),
        };
        if let Some(conjunction) = &stmt.where_clause {
            let predicate = conjunction_to_row(&table, conjunction)?;
            plan = EvalPlan::Select {
                predicate,
                child: Box::new(plan),
            };
        }
        let handles = plan.pipeline()?.handles;

        // Index entries go first, while the rows can still be projected
        let index_names = catalog.get_index_names(&stmt.table_name)?;
        for index_name in &index_names {
            let mut index = catalog.get_index(&stmt.table_name, index_name)?;
            for handle in &handles {
                index.del(*handle)?;
            }
        }
        for handle in &handles {
            table.lock().unwrap().del(*handle)?;
        }

        Ok(QueryResult::with_message(format!(
            "successfully deleted {} rows from {} and {} indices",
            handles.len(),
            stmt.table_name,
            index_names.len()
        )))
    }

    fn select(&mut self, stmt: &SelectStatement) -> Result<QueryResult> {
        let catalog = self.catalog()?;
        let table = catalog.get_table(&stmt.table_name)?;

        let (column_names, column_attributes) = {
            let table = table.lock().unwrap();
            let names: Vec<String> = match &stmt.columns {
                SelectList::Wildcard => table.column_names().to_vec(),
                SelectList::Columns(columns) => columns.clone(),
            };
            let mut attributes = Vec::with_capacity(names.len());
            for name in &names {
                attributes.push(table.column_attribute(name)?);
            }
            (names, attributes)
        };

        let mut plan = EvalPlan::TableScan {
            table_name: stmt.table_name.clone(),
            relation: table.clone(),
        };
        if let Some(conjunction) = &stmt.where_clause {
            let predicate = conjunction_to_row(&table, conjunction)?;
            plan = EvalPlan::Select {
                predicate,
                child: Box::new(plan),
            };
        }
        let mut plan = EvalPlan::Project {
            columns: column_names.clone(),
            child: Box::new(plan),
        }
        .optimize(catalog)?;

        let rows = plan.evaluate()?;
        Ok(QueryResult::with_rows(
            column_names,
            column_attributes,
            rows,
        ))
    }
}

/// Best-effort removal of an index entry while unwinding a failed insert.
fn undo_step(index: &mut BTreeIndex, handle: Handle) {
    if let Err(e) = index.del(handle) {
        tracing::warn!(
            index = %index.name(),
            error = %e,
            "index cleanup failed while unwinding insert"
        );
    }
}

fn literal_value(literal: &Literal) -> Value {
    match literal {
        Literal::Int(n) => Value::Int(*n),
        Literal::Text(s) => Value::Text(s.clone()),
    }
}

/// Convert a parsed conjunction into a predicate row, checking that every
/// constrained column exists on the relation.
fn conjunction_to_row(
    table: &Arc<Mutex<HeapTable>>,
    conjunction: &Conjunction,
) -> Result<Row> {
    let table = table.lock().unwrap();
    let mut predicate = Row::new();
    for condition in conjunction {
        table.column_attribute(&condition.column)?;
        predicate.insert(
            condition.column.clone(),
            literal_value(&condition.value),
        );
    }
    Ok(predicate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{bool_value, int_value};
    use crate::sql::Parser;
    use tempfile::TempDir;

    fn executor(dir: &TempDir) -> SqlExecutor {
        SqlExecutor::new(dir.path())
    }

    fn exec(executor: &mut SqlExecutor, sql: &str) -> Result<QueryResult> {
        let statement = Parser::new(sql)?.parse()?;
        executor.execute(&statement)
    }

    fn exec_ok(executor: &mut SqlExecutor, sql: &str) -> QueryResult {
        exec(executor, sql).unwrap_or_else(|e| panic!("{} failed: {}", sql, e))
    }

    #[test]
    fn test_create_show_drop_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let mut executor = executor(&dir);

        let result = exec_ok(&mut executor, "CREATE TABLE foo (id INT, data TEXT)");
        assert_eq!(result.message, "created foo");

        let result = exec_ok(&mut executor, "SHOW TABLES");
        let rows = result.rows.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0].get("table_name"),
            Some(&Value::Text("foo".to_string()))
        );
        assert_eq!(result.message, "successfully returned 1 rows");

        let result = exec_ok(&mut executor, "SHOW COLUMNS FROM foo");
        assert_eq!(result.rows.unwrap().len(), 2);

        let result = exec_ok(&mut executor, "DROP TABLE foo");
        assert_eq!(result.message, "dropped foo");
        let result = exec_ok(&mut executor, "SHOW TABLES");
        assert!(result.rows.unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_column_rejected_with_no_residue() {
        let dir = tempfile::tempdir().unwrap();
        let mut executor = executor(&dir);

        let err = exec(&mut executor, "CREATE TABLE goo (x INT, x TEXT)").unwrap_err();
        assert_eq!(
            err.to_string(),
            "DbRelationError: duplicate column goo.x"
        );

        let result = exec_ok(&mut executor, "SHOW TABLES");
        assert!(result.rows.unwrap().is_empty());
        let result = exec_ok(&mut executor, "SHOW COLUMNS FROM goo");
        assert!(result.rows.unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_table_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut executor = executor(&dir);
        exec_ok(&mut executor, "CREATE TABLE foo (id INT)");
        assert!(exec(&mut executor, "CREATE TABLE foo (id INT)").is_err());

        // IF NOT EXISTS is a quiet success
        let result = exec_ok(&mut executor, "CREATE TABLE IF NOT EXISTS foo (id INT)");
        assert_eq!(result.message, "table foo already exists");
    }

    #[test]
    fn test_schema_tables_protected() {
        let dir = tempfile::tempdir().unwrap();
        let mut executor = executor(&dir);
        let err = exec(&mut executor, "DROP TABLE _tables").unwrap_err();
        assert_eq!(
            err.to_string(),
            "DbRelationError: cannot drop a schema table"
        );
        assert!(exec(&mut executor, "CREATE TABLE _columns (x INT)").is_err());
    }

    #[test]
    fn test_insert_select_project() {
        let dir = tempfile::tempdir().unwrap();
        let mut executor = executor(&dir);
        exec_ok(&mut executor, "CREATE TABLE foo (id INT, data TEXT)");

        let result = exec_ok(&mut executor, "INSERT INTO foo VALUES (1, \"one\")");
        assert_eq!(
            result.message,
            "successfully inserted 1 row into foo and 0 indices"
        );
        exec_ok(
            &mut executor,
            "INSERT INTO foo (data, id) VALUES ('two', 2)",
        );

        let result = exec_ok(&mut executor, "SELECT * FROM foo");
        assert_eq!(result.column_names.as_deref(), Some(&["id".to_string(), "data".to_string()][..]));
        assert_eq!(result.rows.unwrap().len(), 2);

        let result = exec_ok(&mut executor, "SELECT data FROM foo WHERE id = 2");
        let rows = result.rows.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].len(), 1);
        assert_eq!(
            rows[0].get("data"),
            Some(&Value::Text("two".to_string()))
        );
    }

    #[test]
    fn test_insert_missing_column_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut executor = executor(&dir);
        exec_ok(&mut executor, "CREATE TABLE foo (id INT, data TEXT)");
        assert!(exec(&mut executor, "INSERT INTO foo (id) VALUES (1)").is_err());
        assert!(exec(&mut executor, "INSERT INTO foo VALUES (1)").is_err());
    }

    #[test]
    fn test_index_lookup_and_pushdown() {
        let dir = tempfile::tempdir().unwrap();
        let mut executor = executor(&dir);
        exec_ok(&mut executor, "CREATE TABLE foo (id INT, data TEXT)");
        exec_ok(&mut executor, "INSERT INTO foo VALUES (1, \"one\")");
        exec_ok(&mut executor, "INSERT INTO foo VALUES (2, \"two\")");
        let result = exec_ok(&mut executor, "CREATE INDEX fx ON foo (id)");
        assert_eq!(result.message, "created index fx");

        let result = exec_ok(&mut executor, "SELECT * FROM foo WHERE id = 2");
        let rows = result.rows.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("id"), Some(&Value::Int(2)));
        assert_eq!(
            rows[0].get("data"),
            Some(&Value::Text("two".to_string()))
        );

        // Rows inserted after the index exists are found through it too
        exec_ok(&mut executor, "INSERT INTO foo VALUES (3, \"three\")");
        let result = exec_ok(&mut executor, "SELECT data FROM foo WHERE id = 3");
        assert_eq!(result.rows.unwrap().len(), 1);

        // Unindexed column still answers through the scan path
        let result = exec_ok(&mut executor, "SELECT id FROM foo WHERE data = \"one\"");
        let rows = result.rows.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("id"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_unique_index_rejects_duplicate_and_unwinds() {
        let dir = tempfile::tempdir().unwrap();
        let mut executor = executor(&dir);
        exec_ok(&mut executor, "CREATE TABLE foo (id INT, data TEXT)");
        exec_ok(&mut executor, "CREATE INDEX fx ON foo (id)");
        exec_ok(&mut executor, "INSERT INTO foo VALUES (1, \"one\")");

        assert!(exec(&mut executor, "INSERT INTO foo VALUES (1, \"again\")").is_err());
        // The rejected row is not reachable by a scan
        let result = exec_ok(&mut executor, "SELECT * FROM foo");
        assert_eq!(result.rows.unwrap().len(), 1);
    }

    #[test]
    fn test_hash_index_rejected_with_no_residue() {
        let dir = tempfile::tempdir().unwrap();
        let mut executor = executor(&dir);
        exec_ok(&mut executor, "CREATE TABLE foo (id INT, data TEXT)");

        assert!(exec(&mut executor, "CREATE INDEX hx ON foo USING HASH (id)").is_err());
        let result = exec_ok(&mut executor, "SHOW INDEX FROM foo");
        assert!(result.rows.unwrap().is_empty());
    }

    #[test]
    fn test_show_index_shape() {
        let dir = tempfile::tempdir().unwrap();
        let mut executor = executor(&dir);
        exec_ok(&mut executor, "CREATE TABLE g (x INT, y INT, z INT)");
        exec_ok(&mut executor, "CREATE INDEX fx ON g (x, y)");

        let result = exec_ok(&mut executor, "SHOW INDEX FROM g");
        assert_eq!(
            result.column_names.as_deref(),
            Some(
                &[
                    "table_name".to_string(),
                    "index_name".to_string(),
                    "column_name".to_string(),
                    "seq_in_index".to_string(),
                    "index_type".to_string(),
                    "is_unique".to_string(),
                ][..]
            )
        );
        let rows = result.rows.unwrap();
        assert_eq!(rows.len(), 2);
        for (row, (column, seq)) in rows.iter().zip([("x", 1), ("y", 2)]) {
            assert_eq!(text_value(row, "table_name").unwrap(), "g");
            assert_eq!(text_value(row, "index_name").unwrap(), "fx");
            assert_eq!(text_value(row, "column_name").unwrap(), column);
            assert_eq!(int_value(row, "seq_in_index").unwrap(), seq);
            assert_eq!(text_value(row, "index_type").unwrap(), "BTREE");
            assert!(bool_value(row, "is_unique").unwrap());
        }
    }

    #[test]
    fn test_delete_with_index_cleanup() {
        let dir = tempfile::tempdir().unwrap();
        let mut executor = executor(&dir);
        exec_ok(&mut executor, "CREATE TABLE foo (id INT, data TEXT)");
        exec_ok(&mut executor, "INSERT INTO foo VALUES (1, \"one\")");
        exec_ok(&mut executor, "INSERT INTO foo VALUES (2, \"two\")");
        exec_ok(&mut executor, "INSERT INTO foo VALUES (3, \"three\")");
        exec_ok(&mut executor, "CREATE INDEX fx ON foo (id)");

        let result = exec_ok(&mut executor, "DELETE FROM foo WHERE id = 2");
        assert_eq!(
            result.message,
            "successfully deleted 1 rows from foo and 1 indices"
        );

        let result = exec_ok(&mut executor, "SELECT * FROM foo WHERE id = 2");
        assert!(result.rows.unwrap().is_empty());
        let result = exec_ok(&mut executor, "SELECT * FROM foo");
        assert_eq!(result.rows.unwrap().len(), 2);
    }

    #[test]
    fn test_delete_without_where_empties_table() {
        let dir = tempfile::tempdir().unwrap();
        let mut executor = executor(&dir);
        exec_ok(&mut executor, "CREATE TABLE foo (id INT, data TEXT)");
        exec_ok(&mut executor, "INSERT INTO foo VALUES (1, \"one\")");
        exec_ok(&mut executor, "INSERT INTO foo VALUES (2, \"two\")");

        let result = exec_ok(&mut executor, "DELETE FROM foo");
        assert_eq!(
            result.message,
            "successfully deleted 2 rows from foo and 0 indices"
        );
        let result = exec_ok(&mut executor, "SELECT * FROM foo");
        assert!(result.rows.unwrap().is_empty());
    }

    #[test]
    fn test_drop_index() {
        let dir = tempfile::tempdir().unwrap();
        let mut executor = executor(&dir);
        exec_ok(&mut executor, "CREATE TABLE foo (id INT, data TEXT)");
        exec_ok(&mut executor, "CREATE INDEX fx ON foo (id)");

        let result = exec_ok(&mut executor, "DROP INDEX fx FROM foo");
        assert_eq!(result.message, "dropped index fx from foo");
        let result = exec_ok(&mut executor, "SHOW INDEX FROM foo");
        assert!(result.rows.unwrap().is_empty());
        assert!(exec(&mut executor, "DROP INDEX fx FROM foo").is_err());
    }

    #[test]
    fn test_unknown_table_and_column_errors() {
        let dir = tempfile::tempdir().unwrap();
        let mut executor = executor(&dir);
        assert!(exec(&mut executor, "SELECT * FROM nope").is_err());

        exec_ok(&mut executor, "CREATE TABLE foo (id INT)");
        assert!(exec(&mut executor, "SELECT nope FROM foo").is_err());
        assert!(exec(&mut executor, "SELECT * FROM foo WHERE nope = 1").is_err());
        assert!(exec(&mut executor, "CREATE INDEX nx ON foo (nope)").is_err());
    }

    #[test]
    fn test_result_rendering() {
        let dir = tempfile::tempdir().unwrap();
        let mut executor = executor(&dir);
        exec_ok(&mut executor, "CREATE TABLE foo (id INT, data TEXT)");
        exec_ok(&mut executor, "INSERT INTO foo VALUES (1, \"one\")");

        let result = exec_ok(&mut executor, "SELECT * FROM foo");
        let rendered = result.to_string();
        assert!(rendered.starts_with("id data \n+----------+----------+\n"));
        assert!(rendered.contains("1 \"one\" \n"));
        assert!(rendered.ends_with("successfully returned 1 rows"));
    }
}
