//! Heap table storage for quarrydb
//!
//! A heap table is the row-level view of one relation: it marshals rows
//! into records using the relation's schema, appends them to the heap
//! file, and projects them back out by handle. The schema defines the
//! reader; no per-row type tags are stored.

use std::path::PathBuf;

use super::heap::HeapFile;
use super::tuple::{Handle, Row, Value};
use crate::catalog::DataType;
use crate::error::{Error, Result};

/// Row-level relation backed by a heap file
#[derive(Debug)]
pub struct HeapTable {
    name: String,
    column_names: Vec<String>,
    column_attributes: Vec<DataType>,
    file: HeapFile,
}

impl HeapTable {
    /// Set up a heap table. Does not touch disk; the file is created by
    /// `create` and opened lazily by the row operations.
    pub fn new(
        dir: impl Into<PathBuf>,
        name: &str,
        column_names: Vec<String>,
        column_attributes: Vec<DataType>,
    ) -> Self {
        debug_assert_eq!(column_names.len(), column_attributes.len());
        Self {
            name: name.to_string(),
            column_names,
            column_attributes,
            file: HeapFile::new(dir, name),
        }
    }

    /// Table name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Column names in schema order
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// Column data types in schema order
    pub fn column_attributes(&self) -> &[DataType] {
        &self.column_attributes
    }

    /// Data type of one column
    pub fn column_attribute(&self, column_name: &str) -> Result<DataType> {
        self.column_names
            .iter()
            .position(|c| c == column_name)
            .map(|i| self.column_attributes[i])
            .ok_or_else(|| {
                Error::Relation(format!(
                    "table {} has no column '{}'",
                    self.name, column_name
                ))
            })
    }

    /// Create the physical file. Metadata storage is the catalog's job.
    pub fn create(&mut self) -> Result<()> {
        self.file.create()
    }

    /// Open the physical file if it exists, otherwise create it.
    pub fn create_if_not_exists(&mut self) -> Result<()> {
        self.file.create_if_not_exists()
    }

    /// Delete the physical file.
    pub fn drop_table(&mut self) -> Result<()> {
        self.file.drop_file()
    }

    /// Open the table. Enables insert, select, project, del.
    pub fn open(&mut self) -> Result<()> {
        self.file.open()
    }

    /// Close the table, syncing to disk.
    pub fn close(&mut self) -> Result<()> {
        self.file.close()
    }

    /// Insert a row. The row must supply a value for every schema column.
    /// Returns the handle of the stored record.
    pub fn insert(&mut self, row: &Row) -> Result<Handle> {
        self.open()?;
        let full_row = self.validate(row)?;
        self.append(&full_row)
    }

    /// Updating in place is not supported; rows are deleted and re-inserted.
    pub fn update(&mut self, _handle: Handle, _new_values: &Row) -> Result<()> {
        Err(Error::Relation(format!(
            "table {} does not support update",
            self.name
        )))
    }

    /// Delete the record named by the handle. Its id becomes a tombstone,
    /// so handles to other records stay valid.
    pub fn del(&mut self, handle: Handle) -> Result<()> {
        self.open()?;
        let mut page = self.file.get(handle.block_id)?;
        page.del(handle.record_id);
        self.file.put(&page)
    }

    /// Handles of every live record, in block order then record order.
    pub fn select(&mut self) -> Result<Vec<Handle>> {
        self.open()?;
        let mut handles = Vec::new();
        for block_id in self.file.block_ids() {
            let page = self.file.get(block_id)?;
            for record_id in page.ids() {
                handles.push(Handle::new(block_id, record_id));
            }
        }
        Ok(handles)
    }

    /// Handles of every live record whose row matches all of the equality
    /// terms in `predicate`.
    pub fn select_where(&mut self, predicate: &Row) -> Result<Vec<Handle>> {
        self.open()?;
        let mut handles = Vec::new();
        for block_id in self.file.block_ids() {
            let page = self.file.get(block_id)?;
            for record_id in page.ids() {
                let record = match page.get(record_id) {
                    Some(record) => record,
                    None => continue,
                };
                let row = self.unmarshal(record)?;
                if predicate
                    .iter()
                    .all(|(column, value)| row.get(column) == Some(value))
                {
                    handles.push(Handle::new(block_id, record_id));
                }
            }
        }
        Ok(handles)
    }

    /// Return the full row for the handle.
    pub fn project(&mut self, handle: Handle) -> Result<Row> {
        self.open()?;
        let page = self.file.get(handle.block_id)?;
        let record = page.get(handle.record_id).ok_or_else(|| {
            Error::Relation(format!(
                "record {}:{} in table {} has been deleted",
                handle.block_id, handle.record_id, self.name
            ))
        })?;
        self.unmarshal(record)
    }

    /// Return only the requested columns of the handle's row.
    pub fn project_columns(&mut self, handle: Handle, column_names: &[String]) -> Result<Row> {
        let mut row = self.project(handle)?;
        let mut result = Row::new();
        for column_name in column_names {
            let value = row.remove(column_name).ok_or_else(|| {
                Error::Relation(format!(
                    "table {} has no column '{}'",
                    self.name, column_name
                ))
            })?;
            result.insert(column_name.clone(), value);
        }
        Ok(result)
    }

    /// Check that the row is acceptable to insert and return it with
    /// exactly the schema's columns. NULLs and defaults are unsupported,
    /// so a missing column is an error.
    fn validate(&self, row: &Row) -> Result<Row> {
        let mut full_row = Row::new();
        for column_name in &self.column_names {
            let value = row.get(column_name).ok_or_else(|| {
                Error::Relation(format!(
                    "missing value for column {}.{}",
                    self.name, column_name
                ))
            })?;
            full_row.insert(column_name.clone(), value.clone());
        }
        Ok(full_row)
    }

    /// Append a fully fleshed-out row to the file. Tries the last block
    /// first; on NoRoom a fresh block is allocated and the add retried.
    fn append(&mut self, row: &Row) -> Result<Handle> {
        let record = self.marshal(row)?;
        let mut page = self.file.get(self.file.last_block_id())?;
        let record_id = match page.add(&record) {
            Ok(record_id) => record_id,
            Err(Error::NoRoom(_)) => {
                tracing::debug!(table = %self.name, "block full, allocating a new one");
                page = self.file.get_new()?;
                page.add(&record)?
            }
            Err(e) => return Err(e),
        };
        let block_id = page.block_id();
        self.file.put(&page)?;
        Ok(Handle::new(block_id, record_id))
    }

    /// Marshal a row into record bytes, column by column in schema order:
    /// INT as little-endian i32, TEXT as u16 length plus raw bytes,
    /// BOOLEAN as little-endian i32 0/1.
    fn marshal(&self, row: &Row) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        for (column_name, attr) in self.column_names.iter().zip(&self.column_attributes) {
            let value = row.get(column_name).ok_or_else(|| {
                Error::Relation(format!(
                    "missing value for column {}.{}",
                    self.name, column_name
                ))
            })?;
            match (attr, value) {
                (DataType::Int, Value::Int(n)) => bytes.extend_from_slice(&n.to_le_bytes()),
                (DataType::Text, Value::Text(s)) => {
                    if s.len() > u16::MAX as usize {
                        return Err(Error::Relation(format!(
                            "value too long for column {}.{}",
                            self.name, column_name
                        )));
                    }
                    bytes.extend_from_slice(&(s.len() as u16).to_le_bytes());
                    bytes.extend_from_slice(s.as_bytes());
                }
                (DataType::Boolean, Value::Boolean(b)) => {
                    bytes.extend_from_slice(&(*b as i32).to_le_bytes())
                }
                (attr, value) => {
                    return Err(Error::Relation(format!(
                        "column {}.{} expects {}, got {}",
                        self.name, column_name, attr, value
                    )))
                }
            }
        }
        Ok(bytes)
    }

    /// Invert `marshal` using the schema.
    fn unmarshal(&self, record: &[u8]) -> Result<Row> {
        let mut row = Row::new();
        let mut offset = 0;
        for (column_name, attr) in self.column_names.iter().zip(&self.column_attributes) {
            let value = match attr {
                DataType::Int => {
                    let n = i32::from_le_bytes(
                        record
                            .get(offset..offset + 4)
                            .ok_or_else(|| self.short_record_error())?
                            .try_into()
                            .unwrap(),
                    );
                    offset += 4;
                    Value::Int(n)
                }
                DataType::Text => {
                    let len = u16::from_le_bytes(
                        record
                            .get(offset..offset + 2)
                            .ok_or_else(|| self.short_record_error())?
                            .try_into()
                            .unwrap(),
                    ) as usize;
                    offset += 2;
                    let raw = record
                        .get(offset..offset + len)
                        .ok_or_else(|| self.short_record_error())?;
                    offset += len;
                    Value::Text(String::from_utf8_lossy(raw).into_owned())
                }
                DataType::Boolean => {
                    let n = i32::from_le_bytes(
                        record
                            .get(offset..offset + 4)
                            .ok_or_else(|| self.short_record_error())?
                            .try_into()
                            .unwrap(),
                    );
                    offset += 4;
                    Value::Boolean(n != 0)
                }
            };
            row.insert(column_name.clone(), value);
        }
        Ok(row)
    }

    fn short_record_error(&self) -> Error {
        Error::Relation(format!(
            "record in table {} is shorter than its schema",
            self.name
        ))
    }
}
