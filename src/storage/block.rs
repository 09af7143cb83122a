//! Block file storage for quarrydb
//!
//! A block file is an ordered, 1-indexed sequence of fixed-size blocks in
//! one operating-system file. It is the persistence primitive everything
//! else (heap files, B-tree indexes) is built on.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Block size in bytes (4KB)
pub const BLOCK_SIZE: usize = 4096;

/// Block ID type: 1-based sequential integer within one file
pub type BlockId = u32;

/// A file of fixed-size blocks addressed by block id.
///
/// Open is idempotent and lazy; close syncs the file to disk. Block 1
/// lives at offset 0.
#[derive(Debug)]
pub struct BlockFile {
    /// File path (`<name>.db` inside the data directory)
    path: PathBuf,
    /// Open file handle, if any
    file: Option<File>,
    /// Highest allocated block id (0 when empty)
    last: BlockId,
}

impl BlockFile {
    /// Set up a block file for `name` inside `dir`. Does not touch disk.
    pub fn new(dir: impl Into<PathBuf>, name: &str) -> Self {
        let mut path = dir.into();
        path.push(format!("{}.db", name));
        Self {
            path,
            file: None,
            last: 0,
        }
    }

    /// Create the physical file. Fails if it already exists.
    pub fn create(&mut self) -> Result<()> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(&self.path)?;
        self.file = Some(file);
        self.last = 0;
        Ok(())
    }

    /// Open the physical file. No-op if already open.
    pub fn open(&mut self) -> Result<()> {
        if self.file.is_some() {
            return Ok(());
        }
        let file = OpenOptions::new().read(true).write(true).open(&self.path)?;
        let len = file.metadata()?.len();
        self.last = (len / BLOCK_SIZE as u64) as BlockId;
        self.file = Some(file);
        Ok(())
    }

    /// Close the file, syncing its contents to disk. No-op if closed.
    pub fn close(&mut self) -> Result<()> {
        if let Some(file) = self.file.take() {
            file.sync_all()?;
        }
        Ok(())
    }

    /// Delete the physical file.
    pub fn drop_file(&mut self) -> Result<()> {
        self.close()?;
        std::fs::remove_file(&self.path)?;
        self.last = 0;
        Ok(())
    }

    /// Whether the physical file exists on disk.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read the block with the given id.
    pub fn get(&mut self, block_id: BlockId) -> Result<Vec<u8>> {
        if block_id == 0 || block_id > self.last {
            return Err(Error::Relation(format!(
                "block {} is not allocated in '{}'",
                block_id,
                self.path.display()
            )));
        }
        let file = self.file_mut()?;
        file.seek(SeekFrom::Start(
            (block_id as u64 - 1) * BLOCK_SIZE as u64,
        ))?;
        let mut data = vec![0u8; BLOCK_SIZE];
        file.read_exact(&mut data)?;
        Ok(data)
    }

    /// Write the block with the given id.
    pub fn put(&mut self, block_id: BlockId, data: &[u8]) -> Result<()> {
        debug_assert_eq!(data.len(), BLOCK_SIZE);
        if block_id == 0 || block_id > self.last {
            return Err(Error::Relation(format!(
                "block {} is not allocated in '{}'",
                block_id,
                self.path.display()
            )));
        }
        let file = self.file_mut()?;
        file.seek(SeekFrom::Start(
            (block_id as u64 - 1) * BLOCK_SIZE as u64,
        ))?;
        file.write_all(data)?;
        Ok(())
    }

    /// Append a freshly zeroed block and return its id.
    pub fn allocate_new(&mut self) -> Result<BlockId> {
        let block_id = self.last + 1;
        let file = self.file_mut()?;
        file.seek(SeekFrom::Start(
            (block_id as u64 - 1) * BLOCK_SIZE as u64,
        ))?;
        file.write_all(&[0u8; BLOCK_SIZE])?;
        self.last = block_id;
        Ok(block_id)
    }

    /// Highest allocated block id (0 when the file is empty).
    pub fn last_block_id(&self) -> BlockId {
        self.last
    }

    fn file_mut(&mut self) -> Result<&mut File> {
        match self.file.as_mut() {
            Some(file) => Ok(file),
            None => Err(Error::Relation(format!(
                "block file '{}' is not open",
                self.path.display()
            ))),
        }
    }
}
