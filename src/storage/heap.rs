//! Heap file storage for quarrydb
//!
//! A heap file is the unordered sequence of blocks backing one relation,
//! one slotted page per block. It owns the relation's BlockFile and hands
//! out pages; row-level logic lives in `HeapTable`.

use std::path::PathBuf;

use super::block::{BlockFile, BlockId, BLOCK_SIZE};
use super::page::SlottedPage;
use crate::error::Result;

/// Sequence of blocks backing one relation
#[derive(Debug)]
pub struct HeapFile {
    file: BlockFile,
}

impl HeapFile {
    /// Set up a heap file for `name` inside `dir`. Does not touch disk.
    pub fn new(dir: impl Into<PathBuf>, name: &str) -> Self {
        Self {
            file: BlockFile::new(dir, name),
        }
    }

    /// Create the physical file with its first (empty) block.
    pub fn create(&mut self) -> Result<()> {
        self.file.create()?;
        self.get_new()?;
        Ok(())
    }

    /// Open the file if it exists, otherwise create it.
    pub fn create_if_not_exists(&mut self) -> Result<()> {
        if self.file.exists() {
            self.open()
        } else {
            self.create()
        }
    }

    /// Delete the physical file.
    pub fn drop_file(&mut self) -> Result<()> {
        self.file.drop_file()
    }

    /// Open the physical file. No-op if already open.
    pub fn open(&mut self) -> Result<()> {
        self.file.open()
    }

    /// Close the physical file, syncing to disk. No-op if closed.
    pub fn close(&mut self) -> Result<()> {
        self.file.close()
    }

    /// Allocate, initialise and write out a new empty page; returns it.
    pub fn get_new(&mut self) -> Result<SlottedPage> {
        let block_id = self.file.allocate_new()?;
        let page = SlottedPage::new(vec![0u8; BLOCK_SIZE], block_id, true);
        self.file.put(block_id, page.data())?;
        Ok(page)
    }

    /// Read the page stored in the given block.
    pub fn get(&mut self, block_id: BlockId) -> Result<SlottedPage> {
        Ok(SlottedPage::new(self.file.get(block_id)?, block_id, false))
    }

    /// Write a page back to its block.
    pub fn put(&mut self, page: &SlottedPage) -> Result<()> {
        self.file.put(page.block_id(), page.data())
    }

    /// Sequence of all block ids, first to last.
    pub fn block_ids(&self) -> Vec<BlockId> {
        (1..=self.file.last_block_id()).collect()
    }

    /// Highest allocated block id.
    pub fn last_block_id(&self) -> BlockId {
        self.file.last_block_id()
    }
}
