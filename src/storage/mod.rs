//! Storage engine for quarrydb
//!
//! This module contains the block file, slotted page, heap file, heap
//! table and B-tree index implementations.

pub mod block;
pub mod btree;
pub mod heap;
pub mod page;
pub mod table;
pub mod tuple;

pub use block::{BlockFile, BlockId, BLOCK_SIZE};
pub use btree::{BTreeIndex, IndexKey, KeyProfile};
pub use heap::HeapFile;
pub use page::{RecordId, SlottedPage};
pub use table::HeapTable;
pub use tuple::{Handle, Row, Value};
