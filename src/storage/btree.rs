//! B-tree index for quarrydb
//!
//! A unique B-tree over a projected key, stored in its own block file
//! (`<table>-<index>.db`). Block 1 holds the tree's stat record (root
//! block id and height); the initial root leaf is block 2. Each node
//! occupies one block, serialised with the index's key profile, so key
//! encoding needs no per-entry type tags.

use std::cmp::Ordering;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use super::block::{BlockFile, BlockId, BLOCK_SIZE};
use super::page::RecordId;
use super::table::HeapTable;
use super::tuple::{Handle, Row, Value};
use crate::catalog::DataType;
use crate::error::{Error, Result};

/// Block reserved for the stat record
const STAT_BLOCK: BlockId = 1;

/// Ordered type descriptor of an index key, one entry per key column
pub type KeyProfile = Vec<DataType>;

/// An index key: the values of the indexed columns in sequence order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexKey(pub Vec<Value>);

impl IndexKey {
    /// Compare two keys column by column. Keys built from the same
    /// profile always have comparable values in every position.
    pub fn compare(&self, other: &IndexKey) -> Ordering {
        for (a, b) in self.0.iter().zip(other.0.iter()) {
            match a.compare(b) {
                Some(Ordering::Equal) => continue,
                Some(ord) => return ord,
                None => return Ordering::Equal,
            }
        }
        self.0.len().cmp(&other.0.len())
    }
}

impl PartialOrd for IndexKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.compare(other))
    }
}

impl Ord for IndexKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

/// Root id and height, persisted in the stat block
#[derive(Debug, Clone, Copy)]
struct BTreeStat {
    root_id: BlockId,
    height: u32,
}

/// A node, tagged by kind; the kind is carried as data in the block.
#[derive(Debug)]
enum BTreeNode {
    Leaf(LeafNode),
    Interior(InteriorNode),
}

/// Leaf: sorted (key, handle) entries
#[derive(Debug)]
struct LeafNode {
    id: BlockId,
    entries: Vec<(IndexKey, Handle)>,
}

/// Interior: a first child plus sorted (boundary key, child) entries.
/// A key belongs in the rightmost child whose boundary is <= the key.
#[derive(Debug)]
struct InteriorNode {
    id: BlockId,
    first: BlockId,
    entries: Vec<(IndexKey, BlockId)>,
}

impl InteriorNode {
    fn find(&self, key: &IndexKey) -> BlockId {
        let mut child = self.first;
        for (boundary, block_id) in &self.entries {
            if key >= boundary {
                child = *block_id;
            } else {
                break;
            }
        }
        child
    }
}

const NODE_TAG_LEAF: u8 = 1;
const NODE_TAG_INTERIOR: u8 = 2;

/// Tag byte plus entry count
const LEAF_HEADER_SIZE: usize = 3;
/// Tag byte, entry count, first-child id
const INTERIOR_HEADER_SIZE: usize = 7;

/// Upper bound on an encoded key, so every node can hold several entries
/// and a split always produces nodes that fit in a block.
const MAX_KEY_SIZE: usize = 1024;

/// Unique B-tree index over one relation
#[derive(Debug)]
pub struct BTreeIndex {
    relation: Arc<Mutex<HeapTable>>,
    name: String,
    key_columns: Vec<String>,
    key_profile: KeyProfile,
    file: BlockFile,
    /// Present while the index is open
    stat: Option<BTreeStat>,
}

impl BTreeIndex {
    /// Set up an index named `name` over `key_columns` of `relation`.
    /// Only unique B-trees exist; a non-unique request is rejected.
    pub fn new(
        dir: impl Into<PathBuf>,
        relation: Arc<Mutex<HeapTable>>,
        name: &str,
        key_columns: Vec<String>,
        unique: bool,
    ) -> Result<Self> {
        if !unique {
            return Err(Error::Relation(
                "btree index must have a unique key".to_string(),
            ));
        }
        let (file_name, key_profile) = {
            let table = relation.lock().unwrap();
            let mut profile = KeyProfile::new();
            for column_name in &key_columns {
                profile.push(table.column_attribute(column_name)?);
            }
            (format!("{}-{}", table.name(), name), profile)
        };
        Ok(Self {
            relation,
            name: name.to_string(),
            key_columns,
            key_profile,
            file: BlockFile::new(dir, &file_name),
            stat: None,
        })
    }

    /// Index name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Key column names in sequence order
    pub fn key_columns(&self) -> &[String] {
        &self.key_columns
    }

    /// The relation this index is defined over
    pub fn relation(&self) -> &Arc<Mutex<HeapTable>> {
        &self.relation
    }

    /// Materialise the on-disk tree, then insert every handle already in
    /// the relation.
    pub fn create(&mut self) -> Result<()> {
        self.file.create()?;
        let stat_block = self.file.allocate_new()?;
        debug_assert_eq!(stat_block, STAT_BLOCK);
        let root_id = self.file.allocate_new()?;
        self.save(&BTreeNode::Leaf(LeafNode {
            id: root_id,
            entries: Vec::new(),
        }))?;
        self.save_stat(BTreeStat { root_id, height: 1 })?;

        let handles = self.relation.lock().unwrap().select()?;
        for handle in handles {
            self.insert(handle)?;
        }
        Ok(())
    }

    /// Destroy the on-disk tree.
    pub fn drop_index(&mut self) -> Result<()> {
        self.stat = None;
        self.file.drop_file()
    }

    /// Open the index. No-op if already open.
    pub fn open(&mut self) -> Result<()> {
        self.ensure_open()?;
        Ok(())
    }

    /// Open if needed and return the current stat record.
    fn ensure_open(&mut self) -> Result<BTreeStat> {
        if let Some(stat) = self.stat {
            return Ok(stat);
        }
        self.file.open()?;
        let stat = self.load_stat()?;
        self.stat = Some(stat);
        Ok(stat)
    }

    /// Close the index, syncing to disk. No-op if closed.
    pub fn close(&mut self) -> Result<()> {
        self.stat = None;
        self.file.close()
    }

    /// Find the handles of rows whose key columns equal `key_dict`.
    /// Returns an empty list when the key is absent.
    pub fn lookup(&mut self, key_dict: &Row) -> Result<Vec<Handle>> {
        let stat = self.ensure_open()?;
        let key = self.tkey(key_dict)?;
        let mut block_id = stat.root_id;
        loop {
            match self.load(block_id)? {
                BTreeNode::Leaf(leaf) => {
                    return Ok(
                        match leaf.entries.binary_search_by(|(k, _)| k.cmp(&key)) {
                            Ok(pos) => vec![leaf.entries[pos].1],
                            Err(_) => Vec::new(),
                        },
                    );
                }
                BTreeNode::Interior(interior) => block_id = interior.find(&key),
            }
        }
    }

    /// Insert the handle of a row that already exists in the relation.
    /// Splits propagate upward; if the root splits, a new root is
    /// allocated and the stat record updated before the old root id is
    /// released.
    pub fn insert(&mut self, handle: Handle) -> Result<()> {
        let stat = self.ensure_open()?;
        let row = self.relation.lock().unwrap().project(handle)?;
        let key = self.tkey(&row)?;
        if self.key_size(&key) > MAX_KEY_SIZE {
            return Err(Error::Relation(format!(
                "key too large for index '{}'",
                self.name
            )));
        }
        if let Some((boundary, new_child)) = self.insert_at(stat.root_id, stat.height, key, handle)?
        {
            let new_root_id = self.file.allocate_new()?;
            self.save(&BTreeNode::Interior(InteriorNode {
                id: new_root_id,
                first: stat.root_id,
                entries: vec![(boundary, new_child)],
            }))?;
            self.save_stat(BTreeStat {
                root_id: new_root_id,
                height: stat.height + 1,
            })?;
        }
        Ok(())
    }

    /// Remove the entry for a row that still exists in the relation.
    /// Leaf-level removal only; nodes are never merged or rebalanced.
    pub fn del(&mut self, handle: Handle) -> Result<()> {
        let stat = self.ensure_open()?;
        let row = self.relation.lock().unwrap().project(handle)?;
        let key = self.tkey(&row)?;
        let mut block_id = stat.root_id;
        loop {
            match self.load(block_id)? {
                BTreeNode::Leaf(mut leaf) => {
                    if let Ok(pos) = leaf.entries.binary_search_by(|(k, _)| k.cmp(&key)) {
                        leaf.entries.remove(pos);
                        self.save(&BTreeNode::Leaf(leaf))?;
                    }
                    return Ok(());
                }
                BTreeNode::Interior(interior) => block_id = interior.find(&key),
            }
        }
    }

    /// Range queries are not supported on this index.
    pub fn range(&mut self, _min_key: &Row, _max_key: &Row) -> Result<Vec<Handle>> {
        Err(Error::Relation(
            "don't know how to do a range query on a btree index yet".to_string(),
        ))
    }

    /// Recursive insert. Returns the (boundary key, new block) pair when
    /// a split at this level must be inserted into the parent.
    fn insert_at(
        &mut self,
        block_id: BlockId,
        height: u32,
        key: IndexKey,
        handle: Handle,
    ) -> Result<Option<(IndexKey, BlockId)>> {
        if height == 1 {
            let mut leaf = match self.load(block_id)? {
                BTreeNode::Leaf(leaf) => leaf,
                BTreeNode::Interior(_) => {
                    return Err(Error::Relation(format!(
                        "index '{}' is corrupt: interior node at leaf height",
                        self.name
                    )))
                }
            };
            match leaf.entries.binary_search_by(|(k, _)| k.cmp(&key)) {
                Ok(_) => {
                    return Err(Error::Relation(format!(
                        "duplicate key in unique index '{}'",
                        self.name
                    )))
                }
                Err(pos) => leaf.entries.insert(pos, (key, handle)),
            }
            if LEAF_HEADER_SIZE + self.leaf_entries_size(&leaf.entries) > BLOCK_SIZE {
                let mid = leaf.entries.len() / 2;
                let right_entries = leaf.entries.split_off(mid);
                let right_id = self.file.allocate_new()?;
                let boundary = right_entries[0].0.clone();
                self.save(&BTreeNode::Leaf(leaf))?;
                self.save(&BTreeNode::Leaf(LeafNode {
                    id: right_id,
                    entries: right_entries,
                }))?;
                Ok(Some((boundary, right_id)))
            } else {
                self.save(&BTreeNode::Leaf(leaf))?;
                Ok(None)
            }
        } else {
            let mut interior = match self.load(block_id)? {
                BTreeNode::Interior(interior) => interior,
                BTreeNode::Leaf(_) => {
                    return Err(Error::Relation(format!(
                        "index '{}' is corrupt: leaf node at interior height",
                        self.name
                    )))
                }
            };
            let child = interior.find(&key);
            let insertion = self.insert_at(child, height - 1, key, handle)?;
            let (boundary, new_child) = match insertion {
                Some(split) => split,
                None => return Ok(None),
            };
            let pos = interior
                .entries
                .binary_search_by(|(k, _)| k.cmp(&boundary))
                .unwrap_or_else(|pos| pos);
            interior.entries.insert(pos, (boundary, new_child));
            if INTERIOR_HEADER_SIZE + self.interior_entries_size(&interior.entries) > BLOCK_SIZE {
                let mid = interior.entries.len() / 2;
                let (up_key, up_child) = interior.entries[mid].clone();
                let right_entries = interior.entries.split_off(mid + 1);
                interior.entries.pop();
                let right_id = self.file.allocate_new()?;
                self.save(&BTreeNode::Interior(interior))?;
                self.save(&BTreeNode::Interior(InteriorNode {
                    id: right_id,
                    first: up_child,
                    entries: right_entries,
                }))?;
                Ok(Some((up_key, right_id)))
            } else {
                self.save(&BTreeNode::Interior(interior))?;
                Ok(None)
            }
        }
    }

    /// Project the key columns out of a row, in sequence order.
    fn tkey(&self, row: &Row) -> Result<IndexKey> {
        let mut values = Vec::with_capacity(self.key_columns.len());
        for column_name in &self.key_columns {
            let value = row.get(column_name).ok_or_else(|| {
                Error::Relation(format!(
                    "index '{}' key column '{}' is missing from the row",
                    self.name, column_name
                ))
            })?;
            values.push(value.clone());
        }
        Ok(IndexKey(values))
    }

    // ---- node and stat serialisation ----

    fn load(&mut self, block_id: BlockId) -> Result<BTreeNode> {
        let data = self.file.get(block_id)?;
        self.decode(block_id, &data)
    }

    fn save(&mut self, node: &BTreeNode) -> Result<()> {
        let mut data = self.encode(node);
        debug_assert!(data.len() <= BLOCK_SIZE);
        data.resize(BLOCK_SIZE, 0);
        let block_id = match node {
            BTreeNode::Leaf(leaf) => leaf.id,
            BTreeNode::Interior(interior) => interior.id,
        };
        self.file.put(block_id, &data)
    }

    fn load_stat(&mut self) -> Result<BTreeStat> {
        let data = self.file.get(STAT_BLOCK)?;
        Ok(BTreeStat {
            root_id: u32::from_le_bytes(data[0..4].try_into().unwrap()),
            height: u32::from_le_bytes(data[4..8].try_into().unwrap()),
        })
    }

    fn save_stat(&mut self, stat: BTreeStat) -> Result<()> {
        let mut data = vec![0u8; BLOCK_SIZE];
        data[0..4].copy_from_slice(&stat.root_id.to_le_bytes());
        data[4..8].copy_from_slice(&stat.height.to_le_bytes());
        self.file.put(STAT_BLOCK, &data)?;
        self.stat = Some(stat);
        Ok(())
    }

    fn encode(&self, node: &BTreeNode) -> Vec<u8> {
        let mut bytes = Vec::new();
        match node {
            BTreeNode::Leaf(leaf) => {
                bytes.push(NODE_TAG_LEAF);
                bytes.extend_from_slice(&(leaf.entries.len() as u16).to_le_bytes());
                for (key, handle) in &leaf.entries {
                    self.encode_key(&mut bytes, key);
                    bytes.extend_from_slice(&handle.block_id.to_le_bytes());
                    bytes.extend_from_slice(&handle.record_id.to_le_bytes());
                }
            }
            BTreeNode::Interior(interior) => {
                bytes.push(NODE_TAG_INTERIOR);
                bytes.extend_from_slice(&(interior.entries.len() as u16).to_le_bytes());
                bytes.extend_from_slice(&interior.first.to_le_bytes());
                for (key, child) in &interior.entries {
                    self.encode_key(&mut bytes, key);
                    bytes.extend_from_slice(&child.to_le_bytes());
                }
            }
        }
        bytes
    }

    fn decode(&self, block_id: BlockId, data: &[u8]) -> Result<BTreeNode> {
        let corrupt =
            || Error::Relation(format!("index '{}' has a corrupt node block", self.name));
        let tag = *data.first().ok_or_else(corrupt)?;
        let count = u16::from_le_bytes(data.get(1..3).ok_or_else(corrupt)?.try_into().unwrap());
        let mut offset = 3;
        match tag {
            NODE_TAG_LEAF => {
                let mut entries = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    let key = self.decode_key(data, &mut offset)?;
                    let block = u32::from_le_bytes(
                        data.get(offset..offset + 4)
                            .ok_or_else(corrupt)?
                            .try_into()
                            .unwrap(),
                    );
                    offset += 4;
                    let record = RecordId::from_le_bytes(
                        data.get(offset..offset + 2)
                            .ok_or_else(corrupt)?
                            .try_into()
                            .unwrap(),
                    );
                    offset += 2;
                    entries.push((key, Handle::new(block, record)));
                }
                Ok(BTreeNode::Leaf(LeafNode {
                    id: block_id,
                    entries,
                }))
            }
            NODE_TAG_INTERIOR => {
                let first = u32::from_le_bytes(
                    data.get(offset..offset + 4)
                        .ok_or_else(corrupt)?
                        .try_into()
                        .unwrap(),
                );
                offset += 4;
                let mut entries = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    let key = self.decode_key(data, &mut offset)?;
                    let child = u32::from_le_bytes(
                        data.get(offset..offset + 4)
                            .ok_or_else(corrupt)?
                            .try_into()
                            .unwrap(),
                    );
                    offset += 4;
                    entries.push((key, child));
                }
                Ok(BTreeNode::Interior(InteriorNode {
                    id: block_id,
                    first,
                    entries,
                }))
            }
            _ => Err(corrupt()),
        }
    }

    fn encode_key(&self, bytes: &mut Vec<u8>, key: &IndexKey) {
        for value in &key.0 {
            match value {
                Value::Int(n) => bytes.extend_from_slice(&n.to_le_bytes()),
                Value::Boolean(b) => bytes.extend_from_slice(&(*b as i32).to_le_bytes()),
                Value::Text(s) => {
                    bytes.extend_from_slice(&(s.len() as u16).to_le_bytes());
                    bytes.extend_from_slice(s.as_bytes());
                }
            }
        }
    }

    fn decode_key(&self, data: &[u8], offset: &mut usize) -> Result<IndexKey> {
        let corrupt =
            || Error::Relation(format!("index '{}' has a corrupt node block", self.name));
        let mut values = Vec::with_capacity(self.key_profile.len());
        for attr in &self.key_profile {
            match attr {
                DataType::Int => {
                    let n = i32::from_le_bytes(
                        data.get(*offset..*offset + 4)
                            .ok_or_else(corrupt)?
                            .try_into()
                            .unwrap(),
                    );
                    *offset += 4;
                    values.push(Value::Int(n));
                }
                DataType::Boolean => {
                    let n = i32::from_le_bytes(
                        data.get(*offset..*offset + 4)
                            .ok_or_else(corrupt)?
                            .try_into()
                            .unwrap(),
                    );
                    *offset += 4;
                    values.push(Value::Boolean(n != 0));
                }
                DataType::Text => {
                    let len = u16::from_le_bytes(
                        data.get(*offset..*offset + 2)
                            .ok_or_else(corrupt)?
                            .try_into()
                            .unwrap(),
                    ) as usize;
                    *offset += 2;
                    let raw = data.get(*offset..*offset + len).ok_or_else(corrupt)?;
                    *offset += len;
                    values.push(Value::Text(String::from_utf8_lossy(raw).into_owned()));
                }
            }
        }
        Ok(IndexKey(values))
    }

    fn key_size(&self, key: &IndexKey) -> usize {
        key.0
            .iter()
            .map(|value| match value {
                Value::Int(_) | Value::Boolean(_) => 4,
                Value::Text(s) => 2 + s.len(),
            })
            .sum()
    }

    fn leaf_entries_size(&self, entries: &[(IndexKey, Handle)]) -> usize {
        entries
            .iter()
            .map(|(key, _)| self.key_size(key) + 6)
            .sum()
    }

    fn interior_entries_size(&self, entries: &[(IndexKey, BlockId)]) -> usize {
        entries
            .iter()
            .map(|(key, _)| self.key_size(key) + 4)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn int_row(a: i32, b: i32) -> Row {
        let mut row = Row::new();
        row.insert("a".to_string(), Value::Int(a));
        row.insert("b".to_string(), Value::Int(b));
        row
    }

    fn int_key(a: i32) -> Row {
        let mut key = Row::new();
        key.insert("a".to_string(), Value::Int(a));
        key
    }

    fn int_table(dir: &TempDir) -> Arc<Mutex<HeapTable>> {
        let mut table = HeapTable::new(
            dir.path(),
            "pairs",
            vec!["a".to_string(), "b".to_string()],
            vec![DataType::Int, DataType::Int],
        );
        table.create().unwrap();
        Arc::new(Mutex::new(table))
    }

    #[test]
    fn test_non_unique_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let table = int_table(&dir);
        let result = BTreeIndex::new(dir.path(), table, "ix", vec!["a".to_string()], false);
        assert!(matches!(result, Err(Error::Relation(_))));
    }

    #[test]
    fn test_create_populates_from_relation() {
        let dir = tempfile::tempdir().unwrap();
        let table = int_table(&dir);

        let h1 = table.lock().unwrap().insert(&int_row(12, 99)).unwrap();
        let h2 = table.lock().unwrap().insert(&int_row(88, 101)).unwrap();
        for i in 0..100 {
            table
                .lock()
                .unwrap()
                .insert(&int_row(i + 100, -i))
                .unwrap();
        }

        let mut index =
            BTreeIndex::new(dir.path(), table.clone(), "ix", vec!["a".to_string()], true).unwrap();
        index.create().unwrap();

        assert_eq!(index.lookup(&int_key(12)).unwrap(), vec![h1]);
        assert_eq!(index.lookup(&int_key(88)).unwrap(), vec![h2]);
        assert!(index.lookup(&int_key(6)).unwrap().is_empty());

        for i in 0..100 {
            let handles = index.lookup(&int_key(i + 100)).unwrap();
            assert_eq!(handles.len(), 1);
            let row = table.lock().unwrap().project(handles[0]).unwrap();
            assert_eq!(row.get("b"), Some(&Value::Int(-i)));
        }
    }

    #[test]
    fn test_insert_on_row_insert() {
        let dir = tempfile::tempdir().unwrap();
        let table = int_table(&dir);
        let mut index =
            BTreeIndex::new(dir.path(), table.clone(), "ix", vec!["a".to_string()], true).unwrap();
        index.create().unwrap();

        let handle = table.lock().unwrap().insert(&int_row(7, 70)).unwrap();
        index.insert(handle).unwrap();
        assert_eq!(index.lookup(&int_key(7)).unwrap(), vec![handle]);
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let table = int_table(&dir);
        let mut index =
            BTreeIndex::new(dir.path(), table.clone(), "ix", vec!["a".to_string()], true).unwrap();
        index.create().unwrap();

        let h1 = table.lock().unwrap().insert(&int_row(5, 1)).unwrap();
        let h2 = table.lock().unwrap().insert(&int_row(5, 2)).unwrap();
        index.insert(h1).unwrap();
        assert!(matches!(index.insert(h2), Err(Error::Relation(_))));
    }

    #[test]
    fn test_splits_grow_the_tree() {
        let dir = tempfile::tempdir().unwrap();
        let mut table = HeapTable::new(
            dir.path(),
            "codes",
            vec!["id".to_string(), "code".to_string()],
            vec![DataType::Int, DataType::Text],
        );
        table.create().unwrap();
        let table = Arc::new(Mutex::new(table));

        let mut index = BTreeIndex::new(
            dir.path(),
            table.clone(),
            "by_code",
            vec!["code".to_string()],
            true,
        )
        .unwrap();
        index.create().unwrap();

        // Long text keys keep node fan-out small so a few hundred rows
        // split leaves and then the root more than once.
        let mut handles = Vec::new();
        for i in 0..500 {
            let mut row = Row::new();
            row.insert("id".to_string(), Value::Int(i));
            row.insert(
                "code".to_string(),
                Value::Text(format!("{:0>200}", i)),
            );
            let handle = table.lock().unwrap().insert(&row).unwrap();
            index.insert(handle).unwrap();
            handles.push(handle);
        }
        assert!(index.stat.unwrap().height >= 3);

        for (i, handle) in handles.iter().enumerate() {
            let mut key = Row::new();
            key.insert(
                "code".to_string(),
                Value::Text(format!("{:0>200}", i)),
            );
            assert_eq!(index.lookup(&key).unwrap(), vec![*handle]);
        }
    }

    #[test]
    fn test_del_removes_entry() {
        let dir = tempfile::tempdir().unwrap();
        let table = int_table(&dir);
        let mut index =
            BTreeIndex::new(dir.path(), table.clone(), "ix", vec!["a".to_string()], true).unwrap();
        index.create().unwrap();

        let h1 = table.lock().unwrap().insert(&int_row(1, 10)).unwrap();
        let h2 = table.lock().unwrap().insert(&int_row(2, 20)).unwrap();
        index.insert(h1).unwrap();
        index.insert(h2).unwrap();

        index.del(h1).unwrap();
        assert!(index.lookup(&int_key(1)).unwrap().is_empty());
        assert_eq!(index.lookup(&int_key(2)).unwrap(), vec![h2]);
    }

    #[test]
    fn test_range_not_supported() {
        let dir = tempfile::tempdir().unwrap();
        let table = int_table(&dir);
        let mut index =
            BTreeIndex::new(dir.path(), table.clone(), "ix", vec!["a".to_string()], true).unwrap();
        index.create().unwrap();
        assert!(index.range(&int_key(1), &int_key(2)).is_err());
    }

    #[test]
    fn test_reopen_preserves_tree() {
        let dir = tempfile::tempdir().unwrap();
        let table = int_table(&dir);
        let mut index =
            BTreeIndex::new(dir.path(), table.clone(), "ix", vec!["a".to_string()], true).unwrap();
        index.create().unwrap();
        let handle = table.lock().unwrap().insert(&int_row(42, 0)).unwrap();
        index.insert(handle).unwrap();
        index.close().unwrap();

        let mut index =
            BTreeIndex::new(dir.path(), table.clone(), "ix", vec!["a".to_string()], true).unwrap();
        assert_eq!(index.lookup(&int_key(42)).unwrap(), vec![handle]);
    }
}
