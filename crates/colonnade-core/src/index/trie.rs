use crate::{
    column::Columns,
    error::InternalError,
    index::RowId,
    obs::{self, MetricsEvent},
    trie::{NodeId, Trie},
    value::Value,
};
use std::collections::HashMap;

///
/// TrieIndex
///
/// Multi-column index over the shared arena trie: one level per indexed
/// column, row ids at the terminal node. Supports unique and non-unique
/// key semantics; a full-key lookup walks the trie in O(#columns), and a
/// prefix lookup collects every row below a partial key path.
///
/// Removal prunes ancestors that become childless and row-less, so a fully
/// retracted key path disappears and the key becomes reusable.
///

#[derive(Debug)]
pub struct TrieIndex {
    name: String,
    columns: Vec<String>,
    unique: bool,
    trie: Trie<Vec<RowId>>,
    /// Terminal node of each indexed row; makes `remove` O(depth) without
    /// re-deriving the key from (possibly already changed) column data.
    row_nodes: HashMap<RowId, NodeId>,
}

impl TrieIndex {
    #[must_use]
    pub(crate) fn new(name: impl Into<String>, columns: Vec<String>, unique: bool) -> Self {
        Self {
            name: name.into(),
            columns,
            unique,
            trie: Trie::new(),
            row_nodes: HashMap::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub const fn is_unique(&self) -> bool {
        self.unique
    }

    /// Rows currently indexed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.row_nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.row_nodes.is_empty()
    }

    /// Retract the row's previous path (if any), then insert its current
    /// key. On a unique index an occupied terminal is a duplicate-key
    /// conflict; the freshly created path is pruned again so the failed
    /// insert leaves no dead nodes behind.
    pub(crate) fn update(&mut self, columns: &Columns, row: RowId) -> Result<(), InternalError> {
        let removes = u64::from(self.retract(row));

        let path = self.path_for(columns, row)?;
        let leaf = self.trie.insert_path(&path);

        let rows = self.trie.payload_mut(leaf);
        if self.unique && !rows.is_empty() {
            let occupant = rows[0];
            self.trie.prune_upward(leaf, Vec::is_empty);
            obs::record(MetricsEvent::UniqueViolation { index: &self.name });
            return Err(InternalError::index_conflict(
                &self.name,
                format!("key of row {row} already maps to row {occupant}"),
            ));
        }

        rows.push(row);
        self.row_nodes.insert(row, leaf);
        obs::record(MetricsEvent::IndexDelta {
            index: &self.name,
            inserts: 1,
            removes,
        });

        Ok(())
    }

    /// Remove the row and prune its key path; unknown rows are a no-op.
    pub(crate) fn remove(&mut self, row: RowId) {
        if self.retract(row) {
            obs::record(MetricsEvent::IndexDelta {
                index: &self.name,
                inserts: 0,
                removes: 1,
            });
        }
    }

    /// Full-key lookup: all rows stored under exactly this key.
    pub fn find(&self, keys: &[Value]) -> Result<Vec<RowId>, InternalError> {
        if keys.len() != self.columns.len() {
            return Err(InternalError::index_arity_mismatch(
                &self.name,
                self.columns.len(),
                keys.len(),
            ));
        }

        Ok(self
            .trie
            .find_path(keys)
            .map(|leaf| self.trie.payload(leaf).clone())
            .unwrap_or_default())
    }

    /// Prefix lookup: all rows below a partial key path.
    pub fn find_prefix(&self, keys: &[Value]) -> Result<Vec<RowId>, InternalError> {
        if keys.len() > self.columns.len() {
            return Err(InternalError::index_arity_mismatch(
                &self.name,
                self.columns.len(),
                keys.len(),
            ));
        }

        let mut rows = Vec::new();
        if let Some(node) = self.trie.find_path(keys) {
            self.trie
                .for_each_payload(node, |payload: &Vec<RowId>| rows.extend_from_slice(payload));
        }

        Ok(rows)
    }

    pub(crate) fn clear(&mut self) {
        self.trie.clear();
        self.row_nodes.clear();
    }

    /// Live trie nodes. Test support for pruning assertions.
    #[cfg(test)]
    pub(crate) fn node_count(&self) -> usize {
        self.trie.node_count()
    }

    fn retract(&mut self, row: RowId) -> bool {
        let Some(leaf) = self.row_nodes.remove(&row) else {
            return false;
        };

        let rows = self.trie.payload_mut(leaf);
        if let Some(pos) = rows.iter().position(|&r| r == row) {
            rows.swap_remove(pos);
        }
        self.trie.prune_upward(leaf, Vec::is_empty);

        true
    }

    fn path_for(&self, columns: &Columns, row: RowId) -> Result<Vec<Value>, InternalError> {
        let mut path = Vec::with_capacity(self.columns.len());
        for column in &self.columns {
            path.push(columns.value(column, row)?.clone());
        }

        Ok(path)
    }
}
