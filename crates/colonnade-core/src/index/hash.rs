use crate::{
    column::Columns,
    error::InternalError,
    index::RowId,
    key::IndexKey,
    obs::{self, MetricsEvent},
    value::Value,
};
use std::collections::HashMap;

///
/// HashIndex
///
/// Unique hash index over one or more columns: forward `key → row` plus
/// reverse `row → key`, so an update can retract the row's stale key before
/// inserting the fresh one. A key colliding with a different row is a
/// duplicate-key conflict; after that failure the index must be considered
/// invalid until the offending row is removed or the index rebuilt.
///

#[derive(Debug)]
pub struct HashIndex {
    name: String,
    columns: Vec<String>,
    forward: HashMap<IndexKey, RowId>,
    reverse: HashMap<RowId, IndexKey>,
}

impl HashIndex {
    #[must_use]
    pub(crate) fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            forward: HashMap::new(),
            reverse: HashMap::new(),
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

    /// Distinct keys currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Retract the row's previous key (if any) and insert its current one.
    pub(crate) fn update(&mut self, columns: &Columns, row: RowId) -> Result<(), InternalError> {
        let key = self.key_for(columns, row)?;

        let mut removes = 0;
        if let Some(stale) = self.reverse.remove(&row) {
            self.forward.remove(&stale);
            removes = 1;
        }

        if let Some(&existing) = self.forward.get(&key) {
            obs::record(MetricsEvent::UniqueViolation { index: &self.name });
            return Err(InternalError::index_conflict(
                &self.name,
                format!("key {key} already maps to row {existing}"),
            ));
        }

        self.forward.insert(key.clone(), row);
        self.reverse.insert(row, key);
        obs::record(MetricsEvent::IndexDelta {
            index: &self.name,
            inserts: 1,
            removes,
        });

        Ok(())
    }

    /// Delete both directions of the row's mapping; a row the index never
    /// saw is a no-op.
    pub(crate) fn remove(&mut self, row: RowId) {
        if let Some(key) = self.reverse.remove(&row) {
            self.forward.remove(&key);
            obs::record(MetricsEvent::IndexDelta {
                index: &self.name,
                inserts: 0,
                removes: 1,
            });
        }
    }

    /// Point lookup; `None` when the key is absent.
    pub fn find(&self, keys: &[Value]) -> Result<Option<RowId>, InternalError> {
        if keys.len() != self.columns.len() {
            return Err(InternalError::index_arity_mismatch(
                &self.name,
                self.columns.len(),
                keys.len(),
            ));
        }

        Ok(self.forward.get(&IndexKey::from(keys)).copied())
    }

    pub(crate) fn clear(&mut self) {
        self.forward.clear();
        self.reverse.clear();
    }

    fn key_for(&self, columns: &Columns, row: RowId) -> Result<IndexKey, InternalError> {
        let mut values = Vec::with_capacity(self.columns.len());
        for column in &self.columns {
            values.push(columns.value(column, row)?.clone());
        }

        Ok(IndexKey::new(values))
    }
}
