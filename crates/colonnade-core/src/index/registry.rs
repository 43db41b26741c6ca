use crate::{
    MAX_INDEX_COLUMNS,
    column::Columns,
    error::InternalError,
    index::{RowId, hash::HashIndex, interval::IntervalIndex, trie::TrieIndex},
    obs::{self, MetricsEvent},
    value::Value,
};
use std::{
    collections::{BTreeMap, hash_map::DefaultHasher},
    hash::{Hash, Hasher},
};

///
/// TableIndex
///
/// Closed set of index implementations a registry can own. Maintenance
/// operations dispatch uniformly; lookups are kind-specific and reject a
/// mismatched query shape.
///

#[remain::sorted]
#[derive(Debug)]
pub enum TableIndex {
    Hash(HashIndex),
    Interval(IntervalIndex),
    Trie(TrieIndex),
}

impl TableIndex {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Hash(index) => index.name(),
            Self::Interval(index) => index.name(),
            Self::Trie(index) => index.name(),
        }
    }

    /// Columns participating in this index, in key order.
    #[must_use]
    pub fn columns(&self) -> Vec<&str> {
        match self {
            Self::Hash(index) => index.columns().iter().map(String::as_str).collect(),
            Self::Interval(index) => vec![index.start_column(), index.end_column()],
            Self::Trie(index) => index.columns().iter().map(String::as_str).collect(),
        }
    }

    fn update(&mut self, columns: &Columns, row: RowId) -> Result<(), InternalError> {
        match self {
            Self::Hash(index) => index.update(columns, row),
            Self::Interval(index) => index.update(columns, row),
            Self::Trie(index) => index.update(columns, row),
        }
    }

    fn remove(&mut self, row: RowId) {
        match self {
            Self::Hash(index) => index.remove(row),
            Self::Interval(index) => index.remove(row),
            Self::Trie(index) => index.remove(row),
        }
    }

    fn clear(&mut self) {
        match self {
            Self::Hash(index) => index.clear(),
            Self::Interval(index) => index.clear(),
            Self::Trie(index) => index.clear(),
        }
    }
}

///
/// IndexRegistry
///
/// Owns every index of a table: `name → index` plus a `column → [index]`
/// routing map, so touching one column only reaches the indices that
/// actually reference it. The registry mutates index state only; it never
/// mutates table data.
///

#[derive(Debug, Default)]
pub struct IndexRegistry {
    indices: BTreeMap<String, TableIndex>,
    routing: BTreeMap<String, Vec<String>>,
}

impl IndexRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an index over `columns` and back-fill it from every current
    /// row. Unique semantics pick the hash index, duplicate-friendly
    /// semantics the trie.
    pub fn add_index(
        &mut self,
        data: &Columns,
        name: &str,
        columns: &[&str],
        unique: bool,
    ) -> Result<(), InternalError> {
        if unique {
            let columns = self.validate_new_index(data, name, columns)?;
            let index = TableIndex::Hash(HashIndex::new(name, columns));
            self.backfill_and_register(data, index)
        } else {
            self.add_trie_index(data, name, columns, false)
        }
    }

    /// Create a trie index explicitly (prefix lookups, or unique semantics
    /// combined with trie storage).
    pub fn add_trie_index(
        &mut self,
        data: &Columns,
        name: &str,
        columns: &[&str],
        unique: bool,
    ) -> Result<(), InternalError> {
        let columns = self.validate_new_index(data, name, columns)?;
        let index = TableIndex::Trie(TrieIndex::new(name, columns, unique));

        self.backfill_and_register(data, index)
    }

    /// Create an interval index over a numeric `(start, end)` column pair.
    pub fn add_interval_index(
        &mut self,
        data: &Columns,
        name: &str,
        start_column: &str,
        end_column: &str,
    ) -> Result<(), InternalError> {
        self.validate_new_index(data, name, &[start_column, end_column])?;
        for column in [start_column, end_column] {
            let kind = data
                .get(column)
                .ok_or_else(|| InternalError::column_not_found(column))?
                .kind();
            if !kind.is_numeric() {
                return Err(InternalError::index_unsupported(format!(
                    "interval index '{name}' requires numeric columns; '{column}' is {kind}"
                )));
            }
        }

        let index = TableIndex::Interval(IntervalIndex::new(
            name,
            start_column,
            end_column,
            seed_for(name),
        ));

        self.backfill_and_register(data, index)
    }

    /// Detach an index from the registry and the column routing.
    pub fn remove_index(&mut self, name: &str) -> Result<(), InternalError> {
        let index = self
            .indices
            .remove(name)
            .ok_or_else(|| InternalError::index_not_found(name))?;

        for column in index.columns() {
            if let Some(routed) = self.routing.get_mut(column) {
                routed.retain(|n| n != name);
                if routed.is_empty() {
                    self.routing.remove(column);
                }
            }
        }

        Ok(())
    }

    #[must_use]
    pub fn contains_index(&self, name: &str) -> bool {
        self.indices.contains_key(name)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&TableIndex> {
        self.indices.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.indices.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Broadcast one row's current state to every index.
    pub fn update(&mut self, data: &Columns, row: RowId) -> Result<(), InternalError> {
        for index in self.indices.values_mut() {
            index.update(data, row)?;
        }

        Ok(())
    }

    /// Narrow broadcast: only indices routed through `column`.
    pub fn update_value(
        &mut self,
        data: &Columns,
        column: &str,
        row: RowId,
    ) -> Result<(), InternalError> {
        for name in self.routed_indices(column) {
            if let Some(index) = self.indices.get_mut(&name) {
                index.update(data, row)?;
            }
        }

        Ok(())
    }

    /// Full rebuild of every index routed through `column`; used when a
    /// whole column is replaced.
    pub fn update_column(&mut self, data: &Columns, column: &str) -> Result<(), InternalError> {
        let rows = data.row_count();
        for name in self.routed_indices(column) {
            if let Some(index) = self.indices.get_mut(&name) {
                index.clear();
                for row in 0..rows {
                    index.update(data, row)?;
                }
                obs::record(MetricsEvent::RowsScanned { rows: rows as u64 });
            }
        }

        Ok(())
    }

    /// Retract one row from every index.
    pub fn remove(&mut self, row: RowId) {
        for index in self.indices.values_mut() {
            index.remove(row);
        }
    }

    /// Empty every index without dropping the index definitions.
    pub fn clear_values(&mut self) {
        for index in self.indices.values_mut() {
            index.clear();
        }
    }

    /// Re-create equivalent indices against replacement columns, skipping
    /// any index whose columns are not all present (or, for interval
    /// indices, not numeric) in the target.
    pub fn copy_to(&self, target: &Columns) -> Result<Self, InternalError> {
        let mut copy = Self::new();

        for (name, index) in &self.indices {
            match index {
                TableIndex::Hash(hash) => {
                    let columns: Vec<&str> = hash.columns().iter().map(String::as_str).collect();
                    if columns.iter().all(|c| target.contains(c)) {
                        copy.add_index(target, name, &columns, true)?;
                    }
                }
                TableIndex::Trie(trie) => {
                    let columns: Vec<&str> = trie.columns().iter().map(String::as_str).collect();
                    if columns.iter().all(|c| target.contains(c)) {
                        copy.add_trie_index(target, name, &columns, trie.is_unique())?;
                    }
                }
                TableIndex::Interval(interval) => {
                    let numeric = [interval.start_column(), interval.end_column()]
                        .iter()
                        .all(|c| target.get(c).is_some_and(|col| col.kind().is_numeric()));
                    if numeric {
                        copy.add_interval_index(
                            target,
                            name,
                            interval.start_column(),
                            interval.end_column(),
                        )?;
                    }
                }
            }
        }

        Ok(copy)
    }

    // ── Lookups ────────────────────────────────────────────────

    /// Unique point lookup. Valid on hash indices and unique tries.
    pub fn find(&self, name: &str, keys: &[Value]) -> Result<Option<RowId>, InternalError> {
        match self.require(name)? {
            TableIndex::Hash(index) => index.find(keys),
            TableIndex::Trie(index) if index.is_unique() => {
                Ok(index.find(keys)?.first().copied())
            }
            TableIndex::Trie(_) => Err(InternalError::index_unsupported(format!(
                "index '{name}' is not unique; use find_all"
            ))),
            TableIndex::Interval(_) => Err(InternalError::index_unsupported(format!(
                "index '{name}' is an interval index; use stab or search_all"
            ))),
        }
    }

    /// All rows under a full key.
    pub fn find_all(&self, name: &str, keys: &[Value]) -> Result<Vec<RowId>, InternalError> {
        match self.require(name)? {
            TableIndex::Hash(index) => Ok(index.find(keys)?.into_iter().collect()),
            TableIndex::Trie(index) => index.find(keys),
            TableIndex::Interval(_) => Err(InternalError::index_unsupported(format!(
                "index '{name}' is an interval index; use stab or search_all"
            ))),
        }
    }

    /// All rows under a partial key path; trie indices only.
    pub fn find_prefix(&self, name: &str, keys: &[Value]) -> Result<Vec<RowId>, InternalError> {
        match self.require(name)? {
            TableIndex::Trie(index) => index.find_prefix(keys),
            _ => Err(InternalError::index_unsupported(format!(
                "index '{name}' does not support prefix lookups"
            ))),
        }
    }

    /// Point-stab query; interval indices only.
    pub fn stab(&self, name: &str, probe: &Value) -> Result<Vec<RowId>, InternalError> {
        match self.require(name)? {
            TableIndex::Interval(index) => index.stab(probe),
            _ => Err(InternalError::index_unsupported(format!(
                "index '{name}' is not an interval index"
            ))),
        }
    }

    /// Range-overlap query; interval indices only.
    pub fn search_all(
        &self,
        name: &str,
        low: &Value,
        high: &Value,
    ) -> Result<Vec<RowId>, InternalError> {
        match self.require(name)? {
            TableIndex::Interval(index) => index.search_all(low, high),
            _ => Err(InternalError::index_unsupported(format!(
                "index '{name}' is not an interval index"
            ))),
        }
    }

    // ── Internal ───────────────────────────────────────────────

    fn require(&self, name: &str) -> Result<&TableIndex, InternalError> {
        self.indices
            .get(name)
            .ok_or_else(|| InternalError::index_not_found(name))
    }

    fn routed_indices(&self, column: &str) -> Vec<String> {
        self.routing.get(column).cloned().unwrap_or_default()
    }

    fn validate_new_index(
        &self,
        data: &Columns,
        name: &str,
        columns: &[&str],
    ) -> Result<Vec<String>, InternalError> {
        if self.indices.contains_key(name) {
            return Err(InternalError::index_name_exists(name));
        }
        if columns.is_empty() {
            return Err(InternalError::index_unsupported(format!(
                "index '{name}' needs at least one column"
            )));
        }
        if columns.len() > MAX_INDEX_COLUMNS {
            return Err(InternalError::index_unsupported(format!(
                "index '{name}' exceeds {MAX_INDEX_COLUMNS} columns"
            )));
        }
        for column in columns {
            if !data.contains(column) {
                return Err(InternalError::column_not_found(column));
            }
        }

        Ok(columns.iter().map(ToString::to_string).collect())
    }

    fn backfill_and_register(
        &mut self,
        data: &Columns,
        mut index: TableIndex,
    ) -> Result<(), InternalError> {
        let rows = data.row_count();
        for row in 0..rows {
            index.update(data, row)?;
        }
        obs::record(MetricsEvent::RowsScanned { rows: rows as u64 });

        let name = index.name().to_string();
        for column in index.columns() {
            self.routing
                .entry(column.to_string())
                .or_default()
                .push(name.clone());
        }
        self.indices.insert(name, index);

        Ok(())
    }
}

fn seed_for(name: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    name.hash(&mut hasher);
    hasher.finish()
}
