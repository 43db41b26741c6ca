
use crate::{
    column::{Column, ColumnError, Columns},
    error::InternalError,
    index::{IndexRegistry, RowId},
    join::{self, JoinKind, JoinSpec},
    value::{Value, ValueKind},
};

///
/// Table
///
/// Named, typed, in-memory table: an ordered column set plus the index
/// registry that mirrors it. Every mutation is routed through the registry
/// so no index ever diverges from column data.
///
/// Single writer/reader at a time is a documented precondition: mutation
/// and query must not interleave without external synchronization.
///

#[derive(Debug, Default)]
pub struct Table {
    name: String,
    columns: Columns,
    indices: IndexRegistry,
}

impl Table {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Columns::new(),
            indices: IndexRegistry::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn columns(&self) -> &Columns {
        &self.columns
    }

    #[must_use]
    pub const fn indices(&self) -> &IndexRegistry {
        &self.indices
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.columns.row_count()
    }

    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    // ── Schema ─────────────────────────────────────────────────

    /// Append a column; existing rows are back-filled with NA.
    pub fn add_column(
        &mut self,
        name: impl Into<String>,
        kind: ValueKind,
    ) -> Result<(), InternalError> {
        let mut column = Column::new(name, kind);
        for _ in 0..self.columns.row_count() {
            column.push(Value::Na).map_err(InternalError::from)?;
        }
        self.columns.push(column)?;

        Ok(())
    }

    /// Swap a column wholesale (same name, same row count) and rebuild the
    /// indices that reference it.
    pub fn replace_column(&mut self, column: Column) -> Result<(), InternalError> {
        let rows = self.columns.row_count();
        if !self.columns.is_empty() && column.len() != rows {
            return Err(InternalError::table_unsupported(format!(
                "replacement column '{}' has {} rows, table has {rows}",
                column.name(),
                column.len()
            )));
        }

        let name = column.name().to_string();
        self.columns.replace(column)?;

        let Self {
            columns, indices, ..
        } = self;
        indices.update_column(columns, &name)
    }

    // ── Row mutation ───────────────────────────────────────────

    /// Append one row and feed it to every index. On a duplicate-key
    /// conflict the row stays appended and the offending index must be
    /// considered invalid until the row is removed or the index rebuilt.
    pub fn append_row(&mut self, values: Vec<Value>) -> Result<RowId, InternalError> {
        if values.len() != self.columns.len() {
            return Err(InternalError::table_unsupported(format!(
                "row arity mismatch: table '{}' has {} columns, row has {}",
                self.name,
                self.columns.len(),
                values.len()
            )));
        }

        // validate the full row before touching any column
        for (column, value) in self.columns.iter().zip(&values) {
            if !value.matches_kind(column.kind()) {
                return Err(ColumnError::KindMismatch {
                    column: column.name().to_string(),
                    row: self.columns.row_count(),
                    expected: column.kind(),
                    found: value.clone(),
                }
                .into());
            }
        }

        let row = self.columns.row_count();
        for (column, value) in self.columns.iter_mut().zip(values) {
            column.push(value).map_err(InternalError::from)?;
        }

        let Self {
            columns, indices, ..
        } = self;
        indices.update(columns, row)?;

        Ok(row)
    }

    /// Overwrite one cell and update exactly the indices routed through its
    /// column.
    pub fn set_value(
        &mut self,
        column: &str,
        row: RowId,
        value: Value,
    ) -> Result<(), InternalError> {
        self.columns
            .get_mut(column)
            .ok_or_else(|| InternalError::column_not_found(column))?
            .set(row, value)
            .map_err(InternalError::from)?;

        let Self {
            columns, indices, ..
        } = self;
        indices.update_value(columns, column, row)
    }

    /// Remove one row. Trailing rows are renumbered: they are retracted
    /// from every index under their old ids and re-fed under the new ones,
    /// so indices never hold stale row ids.
    pub fn remove_row(&mut self, row: RowId) -> Result<(), InternalError> {
        let count = self.columns.row_count();
        if row >= count {
            return Err(InternalError::table_invariant(format!(
                "row {row} out of bounds in table '{}' ({count} rows)",
                self.name
            )));
        }

        let Self {
            columns, indices, ..
        } = self;

        indices.remove(row);
        for old in (row + 1)..count {
            indices.remove(old);
        }
        for column in columns.iter_mut() {
            column.remove(row).map_err(InternalError::from)?;
        }
        for renumbered in row..(count - 1) {
            indices.update(columns, renumbered)?;
        }

        Ok(())
    }

    /// Drop every row; index definitions survive empty.
    pub fn clear(&mut self) {
        for column in self.columns.iter_mut() {
            column.clear();
        }
        self.indices.clear_values();
    }

    // ── Cell access ────────────────────────────────────────────

    pub fn value(&self, column: &str, row: RowId) -> Result<&Value, InternalError> {
        self.columns.value(column, row)
    }

    /// Full row snapshot in column order; `None` when out of bounds.
    #[must_use]
    pub fn row(&self, row: RowId) -> Option<Vec<Value>> {
        if row >= self.columns.row_count() {
            return None;
        }

        Some(
            self.columns
                .iter()
                .filter_map(|column| column.get(row).cloned())
                .collect(),
        )
    }

    // ── Index facade ───────────────────────────────────────────

    pub fn add_index(
        &mut self,
        name: &str,
        columns: &[&str],
        unique: bool,
    ) -> Result<(), InternalError> {
        let Self {
            columns: data,
            indices,
            ..
        } = self;
        indices.add_index(data, name, columns, unique)
    }

    pub fn add_trie_index(
        &mut self,
        name: &str,
        columns: &[&str],
        unique: bool,
    ) -> Result<(), InternalError> {
        let Self {
            columns: data,
            indices,
            ..
        } = self;
        indices.add_trie_index(data, name, columns, unique)
    }

    pub fn add_interval_index(
        &mut self,
        name: &str,
        start_column: &str,
        end_column: &str,
    ) -> Result<(), InternalError> {
        let Self {
            columns: data,
            indices,
            ..
        } = self;
        indices.add_interval_index(data, name, start_column, end_column)
    }

    pub fn remove_index(&mut self, name: &str) -> Result<(), InternalError> {
        self.indices.remove_index(name)
    }

    #[must_use]
    pub fn contains_index(&self, name: &str) -> bool {
        self.indices.contains_index(name)
    }

    /// Re-create this table's indices against another table's columns,
    /// skipping indices whose columns are absent there.
    pub fn copy_indices_to(&self, target: &mut Self) -> Result<(), InternalError> {
        target.indices = self.indices.copy_to(&target.columns)?;

        Ok(())
    }

    pub fn find(&self, index: &str, keys: &[Value]) -> Result<Option<RowId>, InternalError> {
        self.indices.find(index, keys)
    }

    pub fn find_all(&self, index: &str, keys: &[Value]) -> Result<Vec<RowId>, InternalError> {
        self.indices.find_all(index, keys)
    }

    pub fn find_prefix(&self, index: &str, keys: &[Value]) -> Result<Vec<RowId>, InternalError> {
        self.indices.find_prefix(index, keys)
    }

    pub fn stab(&self, index: &str, probe: &Value) -> Result<Vec<RowId>, InternalError> {
        self.indices.stab(index, probe)
    }

    pub fn search_all(
        &self,
        index: &str,
        low: &Value,
        high: &Value,
    ) -> Result<Vec<RowId>, InternalError> {
        self.indices.search_all(index, low, high)
    }

    // ── Joins ──────────────────────────────────────────────────

    pub fn join_inner(&self, other: &Self, spec: &JoinSpec) -> Result<Self, InternalError> {
        join::join(self, other, JoinKind::Inner, spec)
    }

    pub fn join_left(&self, other: &Self, spec: &JoinSpec) -> Result<Self, InternalError> {
        join::join(self, other, JoinKind::Left, spec)
    }

    pub fn join_right(&self, other: &Self, spec: &JoinSpec) -> Result<Self, InternalError> {
        join::join(self, other, JoinKind::Right, spec)
    }

    pub fn join_outer(&self, other: &Self, spec: &JoinSpec) -> Result<Self, InternalError> {
        join::join(self, other, JoinKind::Outer, spec)
    }
}
