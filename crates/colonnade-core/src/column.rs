use crate::{
    error::{ErrorClass, ErrorOrigin, InternalError},
    value::{Value, ValueKind},
};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

///
/// Column
///
/// Typed, NA-admitting cell vector. Every non-NA cell carries the column's
/// declared kind; `push`/`set` reject foreign kinds so index code never has
/// to re-check cell types.
///

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Column {
    name: String,
    kind: ValueKind,
    cells: Vec<Value>,
}

impl Column {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            kind,
            cells: Vec::new(),
        }
    }

    /// Build a column from existing cells, validating every kind up front.
    pub fn with_values(
        name: impl Into<String>,
        kind: ValueKind,
        cells: Vec<Value>,
    ) -> Result<Self, ColumnError> {
        let name = name.into();
        for (row, cell) in cells.iter().enumerate() {
            check_kind(&name, kind, row, cell)?;
        }

        Ok(Self { name, kind, cells })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        self.kind
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[must_use]
    pub fn get(&self, row: usize) -> Option<&Value> {
        self.cells.get(row)
    }

    /// Returns true if the cell exists and is the NA sentinel.
    #[must_use]
    pub fn is_na(&self, row: usize) -> bool {
        matches!(self.cells.get(row), Some(Value::Na))
    }

    pub fn push(&mut self, value: Value) -> Result<(), ColumnError> {
        check_kind(&self.name, self.kind, self.cells.len(), &value)?;
        self.cells.push(value);

        Ok(())
    }

    pub fn set(&mut self, row: usize, value: Value) -> Result<(), ColumnError> {
        let len = self.cells.len();
        let cell = self.cells.get_mut(row).ok_or(ColumnError::RowOutOfBounds {
            column: self.name.clone(),
            row,
            len,
        })?;
        check_kind(&self.name, self.kind, row, &value)?;
        *cell = value;

        Ok(())
    }

    pub fn remove(&mut self, row: usize) -> Result<(), ColumnError> {
        if row >= self.cells.len() {
            return Err(ColumnError::RowOutOfBounds {
                column: self.name.clone(),
                row,
                len: self.cells.len(),
            });
        }
        self.cells.remove(row);

        Ok(())
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }
}

fn check_kind(column: &str, kind: ValueKind, row: usize, value: &Value) -> Result<(), ColumnError> {
    if value.matches_kind(kind) {
        return Ok(());
    }

    Err(ColumnError::KindMismatch {
        column: column.to_string(),
        row,
        expected: kind,
        found: value.clone(),
    })
}

///
/// ColumnError
///

#[derive(Debug, ThisError)]
pub enum ColumnError {
    #[error("kind mismatch in column '{column}' at row {row}: expected {expected}, found {found:?}")]
    KindMismatch {
        column: String,
        row: usize,
        expected: ValueKind,
        found: Value,
    },

    #[error("row {row} out of bounds in column '{column}' (len {len})")]
    RowOutOfBounds { column: String, row: usize, len: usize },

    #[error("column name already exists: '{column}'")]
    NameExists { column: String },
}

impl From<ColumnError> for InternalError {
    fn from(err: ColumnError) -> Self {
        let class = match err {
            ColumnError::KindMismatch { .. } => ErrorClass::Unsupported,
            ColumnError::RowOutOfBounds { .. } => ErrorClass::InvariantViolation,
            ColumnError::NameExists { .. } => ErrorClass::Conflict,
        };

        Self::new(class, ErrorOrigin::Column, err.to_string())
    }
}

///
/// Columns
///
/// Ordered, name-addressable column set. This is the surface the index
/// layer consumes: cell access by `(column name, row)` with contextual
/// errors instead of panics.
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Columns {
    cols: Vec<Column>,
}

impl Columns {
    #[must_use]
    pub const fn new() -> Self {
        Self { cols: Vec::new() }
    }

    pub fn push(&mut self, column: Column) -> Result<(), ColumnError> {
        if self.contains(column.name()) {
            return Err(ColumnError::NameExists {
                column: column.name().to_string(),
            });
        }
        self.cols.push(column);

        Ok(())
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.cols.iter().any(|c| c.name() == name)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Column> {
        self.cols.iter().find(|c| c.name() == name)
    }

    #[must_use]
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.cols.iter_mut().find(|c| c.name() == name)
    }

    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.cols.iter().position(|c| c.name() == name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cols.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cols.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Column> {
        self.cols.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Column> {
        self.cols.iter_mut()
    }

    /// Number of rows; every column holds exactly this many cells.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.cols.first().map_or(0, Column::len)
    }

    /// Cell access with contextual errors; the index layer's entry point.
    pub fn value(&self, name: &str, row: usize) -> Result<&Value, InternalError> {
        let column = self
            .get(name)
            .ok_or_else(|| InternalError::column_not_found(name))?;

        column.get(row).ok_or_else(|| {
            InternalError::new(
                ErrorClass::InvariantViolation,
                ErrorOrigin::Column,
                format!(
                    "row {row} out of bounds in column '{name}' (len {})",
                    column.len()
                ),
            )
        })
    }

    pub(crate) fn replace(&mut self, column: Column) -> Result<Column, InternalError> {
        let slot = self
            .index_of(column.name())
            .ok_or_else(|| InternalError::column_not_found(column.name()))?;

        Ok(std::mem::replace(&mut self.cols[slot], column))
    }
}
