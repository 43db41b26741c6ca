use crate::{
    column::Columns,
    error::InternalError,
    index::{RowId, interval_tree::IntervalSearchTree},
    interval::Interval,
    obs::{self, MetricsEvent},
    value::{Float64, Value},
};
use std::collections::HashMap;

///
/// IntervalIndex
///
/// Two-column `(start, end)` index over the randomized interval search
/// tree. A row participates only when both endpoint cells are non-NA; the
/// row → interval cache makes removal independent of current column data.
///
/// Stab and overlap queries reject non-numeric probes before touching the
/// tree.
///

#[derive(Debug)]
pub struct IntervalIndex {
    name: String,
    start_column: String,
    end_column: String,
    tree: IntervalSearchTree,
    row_intervals: HashMap<RowId, Interval>,
}

impl IntervalIndex {
    #[must_use]
    pub(crate) fn new(
        name: impl Into<String>,
        start_column: impl Into<String>,
        end_column: impl Into<String>,
        seed: u64,
    ) -> Self {
        Self {
            name: name.into(),
            start_column: start_column.into(),
            end_column: end_column.into(),
            tree: IntervalSearchTree::with_seed(seed),
            row_intervals: HashMap::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn start_column(&self) -> &str {
        &self.start_column
    }

    #[must_use]
    pub fn end_column(&self) -> &str {
        &self.end_column
    }

    /// Rows currently indexed (NA-endpoint rows are not).
    #[must_use]
    pub fn len(&self) -> usize {
        self.row_intervals.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.row_intervals.is_empty()
    }

    /// Retract the row's previous interval (if any) and re-index its
    /// current endpoint pair. Rows with an NA endpoint are skipped.
    pub(crate) fn update(&mut self, columns: &Columns, row: RowId) -> Result<(), InternalError> {
        let removes = u64::from(self.retract(row));

        let low = columns.value(&self.start_column, row)?;
        let high = columns.value(&self.end_column, row)?;
        if low.is_na() || high.is_na() {
            return Ok(());
        }

        let interval = Interval::try_from_values(low, high).map_err(|err| {
            InternalError::index_unsupported(format!("interval index '{}': {err}", self.name))
        })?;

        self.tree.add(interval, row);
        self.row_intervals.insert(row, interval);
        obs::record(MetricsEvent::IndexDelta {
            index: &self.name,
            inserts: 1,
            removes,
        });

        Ok(())
    }

    /// Remove the row's interval; rows the index never saw are a no-op.
    pub(crate) fn remove(&mut self, row: RowId) {
        if self.retract(row) {
            obs::record(MetricsEvent::IndexDelta {
                index: &self.name,
                inserts: 0,
                removes: 1,
            });
        }
    }

    /// All rows whose interval contains the probe value.
    pub fn stab(&self, probe: &Value) -> Result<Vec<RowId>, InternalError> {
        let point = self.numeric_probe(probe)?;
        obs::record(MetricsEvent::IntervalStab);

        Ok(self.tree.stab(point))
    }

    /// All rows whose interval intersects `[low, high]`.
    pub fn search_all(&self, low: &Value, high: &Value) -> Result<Vec<RowId>, InternalError> {
        let query = Interval::new(self.numeric_probe(low)?, self.numeric_probe(high)?);
        obs::record(MetricsEvent::IntervalSearch);

        Ok(self.tree.search_all(&query))
    }

    pub(crate) fn clear(&mut self) {
        self.tree.clear();
        self.row_intervals.clear();
    }

    fn retract(&mut self, row: RowId) -> bool {
        match self.row_intervals.remove(&row) {
            Some(interval) => self.tree.remove(&interval, row),
            None => false,
        }
    }

    fn numeric_probe(&self, value: &Value) -> Result<Float64, InternalError> {
        value
            .as_f64()
            .and_then(Float64::try_new)
            .ok_or_else(|| {
                InternalError::index_unsupported(format!(
                    "interval index '{}' requires a numeric probe, found {value:?}",
                    self.name
                ))
            })
    }
}
