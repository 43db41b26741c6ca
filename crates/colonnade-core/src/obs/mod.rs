//! Metrics sink boundary.
//!
//! Engine logic MUST NOT touch counter state directly; all instrumentation
//! flows through [`MetricsEvent`] and [`record`]. Tests install a scoped
//! sink override to observe events without reading global state.

use std::{cell::RefCell, collections::BTreeMap, rc::Rc};

thread_local! {
    static STATE: RefCell<MetricsState> = RefCell::new(MetricsState::default());
    static SINK_OVERRIDES: RefCell<Vec<Rc<dyn MetricsSink>>> = const { RefCell::new(Vec::new()) };
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug)]
pub enum MetricsEvent<'a> {
    IndexDelta {
        index: &'a str,
        inserts: u64,
        removes: u64,
    },
    UniqueViolation {
        index: &'a str,
    },
    RowsScanned {
        rows: u64,
    },
    JoinRowsEmitted {
        rows: u64,
    },
    IntervalStab,
    IntervalSearch,
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: MetricsEvent<'_>);
}

///
/// OpsCounters
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct OpsCounters {
    pub index_inserts: u64,
    pub index_removes: u64,
    pub unique_violations: u64,
    pub rows_scanned: u64,
    pub join_rows_emitted: u64,
    pub interval_stabs: u64,
    pub interval_searches: u64,
}

///
/// IndexCounters
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct IndexCounters {
    pub inserts: u64,
    pub removes: u64,
    pub unique_violations: u64,
}

///
/// MetricsState
///

#[derive(Clone, Debug, Default)]
pub struct MetricsState {
    pub ops: OpsCounters,
    pub indices: BTreeMap<String, IndexCounters>,
}

/// GlobalMetricsSink
/// Default process-local sink that writes into thread-local counter state.

struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent<'_>) {
        STATE.with_borrow_mut(|state| match event {
            MetricsEvent::IndexDelta {
                index,
                inserts,
                removes,
            } => {
                state.ops.index_inserts = state.ops.index_inserts.saturating_add(inserts);
                state.ops.index_removes = state.ops.index_removes.saturating_add(removes);
                let entry = state.indices.entry(index.to_string()).or_default();
                entry.inserts = entry.inserts.saturating_add(inserts);
                entry.removes = entry.removes.saturating_add(removes);
            }

            MetricsEvent::UniqueViolation { index } => {
                state.ops.unique_violations = state.ops.unique_violations.saturating_add(1);
                let entry = state.indices.entry(index.to_string()).or_default();
                entry.unique_violations = entry.unique_violations.saturating_add(1);
            }

            MetricsEvent::RowsScanned { rows } => {
                state.ops.rows_scanned = state.ops.rows_scanned.saturating_add(rows);
            }

            MetricsEvent::JoinRowsEmitted { rows } => {
                state.ops.join_rows_emitted = state.ops.join_rows_emitted.saturating_add(rows);
            }

            MetricsEvent::IntervalStab => {
                state.ops.interval_stabs = state.ops.interval_stabs.saturating_add(1);
            }

            MetricsEvent::IntervalSearch => {
                state.ops.interval_searches = state.ops.interval_searches.saturating_add(1);
            }
        });
    }
}

/// Route one event to the innermost scoped sink, or the global counters.
pub(crate) fn record(event: MetricsEvent<'_>) {
    let sink = SINK_OVERRIDES.with_borrow(|stack| stack.last().cloned());
    match sink {
        Some(sink) => sink.record(event),
        None => GlobalMetricsSink.record(event),
    }
}

/// Snapshot the current counter state.
#[must_use]
pub fn report() -> MetricsState {
    STATE.with_borrow(Clone::clone)
}

/// Reset all counters.
pub fn reset_all() {
    STATE.with_borrow_mut(|state| *state = MetricsState::default());
}

/// Run a closure with a temporary metrics sink override.
///
/// Overrides nest; the previous sink is restored on all exits, including
/// unwind.
pub fn with_metrics_sink<T>(sink: Rc<dyn MetricsSink>, f: impl FnOnce() -> T) -> T {
    struct Guard;

    impl Drop for Guard {
        fn drop(&mut self) {
            SINK_OVERRIDES.with_borrow_mut(|stack| {
                stack.pop();
            });
        }
    }

    SINK_OVERRIDES.with_borrow_mut(|stack| stack.push(sink));
    let _guard = Guard;

    f()
}
