use super::*;
use crate::{
    column::{Column, Columns},
    obs,
    value::{Value, ValueKind},
};
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

/// Two-column fixture in the shape of the expression-table scenario:
/// a text GENE_ID and an integer FPKM.
fn gene_columns(rows: &[(&str, i64)]) -> Columns {
    let mut gene = Column::new("GENE_ID", ValueKind::Text);
    let mut fpkm = Column::new("FPKM", ValueKind::Int);
    for (id, value) in rows {
        gene.push(Value::Text((*id).to_string())).unwrap();
        fpkm.push(Value::Int(*value)).unwrap();
    }

    let mut columns = Columns::new();
    columns.push(gene).unwrap();
    columns.push(fpkm).unwrap();
    columns
}

fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

// ── HashIndex ──────────────────────────────────────────────────

#[test]
fn hash_index_finds_backfilled_rows() {
    let data = gene_columns(&[("A", 5), ("B", 7), ("C", 3)]);
    let mut registry = IndexRegistry::new();
    registry.add_index(&data, "by_gene", &["GENE_ID"], true).unwrap();

    assert_eq!(registry.find("by_gene", &[text("B")]).unwrap(), Some(1));
    assert_eq!(registry.find("by_gene", &[text("Z")]).unwrap(), None);
}

#[test]
fn hash_index_rejects_duplicate_keys() {
    let data = gene_columns(&[("A", 5), ("A", 7)]);
    let mut registry = IndexRegistry::new();

    let err = registry
        .add_index(&data, "by_gene", &["GENE_ID"], true)
        .unwrap_err();
    assert!(err.is_conflict(), "duplicate key must be a conflict: {err}");
    assert!(
        !registry.contains_index("by_gene"),
        "failed backfill must not register the index"
    );
}

#[test]
fn hash_index_update_moves_a_row_between_keys() {
    let mut data = gene_columns(&[("A", 5), ("B", 7)]);
    let mut registry = IndexRegistry::new();
    registry.add_index(&data, "by_gene", &["GENE_ID"], true).unwrap();

    // rename gene B -> D, then the old key must be gone
    data.get_mut("GENE_ID").unwrap().set(1, text("D")).unwrap();
    registry.update_value(&data, "GENE_ID", 1).unwrap();

    assert_eq!(registry.find("by_gene", &[text("D")]).unwrap(), Some(1));
    assert_eq!(registry.find("by_gene", &[text("B")]).unwrap(), None);
}

#[test]
fn hash_index_checks_key_arity() {
    let data = gene_columns(&[("A", 5)]);
    let mut registry = IndexRegistry::new();
    registry
        .add_index(&data, "by_both", &["GENE_ID", "FPKM"], true)
        .unwrap();

    let err = registry.find("by_both", &[text("A")]).unwrap_err();
    assert!(err.message.contains("arity"), "unexpected error: {err}");

    assert_eq!(
        registry
            .find("by_both", &[text("A"), Value::Int(5)])
            .unwrap(),
        Some(0)
    );
}

#[test]
fn multi_column_hash_index_distinguishes_component_order() {
    let mut a = Column::new("a", ValueKind::Int);
    let mut b = Column::new("b", ValueKind::Int);
    a.push(Value::Int(1)).unwrap();
    b.push(Value::Int(2)).unwrap();
    let mut data = Columns::new();
    data.push(a).unwrap();
    data.push(b).unwrap();

    let mut registry = IndexRegistry::new();
    registry.add_index(&data, "ab", &["a", "b"], true).unwrap();

    assert_eq!(
        registry.find("ab", &[Value::Int(1), Value::Int(2)]).unwrap(),
        Some(0)
    );
    assert_eq!(
        registry.find("ab", &[Value::Int(2), Value::Int(1)]).unwrap(),
        None
    );
}

// ── TrieIndex ──────────────────────────────────────────────────

#[test]
fn non_unique_trie_keeps_every_row_under_a_key() {
    let data = gene_columns(&[("A", 5), ("A", 7), ("B", 3)]);
    let mut registry = IndexRegistry::new();
    registry
        .add_index(&data, "by_gene", &["GENE_ID"], false)
        .unwrap();

    let mut rows = registry.find_all("by_gene", &[text("A")]).unwrap();
    rows.sort_unstable();
    assert_eq!(rows, vec![0, 1]);
    assert_eq!(registry.find_all("by_gene", &[text("B")]).unwrap(), vec![2]);
    assert!(registry.find_all("by_gene", &[text("Z")]).unwrap().is_empty());
}

#[test]
fn unique_trie_rejects_duplicate_keys_and_counts_the_violation() {
    let data = gene_columns(&[("A", 5), ("A", 7)]);

    obs::reset_all();
    let mut registry = IndexRegistry::new();
    let err = registry
        .add_trie_index(&data, "by_gene", &["GENE_ID"], true)
        .unwrap_err();

    assert!(err.is_conflict());
    assert_eq!(obs::report().ops.unique_violations, 1);
}

#[test]
fn trie_prefix_lookup_collects_all_rows_below_the_path() {
    let data = gene_columns(&[("A", 5), ("A", 7), ("B", 3)]);
    let mut registry = IndexRegistry::new();
    registry
        .add_trie_index(&data, "by_gene_fpkm", &["GENE_ID", "FPKM"], false)
        .unwrap();

    let mut rows = registry.find_prefix("by_gene_fpkm", &[text("A")]).unwrap();
    rows.sort_unstable();
    assert_eq!(rows, vec![0, 1]);

    assert_eq!(
        registry
            .find_all("by_gene_fpkm", &[text("A"), Value::Int(7)])
            .unwrap(),
        vec![1]
    );
}

#[test]
fn trie_prunes_dead_paths_and_allows_key_reuse() {
    let data = gene_columns(&[("A", 5), ("B", 7)]);
    let mut index = TrieIndex::new("t", vec!["GENE_ID".into(), "FPKM".into()], true);
    index.update(&data, 0).unwrap();
    index.update(&data, 1).unwrap();
    assert_eq!(index.node_count(), 4);

    index.remove(0);
    assert_eq!(index.node_count(), 2, "row 0's path must be fully pruned");
    assert!(index.find(&[text("A"), Value::Int(5)]).unwrap().is_empty());

    // the fully pruned key is immediately reusable, even on a unique trie
    index.update(&data, 0).unwrap();
    assert_eq!(index.find(&[text("A"), Value::Int(5)]).unwrap(), vec![0]);
}

#[test]
fn na_cells_are_ordinary_trie_key_components() {
    let mut gene = Column::new("GENE_ID", ValueKind::Text);
    gene.push(Value::Na).unwrap();
    gene.push(text("A")).unwrap();
    let mut data = Columns::new();
    data.push(gene).unwrap();

    let mut registry = IndexRegistry::new();
    registry.add_index(&data, "by_gene", &["GENE_ID"], false).unwrap();

    assert_eq!(registry.find_all("by_gene", &[Value::Na]).unwrap(), vec![0]);
    assert_eq!(registry.find_all("by_gene", &[text("A")]).unwrap(), vec![1]);
}

// ── IntervalIndex via the registry ─────────────────────────────

fn span_columns(spans: &[Option<(i64, i64)>]) -> Columns {
    let mut start = Column::new("start", ValueKind::Int);
    let mut end = Column::new("end", ValueKind::Int);
    for span in spans {
        match span {
            Some((lo, hi)) => {
                start.push(Value::Int(*lo)).unwrap();
                end.push(Value::Int(*hi)).unwrap();
            }
            None => {
                start.push(Value::Na).unwrap();
                end.push(Value::Na).unwrap();
            }
        }
    }

    let mut columns = Columns::new();
    columns.push(start).unwrap();
    columns.push(end).unwrap();
    columns
}

#[test]
fn interval_index_answers_stab_and_overlap_queries() {
    let data = span_columns(&[Some((1, 5)), Some((2, 6)), Some((10, 12)), None]);
    let mut registry = IndexRegistry::new();
    registry
        .add_interval_index(&data, "spans", "start", "end")
        .unwrap();

    let stabbed: BTreeSet<RowId> = registry
        .stab("spans", &Value::Int(4))
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(stabbed, BTreeSet::from([0, 1]));

    let overlapping: BTreeSet<RowId> = registry
        .search_all("spans", &Value::Int(6), &Value::Int(9))
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(overlapping, BTreeSet::from([1]));
}

#[test]
fn interval_index_rejects_non_numeric_probes_and_columns() {
    let data = gene_columns(&[("A", 5)]);
    let mut registry = IndexRegistry::new();

    let err = registry
        .add_interval_index(&data, "spans", "GENE_ID", "FPKM")
        .unwrap_err();
    assert!(err.message.contains("numeric"), "unexpected error: {err}");

    let span_data = span_columns(&[Some((1, 5))]);
    registry
        .add_interval_index(&span_data, "spans", "start", "end")
        .unwrap();
    let err = registry.stab("spans", &text("mid")).unwrap_err();
    assert!(err.message.contains("numeric probe"), "unexpected error: {err}");
}

// ── IndexRegistry bookkeeping ──────────────────────────────────

#[test]
fn registry_rejects_duplicate_names_and_unknown_lookups() {
    let data = gene_columns(&[("A", 5)]);
    let mut registry = IndexRegistry::new();
    registry.add_index(&data, "by_gene", &["GENE_ID"], true).unwrap();

    let err = registry
        .add_index(&data, "by_gene", &["FPKM"], false)
        .unwrap_err();
    assert!(err.is_conflict());

    assert!(registry.find("missing", &[text("A")]).unwrap_err().is_not_found());
    assert!(registry.remove_index("missing").unwrap_err().is_not_found());

    registry.remove_index("by_gene").unwrap();
    assert!(!registry.contains_index("by_gene"));
}

#[test]
fn registry_validates_index_columns() {
    let data = gene_columns(&[("A", 5)]);
    let mut registry = IndexRegistry::new();

    assert!(registry
        .add_index(&data, "bad", &["NOPE"], true)
        .unwrap_err()
        .is_not_found());
    assert!(registry.add_index(&data, "empty", &[], true).is_err());
}

#[test]
fn narrow_update_only_touches_routed_indices() {
    let mut data = gene_columns(&[("A", 5), ("B", 7)]);
    let mut registry = IndexRegistry::new();
    registry.add_index(&data, "by_gene", &["GENE_ID"], true).unwrap();
    registry.add_index(&data, "by_fpkm", &["FPKM"], true).unwrap();

    // change FPKM of row 0 without telling the registry, then narrowly
    // update only GENE_ID: by_fpkm must still hold the stale key
    data.get_mut("FPKM").unwrap().set(0, Value::Int(50)).unwrap();
    registry.update_value(&data, "GENE_ID", 0).unwrap();

    assert_eq!(registry.find("by_fpkm", &[Value::Int(5)]).unwrap(), Some(0));
    assert_eq!(registry.find("by_fpkm", &[Value::Int(50)]).unwrap(), None);

    // the narrow column-replacement rebuild repairs it
    registry.update_column(&data, "FPKM").unwrap();
    assert_eq!(registry.find("by_fpkm", &[Value::Int(50)]).unwrap(), Some(0));
}

#[test]
fn clear_values_keeps_definitions_but_drops_rows() {
    let data = gene_columns(&[("A", 5)]);
    let mut registry = IndexRegistry::new();
    registry.add_index(&data, "by_gene", &["GENE_ID"], true).unwrap();

    registry.clear_values();
    assert!(registry.contains_index("by_gene"));
    assert_eq!(registry.find("by_gene", &[text("A")]).unwrap(), None);

    // re-fills on update
    registry.update(&data, 0).unwrap();
    assert_eq!(registry.find("by_gene", &[text("A")]).unwrap(), Some(0));
}

#[test]
fn copy_to_recreates_matching_indices_and_skips_missing_columns() {
    let data = gene_columns(&[("A", 5), ("B", 7)]);
    let mut registry = IndexRegistry::new();
    registry.add_index(&data, "by_gene", &["GENE_ID"], true).unwrap();
    registry.add_index(&data, "by_fpkm", &["FPKM"], false).unwrap();

    // target lacks FPKM entirely
    let mut gene = Column::new("GENE_ID", ValueKind::Text);
    gene.push(text("B")).unwrap();
    let mut target = Columns::new();
    target.push(gene).unwrap();

    let copy = registry.copy_to(&target).unwrap();
    assert!(copy.contains_index("by_gene"));
    assert!(!copy.contains_index("by_fpkm"));
    assert_eq!(copy.find("by_gene", &[text("B")]).unwrap(), Some(0));
}

#[test]
fn index_deltas_reach_the_obs_counters() {
    let data = gene_columns(&[("A", 5), ("B", 7)]);

    obs::reset_all();
    let mut registry = IndexRegistry::new();
    registry.add_index(&data, "by_gene", &["GENE_ID"], true).unwrap();
    registry.remove(0);

    let state = obs::report();
    assert_eq!(state.ops.index_inserts, 2);
    assert_eq!(state.ops.index_removes, 1);
    assert_eq!(state.ops.rows_scanned, 2);
    let per_index = state.indices.get("by_gene").expect("per-index counters");
    assert_eq!(per_index.inserts, 2);
    assert_eq!(per_index.removes, 1);
}

// ── Trie round-trip property ───────────────────────────────────

#[derive(Clone, Debug)]
enum Op {
    Set { row: usize, value: i64 },
    Remove { row: usize },
}

fn arb_op(rows: usize) -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..rows, 0i64..6).prop_map(|(row, value)| Op::Set { row, value }),
        (0..rows).prop_map(|row| Op::Remove { row }),
    ]
}

proptest! {
    /// For every op sequence, `find(key)` returns exactly the rows whose
    /// current cell equals the key, and retracting everything prunes the
    /// trie completely.
    #[test]
    fn trie_round_trip_matches_oracle(ops in prop::collection::vec(arb_op(8), 1..60)) {
        let rows = 8usize;
        let mut column = Column::new("k", ValueKind::Int);
        for _ in 0..rows {
            column.push(Value::Na).unwrap();
        }
        let mut data = Columns::new();
        data.push(column).unwrap();

        let mut index = TrieIndex::new("k", vec!["k".into()], false);
        let mut oracle: BTreeMap<i64, BTreeSet<usize>> = BTreeMap::new();
        let mut indexed: BTreeSet<usize> = BTreeSet::new();

        for op in ops {
            match op {
                Op::Set { row, value } => {
                    data.get_mut("k").unwrap().set(row, Value::Int(value)).unwrap();
                    index.update(&data, row).unwrap();
                    for set in oracle.values_mut() {
                        set.remove(&row);
                    }
                    oracle.entry(value).or_default().insert(row);
                    indexed.insert(row);
                }
                Op::Remove { row } => {
                    index.remove(row);
                    for set in oracle.values_mut() {
                        set.remove(&row);
                    }
                    indexed.remove(&row);
                }
            }

            for key in 0i64..6 {
                let got: BTreeSet<usize> =
                    index.find(&[Value::Int(key)]).unwrap().into_iter().collect();
                let want = oracle.get(&key).cloned().unwrap_or_default();
                prop_assert_eq!(got, want, "mismatch under key {}", key);
            }
        }

        for row in indexed {
            index.remove(row);
        }
        prop_assert_eq!(index.node_count(), 0, "retracting all rows must prune everything");
    }
}
