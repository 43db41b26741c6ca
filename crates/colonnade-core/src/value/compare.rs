use super::Value;
use std::cmp::Ordering;

/// Stable canonical rank used for cross-variant ordering.
///
/// Columns are typed, so same-column comparisons are always same-variant;
/// the rank only decides placement when heterogeneous values meet (key
/// components from different columns, trie child ordering in diagnostics).
pub(crate) const fn canonical_rank(value: &Value) -> u8 {
    match value {
        Value::Bool(_) => 0,
        Value::Float(_) => 1,
        Value::Int(_) => 2,
        Value::Na => 3,
        Value::Text(_) => 4,
    }
}

/// Total canonical comparator: natural order within a variant, rank order
/// across variants. `Int` and `Float` are NOT numerically coerced; equality
/// and ordering are strict per variant.
pub(crate) fn canonical_cmp(left: &Value, right: &Value) -> Ordering {
    match (left, right) {
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Float(a), Value::Float(b)) => a.cmp(b),
        (Value::Int(a), Value::Int(b)) => a.cmp(b),
        (Value::Na, Value::Na) => Ordering::Equal,
        (Value::Text(a), Value::Text(b)) => a.cmp(b),

        _ => canonical_rank(left).cmp(&canonical_rank(right)),
    }
}
