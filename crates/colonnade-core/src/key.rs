use crate::value::Value;
use std::{
    collections::hash_map::DefaultHasher,
    fmt,
    hash::{Hash, Hasher},
};

///
/// IndexKey
///
/// The atomic, normalized unit of the keyspace: an ordered, fixed-arity
/// tuple of cell values with its hash cached at construction. Keys are
/// immutable; an index that needs to move a row re-builds a fresh key and
/// reinserts, so a hash table never holds a key with a stale hash.
///

#[derive(Clone, Debug, Eq)]
pub struct IndexKey {
    values: Vec<Value>,
    hash: u64,
}

impl IndexKey {
    #[must_use]
    pub fn new(values: Vec<Value>) -> Self {
        let mut hasher = DefaultHasher::new();
        for value in &values {
            value.hash(&mut hasher);
        }
        let hash = hasher.finish();

        Self { values, hash }
    }

    #[must_use]
    pub fn arity(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

impl PartialEq for IndexKey {
    fn eq(&self, other: &Self) -> bool {
        // hash first: cheap reject for the common miss
        self.hash == other.hash && self.values == other.values
    }
}

impl Hash for IndexKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

impl fmt::Display for IndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{value}")?;
        }
        write!(f, "]")
    }
}

impl From<&[Value]> for IndexKey {
    fn from(values: &[Value]) -> Self {
        Self::new(values.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Float64;
    use std::collections::HashMap;

    #[test]
    fn equal_keys_share_hash_and_compare_equal() {
        let a = IndexKey::new(vec![Value::Text("A".into()), Value::Int(5)]);
        let b = IndexKey::new(vec![Value::Text("A".into()), Value::Int(5)]);

        assert_eq!(a, b);
        assert_eq!(a.hash, b.hash);
    }

    #[test]
    fn keys_differing_in_any_position_are_unequal() {
        let a = IndexKey::new(vec![Value::Text("A".into()), Value::Int(5)]);
        let b = IndexKey::new(vec![Value::Text("A".into()), Value::Int(6)]);
        let c = IndexKey::new(vec![Value::Text("B".into()), Value::Int(5)]);

        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn na_participates_as_an_ordinary_component() {
        let with_na = IndexKey::new(vec![Value::Na, Value::Int(1)]);
        let without = IndexKey::new(vec![Value::Int(0), Value::Int(1)]);

        assert_ne!(with_na, without);

        let mut map = HashMap::new();
        map.insert(with_na.clone(), 7usize);
        assert_eq!(map.get(&with_na), Some(&7));
    }

    #[test]
    fn display_renders_ordered_components() {
        let key = IndexKey::new(vec![
            Value::Text("g".into()),
            Value::Float(Float64::try_new(2.5).unwrap()),
            Value::Na,
        ]);
        assert_eq!(key.to_string(), "[g, 2.5, NA]");
    }
}
