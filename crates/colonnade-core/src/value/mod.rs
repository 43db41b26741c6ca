mod compare;
mod float;

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, fmt};

// re-exports
pub use float::{Float64, Float64Error};

///
/// Value
///
/// Closed set of cell values. `Na` is the "not available" sentinel: an
/// ordinary value distinct from every domain value and equal only to
/// itself. It participates in keys and trie paths like any other value.
///

#[remain::sorted]
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Value {
    Bool(bool),
    Float(Float64),
    Int(i64),
    Na,
    Text(String),
}

impl Value {
    /// Returns true if the value is the NA sentinel.
    #[must_use]
    pub const fn is_na(&self) -> bool {
        matches!(self, Self::Na)
    }

    /// Kind of a non-NA value; `Na` carries no kind of its own.
    #[must_use]
    pub const fn kind(&self) -> Option<ValueKind> {
        match self {
            Self::Bool(_) => Some(ValueKind::Bool),
            Self::Float(_) => Some(ValueKind::Float),
            Self::Int(_) => Some(ValueKind::Int),
            Self::Na => None,
            Self::Text(_) => Some(ValueKind::Text),
        }
    }

    /// Returns true if the value may live in a column of `kind`.
    /// NA is admitted everywhere.
    #[must_use]
    pub fn matches_kind(&self, kind: ValueKind) -> bool {
        match self.kind() {
            Some(own) => own == kind,
            None => true,
        }
    }

    /// Numeric view for interval queries; `None` for non-numeric values.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(f.get()),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        if let Self::Bool(b) = self { Some(*b) } else { None }
    }

    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        if let Self::Int(i) = self { Some(*i) } else { None }
    }

    #[must_use]
    pub const fn as_text(&self) -> Option<&str> {
        if let Self::Text(s) = self {
            Some(s.as_str())
        } else {
            None
        }
    }

}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        compare::canonical_cmp(self, other)
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Na => write!(f, "NA"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

#[macro_export]
macro_rules! impl_value_from {
    ( $( $type:ty => $variant:ident ),* $(,)? ) => {
        $(
            impl From<$type> for Value {
                fn from(v: $type) -> Self {
                    Self::$variant(v.into())
                }
            }
        )*
    };
}

impl_value_from! {
    bool    => Bool,
    Float64 => Float,
    i8      => Int,
    i16     => Int,
    i32     => Int,
    i64     => Int,
    &str    => Text,
    String  => Text,
}

///
/// ValueKind
///
/// Declared type of a column; every non-NA cell of a column carries
/// exactly this kind.
///

#[remain::sorted]
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum ValueKind {
    Bool,
    Float,
    Int,
    Text,
}

impl ValueKind {
    /// Returns true for kinds that interval indices can consume.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Float | Self::Int)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Bool => "bool",
            Self::Float => "float",
            Self::Int => "int",
            Self::Text => "text",
        };
        write!(f, "{label}")
    }
}
