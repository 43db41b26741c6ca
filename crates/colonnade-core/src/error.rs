use std::fmt;
use thiserror::Error as ThisError;

///
/// InternalError
///
/// Structured runtime error with a stable internal classification.
/// Not a stable API; intended for internal use and may change without notice.
///

#[derive(Clone, Debug, ThisError)]
#[error("{message}")]
pub struct InternalError {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl InternalError {
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
        }
    }

    /// Construct a column-origin not-found error.
    pub(crate) fn column_not_found(name: &str) -> Self {
        Self::new(
            ErrorClass::NotFound,
            ErrorOrigin::Column,
            format!("column not found: '{name}'"),
        )
    }

    /// Construct a table-origin invariant violation.
    pub(crate) fn table_invariant(message: impl Into<String>) -> Self {
        Self::new(
            ErrorClass::InvariantViolation,
            ErrorOrigin::Table,
            message.into(),
        )
    }

    /// Construct a table-origin unsupported error.
    pub(crate) fn table_unsupported(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Unsupported, ErrorOrigin::Table, message.into())
    }

    /// Construct an index uniqueness violation conflict error.
    pub(crate) fn index_conflict(index: &str, message: impl Into<String>) -> Self {
        Self::new(
            ErrorClass::Conflict,
            ErrorOrigin::Index,
            format!("duplicate key on unique index '{index}': {}", message.into()),
        )
    }

    /// Construct an index-origin not-found error.
    pub(crate) fn index_not_found(name: &str) -> Self {
        Self::new(
            ErrorClass::NotFound,
            ErrorOrigin::Index,
            format!("index not found: '{name}'"),
        )
    }

    /// Construct a conflict error for an index name that is already taken.
    pub(crate) fn index_name_exists(name: &str) -> Self {
        Self::new(
            ErrorClass::Conflict,
            ErrorOrigin::Index,
            format!("index name already exists: '{name}'"),
        )
    }

    /// Construct an index-origin unsupported error.
    pub(crate) fn index_unsupported(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Unsupported, ErrorOrigin::Index, message.into())
    }

    /// Construct an index-origin invariant violation.
    pub(crate) fn index_invariant(message: impl Into<String>) -> Self {
        Self::new(
            ErrorClass::InvariantViolation,
            ErrorOrigin::Index,
            message.into(),
        )
    }

    /// Construct an arity-mismatch error for an index lookup or update.
    pub(crate) fn index_arity_mismatch(index: &str, expected: usize, found: usize) -> Self {
        Self::new(
            ErrorClass::Unsupported,
            ErrorOrigin::Index,
            format!("key arity mismatch on index '{index}': expected {expected}, found {found}"),
        )
    }

    /// Construct a join-origin not-found error for a missing join column.
    pub(crate) fn join_column_not_found(table: &str, column: &str) -> Self {
        Self::new(
            ErrorClass::NotFound,
            ErrorOrigin::Join,
            format!("join column not found in table '{table}': '{column}'"),
        )
    }

    /// Construct a join-origin unsupported error.
    pub(crate) fn join_unsupported(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Unsupported, ErrorOrigin::Join, message.into())
    }

    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self.class, ErrorClass::Conflict)
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self.class, ErrorClass::NotFound)
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}: {}", self.origin, self.class, self.message)
    }
}

///
/// ErrorClass
/// Internal error taxonomy for runtime classification.
/// Not a stable API; may change without notice.
///

#[remain::sorted]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    Conflict,
    Internal,
    InvariantViolation,
    NotFound,
    Unsupported,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Conflict => "conflict",
            Self::Internal => "internal",
            Self::InvariantViolation => "invariant_violation",
            Self::NotFound => "not_found",
            Self::Unsupported => "unsupported",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
/// Internal origin taxonomy for runtime classification.
/// Not a stable API; may change without notice.
///

#[remain::sorted]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorOrigin {
    Column,
    Index,
    Join,
    Table,
    Value,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Column => "column",
            Self::Index => "index",
            Self::Join => "join",
            Self::Table => "table",
            Self::Value => "value",
        };
        write!(f, "{label}")
    }
}
