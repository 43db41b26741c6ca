mod tree;


pub(crate) use tree::JoinTree;

use crate::{
    column::Column,
    error::InternalError,
    index::RowId,
    obs::{self, MetricsEvent},
    table::Table,
    value::{Value, ValueKind},
};

/// Default collision suffixes; `FPKM` present on both sides becomes
/// `FPKM.A` / `FPKM.B`.
pub const DEFAULT_SUFFIX_LEFT: &str = ".A";
pub const DEFAULT_SUFFIX_RIGHT: &str = ".B";

///
/// JoinKind
///

#[remain::sorted]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum JoinKind {
    Inner,
    Left,
    Outer,
    Right,
}

///
/// JoinSpec
///
/// Equi-join configuration: ordered join-column pairs plus the suffixes
/// used to disambiguate colliding non-join column names.
///

#[derive(Clone, Debug)]
pub struct JoinSpec {
    pairs: Vec<(String, String)>,
    suffix_left: String,
    suffix_right: String,
}

impl JoinSpec {
    /// Join on one column present under the same name in both tables.
    #[must_use]
    pub fn on(column: impl Into<String>) -> Self {
        let column = column.into();
        Self::on_pair(column.clone(), column)
    }

    /// Join on a differently named column pair (left name, right name).
    #[must_use]
    pub fn on_pair(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            pairs: vec![(left.into(), right.into())],
            suffix_left: DEFAULT_SUFFIX_LEFT.to_string(),
            suffix_right: DEFAULT_SUFFIX_RIGHT.to_string(),
        }
    }

    /// Add another same-named join column.
    #[must_use]
    pub fn and_on(mut self, column: impl Into<String>) -> Self {
        let column = column.into();
        self.pairs.push((column.clone(), column));
        self
    }

    /// Add another differently named join-column pair.
    #[must_use]
    pub fn and_on_pair(mut self, left: impl Into<String>, right: impl Into<String>) -> Self {
        self.pairs.push((left.into(), right.into()));
        self
    }

    /// Override the collision suffixes.
    #[must_use]
    pub fn with_suffixes(mut self, left: impl Into<String>, right: impl Into<String>) -> Self {
        self.suffix_left = left.into();
        self.suffix_right = right.into();
        self
    }

    #[must_use]
    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }
}

///
/// OutputLayout
///
/// Precomputed output schema: join columns once under the left-side name,
/// then left non-join columns, then right non-join columns, collisions
/// resolved by the spec's suffixes.
///

struct OutputLayout {
    pairs: Vec<(String, String)>,
    left_extra: Vec<String>,
    right_extra: Vec<String>,
    /// (output name, kind) per output column, in emission order.
    schema: Vec<(String, ValueKind)>,
}

impl OutputLayout {
    fn plan(left: &Table, right: &Table, spec: &JoinSpec) -> Result<Self, InternalError> {
        if spec.pairs.is_empty() {
            return Err(InternalError::join_unsupported(
                "join needs at least one column pair",
            ));
        }

        let mut pairs = Vec::with_capacity(spec.pairs.len());
        for (left_name, right_name) in &spec.pairs {
            let left_col = left
                .columns()
                .get(left_name)
                .ok_or_else(|| InternalError::join_column_not_found(left.name(), left_name))?;
            let right_col = right
                .columns()
                .get(right_name)
                .ok_or_else(|| InternalError::join_column_not_found(right.name(), right_name))?;

            if left_col.kind() != right_col.kind() {
                return Err(InternalError::join_unsupported(format!(
                    "join pair '{left_name}'/'{right_name}' kinds differ: {} vs {}",
                    left_col.kind(),
                    right_col.kind()
                )));
            }
            pairs.push((left_name.clone(), right_name.clone()));
        }

        let left_extra: Vec<String> = left
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .filter(|n| !pairs.iter().any(|(l, _)| l == n))
            .collect();
        let right_extra: Vec<String> = right
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .filter(|n| !pairs.iter().any(|(_, r)| r == n))
            .collect();

        let mut schema = Vec::new();
        for (left_name, _) in &pairs {
            // kind equality was checked above; the left column exists
            let kind = left.columns().get(left_name).map_or(ValueKind::Text, Column::kind);
            schema.push((left_name.clone(), kind));
        }
        for name in &left_extra {
            let kind = left.columns().get(name).map_or(ValueKind::Text, Column::kind);
            let collides = right_extra.contains(name);
            let output = if collides {
                format!("{name}{}", spec.suffix_left)
            } else {
                name.clone()
            };
            schema.push((output, kind));
        }
        for name in &right_extra {
            let kind = right.columns().get(name).map_or(ValueKind::Text, Column::kind);
            let collides = left_extra.contains(name) || pairs.iter().any(|(l, _)| l == name);
            let output = if collides {
                format!("{name}{}", spec.suffix_right)
            } else {
                name.clone()
            };
            schema.push((output, kind));
        }

        Ok(Self {
            pairs,
            left_extra,
            right_extra,
            schema,
        })
    }

    fn output_table(&self, left: &Table, right: &Table) -> Result<Table, InternalError> {
        let mut out = Table::new(format!("{}_{}", left.name(), right.name()));
        for (name, kind) in &self.schema {
            out.add_column(name.clone(), *kind)?;
        }

        Ok(out)
    }

    /// Assemble one output row; either side may be absent and is then
    /// NA-filled. Every cell is written; no output cell is ever left
    /// unset.
    fn output_row(
        &self,
        left: &Table,
        right: &Table,
        left_row: Option<RowId>,
        right_row: Option<RowId>,
    ) -> Result<Vec<Value>, InternalError> {
        let mut values = Vec::with_capacity(self.schema.len());

        for (left_name, right_name) in &self.pairs {
            let value = match (left_row, right_row) {
                (Some(row), _) => left.columns().value(left_name, row)?.clone(),
                (None, Some(row)) => right.columns().value(right_name, row)?.clone(),
                (None, None) => Value::Na,
            };
            values.push(value);
        }
        for name in &self.left_extra {
            let value = match left_row {
                Some(row) => left.columns().value(name, row)?.clone(),
                None => Value::Na,
            };
            values.push(value);
        }
        for name in &self.right_extra {
            let value = match right_row {
                Some(row) => right.columns().value(name, row)?.clone(),
                None => Value::Na,
            };
            values.push(value);
        }

        Ok(values)
    }
}

/// Compute the equi-join of two tables.
///
/// A `JoinTree` over the join columns groups the rows of both sides by key;
/// matched groups emit Cartesian products, unmatched rows emit once with the
/// other side NA-filled (for the kinds that keep them).
pub(crate) fn join(
    left: &Table,
    right: &Table,
    kind: JoinKind,
    spec: &JoinSpec,
) -> Result<Table, InternalError> {
    let layout = OutputLayout::plan(left, right, spec)?;
    let tree = JoinTree::build(left.columns(), right.columns(), &layout.pairs)?;
    let mut out = layout.output_table(left, right)?;

    let keep_left = matches!(kind, JoinKind::Left | JoinKind::Outer);
    let keep_right = matches!(kind, JoinKind::Right | JoinKind::Outer);

    if kind == JoinKind::Right {
        // anchor on the right side: every right row appears, in row order
        for right_row in 0..right.row_count() {
            let group = tree.group_for_right(right.columns(), right_row)?;
            if group.left.is_empty() {
                out.append_row(layout.output_row(left, right, None, Some(right_row))?)?;
            } else {
                for &left_row in &group.left {
                    out.append_row(layout.output_row(
                        left,
                        right,
                        Some(left_row),
                        Some(right_row),
                    )?)?;
                }
            }
        }
    } else {
        // left-anchored pass covers inner, left, and the left half of outer
        for left_row in 0..left.row_count() {
            let group = tree.group_for_left(left.columns(), left_row)?;
            if group.right.is_empty() {
                if keep_left {
                    out.append_row(layout.output_row(left, right, Some(left_row), None)?)?;
                }
            } else {
                for &right_row in &group.right {
                    out.append_row(layout.output_row(
                        left,
                        right,
                        Some(left_row),
                        Some(right_row),
                    )?)?;
                }
            }
        }

        if keep_right {
            // append right rows that matched nothing on the left
            for right_row in 0..right.row_count() {
                let group = tree.group_for_right(right.columns(), right_row)?;
                if group.left.is_empty() {
                    out.append_row(layout.output_row(left, right, None, Some(right_row))?)?;
                }
            }
        }
    }

    obs::record(MetricsEvent::JoinRowsEmitted {
        rows: out.row_count() as u64,
    });

    Ok(out)
}
