use crate::{column::Columns, error::InternalError, index::RowId, trie::Trie, value::Value};

///
/// MatchGroup
///
/// Leaf payload of the join tree: the rows from each side that share one
/// join-key path. A leaf reached from both sides is a matched group; the
/// Cartesian product of its two lists is exactly the equi-join output for
/// that key.
///

#[derive(Debug, Default)]
pub(crate) struct MatchGroup {
    pub left: Vec<RowId>,
    pub right: Vec<RowId>,
}

impl MatchGroup {
    #[cfg(test)]
    const fn is_empty(&self) -> bool {
        self.left.is_empty() && self.right.is_empty()
    }
}

///
/// JoinTree
///
/// The shared-trie equi-join matcher: one trie keyed by the ordered
/// join-column values, populated once from each table's rows. Transient:
/// built per join invocation and discarded after materialization.
///

#[derive(Debug)]
pub(crate) struct JoinTree {
    trie: Trie<MatchGroup>,
    left_key_columns: Vec<String>,
    right_key_columns: Vec<String>,
}

impl JoinTree {
    /// Build the matcher from both tables' rows. Join columns are assumed
    /// validated by the caller.
    pub(crate) fn build(
        left: &Columns,
        right: &Columns,
        pairs: &[(String, String)],
    ) -> Result<Self, InternalError> {
        let mut tree = Self {
            trie: Trie::new(),
            left_key_columns: pairs.iter().map(|(l, _)| l.clone()).collect(),
            right_key_columns: pairs.iter().map(|(_, r)| r.clone()).collect(),
        };

        for row in 0..left.row_count() {
            let path = key_path(left, &tree.left_key_columns, row)?;
            let leaf = tree.trie.insert_path(&path);
            tree.trie.payload_mut(leaf).left.push(row);
        }
        for row in 0..right.row_count() {
            let path = key_path(right, &tree.right_key_columns, row)?;
            let leaf = tree.trie.insert_path(&path);
            tree.trie.payload_mut(leaf).right.push(row);
        }

        Ok(tree)
    }

    /// Matched group of one left-side row.
    pub(crate) fn group_for_left(
        &self,
        left: &Columns,
        row: RowId,
    ) -> Result<&MatchGroup, InternalError> {
        self.group_for(left, &self.left_key_columns, row)
    }

    /// Matched group of one right-side row.
    pub(crate) fn group_for_right(
        &self,
        right: &Columns,
        row: RowId,
    ) -> Result<&MatchGroup, InternalError> {
        self.group_for(right, &self.right_key_columns, row)
    }

    fn group_for(
        &self,
        data: &Columns,
        key_columns: &[String],
        row: RowId,
    ) -> Result<&MatchGroup, InternalError> {
        let path = key_path(data, key_columns, row)?;
        let leaf = self.trie.find_path(&path).ok_or_else(|| {
            InternalError::index_invariant(format!(
                "join tree lost the key path of row {row}; the tree must index every row it was built from"
            ))
        })?;

        Ok(self.trie.payload(leaf))
    }

    /// Visit every non-empty match group.
    #[cfg(test)]
    pub(crate) fn for_each_group(&self, mut visit: impl FnMut(&MatchGroup)) {
        self.trie.for_each(|group: &MatchGroup| {
            if !group.is_empty() {
                visit(group);
            }
        });
    }
}

fn key_path(
    data: &Columns,
    key_columns: &[String],
    row: RowId,
) -> Result<Vec<Value>, InternalError> {
    let mut path = Vec::with_capacity(key_columns.len());
    for column in key_columns {
        path.push(data.value(column, row)?.clone());
    }

    Ok(path)
}
