use serde::Deserialize;

/// One step of an interactive bulk-edit session over a table of rows.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum RowEdit<R> {
    /// Appends the row, or inserts it before `index` when given.
    Insert {
        #[serde(default)]
        index: Option<usize>,
        row: R,
    },
    Update { index: usize, row: R },
    Remove { index: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("edit #{step}: row index {index} out of range (table has {len} rows)")]
pub struct EditError {
    pub step: usize,
    pub index: usize,
    pub len: usize,
}

/// Applies `edits` in order and returns the proposed rows. Nothing is validated
/// beyond index bounds; incomplete rows are dealt with at save time.
pub fn apply_edits<R>(mut rows: Vec<R>, edits: Vec<RowEdit<R>>) -> Result<Vec<R>, EditError> {
    for (step, edit) in edits.into_iter().enumerate() {
        let len = rows.len();
        match edit {
            RowEdit::Insert { index: None, row } => rows.push(row),
            RowEdit::Insert {
                index: Some(index),
                row,
            } => {
                if index > len {
                    return Err(EditError { step, index, len });
                }
                rows.insert(index, row);
            }
            RowEdit::Update { index, row } => match rows.get_mut(index) {
                Some(slot) => *slot = row,
                None => return Err(EditError { step, index, len }),
            },
            RowEdit::Remove { index } => {
                if index >= len {
                    return Err(EditError { step, index, len });
                }
                rows.remove(index);
            }
        }
    }
    Ok(rows)
}
