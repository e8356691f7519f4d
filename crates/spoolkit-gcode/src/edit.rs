//! Edit scripts over line vectors.
//!
//! Normalization repairs are collected as insert/delete/replace operations
//! addressed by the indices of the *unedited* document, then applied in a
//! single pass from the end backward. Later edits never invalidate earlier
//! indices, so layer bookkeeping stays consistent without shifting offsets
//! around after every splice.

/// One edit operation, addressed in pre-edit line indices.
#[derive(Debug, Clone, PartialEq)]
pub enum EditOp {
    /// Insert a block of lines before line `at`.
    Insert { at: usize, lines: Vec<String> },
    /// Delete line `at`.
    Delete { at: usize },
    /// Replace line `at`.
    Replace { at: usize, line: String },
}

impl EditOp {
    fn at(&self) -> usize {
        match self {
            EditOp::Insert { at, .. } | EditOp::Delete { at } | EditOp::Replace { at, .. } => *at,
        }
    }

    /// Application order for operations at the same index: replace and
    /// delete act on the original line first, then inserts land in front
    /// of whatever remains.
    fn rank(&self) -> u8 {
        match self {
            EditOp::Replace { .. } => 0,
            EditOp::Delete { .. } => 1,
            EditOp::Insert { .. } => 2,
        }
    }
}

/// An ordered collection of edits applied in one backward pass.
#[derive(Debug, Clone, Default)]
pub struct EditScript {
    ops: Vec<EditOp>,
}

impl EditScript {
    /// Create an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a single line before `at`.
    pub fn insert(&mut self, at: usize, line: impl Into<String>) {
        self.ops.push(EditOp::Insert {
            at,
            lines: vec![line.into()],
        });
    }

    /// Insert a block of lines before `at`, preserving their order.
    pub fn insert_all(&mut self, at: usize, lines: Vec<String>) {
        if !lines.is_empty() {
            self.ops.push(EditOp::Insert { at, lines });
        }
    }

    /// Delete the line at `at`.
    pub fn delete(&mut self, at: usize) {
        self.ops.push(EditOp::Delete { at });
    }

    /// Replace the line at `at`.
    pub fn replace(&mut self, at: usize, line: impl Into<String>) {
        self.ops.push(EditOp::Replace {
            at,
            line: line.into(),
        });
    }

    /// Whether the script contains no operations.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Number of operations.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Apply all operations to `lines`, highest index first.
    pub fn apply(mut self, lines: &mut Vec<String>) {
        self.ops
            .sort_by(|a, b| b.at().cmp(&a.at()).then(a.rank().cmp(&b.rank())));
        for op in self.ops {
            match op {
                EditOp::Insert { at, lines: block } => {
                    let at = at.min(lines.len());
                    for (offset, line) in block.into_iter().enumerate() {
                        lines.insert(at + offset, line);
                    }
                }
                EditOp::Delete { at } => {
                    if at < lines.len() {
                        lines.remove(at);
                    }
                }
                EditOp::Replace { at, line } => {
                    if at < lines.len() {
                        lines[at] = line;
                    }
                }
            }
        }
    }
}
