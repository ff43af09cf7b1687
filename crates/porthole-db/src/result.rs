/// Outcome of an insert: the assigned identifier in its textual form.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertOutcome {
    pub id: String,
}

/// Outcome of an update. `matched` is reported separately from `modified`
/// so a no-op update against a nonexistent id is visible to the caller
/// instead of silently "succeeding".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpdateOutcome {
    pub matched: u64,
    pub modified: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeleteOutcome {
    pub deleted: u64,
}
