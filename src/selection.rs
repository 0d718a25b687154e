use crate::mapper::COL_SQUAD;
use crate::source::SourceRow;

pub const DEFAULT_TEAM_PREFIX: &str = "Manchester";
pub const DEFAULT_PRIORITY_QUOTA: usize = 5;
pub const DEFAULT_LOAD_TARGET: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionPolicy {
    pub team_prefix: String,
    pub priority_quota: usize,
    pub target: usize,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self {
            team_prefix: DEFAULT_TEAM_PREFIX.to_string(),
            priority_quota: DEFAULT_PRIORITY_QUOTA,
            target: DEFAULT_LOAD_TARGET,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection<'a> {
    pub rows: Vec<&'a SourceRow>,
    /// Leading entries of `rows` taken for their team prefix.
    pub priority: usize,
}

impl Selection<'_> {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Prefix-matching rows first (up to the quota), then non-matching rows until the target.
pub fn select_rows<'a>(rows: &'a [SourceRow], policy: &SelectionPolicy) -> Selection<'a> {
    let quota = policy.priority_quota.min(policy.target);
    let (priority, others): (Vec<&SourceRow>, Vec<&SourceRow>) = rows
        .iter()
        .partition(|row| team_has_prefix(row, &policy.team_prefix));

    let mut selected: Vec<&SourceRow> = priority.into_iter().take(quota).collect();
    let priority_count = selected.len();
    let remaining = policy.target - priority_count;
    selected.extend(others.into_iter().take(remaining));

    Selection {
        rows: selected,
        priority: priority_count,
    }
}

pub fn team_has_prefix(row: &SourceRow, prefix: &str) -> bool {
    row.get(COL_SQUAD)
        .is_some_and(|team| team.starts_with(prefix))
}
