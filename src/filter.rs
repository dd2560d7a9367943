//! Search-box filtering over task names.

use crate::types::GroupView;

/// Keep tasks whose name contains `query`, case-insensitively.
///
/// Every group is returned, including ones left with no tasks, so group
/// headers stay visible while searching. An empty query returns the input.
pub fn filter_board(groups: &[GroupView], query: &str) -> Vec<GroupView> {
    if query.is_empty() {
        return groups.to_vec();
    }
    let needle = query.to_lowercase();

    groups
        .iter()
        .map(|g| GroupView {
            group: g.group.clone(),
            tasks: g
                .tasks
                .iter()
                .filter(|t| t.name.to_lowercase().contains(&needle))
                .cloned()
                .collect(),
        })
        .collect()
}
