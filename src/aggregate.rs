//! Stage counts for STATUS columns, feeding progress bars and funnels.

use crate::types::{Column, StageBreakdown, StageCount, Task};
use std::collections::HashMap;

/// Count tasks per option id of a STATUS column.
///
/// Every id in `known_option_ids` is present in the result, zero when no task
/// carries it. Tasks that are unset, or that reference an id outside
/// `known_option_ids`, are left out of every bucket.
pub fn count_by_status_column(
    tasks: &[Task],
    column_id: &str,
    known_option_ids: &[String],
) -> HashMap<String, usize> {
    let mut counts: HashMap<String, usize> =
        known_option_ids.iter().map(|id| (id.clone(), 0)).collect();

    for task in tasks {
        let Some(option_id) = task.value(column_id).and_then(|v| v.status_option()) else {
            continue;
        };
        if let Some(count) = counts.get_mut(option_id) {
            *count += 1;
        }
    }
    counts
}

/// Per-stage counts in the column's option order, with label and color.
pub fn stage_breakdown(column: &Column, tasks: &[Task]) -> StageBreakdown {
    let known = column.settings.option_ids();
    let counts = count_by_status_column(tasks, &column.id, &known);

    let stages: Vec<StageCount> = column
        .settings
        .options
        .iter()
        .map(|option| StageCount {
            option_id: option.id.clone(),
            label: option.label.clone(),
            color: option.color.clone(),
            count: counts.get(&option.id).copied().unwrap_or(0),
        })
        .collect();

    let counted: usize = stages.iter().map(|s| s.count).sum();
    StageBreakdown {
        column_id: column.id.clone(),
        stages,
        total_tasks: tasks.len(),
        excluded: tasks.len() - counted,
    }
}
