//! Formatting helpers for terminal output.

use chrono::NaiveDate;
use tasklist_core::models::{Task, TaskStats, TaskStatus};

/// Width of the title column in task listings
pub const TITLE_WIDTH: usize = 40;

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Relative due date: "today", "in 3d", "2d overdue"
pub fn format_due(task: &Task, today: NaiveDate) -> String {
    let days = task.days_until_due(today);
    match days {
        0 => "today".to_string(),
        1 => "tomorrow".to_string(),
        d if d > 1 => format!("in {}d", d),
        d if task.status == TaskStatus::Completed => format!("{}d ago", -d),
        d => format!("{}d overdue", -d),
    }
}

pub fn status_marker(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Pending => "[ ]",
        TaskStatus::InProgress => "[~]",
        TaskStatus::Completed => "[x]",
    }
}

pub fn format_task_row(task: &Task, today: NaiveDate) -> String {
    format!(
        "{:>5} {} {:<6} {:<12} {}",
        task.id,
        status_marker(task.status),
        task.priority.to_string(),
        format_due(task, today),
        truncate_string(&task.title, TITLE_WIDTH)
    )
}

pub fn format_stats(stats: &TaskStats) -> String {
    format!(
        "{} tasks: {} completed ({}%), {} in progress, {} pending, {} overdue",
        stats.total_tasks,
        stats.completed_tasks,
        stats.completion_rate,
        stats.in_progress_tasks,
        stats.pending_tasks,
        stats.overdue_tasks
    )
}
