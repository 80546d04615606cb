//! Manual ordering of a task list.
//!
//! Dropping one task onto another moves it to that position, the rest shift
//! to make room, and every task in the list is renumbered from zero. The list
//! is updated in place before the server hears about it, so the view reflects
//! the drop immediately.

use super::{Task, TaskOrder};

/// Move `active_id` to the position of `over_id`.
///
/// Returns the new `[{id, order}]` assignment for every task in `tasks`, or
/// `None` when nothing moves (same task, or either id not in the list).
/// `tasks` may be a filtered view; only the tasks in it are renumbered.
pub fn move_task(tasks: &mut Vec<Task>, active_id: i64, over_id: i64) -> Option<Vec<TaskOrder>> {
    if active_id == over_id {
        return None;
    }
    let from = tasks.iter().position(|t| t.id == active_id)?;
    let to = tasks.iter().position(|t| t.id == over_id)?;

    let task = tasks.remove(from);
    tasks.insert(to, task);

    Some(renumber(tasks))
}

/// Assign `order = index` to every task and return the assignment.
pub fn renumber(tasks: &mut [Task]) -> Vec<TaskOrder> {
    tasks
        .iter_mut()
        .enumerate()
        .map(|(index, task)| {
            task.order = index as i32;
            TaskOrder { id: task.id, order: task.order }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::models::task::sample_task;

    fn list(ids: &[i64]) -> Vec<Task> {
        let due = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        ids.iter().map(|&id| sample_task(id, &format!("task {}", id), due)).collect()
    }

    fn order_of(tasks: &[Task]) -> Vec<i64> {
        tasks.iter().map(|t| t.id).collect()
    }

    #[test]
    fn moves_down() {
        let mut tasks = list(&[10, 20, 30, 40]);
        let orders = move_task(&mut tasks, 10, 30).unwrap();
        assert_eq!(order_of(&tasks), vec![20, 30, 10, 40]);
        assert_eq!(
            orders,
            vec![
                TaskOrder { id: 20, order: 0 },
                TaskOrder { id: 30, order: 1 },
                TaskOrder { id: 10, order: 2 },
                TaskOrder { id: 40, order: 3 },
            ]
        );
        assert_eq!(tasks[2].order, 2);
    }

    #[test]
    fn moves_up() {
        let mut tasks = list(&[10, 20, 30, 40]);
        move_task(&mut tasks, 40, 20).unwrap();
        assert_eq!(order_of(&tasks), vec![10, 40, 20, 30]);
    }

    #[test]
    fn same_position_is_a_no_op() {
        let mut tasks = list(&[10, 20]);
        assert!(move_task(&mut tasks, 10, 10).is_none());
        assert_eq!(order_of(&tasks), vec![10, 20]);
    }

    #[test]
    fn unknown_ids_are_ignored() {
        let mut tasks = list(&[10, 20]);
        assert!(move_task(&mut tasks, 10, 99).is_none());
        assert!(move_task(&mut tasks, 99, 10).is_none());
        assert_eq!(order_of(&tasks), vec![10, 20]);
    }
}
