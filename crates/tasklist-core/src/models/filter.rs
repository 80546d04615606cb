//! Dashboard filtering.
//!
//! The same filter is used two ways: as query parameters for `GET /tasks/`
//! and locally over an already-fetched list, so a view can narrow results
//! without another request.

use chrono::NaiveDate;

use super::{Priority, Task, TaskStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueWindow {
    Today,
    /// Today through the next seven days
    Upcoming,
    /// Past due and not completed
    Overdue,
}

impl DueWindow {
    pub fn as_str(&self) -> &'static str {
        match self {
            DueWindow::Today => "today",
            DueWindow::Upcoming => "upcoming",
            DueWindow::Overdue => "overdue",
        }
    }

    pub fn contains(&self, task: &Task, today: NaiveDate) -> bool {
        match self {
            DueWindow::Today => task.is_due_today(today),
            DueWindow::Upcoming => task.is_upcoming(today),
            DueWindow::Overdue => task.is_overdue(today),
        }
    }
}

impl std::str::FromStr for DueWindow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "today" => Ok(DueWindow::Today),
            "upcoming" => Ok(DueWindow::Upcoming),
            "overdue" => Ok(DueWindow::Overdue),
            other => Err(format!("unknown due window '{}'", other)),
        }
    }
}

/// `None` on any field means "all".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub due: Option<DueWindow>,
    pub search: Option<String>,
}

impl TaskFilter {
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_due(mut self, due: DueWindow) -> Self {
        self.due = Some(due);
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.priority.is_none() && self.due.is_none() && self.search_term().is_none()
    }

    /// Query parameters understood by the task list endpoint.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(status) = self.status {
            pairs.push(("status".to_string(), status.as_str().to_string()));
        }
        if let Some(priority) = self.priority {
            pairs.push(("priority".to_string(), priority.as_str().to_string()));
        }
        if let Some(due) = self.due {
            pairs.push(("due_date".to_string(), due.as_str().to_string()));
        }
        if let Some(search) = self.search_term() {
            pairs.push(("search".to_string(), search.to_string()));
        }
        pairs
    }

    pub fn matches(&self, task: &Task, today: NaiveDate) -> bool {
        if self.status.is_some_and(|status| task.status != status) {
            return false;
        }
        if self.priority.is_some_and(|priority| task.priority != priority) {
            return false;
        }
        if self.due.is_some_and(|due| !due.contains(task, today)) {
            return false;
        }
        if let Some(term) = self.search_term() {
            let term = term.to_lowercase();
            if !task.title.to_lowercase().contains(&term)
                && !task.description.to_lowercase().contains(&term)
            {
                return false;
            }
        }
        true
    }

    pub fn apply<'a>(&self, tasks: &'a [Task], today: NaiveDate) -> Vec<&'a Task> {
        tasks.iter().filter(|task| self.matches(task, today)).collect()
    }
}
