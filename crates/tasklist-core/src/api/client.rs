//! API client for the task resource.
//!
//! Every call goes through the `RequestGateway`, so credentials are attached,
//! refreshed and retried without the caller noticing.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{Task, TaskDraft, TaskFilter, TaskOrder, TaskPatch, TaskStats};

use super::{ApiError, ApiRequest, RequestGateway};

const TASKS_PATH: &str = "/tasks/";
const REORDER_PATH: &str = "/tasks/reorder/";
const STATS_PATH: &str = "/tasks/stats/";

/// The list endpoint answers with a bare array, or a page when pagination is on.
#[derive(Deserialize)]
#[serde(untagged)]
enum TaskListResponse {
    Paginated { results: Vec<Task> },
    Plain(Vec<Task>),
}

impl TaskListResponse {
    fn into_tasks(self) -> Vec<Task> {
        match self {
            TaskListResponse::Paginated { results } => results,
            TaskListResponse::Plain(tasks) => tasks,
        }
    }
}

#[derive(Serialize)]
struct ReorderRequest<'a> {
    task_orders: &'a [TaskOrder],
}

/// Clone is cheap - the gateway is shared behind an Arc.
#[derive(Clone)]
pub struct ApiClient {
    gateway: Arc<RequestGateway>,
}

impl ApiClient {
    pub fn new(gateway: Arc<RequestGateway>) -> Self {
        Self { gateway }
    }

    fn task_path(id: i64) -> String {
        format!("{}{}/", TASKS_PATH, id)
    }

    async fn execute<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let response = self.gateway.send(request).await?.error_for_status()?;
        response.json()
    }

    /// For endpoints whose body we don't need (DELETE answers 204).
    async fn execute_empty(&self, request: ApiRequest) -> Result<(), ApiError> {
        self.gateway.send(request).await?.error_for_status()?;
        Ok(())
    }

    // ===== Tasks =====

    /// Fetch the user's tasks, filtered server-side.
    pub async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>, ApiError> {
        let request = ApiRequest::get(TASKS_PATH).query(filter.query_pairs());
        let tasks = self.execute::<TaskListResponse>(request).await?.into_tasks();
        debug!(count = tasks.len(), "Fetched tasks");
        Ok(tasks)
    }

    pub async fn get_task(&self, id: i64) -> Result<Task, ApiError> {
        self.execute(ApiRequest::get(Self::task_path(id))).await
    }

    pub async fn create_task(&self, draft: &TaskDraft) -> Result<Task, ApiError> {
        self.execute(ApiRequest::post(TASKS_PATH, draft)?).await
    }

    /// Replace every editable field of a task.
    pub async fn update_task(&self, id: i64, draft: &TaskDraft) -> Result<Task, ApiError> {
        self.execute(ApiRequest::put(Self::task_path(id), draft)?).await
    }

    pub async fn patch_task(&self, id: i64, patch: &TaskPatch) -> Result<Task, ApiError> {
        self.execute(ApiRequest::patch(Self::task_path(id), patch)?).await
    }

    /// Move a task to the next status in the pending/in progress/completed cycle.
    pub async fn advance_status(&self, task: &Task) -> Result<Task, ApiError> {
        self.patch_task(task.id, &TaskPatch::status(task.status.next())).await
    }

    pub async fn delete_task(&self, id: i64) -> Result<(), ApiError> {
        self.execute_empty(ApiRequest::delete(Self::task_path(id))).await
    }

    /// Persist a manual ordering. Ids the server doesn't own are skipped there.
    pub async fn reorder_tasks(&self, orders: &[TaskOrder]) -> Result<(), ApiError> {
        let request = ApiRequest::patch(REORDER_PATH, &ReorderRequest { task_orders: orders })?;
        self.execute_empty(request).await
    }

    pub async fn stats(&self) -> Result<TaskStats, ApiError> {
        self.execute(ApiRequest::get(STATS_PATH)).await
    }

    /// Tasks and stats together, fetched concurrently.
    pub async fn dashboard(&self, filter: &TaskFilter) -> Result<(Vec<Task>, TaskStats), ApiError> {
        futures::try_join!(self.list_tasks(filter), self.stats())
    }
}
