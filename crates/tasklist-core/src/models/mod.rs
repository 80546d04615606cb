//! Data models for the tasklist service.
//!
//! - `Task`, `TaskStatus`, `Priority`: the task resource
//! - `TaskDraft`, `TaskPatch`: create/replace and partial update bodies
//! - `TaskFilter`: dashboard filtering, server-side and local
//! - `move_task`: manual reordering
//! - `User`, `Credentials`, `NewUser`: account types

pub mod filter;
pub mod reorder;
pub mod task;
pub mod user;

pub use filter::{DueWindow, TaskFilter};
pub use reorder::{move_task, renumber};
pub use task::{Priority, Task, TaskDraft, TaskOrder, TaskPatch, TaskStats, TaskStatus};
pub use user::{Credentials, NewUser, RegisteredUser, User};
