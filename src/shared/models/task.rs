use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{category::Category, priority::Priority};

/// A task with its associations loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub description: String,
    pub created: DateTime<Utc>,
    pub done: bool,
    pub user_id: u64,
    pub priority: Option<Priority>,
    pub categories: Vec<Category>,
}

impl Task {
    pub fn priority_id(&self) -> Option<u64> {
        self.priority.as_ref().map(|p| p.id)
    }

    pub fn category_ids(&self) -> Vec<u64> {
        self.categories.iter().map(|c| c.id).collect()
    }
}

/// The stored shape of a task. Associations live in their own tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRow {
    pub id: u64,
    pub description: String,
    pub created: DateTime<Utc>,
    pub done: bool,
    pub user_id: u64,
    pub priority_id: Option<u64>,
}

/// Scalar task fields as submitted by a caller. `id` is only set for updates,
/// `user_id` is filled in from the authenticated user.
#[derive(Debug, Clone, Default)]
pub struct TaskDraft {
    pub id: Option<u64>,
    pub description: String,
    pub done: bool,
    pub user_id: Option<u64>,
}
