use serde::Serialize;

use crate::shared::models::{category::Category, priority::Priority, task::Task};
use crate::util::timezone::format_date_time;

/// A task as the templates see it, with `created` already formatted for
/// the viewer's zone.
#[derive(Debug, Clone, Serialize)]
pub struct TaskView {
    pub id: u64,
    pub description: String,
    pub created: String,
    pub done: bool,
    pub priority: Option<Priority>,
    pub categories: Vec<Category>,
    pub category_ids: Vec<u64>,
}

impl TaskView {
    pub fn new(task: Task, timezone: &str) -> Self {
        Self {
            created: format_date_time(Some(&task.created), Some(timezone)),
            category_ids: task.category_ids(),
            id: task.id,
            description: task.description,
            done: task.done,
            priority: task.priority,
            categories: task.categories,
        }
    }

    pub fn list(tasks: Vec<Task>, timezone: &str) -> Vec<TaskView> {
        tasks.into_iter().map(|task| TaskView::new(task, timezone)).collect()
    }
}

/// A category checkbox on the create and edit forms.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryChoice {
    pub id: u64,
    pub name: String,
    pub selected: bool,
}

impl CategoryChoice {
    pub fn list(categories: Vec<Category>, selected: &[u64]) -> Vec<CategoryChoice> {
        categories
            .into_iter()
            .map(|category| CategoryChoice {
                selected: selected.contains(&category.id),
                id: category.id,
                name: category.name,
            })
            .collect()
    }
}
