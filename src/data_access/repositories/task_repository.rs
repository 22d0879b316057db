//! Task rows plus their priority and category associations.
//!
//! Associations are loaded eagerly: every `Task` leaving this module carries
//! its priority and categories. The category set is only ever replaced as a
//! whole (`replace_categories`, inside the create or update transaction),
//! never diffed.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use redb::{ReadTransaction, ReadableMultimapTable, WriteTransaction};

use crate::data_access::data_context::{
    encode, get_row, next_id, scan_rows, DataContext, StoreError, CATEGORIES_TABLE,
    PRIORITIES_TABLE, TASKS_TABLE, TASK_CATEGORIES,
};
use crate::data_access::repositories::category_repository::sort_by_name;
use crate::shared::models::{
    category::Category,
    priority::Priority,
    task::{Task, TaskRow},
};

/// Everything needed to store a new task.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub description: String,
    pub created: DateTime<Utc>,
    pub done: bool,
    pub user_id: u64,
    pub priority_id: Option<u64>,
    pub category_ids: Vec<u64>,
}

/// Replacement values for an existing task. Owner and creation time are kept.
#[derive(Debug, Clone)]
pub struct TaskChanges {
    pub id: u64,
    pub description: String,
    pub done: bool,
    pub priority_id: Option<u64>,
    pub category_ids: Vec<u64>,
}

/// Which slice of a user's tasks to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoneFilter {
    All,
    Completed,
    New,
}

impl DoneFilter {
    fn accepts(self, done: bool) -> bool {
        match self {
            DoneFilter::All => true,
            DoneFilter::Completed => done,
            DoneFilter::New => !done,
        }
    }
}

#[derive(Clone)]
pub struct TaskRepository {
    context: DataContext,
}

impl TaskRepository {
    pub fn new(context: DataContext) -> Self {
        Self { context }
    }

    pub fn find_by_id(&self, id: u64) -> Result<Option<Task>, StoreError> {
        self.context.read(|txn| {
            let tasks = txn.open_table(TASKS_TABLE)?;
            match get_row::<TaskRow, _>(&tasks, id)? {
                Some(row) => Ok(load_associations(txn, vec![row])?.pop()),
                None => Ok(None),
            }
        })
    }

    /// A user's tasks, newest first.
    pub fn find_by_user(&self, user_id: u64, filter: DoneFilter) -> Result<Vec<Task>, StoreError> {
        self.context.read(|txn| {
            let tasks = txn.open_table(TASKS_TABLE)?;
            let mut rows: Vec<TaskRow> =
                scan_rows(&tasks, |t: &TaskRow| t.user_id == user_id && filter.accepts(t.done))?;
            rows.sort_by(|a, b| b.created.cmp(&a.created).then(b.id.cmp(&a.id)));
            load_associations(txn, rows)
        })
    }

    pub fn find_all_by_user(&self, user_id: u64) -> Result<Vec<Task>, StoreError> {
        self.find_by_user(user_id, DoneFilter::All)
    }

    pub fn find_completed_by_user(&self, user_id: u64) -> Result<Vec<Task>, StoreError> {
        self.find_by_user(user_id, DoneFilter::Completed)
    }

    pub fn find_new_by_user(&self, user_id: u64) -> Result<Vec<Task>, StoreError> {
        self.find_by_user(user_id, DoneFilter::New)
    }

    /// Store the task row and its category links in one transaction.
    pub fn create_task(&self, new_task: NewTask) -> Result<Task, StoreError> {
        let id = self.context.tx(|txn| {
            let id = next_id(txn, "tasks")?;
            let row = TaskRow {
                id,
                description: new_task.description,
                created: new_task.created,
                done: new_task.done,
                user_id: new_task.user_id,
                priority_id: new_task.priority_id,
            };
            let mut tasks = txn.open_table(TASKS_TABLE)?;
            tasks.insert(id, encode(&row)?.as_slice())?;
            replace_categories(txn, id, &new_task.category_ids)?;
            Ok(id)
        })?;

        self.find_by_id(id)?
            .ok_or_else(|| StoreError::Decode(format!("task {id} vanished after insert")))
    }

    /// Replace scalar fields, priority and the full category set.
    /// Returns false when the task does not exist.
    pub fn update_task(&self, changes: TaskChanges) -> Result<bool, StoreError> {
        self.context.tx(|txn| {
            let mut tasks = txn.open_table(TASKS_TABLE)?;
            let Some(mut row) = get_row::<TaskRow, _>(&tasks, changes.id)? else {
                return Ok(false);
            };
            row.description = changes.description;
            row.done = changes.done;
            row.priority_id = changes.priority_id;
            tasks.insert(row.id, encode(&row)?.as_slice())?;
            replace_categories(txn, row.id, &changes.category_ids)?;
            Ok(true)
        })
    }

    /// Blind `done = true`. Returns whether a row matched.
    pub fn complete_task(&self, id: u64) -> Result<bool, StoreError> {
        self.context.execute_update(TASKS_TABLE, id, |row: &mut TaskRow| row.done = true)
    }

    /// Remove the task and its category links.
    pub fn delete_by_id(&self, id: u64) -> Result<bool, StoreError> {
        self.context.tx(|txn| {
            let mut tasks = txn.open_table(TASKS_TABLE)?;
            let removed = tasks.remove(id)?.is_some();
            if removed {
                let mut links = txn.open_multimap_table(TASK_CATEGORIES)?;
                links.remove_all(id)?;
            }
            Ok(removed)
        })
    }
}

/// Drop every existing category link of the task and store `category_ids`
/// instead. Runs inside the caller's transaction.
fn replace_categories(txn: &WriteTransaction, task_id: u64, category_ids: &[u64]) -> Result<(), StoreError> {
    let mut links = txn.open_multimap_table(TASK_CATEGORIES)?;
    links.remove_all(task_id)?;
    let unique: BTreeSet<u64> = category_ids.iter().copied().collect();
    for category_id in unique {
        links.insert(task_id, category_id)?;
    }
    Ok(())
}

fn load_associations(txn: &ReadTransaction, rows: Vec<TaskRow>) -> Result<Vec<Task>, StoreError> {
    let priorities = txn.open_table(PRIORITIES_TABLE)?;
    let categories = txn.open_table(CATEGORIES_TABLE)?;
    let links = txn.open_multimap_table(TASK_CATEGORIES)?;

    let mut loaded = Vec::with_capacity(rows.len());
    for row in rows {
        let priority = match row.priority_id {
            Some(priority_id) => get_row::<Priority, _>(&priorities, priority_id)?,
            None => None,
        };

        let mut task_categories = Vec::new();
        for link in links.get(row.id)? {
            let category_id = link?.value();
            if let Some(category) = get_row::<Category, _>(&categories, category_id)? {
                task_categories.push(category);
            }
        }
        sort_by_name(&mut task_categories);

        loaded.push(Task {
            id: row.id,
            description: row.description,
            created: row.created,
            done: row.done,
            user_id: row.user_id,
            priority,
            categories: task_categories,
        });
    }
    Ok(loaded)
}
