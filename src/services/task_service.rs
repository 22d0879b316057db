use chrono::Utc;
use tracing::{debug, warn};

use crate::data_access::data_context::DataContext;
use crate::data_access::repositories::{
    category_repository::CategoryRepository,
    priority_repository::PriorityRepository,
    task_repository::{NewTask, TaskChanges, TaskRepository},
};
use crate::services::service_error::ServiceError;
use crate::shared::models::{
    category::Category,
    priority::Priority,
    settings::Settings,
    task::{Task, TaskDraft},
    user::User,
};

#[derive(Clone)]
pub struct TaskService {
    tasks: TaskRepository,
    priorities: PriorityRepository,
    categories: CategoryRepository,
}

impl TaskService {
    pub fn new(context: DataContext) -> Self {
        Self {
            tasks: TaskRepository::new(context.clone()),
            priorities: PriorityRepository::new(context.clone()),
            categories: CategoryRepository::new(context),
        }
    }

    /// Seed reference data. Returns (priorities, categories) created.
    pub fn ensure_reference_data(&self, settings: &Settings) -> Result<(usize, usize), ServiceError> {
        let priorities = self.priorities.ensure_defaults(&settings.priorities)?;
        let categories = self.categories.ensure_defaults(&settings.categories)?;
        Ok((priorities, categories))
    }

    pub fn find_all_by_user(&self, user: &User) -> Result<Vec<Task>, ServiceError> {
        Ok(self.tasks.find_all_by_user(user.id)?)
    }

    pub fn find_completed_by_user(&self, user: &User) -> Result<Vec<Task>, ServiceError> {
        Ok(self.tasks.find_completed_by_user(user.id)?)
    }

    pub fn find_new_by_user(&self, user: &User) -> Result<Vec<Task>, ServiceError> {
        Ok(self.tasks.find_new_by_user(user.id)?)
    }

    pub fn find_by_id(&self, id: u64) -> Result<Option<Task>, ServiceError> {
        Ok(self.tasks.find_by_id(id)?)
    }

    /// The task, provided it exists and belongs to `user`.
    pub fn find_owned(&self, id: u64, user: &User) -> Result<Task, ServiceError> {
        let task = self
            .tasks
            .find_by_id(id)?
            .ok_or_else(|| ServiceError::NotFound(format!("task with id {id} not found")))?;
        if task.user_id != user.id {
            warn!(task_id = id, user_id = user.id, owner_id = task.user_id, "foreign task access rejected");
            return Err(ServiceError::AccessDenied("no access to this task".to_string()));
        }
        Ok(task)
    }

    pub fn create_task(
        &self,
        draft: TaskDraft,
        priority_id: Option<u64>,
        category_ids: &[u64],
    ) -> Result<Task, ServiceError> {
        debug!(?priority_id, ?category_ids, "creating task");

        let user_id = draft
            .user_id
            .ok_or_else(|| ServiceError::invalid("task must be assigned to a user"))?;
        let description = validate_description(&draft.description)?;
        self.validate_priority_id(priority_id)?;
        self.validate_category_ids(category_ids)?;

        let task = self.tasks.create_task(NewTask {
            description,
            created: Utc::now(),
            done: draft.done,
            user_id,
            priority_id,
            category_ids: category_ids.to_vec(),
        })?;
        Ok(task)
    }

    /// Returns whether a task was updated; false when the id is unknown.
    pub fn update_task(
        &self,
        draft: TaskDraft,
        priority_id: Option<u64>,
        category_ids: &[u64],
    ) -> Result<bool, ServiceError> {
        debug!(task_id = ?draft.id, ?priority_id, ?category_ids, "updating task");

        let id = draft
            .id
            .ok_or_else(|| ServiceError::invalid("task id must be set for update"))?;
        let description = validate_description(&draft.description)?;
        self.validate_priority_id(priority_id)?;
        self.validate_category_ids(category_ids)?;

        Ok(self.tasks.update_task(TaskChanges {
            id,
            description,
            done: draft.done,
            priority_id,
            category_ids: category_ids.to_vec(),
        })?)
    }

    pub fn complete_task(&self, id: u64) -> Result<bool, ServiceError> {
        Ok(self.tasks.complete_task(id)?)
    }

    pub fn delete_by_id(&self, id: u64) -> Result<bool, ServiceError> {
        Ok(self.tasks.delete_by_id(id)?)
    }

    pub fn get_all_priorities(&self) -> Result<Vec<Priority>, ServiceError> {
        Ok(self.priorities.find_all()?)
    }

    pub fn get_all_categories(&self) -> Result<Vec<Category>, ServiceError> {
        Ok(self.categories.find_all()?)
    }

    pub fn find_categories_by_ids(&self, ids: &[u64]) -> Result<Vec<Category>, ServiceError> {
        Ok(self.categories.find_by_ids(ids)?)
    }

    pub fn find_priority_by_id(&self, id: u64) -> Result<Option<Priority>, ServiceError> {
        Ok(self.priorities.find_by_id(id)?)
    }

    pub fn find_category_by_id(&self, id: u64) -> Result<Option<Category>, ServiceError> {
        Ok(self.categories.find_by_id(id)?)
    }

    pub fn priority_exists(&self, id: u64) -> Result<bool, ServiceError> {
        Ok(self.priorities.exists_by_id(id)?)
    }

    pub fn category_exists(&self, id: u64) -> Result<bool, ServiceError> {
        Ok(self.categories.exists_by_id(id)?)
    }

    fn validate_priority_id(&self, priority_id: Option<u64>) -> Result<(), ServiceError> {
        if let Some(id) = priority_id {
            if !self.priorities.exists_by_id(id)? {
                return Err(ServiceError::invalid(format!("priority with id {id} not found")));
            }
        }
        Ok(())
    }

    fn validate_category_ids(&self, category_ids: &[u64]) -> Result<(), ServiceError> {
        for &id in category_ids {
            if !self.categories.exists_by_id(id)? {
                return Err(ServiceError::invalid(format!("category with id {id} does not exist")));
            }
        }
        Ok(())
    }
}

fn validate_description(description: &str) -> Result<String, ServiceError> {
    let trimmed = description.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::invalid("description must not be empty"));
    }
    Ok(trimmed.to_string())
}
