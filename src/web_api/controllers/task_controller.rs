use axum::{
    async_trait,
    extract::{FromRequestParts, Path, State},
    http::request::Parts,
    response::Response,
    Form,
};
use tracing::info;

use crate::authentication::filters::{AuthUser, RequestContext};
use crate::authentication::session::FlashKind;
use crate::services::service_error::ServiceError;
use crate::shared::dto::{
    task_form::TaskForm,
    task_view::{CategoryChoice, TaskView},
};
use crate::shared::models::{app_state::SharedState, task::Task, user::User};
use crate::web_api::controllers::error_handler::{AppError, RedirectOnRejection};
use crate::web_api::controllers::main_controller::{render_task_list, TaskListKind};
use crate::web_api::views;

pub const TASKS_PATH: &str = "/tasks";
const CREATE_PATH: &str = "/tasks/create";

fn edit_path(id: u64) -> String {
    format!("{TASKS_PATH}/edit/{id}")
}

/// The task, if it exists and belongs to `user`. Otherwise the caller is
/// sent back to the task list with the reason as an error flash.
pub fn validate_task_ownership(state: &SharedState, id: u64, user: &User) -> Result<Task, AppError> {
    state.task_service.find_owned(id, user).or_redirect(TASKS_PATH)
}

/// Task id taken from the path. A segment that is not a number names no task
/// and is answered like any other missing one.
#[derive(Debug, Clone, Copy)]
pub struct TaskId(pub u64);

#[async_trait]
impl<S> FromRequestParts<S> for TaskId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::Unexpected(rejection.body_text()))?;
        raw.parse().map(TaskId).map_err(|_| AppError::Rejected {
            to: TASKS_PATH.to_string(),
            message: format!("task with id {raw} not found"),
        })
    }
}

pub struct TaskController {}

impl TaskController {
    pub async fn list(
        State(state): State<SharedState>,
        context: RequestContext,
        AuthUser(user): AuthUser,
    ) -> Result<Response, AppError> {
        let tasks = state.task_service.find_all_by_user(&user)?;
        render_task_list(&context, tasks, TaskListKind::All)
    }

    pub async fn completed(
        State(state): State<SharedState>,
        context: RequestContext,
        AuthUser(user): AuthUser,
    ) -> Result<Response, AppError> {
        let tasks = state.task_service.find_completed_by_user(&user)?;
        render_task_list(&context, tasks, TaskListKind::Completed)
    }

    pub async fn new_tasks(
        State(state): State<SharedState>,
        context: RequestContext,
        AuthUser(user): AuthUser,
    ) -> Result<Response, AppError> {
        let tasks = state.task_service.find_new_by_user(&user)?;
        render_task_list(&context, tasks, TaskListKind::New)
    }

    pub async fn create_form(
        State(state): State<SharedState>,
        context: RequestContext,
        AuthUser(_user): AuthUser,
    ) -> Result<Response, AppError> {
        let mut page = views::page_context(&context);
        page.insert("priorities", &state.task_service.get_all_priorities()?);
        page.insert("categories", &CategoryChoice::list(state.task_service.get_all_categories()?, &[]));
        Ok(views::render("create.html", &page)?)
    }

    pub async fn create(
        State(state): State<SharedState>,
        AuthUser(user): AuthUser,
        Form(pairs): Form<Vec<(String, String)>>,
    ) -> Result<Response, AppError> {
        let form = TaskForm::from_pairs(pairs).or_redirect(CREATE_PATH)?;
        let task = state
            .task_service
            .create_task(form.draft(user.id), form.priority_id, &form.category_ids)
            .or_redirect(CREATE_PATH)?;

        info!(task_id = task.id, user_id = user.id, "task created");
        Ok(views::redirect_with_flash(TASKS_PATH, FlashKind::Success, "Task created"))
    }

    pub async fn details(
        State(state): State<SharedState>,
        context: RequestContext,
        AuthUser(user): AuthUser,
        TaskId(id): TaskId,
    ) -> Result<Response, AppError> {
        let task = validate_task_ownership(&state, id, &user)?;
        let mut page = views::page_context(&context);
        page.insert("task", &TaskView::new(task, &context.current_user.timezone));
        Ok(views::render("details.html", &page)?)
    }

    pub async fn edit_form(
        State(state): State<SharedState>,
        context: RequestContext,
        AuthUser(user): AuthUser,
        TaskId(id): TaskId,
    ) -> Result<Response, AppError> {
        let task = validate_task_ownership(&state, id, &user)?;
        let selected = task.category_ids();

        let mut page = views::page_context(&context);
        page.insert("priorities", &state.task_service.get_all_priorities()?);
        page.insert("categories", &CategoryChoice::list(state.task_service.get_all_categories()?, &selected));
        page.insert("task", &TaskView::new(task, &context.current_user.timezone));
        Ok(views::render("edit.html", &page)?)
    }

    /// `POST /tasks/edit/{id}`: the path names the task.
    pub async fn edit(
        State(state): State<SharedState>,
        AuthUser(user): AuthUser,
        TaskId(id): TaskId,
        Form(pairs): Form<Vec<(String, String)>>,
    ) -> Result<Response, AppError> {
        let mut form = TaskForm::from_pairs(pairs).or_redirect(&edit_path(id))?;
        form.id = Some(id);
        apply_update(&state, &user, form)
    }

    /// `POST /tasks/update`: the form names the task.
    pub async fn update(
        State(state): State<SharedState>,
        AuthUser(user): AuthUser,
        Form(pairs): Form<Vec<(String, String)>>,
    ) -> Result<Response, AppError> {
        let form = TaskForm::from_pairs(pairs).or_redirect(TASKS_PATH)?;
        apply_update(&state, &user, form)
    }

    pub async fn complete(
        State(state): State<SharedState>,
        AuthUser(user): AuthUser,
        TaskId(id): TaskId,
    ) -> Result<Response, AppError> {
        let task = validate_task_ownership(&state, id, &user)?;
        state.task_service.complete_task(task.id)?;
        Ok(views::redirect_with_flash(TASKS_PATH, FlashKind::Success, "Task marked as done"))
    }

    pub async fn delete(
        State(state): State<SharedState>,
        AuthUser(user): AuthUser,
        TaskId(id): TaskId,
    ) -> Result<Response, AppError> {
        let task = validate_task_ownership(&state, id, &user)?;
        state.task_service.delete_by_id(task.id)?;
        info!(task_id = task.id, user_id = user.id, "task deleted");
        Ok(views::redirect_with_flash(TASKS_PATH, FlashKind::Success, "Task deleted"))
    }
}

fn apply_update(state: &SharedState, user: &User, form: TaskForm) -> Result<Response, AppError> {
    let id = form
        .id
        .ok_or_else(|| ServiceError::invalid("task id must be set for update"))
        .or_redirect(TASKS_PATH)?;
    validate_task_ownership(state, id, user)?;

    let updated = state
        .task_service
        .update_task(form.draft(user.id), form.priority_id, &form.category_ids)
        .or_redirect(&edit_path(id))?;
    if !updated {
        return Err(AppError::Rejected {
            to: TASKS_PATH.to_string(),
            message: format!("task with id {id} not found"),
        });
    }
    Ok(views::redirect_with_flash(&format!("{TASKS_PATH}/{id}"), FlashKind::Success, "Task updated"))
}
