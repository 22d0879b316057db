use axum::{extract::State, response::Response};

use crate::authentication::filters::{AuthUser, RequestContext};
use crate::shared::dto::task_view::TaskView;
use crate::shared::models::{app_state::SharedState, task::Task};
use crate::web_api::controllers::error_handler::AppError;
use crate::web_api::views;

/// Which tab of the list page is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskListKind {
    All,
    Completed,
    New,
}

impl TaskListKind {
    fn name(self) -> &'static str {
        match self {
            TaskListKind::All => "all",
            TaskListKind::Completed => "completed",
            TaskListKind::New => "new",
        }
    }

    fn title(self) -> &'static str {
        match self {
            TaskListKind::All => "All tasks",
            TaskListKind::Completed => "Completed tasks",
            TaskListKind::New => "New tasks",
        }
    }
}

pub struct MainController {}

impl MainController {
    /// `/` and `/index`. Guests see an empty list.
    pub async fn index(
        State(state): State<SharedState>,
        context: RequestContext,
    ) -> Result<Response, AppError> {
        let tasks = match &context.user {
            Some(user) => state.task_service.find_all_by_user(user)?,
            None => Vec::new(),
        };
        render_task_list(&context, tasks, TaskListKind::All)
    }

    pub async fn all(
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
}

pub fn render_task_list(
    context: &RequestContext,
    tasks: Vec<Task>,
    kind: TaskListKind,
) -> Result<Response, AppError> {
    let mut page = views::page_context(context);
    page.insert("tasks", &TaskView::list(tasks, &context.current_user.timezone));
    page.insert("filter", kind.name());
    page.insert("title", kind.title());
    Ok(views::render("index.html", &page)?)
}
