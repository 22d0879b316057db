use std::sync::Arc;
use axum::{Router, routing::{get, post}};
use crate::{app_state::AppState, task_controller::TaskController};

pub const ROUTER_PATH: &str = "/tasks";

pub fn get_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route(ROUTER_PATH, get(TaskController::list))
        .route(format!("{}/completed", ROUTER_PATH).as_str(), get(TaskController::completed))
        .route(format!("{}/new", ROUTER_PATH).as_str(), get(TaskController::new_tasks))
        .route(format!("{}/create", ROUTER_PATH).as_str(), get(TaskController::create_form).post(TaskController::create))
        .route(format!("{}/update", ROUTER_PATH).as_str(), post(TaskController::update))
        .route(format!("{}/:id", ROUTER_PATH).as_str(), get(TaskController::details))
        .route(format!("{}/edit/:id", ROUTER_PATH).as_str(), get(TaskController::edit_form).post(TaskController::edit))
        .route(format!("{}/complete/:id", ROUTER_PATH).as_str(), post(TaskController::complete))
        .route(format!("{}/delete/:id", ROUTER_PATH).as_str(), post(TaskController::delete))
        .with_state(app_state)
}
