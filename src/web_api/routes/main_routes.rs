use std::sync::Arc;
use axum::{Router, routing::get};
use crate::{app_state::AppState, main_controller::MainController};

pub fn get_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(MainController::index))
        .route("/index", get(MainController::index))
        .route("/all", get(MainController::all))
        .route("/completed", get(MainController::completed))
        .route("/new", get(MainController::new_tasks))
        .with_state(app_state)
}
