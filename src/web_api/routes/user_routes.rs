use std::sync::Arc;
use axum::{Router, routing::{get, post}};
use crate::{app_state::AppState, user_controller::UserController};

pub const ROUTER_PATH: &str = "/users";

pub fn get_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route(format!("{}/register", ROUTER_PATH).as_str(), get(UserController::register_form).post(UserController::register))
        .route(format!("{}/login", ROUTER_PATH).as_str(), get(UserController::login_form).post(UserController::login))
        .route(format!("{}/logout", ROUTER_PATH).as_str(), post(UserController::logout))
        .with_state(app_state)
}
