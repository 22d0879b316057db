pub mod main_routes;
pub mod task_routes;
pub mod user_routes;

use axum::{middleware, Router};
use tower_http::{catch_panic::CatchPanicLayer, services::ServeDir, trace::TraceLayer};

use crate::app_state::SharedState;
use crate::authentication::filters::{authorization_filter, session_filter};
use crate::error_handler::{handle_panic, log_failures};

/// The whole application. The last layer added is the outermost, so a
/// request is guarded against panics, traced, authorized and only then
/// given its session.
pub fn map_routes(app_state: SharedState) -> Router {
    let static_dir = app_state.settings.static_dir.clone();

    Router::new()
        .merge(main_routes::get_router(app_state.clone()))
        .merge(task_routes::get_router(app_state.clone()))
        .merge(user_routes::get_router(app_state.clone()))
        .nest_service("/css", ServeDir::new(format!("{static_dir}/css")))
        .nest_service("/js", ServeDir::new(format!("{static_dir}/js")))
        .nest_service("/images", ServeDir::new(format!("{static_dir}/images")))
        .layer(middleware::from_fn_with_state(app_state.clone(), session_filter))
        .layer(middleware::from_fn_with_state(app_state, authorization_filter))
        .layer(middleware::from_fn(log_failures))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(handle_panic))
}
