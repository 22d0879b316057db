use std::any::Any;

use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::authentication::auth::AuthError;
use crate::authentication::session::FlashKind;
use crate::data_access::data_context::StoreError;
use crate::services::service_error::ServiceError;
use crate::web_api::views;

#[derive(Debug, Error)]
pub enum AppError {
    /// Something the user can fix: go back to `to` and show `message`.
    #[error("{message}")]
    Rejected { to: String, message: String },

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("template error: {0:?}")]
    Template(#[from] tera::Error),

    #[error("{0}")]
    Unexpected(String),
}

/// Cause of a failed request, attached to the response for `log_failures`.
#[derive(Debug, Clone)]
pub struct FailureCause(pub String);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Rejected { to, message } => views::redirect_with_flash(&to, FlashKind::Error, message),
            other => {
                let mut response = views::error_page(StatusCode::INTERNAL_SERVER_ERROR);
                response.extensions_mut().insert(FailureCause(other.to_string()));
                response
            }
        }
    }
}

pub trait RedirectOnRejection<T> {
    /// User-facing service outcomes become a redirect to `to` with an error
    /// flash; everything else stays a failure.
    fn or_redirect(self, to: &str) -> Result<T, AppError>;
}

impl<T> RedirectOnRejection<T> for Result<T, ServiceError> {
    fn or_redirect(self, to: &str) -> Result<T, AppError> {
        self.map_err(|e| {
            if e.is_user_facing() {
                AppError::Rejected { to: to.to_string(), message: e.to_string() }
            } else {
                AppError::Service(e)
            }
        })
    }
}

pub async fn log_failures(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let response = next.run(request).await;
    if let Some(FailureCause(cause)) = response.extensions().get::<FailureCause>() {
        error!(%method, %path, %cause, "request failed");
    }
    response
}

/// Used by `CatchPanicLayer`: log the panic and show the apology page.
pub fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    error!(panic = %detail, "handler panicked");
    views::error_page(StatusCode::INTERNAL_SERVER_ERROR)
}
