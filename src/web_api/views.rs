//! Template rendering and redirect helpers shared by the controllers.

use std::sync::OnceLock;

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
};
use tera::{Context, Tera};
use tracing::error;

use crate::authentication::filters::RequestContext;
use crate::authentication::session::FlashKind;

static TERA: OnceLock<Tera> = OnceLock::new();

const TEMPLATES: &[(&str, &str)] = &[
    ("base.html", include_str!("../../templates/base.html")),
    ("index.html", include_str!("../../templates/index.html")),
    ("create.html", include_str!("../../templates/create.html")),
    ("edit.html", include_str!("../../templates/edit.html")),
    ("details.html", include_str!("../../templates/details.html")),
    ("error.html", include_str!("../../templates/error.html")),
    ("users/login.html", include_str!("../../templates/users/login.html")),
    ("users/register.html", include_str!("../../templates/users/register.html")),
];

/// Last resort when even the error template cannot be rendered.
const FALLBACK_ERROR_PAGE: &str = "<!DOCTYPE html><html><head><title>Error</title></head>\
<body><h1>Something went wrong</h1><p>Please try again later.</p><a href=\"/\">Home</a></body></html>";

pub const APOLOGY: &str = "Sorry, something went wrong on our side. Please try again later.";

fn engine() -> &'static Tera {
    TERA.get_or_init(|| {
        let mut tera = Tera::default();
        match tera.add_raw_templates(TEMPLATES.iter().copied()) {
            Ok(()) => tera,
            Err(e) => {
                error!(error = ?e, "failed to compile templates");
                Tera::default()
            }
        }
    })
}

/// A flash message the session filter stores once the handler has returned.
#[derive(Debug, Clone)]
pub struct PendingFlash(pub FlashKind, pub String);

/// Context every page gets: who is looking, and the flash messages of this request.
pub fn page_context(request_context: &RequestContext) -> Context {
    let mut context = Context::new();
    context.insert("current_user", &request_context.current_user);
    context.insert("flash", &request_context.flash);
    context
}

pub fn render(template: &str, context: &Context) -> Result<Response, tera::Error> {
    let body = engine().render(template, context)?;
    Ok(Html(body).into_response())
}

/// 303 to `location`.
pub fn see_other(location: &str) -> Response {
    let mut response = StatusCode::SEE_OTHER.into_response();
    if let Ok(value) = HeaderValue::from_str(location) {
        response.headers_mut().insert(header::LOCATION, value);
    }
    response
}

pub fn redirect_with_flash(location: &str, kind: FlashKind, message: impl Into<String>) -> Response {
    let mut response = see_other(location);
    response.extensions_mut().insert(PendingFlash(kind, message.into()));
    response
}

/// The generic apology page. Never fails.
pub fn error_page(status: StatusCode) -> Response {
    let mut context = Context::new();
    context.insert("message", APOLOGY);
    context.insert("status", &status.as_u16());
    let body = engine()
        .render("error.html", &context)
        .unwrap_or_else(|_| FALLBACK_ERROR_PAGE.to_string());
    (status, Html(body)).into_response()
}
