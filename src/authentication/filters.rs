//! Request filters: who may reach which path, and the per-request session
//! context handed to controllers.
//!
//! The authorization filter runs first and only decides whether a request may
//! proceed. The session filter then resolves the session, loads the user and
//! drains pending flash messages into a `RequestContext`. After the handler it
//! stores any flash the response carries, creating a session only at that
//! point, and refreshes or clears the session cookie.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;
use uuid::Uuid;

use crate::authentication::session::{
    expired_session_cookie, session_cookie, session_token_from_headers, FlashMessages,
};
use crate::shared::models::{app_state::SharedState, current_user::CurrentUser, user::User};
use crate::web_api::controllers::error_handler::AppError;
use crate::web_api::views::{self, PendingFlash};

pub const LOGIN_PATH: &str = "/users/login";
pub const REGISTER_PATH: &str = "/users/register";

const PERMITTED_PREFIXES: &[&str] = &[REGISTER_PATH, LOGIN_PATH, "/css", "/js", "/images"];
const PERMITTED_PATHS: &[&str] = &["/", "/index"];
const PROTECTED_PREFIXES: &[&str] = &["/tasks"];
const PROTECTED_PATHS: &[&str] = &["/all", "/completed", "/new"];
const STATIC_PREFIXES: &[&str] = &["/css", "/js", "/images"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Permitted,
    Protected,
    Unlisted,
}

/// `prefix` itself or anything below it.
fn under(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

pub fn classify(path: &str) -> Access {
    if PERMITTED_PATHS.contains(&path) || PERMITTED_PREFIXES.iter().any(|p| under(path, p)) {
        Access::Permitted
    } else if PROTECTED_PATHS.contains(&path) || PROTECTED_PREFIXES.iter().any(|p| under(path, p)) {
        Access::Protected
    } else {
        Access::Unlisted
    }
}

fn is_static(path: &str) -> bool {
    STATIC_PREFIXES.iter().any(|p| under(path, p))
}

/// Session id resolved from the cookie, shared between the two filters.
#[derive(Debug, Clone, Copy)]
struct ResolvedSession(Option<Uuid>);

fn resolve_session(state: &SharedState, request: &mut Request) -> Option<Uuid> {
    if let Some(ResolvedSession(sid)) = request.extensions().get::<ResolvedSession>() {
        return *sid;
    }
    let sid = session_token_from_headers(request.headers()).and_then(|token| state.sessions.resolve(&token));
    request.extensions_mut().insert(ResolvedSession(sid));
    sid
}

pub async fn authorization_filter(
    State(state): State<SharedState>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    if classify(&path) != Access::Protected {
        return next.run(request).await;
    }

    let signed_in = resolve_session(&state, &mut request)
        .and_then(|sid| state.sessions.user_id(sid))
        .is_some();
    if !signed_in {
        debug!(%path, "anonymous request to protected path");
        return views::see_other(LOGIN_PATH);
    }
    next.run(request).await
}

/// Everything a controller needs to know about the session of this request.
/// `session_id` is `None` for visitors that have nothing stored yet.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub session_id: Option<Uuid>,
    pub user: Option<User>,
    pub current_user: CurrentUser,
    pub flash: FlashMessages,
}

/// Attached to a response by a handler that replaced the session, e.g. at
/// sign-in. The cookie is then issued for this session instead.
#[derive(Debug, Clone, Copy)]
pub struct RotatedSession(pub Uuid);

pub async fn session_filter(
    State(state): State<SharedState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = request.uri().path().to_string();
    if is_static(&path) {
        return Ok(next.run(request).await);
    }

    let had_cookie = session_token_from_headers(request.headers()).is_some();
    let session_id = match resolve_session(&state, &mut request) {
        Some(sid) if under(&path, REGISTER_PATH) => {
            debug!(%sid, "registration page drops the current session");
            state.sessions.invalidate(sid);
            None
        }
        resolved => resolved,
    };

    let user = match session_id.and_then(|sid| state.sessions.user_id(sid)) {
        Some(user_id) => state.user_service.find_by_id(user_id)?,
        None => None,
    };
    let default_timezone = state.settings.default_timezone.as_str();
    let current_user = match &user {
        Some(user) => CurrentUser::of(user, default_timezone),
        None => CurrentUser::guest(default_timezone),
    };
    let flash = session_id
        .map(|sid| state.sessions.take_flash(sid))
        .unwrap_or_default();

    request.extensions_mut().insert(RequestContext {
        session_id,
        user,
        current_user,
        flash,
    });

    let mut response = next.run(request).await;

    let mut session_id = session_id.filter(|sid| state.sessions.contains(*sid));
    if let Some(RotatedSession(sid)) = response.extensions_mut().remove::<RotatedSession>() {
        session_id = Some(sid);
    }
    // Anonymous visitors only get a session once there is something to keep.
    if let Some(PendingFlash(kind, message)) = response.extensions_mut().remove::<PendingFlash>() {
        let sid = *session_id.get_or_insert_with(|| state.sessions.create());
        state.sessions.push_flash(sid, kind, message);
    }

    let cookie = match session_id {
        Some(sid) => {
            let token = state.sessions.issue_token(sid)?;
            Some(session_cookie(&token, state.sessions.max_age_seconds()))
        }
        None if had_cookie => Some(expired_session_cookie()),
        None => None,
    };
    if let Some(value) = cookie.and_then(|c| HeaderValue::from_str(&c).ok()) {
        response.headers_mut().append(header::SET_COOKIE, value);
    }
    Ok(response)
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .ok_or_else(|| AppError::Unexpected("session filter did not run".to_string()))
    }
}

/// The signed-in user. Anonymous requests are sent to the login page.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let context = RequestContext::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;
        context
            .user
            .map(AuthUser)
            .ok_or_else(|| views::see_other(LOGIN_PATH))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_list() {
        for path in ["/", "/index", "/users/login", "/users/register", "/users/register/x", "/css/style.css", "/images/a.png", "/js/app.js"] {
            assert_eq!(classify(path), Access::Permitted, "{path}");
        }
    }

    #[test]
    fn protected_paths() {
        for path in ["/tasks", "/tasks/3", "/tasks/edit/3", "/all", "/completed", "/new"] {
            assert_eq!(classify(path), Access::Protected, "{path}");
        }
    }

    #[test]
    fn everything_else_is_unlisted() {
        for path in ["/users/logout", "/favicon.ico", "/taskslist", "/allx", "/new/thing"] {
            assert_eq!(classify(path), Access::Unlisted, "{path}");
        }
    }

    #[test]
    fn prefixes_match_whole_segments() {
        assert!(under("/users/register", REGISTER_PATH));
        assert!(under("/users/register/confirm", REGISTER_PATH));
        assert!(!under("/users/registered", REGISTER_PATH));
    }
}
