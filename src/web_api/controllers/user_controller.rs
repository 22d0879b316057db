use axum::{extract::State, response::Response, Form};
use tera::Context;
use tracing::info;

use crate::authentication::filters::{RequestContext, RotatedSession, LOGIN_PATH};
use crate::authentication::session::FlashKind;
use crate::services::user_service::Registration;
use crate::shared::dto::{user_login_request::UserLoginRequest, user_register_request::UserRegisterRequest};
use crate::shared::models::app_state::SharedState;
use crate::web_api::controllers::error_handler::AppError;
use crate::web_api::controllers::task_controller::TASKS_PATH;
use crate::web_api::views;

pub struct UserController {}

impl UserController {
    pub async fn register_form(
        State(state): State<SharedState>,
        context: RequestContext,
    ) -> Result<Response, AppError> {
        let page = register_page(&state, &context, None, None);
        Ok(views::render("users/register.html", &page)?)
    }

    /// Failures re-render the form: a redirect back here would drop the
    /// session, and the flash with it.
    pub async fn register(
        State(state): State<SharedState>,
        context: RequestContext,
        Form(request): Form<UserRegisterRequest>,
    ) -> Result<Response, AppError> {
        match state.user_service.register(Registration::from(request.clone())) {
            Ok(user) => Ok(views::redirect_with_flash(
                LOGIN_PATH,
                FlashKind::Success,
                format!("Account {} created, please sign in", user.login),
            )),
            Err(e) if e.is_user_facing() => {
                let page = register_page(&state, &context, Some(&request), Some(e.to_string()));
                Ok(views::render("users/register.html", &page)?)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn login_form(context: RequestContext) -> Result<Response, AppError> {
        Ok(views::render("users/login.html", &views::page_context(&context))?)
    }

    pub async fn login(
        State(state): State<SharedState>,
        context: RequestContext,
        Form(request): Form<UserLoginRequest>,
    ) -> Result<Response, AppError> {
        let Some(user) = state.user_service.authenticate(&request.login, &request.password)? else {
            return Ok(views::redirect_with_flash(LOGIN_PATH, FlashKind::Error, "Invalid login or password"));
        };
        // A fresh session id on every sign-in; the pre-login id stops working.
        if let Some(previous) = context.session_id {
            state.sessions.invalidate(previous);
        }
        let session_id = state.sessions.create();
        if !state.sessions.login(session_id, user.id) {
            return Err(AppError::Unexpected("session vanished during login".to_string()));
        }

        info!(user_id = user.id, login = %user.login, "user signed in");
        let mut response =
            views::redirect_with_flash(TASKS_PATH, FlashKind::Message, format!("Welcome, {}", user.name));
        response.extensions_mut().insert(RotatedSession(session_id));
        Ok(response)
    }

    pub async fn logout(
        State(state): State<SharedState>,
        context: RequestContext,
    ) -> Response {
        if let Some(user) = &context.user {
            info!(user_id = user.id, "user signed out");
        }
        if let Some(session_id) = context.session_id {
            state.sessions.invalidate(session_id);
        }
        views::see_other(LOGIN_PATH)
    }
}

fn register_page(
    state: &SharedState,
    context: &RequestContext,
    request: Option<&UserRegisterRequest>,
    error: Option<String>,
) -> Context {
    let mut flash = context.flash.clone();
    if let Some(error) = error {
        flash.set(FlashKind::Error, error);
    }

    let mut page = views::page_context(context);
    page.insert("flash", &flash);
    page.insert("popular_timezones", &state.user_service.popular_timezones());
    page.insert("all_timezones", &state.user_service.all_timezones());
    page.insert("name", request.map_or("", |r| r.name.as_str()));
    page.insert("login", request.map_or("", |r| r.login.as_str()));
    page.insert("timezone", request.and_then(|r| r.timezone.as_deref()).unwrap_or(""));
    page
}
