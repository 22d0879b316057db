use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use http_body_util::BodyExt;
use todo_server::{
    app_state::{AppState, SharedState},
    data_access::data_context::DataContext,
    map_routes,
    settings::Settings,
};
use tower::ServiceExt;

fn app_with_state() -> (Router, SharedState) {
    let state = AppState::new(Settings::default(), DataContext::open_in_memory().unwrap()).shared();
    state.task_service.ensure_reference_data(&state.settings).unwrap();
    (map_routes(state.clone()), state)
}

fn app() -> Router {
    app_with_state().0
}

async fn get(app: &Router, path: &str, cookie: Option<&str>) -> Response {
    let mut builder = Request::builder().uri(path);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    app.clone().oneshot(builder.body(Body::empty()).unwrap()).await.unwrap()
}

async fn post(app: &Router, path: &str, form: &str, cookie: Option<&str>) -> Response {
    let mut builder = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    app.clone().oneshot(builder.body(Body::from(form.to_string())).unwrap()).await.unwrap()
}

/// `todo_session=<token>` from the response, ready to send back.
fn session_cookie(response: &Response) -> String {
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("response sets the session cookie")
        .to_str()
        .unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

fn location(response: &Response) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Register `login` and sign in. Returns the session cookie.
async fn sign_in(app: &Router, login: &str) -> String {
    let registered = post(
        app,
        "/users/register",
        &format!("name={login}&login={login}&password=secret&timezone=UTC"),
        None,
    )
    .await;
    assert_eq!(registered.status(), StatusCode::SEE_OTHER);
    let cookie = session_cookie(&registered);

    let signed_in = post(app, "/users/login", &format!("login={login}&password=secret"), Some(&cookie)).await;
    assert_eq!(signed_in.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&signed_in), "/tasks");
    session_cookie(&signed_in)
}

#[tokio::test]
async fn protected_paths_redirect_anonymous_users() {
    let app = app();
    for path in ["/tasks", "/tasks/1", "/tasks/create", "/all", "/completed", "/new"] {
        let response = get(&app, path, None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(location(&response), "/users/login", "{path}");
    }
}

#[tokio::test]
async fn start_page_is_public() {
    let app = app();
    let response = get(&app, "/", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!response.headers().contains_key(header::SET_COOKIE));
    assert!(body_text(response).await.contains("Sign in to see your tasks"));
}

#[tokio::test]
async fn anonymous_browsing_stores_no_sessions() {
    let (app, state) = app_with_state();
    for _ in 0..50 {
        for path in ["/", "/favicon.ico", "/nope", "/users/login", "/users/register"] {
            let response = get(&app, path, None).await;
            assert!(!response.headers().contains_key(header::SET_COOKIE), "{path}");
        }
    }
    assert_eq!(state.sessions.len(), 0);

    // Something to remember creates one.
    let failed = post(&app, "/users/login", "login=ghost&password=x", None).await;
    assert_eq!(location(&failed), "/users/login");
    assert_eq!(state.sessions.len(), 1);
    let page = body_text(get(&app, "/users/login", Some(&session_cookie(&failed))).await).await;
    assert!(page.contains("Invalid login or password"));
}

#[tokio::test]
async fn registration_flash_is_shown_once() {
    let app = app();
    let registered = post(&app, "/users/register", "name=Ann&login=ann&password=pw&timezone=UTC", None).await;
    assert_eq!(location(&registered), "/users/login");
    let cookie = session_cookie(&registered);

    let first = body_text(get(&app, "/users/login", Some(&cookie)).await).await;
    assert!(first.contains("Account ann created"));

    let second = body_text(get(&app, "/users/login", Some(&cookie)).await).await;
    assert!(!second.contains("Account ann created"));
}

#[tokio::test]
async fn duplicate_registration_rerenders_form() {
    let app = app();
    post(&app, "/users/register", "name=Ann&login=ann&password=pw", None).await;
    let again = post(&app, "/users/register", "name=Other&login=ann&password=pw", None).await;

    assert_eq!(again.status(), StatusCode::OK);
    assert!(body_text(again).await.contains("login ann is already taken"));
}

#[tokio::test]
async fn wrong_password_is_rejected() {
    let app = app();
    let registered = post(&app, "/users/register", "name=Ann&login=ann&password=pw", None).await;
    let cookie = session_cookie(&registered);

    let response = post(&app, "/users/login", "login=ann&password=nope", Some(&cookie)).await;
    assert_eq!(location(&response), "/users/login");

    let page = body_text(get(&app, "/users/login", Some(&cookie)).await).await;
    assert!(page.contains("Invalid login or password"));
    assert_eq!(get(&app, "/tasks", Some(&cookie)).await.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn create_list_and_view_task() {
    let app = app();
    let cookie = sign_in(&app, "ann").await;

    let created = post(
        &app,
        "/tasks/create",
        "description=Buy+milk&priorityId=1&categoryIds=1&categoryIds=2",
        Some(&cookie),
    )
    .await;
    assert_eq!(created.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&created), "/tasks");

    let list = body_text(get(&app, "/tasks", Some(&cookie)).await).await;
    assert!(list.contains("Buy milk"));
    assert!(list.contains("Task created"));

    let details = get(&app, "/tasks/1", Some(&cookie)).await;
    assert_eq!(details.status(), StatusCode::OK);
    let details = body_text(details).await;
    assert!(details.contains("urgent"));
    assert!(details.contains("Work"));
    assert!(details.contains("Home"));
}

#[tokio::test]
async fn unknown_category_is_reported_and_nothing_is_stored() {
    let app = app();
    let cookie = sign_in(&app, "ann").await;

    let response = post(&app, "/tasks/create", "description=Nope&categoryIds=999", Some(&cookie)).await;
    assert_eq!(location(&response), "/tasks/create");

    let form = body_text(get(&app, "/tasks/create", Some(&cookie)).await).await;
    assert!(form.contains("category with id 999 does not exist"));
    assert!(!body_text(get(&app, "/tasks", Some(&cookie)).await).await.contains("Nope"));
}

#[tokio::test]
async fn foreign_tasks_are_off_limits() {
    let app = app();
    let ann = sign_in(&app, "ann").await;
    post(&app, "/tasks/create", "description=Secret+plan", Some(&ann)).await;

    let bob = sign_in(&app, "bob").await;
    for (method, path, form) in [
        ("GET", "/tasks/1", ""),
        ("GET", "/tasks/edit/1", ""),
        ("POST", "/tasks/edit/1", "description=Hijacked"),
        ("POST", "/tasks/update", "id=1&description=Hijacked"),
        ("POST", "/tasks/complete/1", ""),
        ("POST", "/tasks/delete/1", ""),
    ] {
        let response = if method == "GET" {
            get(&app, path, Some(&bob)).await
        } else {
            post(&app, path, form, Some(&bob)).await
        };
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(location(&response), "/tasks", "{path}");

        let page = body_text(get(&app, "/tasks", Some(&bob)).await).await;
        assert!(page.contains("no access to this task"), "{path}");
    }

    let still_there = body_text(get(&app, "/tasks/1", Some(&ann)).await).await;
    assert!(still_there.contains("Secret plan"));
    assert!(!still_there.contains("Hijacked"));
    assert!(still_there.contains("new"));
}

#[tokio::test]
async fn missing_task_redirects_with_not_found() {
    let app = app();
    let cookie = sign_in(&app, "ann").await;

    let response = get(&app, "/tasks/42", Some(&cookie)).await;
    assert_eq!(location(&response), "/tasks");
    let page = body_text(get(&app, "/tasks", Some(&cookie)).await).await;
    assert!(page.contains("task with id 42 not found"));
}

#[tokio::test]
async fn non_numeric_task_id_is_not_found() {
    let app = app();
    let cookie = sign_in(&app, "ann").await;

    for (method, path) in [
        ("GET", "/tasks/abc"),
        ("GET", "/tasks/edit/abc"),
        ("POST", "/tasks/complete/-1"),
        ("POST", "/tasks/delete/99999999999999999999"),
    ] {
        let response = if method == "GET" {
            get(&app, path, Some(&cookie)).await
        } else {
            post(&app, path, "", Some(&cookie)).await
        };
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(location(&response), "/tasks", "{path}");

        let page = body_text(get(&app, "/tasks", Some(&cookie)).await).await;
        assert!(page.contains("not found"), "{path}");
    }
}

#[tokio::test]
async fn complete_moves_task_between_lists() {
    let app = app();
    let cookie = sign_in(&app, "ann").await;
    post(&app, "/tasks/create", "description=Water+plants", Some(&cookie)).await;

    assert!(body_text(get(&app, "/tasks/new", Some(&cookie)).await).await.contains("Water plants"));

    let done = post(&app, "/tasks/complete/1", "", Some(&cookie)).await;
    assert_eq!(location(&done), "/tasks");

    assert!(!body_text(get(&app, "/new", Some(&cookie)).await).await.contains("Water plants"));
    assert!(body_text(get(&app, "/completed", Some(&cookie)).await).await.contains("Water plants"));
}

#[tokio::test]
async fn edit_replaces_fields_and_categories() {
    let app = app();
    let cookie = sign_in(&app, "ann").await;
    post(&app, "/tasks/create", "description=Draft&categoryIds=1", Some(&cookie)).await;

    let edited = post(
        &app,
        "/tasks/edit/1",
        "description=Final&done=true&priorityId=2&categoryIds=3",
        Some(&cookie),
    )
    .await;
    assert_eq!(location(&edited), "/tasks/1");

    let details = body_text(get(&app, "/tasks/1", Some(&cookie)).await).await;
    assert!(details.contains("Final"));
    assert!(details.contains("normal"));
    assert!(details.contains("Study"));
    assert!(!details.contains("Work"));
    assert!(details.contains("completed"));
}

#[tokio::test]
async fn update_takes_id_from_form() {
    let app = app();
    let cookie = sign_in(&app, "ann").await;
    post(&app, "/tasks/create", "description=Old", Some(&cookie)).await;

    let updated = post(&app, "/tasks/update", "id=1&description=Renamed", Some(&cookie)).await;
    assert_eq!(location(&updated), "/tasks/1");
    assert!(body_text(get(&app, "/tasks/1", Some(&cookie)).await).await.contains("Renamed"));

    let missing_id = post(&app, "/tasks/update", "description=Whatever", Some(&cookie)).await;
    assert_eq!(location(&missing_id), "/tasks");
}

#[tokio::test]
async fn delete_removes_task() {
    let app = app();
    let cookie = sign_in(&app, "ann").await;
    post(&app, "/tasks/create", "description=Temporary", Some(&cookie)).await;

    let deleted = post(&app, "/tasks/delete/1", "", Some(&cookie)).await;
    assert_eq!(location(&deleted), "/tasks");
    assert_eq!(location(&get(&app, "/tasks/1", Some(&cookie)).await), "/tasks");
}

#[tokio::test]
async fn sign_in_replaces_the_session() {
    let (app, state) = app_with_state();
    let registered = post(&app, "/users/register", "name=Ann&login=ann&password=pw", None).await;
    let before = session_cookie(&registered);

    let signed_in = post(&app, "/users/login", "login=ann&password=pw", Some(&before)).await;
    assert_eq!(location(&signed_in), "/tasks");
    let after = session_cookie(&signed_in);
    assert_ne!(before, after);
    assert_eq!(state.sessions.len(), 1);

    assert_eq!(location(&get(&app, "/tasks", Some(&before)).await), "/users/login");
    let list = body_text(get(&app, "/tasks", Some(&after)).await).await;
    assert!(list.contains("Welcome, Ann"));
}

#[tokio::test]
async fn logout_ends_the_session() {
    let app = app();
    let cookie = sign_in(&app, "ann").await;

    let response = post(&app, "/users/logout", "", Some(&cookie)).await;
    assert_eq!(location(&response), "/users/login");
    let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(set_cookie.contains("Max-Age=0"));

    assert_eq!(location(&get(&app, "/tasks", Some(&cookie)).await), "/users/login");
}

#[tokio::test]
async fn visiting_registration_drops_the_session() {
    let app = app();
    let cookie = sign_in(&app, "ann").await;
    assert_eq!(get(&app, "/tasks", Some(&cookie)).await.status(), StatusCode::OK);

    let page = get(&app, "/users/register", Some(&cookie)).await;
    assert_eq!(page.status(), StatusCode::OK);

    assert_eq!(location(&get(&app, "/tasks", Some(&cookie)).await), "/users/login");
}

#[tokio::test]
async fn tampered_cookie_is_cleared() {
    let (app, state) = app_with_state();
    let response = get(&app, "/", Some("todo_session=not-a-token")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(set_cookie.contains("Max-Age=0"));
    assert_eq!(state.sessions.len(), 0);
    assert_eq!(location(&get(&app, "/tasks", Some("todo_session=not-a-token")).await), "/users/login");
}
