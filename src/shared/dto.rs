// Requests
pub mod task_form;
pub mod user_login_request;
pub mod user_register_request;

// Views
pub mod task_view;
