pub mod app_state;
pub mod category;
pub mod current_user;
pub mod priority;
pub mod settings;
pub mod task;
pub mod user;
