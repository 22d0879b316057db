pub mod error_handler;
pub mod main_controller;
pub mod task_controller;
pub mod user_controller;
