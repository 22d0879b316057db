
//---------------------------------------
pub mod web_api {
    pub mod routes;
    pub mod controllers;
    pub mod views;
}

pub use web_api::routes::map_routes;
pub use web_api::controllers::*;
//---------------------------------------

//---------------------------------------
pub mod shared {
    pub mod models;
    pub mod dto;
}

pub use shared::models::*;
pub use shared::dto::*;
//---------------------------------------

//---------------------------------------
pub mod services {
    pub mod service_error;
    pub mod task_service;
    pub mod user_service;
}
//---------------------------------------

//---------------------------------------
pub mod authentication {
    pub mod auth;
    pub mod filters;
    pub mod session;
}
//---------------------------------------

//---------------------------------------
pub mod data_access {
    pub mod data_context;
    pub mod repositories {
        pub mod category_repository;
        pub mod priority_repository;
        pub mod task_repository;
        pub mod user_repository;
    }
}
//---------------------------------------

//---------------------------------------
pub mod util {
    pub mod timezone;
}
//---------------------------------------
