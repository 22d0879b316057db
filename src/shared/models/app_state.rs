use std::sync::Arc;

use crate::authentication::session::SessionStore;
use crate::data_access::data_context::DataContext;
use crate::services::{task_service::TaskService, user_service::UserService};
use crate::shared::models::settings::Settings;

pub struct AppState {
    pub task_service: TaskService,
    pub user_service: UserService,
    pub sessions: SessionStore,
    pub settings: Settings,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(settings: Settings, data_context: DataContext) -> Self {
        Self {
            task_service: TaskService::new(data_context.clone()),
            user_service: UserService::new(data_context, settings.default_timezone.clone()),
            sessions: SessionStore::new(&settings.session_secret, settings.session_expiration_in_minutes),
            settings,
        }
    }

    pub fn shared(self) -> SharedState {
        Arc::new(self)
    }
}
