use serde::Deserialize;

use crate::services::user_service::Registration;

#[derive(Debug, Clone, Deserialize)]
pub struct UserRegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub timezone: Option<String>,
}

impl From<UserRegisterRequest> for Registration {
    fn from(request: UserRegisterRequest) -> Self {
        Registration {
            name: request.name,
            login: request.login,
            password: request.password,
            timezone: request.timezone,
        }
    }
}
