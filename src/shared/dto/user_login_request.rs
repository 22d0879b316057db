use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct UserLoginRequest {
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub password: String,
}
