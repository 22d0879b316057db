use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub login: String,
    pub password_hash: String,
    pub created: DateTime<Utc>,
    pub timezone: Option<String>,
}

/// A user that has not been stored yet. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub login: String,
    pub password_hash: String,
    pub timezone: Option<String>,
}

impl NewUser {
    pub fn into_user(self, id: u64) -> User {
        User {
            id,
            name: self.name,
            login: self.login,
            password_hash: self.password_hash,
            created: Utc::now(),
            timezone: self.timezone,
        }
    }
}
