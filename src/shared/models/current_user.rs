use serde::Serialize;

use super::user::User;

pub const GUEST_NAME: &str = "Guest";

/// What templates get to know about the person behind a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentUser {
    pub id: u64,
    pub name: String,
    pub timezone: String,
    pub guest: bool,
}

impl CurrentUser {
    pub fn guest(default_timezone: &str) -> Self {
        Self {
            id: 0,
            name: GUEST_NAME.to_string(),
            timezone: default_timezone.to_string(),
            guest: true,
        }
    }

    pub fn of(user: &User, default_timezone: &str) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            timezone: user
                .timezone
                .clone()
                .filter(|tz| !tz.is_empty())
                .unwrap_or_else(|| default_timezone.to_string()),
            guest: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(timezone: Option<&str>) -> User {
        User {
            id: 7,
            name: "Ann".into(),
            login: "ann".into(),
            password_hash: "x".into(),
            created: Utc::now(),
            timezone: timezone.map(String::from),
        }
    }

    #[test]
    fn guest_uses_sentinel_identity() {
        let guest = CurrentUser::guest("UTC");
        assert_eq!(guest.id, 0);
        assert_eq!(guest.name, GUEST_NAME);
        assert!(guest.guest);
    }

    #[test]
    fn user_without_timezone_gets_default() {
        assert_eq!(CurrentUser::of(&user(None), "Europe/Moscow").timezone, "Europe/Moscow");
        assert_eq!(CurrentUser::of(&user(Some("Asia/Tokyo")), "UTC").timezone, "Asia/Tokyo");
        assert!(!CurrentUser::of(&user(None), "UTC").guest);
    }
}
