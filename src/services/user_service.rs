use tracing::{debug, info};

use crate::authentication::auth::{hash_password, verify_password};
use crate::data_access::data_context::{DataContext, StoreError};
use crate::data_access::repositories::user_repository::UserRepository;
use crate::services::service_error::ServiceError;
use crate::shared::models::user::{NewUser, User};
use crate::util::timezone::{self, TimezoneOption};

/// Zones offered at the top of the registration form.
const POPULAR_TIMEZONES: &[&str] = &[
    "Europe/Moscow",
    "Europe/London",
    "Europe/Berlin",
    "Europe/Paris",
    "America/New_York",
    "America/Chicago",
    "America/Los_Angeles",
    "Asia/Tokyo",
    "Asia/Shanghai",
    "Asia/Kolkata",
    "Australia/Sydney",
    "UTC",
];

/// Raw registration input. The password is still in plain text here.
#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub name: String,
    pub login: String,
    pub password: String,
    pub timezone: Option<String>,
}

#[derive(Clone)]
pub struct UserService {
    users: UserRepository,
    default_timezone: String,
}

impl UserService {
    pub fn new(context: DataContext, default_timezone: impl Into<String>) -> Self {
        Self {
            users: UserRepository::new(context),
            default_timezone: default_timezone.into(),
        }
    }

    pub fn default_timezone(&self) -> &str {
        &self.default_timezone
    }

    pub fn register(&self, registration: Registration) -> Result<User, ServiceError> {
        let name = required(&registration.name, "name")?;
        let login = required(&registration.login, "login")?;
        if registration.password.is_empty() {
            return Err(ServiceError::invalid("password must not be empty"));
        }

        // Empty or unknown zones fall back to the server default.
        let timezone = registration
            .timezone
            .map(|tz| tz.trim().to_string())
            .filter(|tz| timezone::is_valid_timezone(tz))
            .unwrap_or_else(|| self.default_timezone.clone());

        let password_hash = hash_password(&registration.password)?;
        let user = self
            .users
            .create_user(NewUser {
                name,
                login: login.clone(),
                password_hash,
                timezone: Some(timezone),
            })
            .map_err(|e| match e {
                StoreError::UniqueViolation(_) => ServiceError::DuplicateLogin(login.clone()),
                other => ServiceError::Store(other),
            })?;

        info!(user_id = user.id, login = %user.login, "user registered");
        Ok(user)
    }

    /// The user with this login, if the password matches. A user without a
    /// stored timezone gets the default one assigned and saved.
    pub fn authenticate(&self, login: &str, password: &str) -> Result<Option<User>, ServiceError> {
        let Some(mut user) = self.users.find_by_login(login.trim())? else {
            debug!(login, "login attempt for unknown user");
            return Ok(None);
        };
        if !verify_password(password, &user.password_hash) {
            debug!(login, "login attempt with wrong password");
            return Ok(None);
        }

        if user.timezone.as_deref().map_or(true, str::is_empty) {
            user.timezone = Some(self.default_timezone.clone());
            self.users.update_user(&user)?;
        }
        Ok(Some(user))
    }

    pub fn find_by_id(&self, id: u64) -> Result<Option<User>, ServiceError> {
        Ok(self.users.find_by_id(id)?)
    }

    pub fn find_by_login(&self, login: &str) -> Result<Option<User>, ServiceError> {
        Ok(self.users.find_by_login(login)?)
    }

    pub fn find_all(&self) -> Result<Vec<User>, ServiceError> {
        Ok(self.users.find_all()?)
    }

    pub fn update(&self, user: &User) -> Result<bool, ServiceError> {
        self.users.update_user(user).map_err(|e| match e {
            StoreError::UniqueViolation(_) => ServiceError::DuplicateLogin(user.login.clone()),
            other => ServiceError::Store(other),
        })
    }

    pub fn delete_by_id(&self, id: u64) -> Result<bool, ServiceError> {
        Ok(self.users.delete_by_id(id)?)
    }

    /// Common zones with their current UTC offset, headed by an empty entry
    /// that stands for the server default.
    pub fn popular_timezones(&self) -> Vec<TimezoneOption> {
        std::iter::once(TimezoneOption::new(""))
            .chain(
                POPULAR_TIMEZONES
                    .iter()
                    .filter(|id| timezone::is_valid_timezone(id))
                    .map(|id| TimezoneOption::new(id)),
            )
            .collect()
    }

    pub fn all_timezones(&self) -> Vec<TimezoneOption> {
        timezone::all_timezones()
    }
}

fn required(value: &str, field: &str) -> Result<String, ServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::invalid(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}
