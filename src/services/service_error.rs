use thiserror::Error;

use crate::authentication::auth::AuthError;
use crate::data_access::data_context::StoreError;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Bad input or a reference to something that does not exist.
    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    AccessDenied(String),

    #[error("login {0} is already taken")]
    DuplicateLogin(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServiceError {
    pub fn invalid(message: impl Into<String>) -> Self {
        ServiceError::InvalidArgument(message.into())
    }

    /// Outcomes the user caused and can correct, as opposed to failures of
    /// the system itself.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            ServiceError::InvalidArgument(_)
                | ServiceError::NotFound(_)
                | ServiceError::AccessDenied(_)
                | ServiceError::DuplicateLogin(_)
        )
    }
}
