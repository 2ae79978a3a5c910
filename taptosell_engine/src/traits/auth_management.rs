use thiserror::Error;

use crate::db_types::{Role, UserClaims};

/// Role and bearer-token management. A token maps to exactly one user; a user carries a set of
/// roles. Every route in the server layer is guarded by a role check built on top of this trait;
/// handlers themselves never re-check capabilities.
#[allow(async_fn_in_trait)]
pub trait AuthManagement: Clone {
    /// Resolve a bearer token into user claims, or `None` if the token is unknown.
    async fn claims_for_token(&self, token: &str) -> Result<Option<UserClaims>, AuthApiError>;

    async fn roles_for_user(&self, user_id: i64) -> Result<Vec<Role>, AuthApiError>;

    /// Succeeds only if the user carries the given role.
    async fn check_user_has_role(&self, user_id: i64, role: Role) -> Result<(), AuthApiError>;

    async fn assign_roles(&self, user_id: i64, roles: &[Role]) -> Result<(), AuthApiError>;

    /// Removes the given roles. Returns the number of roles actually removed.
    async fn remove_roles(&self, user_id: i64, roles: &[Role]) -> Result<u64, AuthApiError>;

    /// Stores a bearer token for the user. Tokens are opaque strings to the engine.
    async fn issue_token(&self, user_id: i64, token: &str) -> Result<(), AuthApiError>;
}

#[derive(Debug, Clone, Error)]
pub enum AuthApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("The bearer token is not recognised")]
    TokenNotFound,
    #[error("User {0} does not have the required role")]
    RoleNotFound(i64),
}

impl From<sqlx::Error> for AuthApiError {
    fn from(e: sqlx::Error) -> Self {
        AuthApiError::DatabaseError(e.to_string())
    }
}
