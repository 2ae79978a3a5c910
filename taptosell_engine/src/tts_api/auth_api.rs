use std::fmt::Debug;

use log::debug;
use rand::{distributions::Alphanumeric, Rng};

use crate::{
    db_types::{Role, UserClaims},
    traits::{AuthApiError, AuthManagement},
};

/// The `AuthApi` resolves access tokens into user claims and manages user roles.
pub struct AuthApi<B> {
    db: B,
}

impl<B: Debug> Debug for AuthApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AuthApi ({:?})", self.db)
    }
}

impl<B> AuthApi<B>
where B: AuthManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Resolve a bearer token into the claims (user id and roles) it represents.
    pub async fn authenticate_token(&self, token: &str) -> Result<UserClaims, AuthApiError> {
        match self.db.claims_for_token(token).await? {
            Some(claims) => Ok(claims),
            None => Err(AuthApiError::TokenNotFound),
        }
    }

    pub async fn roles_for_user(&self, user_id: i64) -> Result<Vec<Role>, AuthApiError> {
        self.db.roles_for_user(user_id).await
    }

    pub async fn check_user_has_role(&self, user_id: i64, role: Role) -> Result<(), AuthApiError> {
        self.db.check_user_has_role(user_id, role).await
    }

    pub async fn assign_roles(&self, user_id: i64, roles: &[Role]) -> Result<(), AuthApiError> {
        self.db.assign_roles(user_id, roles).await
    }

    pub async fn remove_roles(&self, user_id: i64, roles: &[Role]) -> Result<u64, AuthApiError> {
        self.db.remove_roles(user_id, roles).await
    }

    /// Mint a fresh random token for the user and store it. The token string is the only copy; it
    /// is returned to the caller once.
    pub async fn issue_token(&self, user_id: i64) -> Result<String, AuthApiError> {
        let token: String = rand::thread_rng().sample_iter(&Alphanumeric).take(48).map(char::from).collect();
        self.db.issue_token(user_id, &token).await?;
        debug!("🔑️ New access token issued for user #{user_id}");
        Ok(token)
    }
}
