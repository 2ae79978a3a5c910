use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{Role, UserClaims},
    traits::AuthApiError,
};

pub async fn claims_for_token(token: &str, conn: &mut SqliteConnection) -> Result<Option<UserClaims>, AuthApiError> {
    let row: Option<(i64,)> =
        sqlx::query_as("SELECT user_id FROM access_tokens WHERE token = $1").bind(token).fetch_optional(&mut *conn).await?;
    let Some((user_id,)) = row else {
        return Ok(None);
    };
    let roles = roles_for_user(user_id, conn).await?;
    Ok(Some(UserClaims { user_id, roles }))
}

pub async fn roles_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Role>, AuthApiError> {
    let roles: Vec<(Role,)> = sqlx::query_as("SELECT role FROM user_roles WHERE user_id = $1 ORDER BY role ASC")
        .bind(user_id)
        .fetch_all(conn)
        .await?;
    Ok(roles.into_iter().map(|(r,)| r).collect())
}

pub async fn user_has_role(user_id: i64, role: Role, conn: &mut SqliteConnection) -> Result<(), AuthApiError> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM user_roles WHERE user_id = $1 AND role = $2 LIMIT 1")
        .bind(user_id)
        .bind(role)
        .fetch_optional(conn)
        .await?;
    match row {
        Some(_) => Ok(()),
        None => Err(AuthApiError::RoleNotFound(user_id)),
    }
}

pub async fn assign_roles(user_id: i64, roles: &[Role], conn: &mut SqliteConnection) -> Result<(), AuthApiError> {
    for role in roles {
        sqlx::query("INSERT OR IGNORE INTO user_roles (user_id, role) VALUES ($1, $2)")
            .bind(user_id)
            .bind(role)
            .execute(&mut *conn)
            .await?;
    }
    debug!("🔑️ Roles {roles:?} assigned to user #{user_id}");
    Ok(())
}

pub async fn remove_roles(user_id: i64, roles: &[Role], conn: &mut SqliteConnection) -> Result<u64, AuthApiError> {
    let mut removed = 0u64;
    for role in roles {
        let result = sqlx::query("DELETE FROM user_roles WHERE user_id = $1 AND role = $2")
            .bind(user_id)
            .bind(role)
            .execute(&mut *conn)
            .await?;
        removed += result.rows_affected();
    }
    Ok(removed)
}

pub async fn insert_token(user_id: i64, token: &str, conn: &mut SqliteConnection) -> Result<(), AuthApiError> {
    sqlx::query(
        r#"
            INSERT INTO access_tokens (token, user_id) VALUES ($1, $2)
            ON CONFLICT (token) DO UPDATE SET user_id = excluded.user_id;
        "#,
    )
    .bind(token)
    .bind(user_id)
    .execute(conn)
    .await?;
    Ok(())
}
