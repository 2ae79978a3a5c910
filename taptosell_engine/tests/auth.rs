//! Token and role management tests.
use taptosell_engine::{
    db_types::Role,
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    traits::AuthApiError,
    AuthApi,
    SqliteDatabase,
};

async fn new_test_db() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database")
}

#[tokio::test]
async fn issued_tokens_resolve_to_their_claims() {
    let db = new_test_db().await;
    let auth = AuthApi::new(db);
    auth.assign_roles(7, &[Role::Supplier, Role::Admin]).await.unwrap();
    let token = auth.issue_token(7).await.unwrap();

    let claims = auth.authenticate_token(&token).await.unwrap();
    assert_eq!(claims.user_id, 7);
    assert!(claims.has_role(Role::Supplier));
    assert!(claims.is_admin());
    assert!(!claims.has_role(Role::Dropshipper));
}

#[tokio::test]
async fn unknown_tokens_are_rejected() {
    let db = new_test_db().await;
    let auth = AuthApi::new(db);
    let err = auth.authenticate_token("not-a-token").await.unwrap_err();
    assert!(matches!(err, AuthApiError::TokenNotFound), "unexpected error: {err}");
}

#[tokio::test]
async fn roles_can_be_granted_and_revoked() {
    let db = new_test_db().await;
    let auth = AuthApi::new(db);
    auth.assign_roles(8, &[Role::Dropshipper]).await.unwrap();
    auth.check_user_has_role(8, Role::Dropshipper).await.unwrap();
    let err = auth.check_user_has_role(8, Role::Admin).await.unwrap_err();
    assert!(matches!(err, AuthApiError::RoleNotFound(8)), "unexpected error: {err}");

    // Granting twice is idempotent
    auth.assign_roles(8, &[Role::Dropshipper, Role::Supplier]).await.unwrap();
    let roles = auth.roles_for_user(8).await.unwrap();
    assert_eq!(roles.len(), 2);

    let removed = auth.remove_roles(8, &[Role::Supplier, Role::Admin]).await.unwrap();
    assert_eq!(removed, 1);
    let roles = auth.roles_for_user(8).await.unwrap();
    assert_eq!(roles, vec![Role::Dropshipper]);
}
