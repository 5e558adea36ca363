use std::sync::Arc;

use axum::Router;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

use crate::{
    auth::password::hash_password,
    config::AppConfig,
    db::{
        dao::{DaoContext, NewPermission, NewRole, NewUser},
        entities::{role, user},
        schema,
    },
    middleware::json_error_middleware,
    routes::router,
    state::AppState,
};

/// Fresh in-memory sqlite with the schema applied. The pool is pinned to a
/// single connection so every handle sees the same database.
pub async fn test_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options).await.expect("connect sqlite");
    schema::create_tables(&db).await.expect("create tables");
    db
}

pub fn test_config() -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.auth.jwt_secret = "integration-test-secret".to_string();
    cfg
}

pub async fn test_state() -> Arc<AppState> {
    AppState::new(test_config(), test_db().await)
}

/// The app as served in production minus logging: the full router plus the
/// json error rewrap, over a fresh database.
pub async fn test_app() -> (Router, Arc<AppState>) {
    let state = test_state().await;
    let app = Router::new()
        .merge(router(Arc::clone(&state)))
        .layer(axum::middleware::from_fn(json_error_middleware));
    (app, state)
}

/// Creates an active user with the given credentials.
pub async fn seed_user(state: &AppState, username: &str, password: &str) -> user::Model {
    let daos = DaoContext::new(&state.db);
    let hash = hash_password(password).expect("hash password");
    daos.user()
        .create(NewUser {
            username: username.to_string(),
            password_hash: hash,
            nickname: None,
            email: None,
            phone: None,
        })
        .await
        .expect("create user")
}

/// Creates a role carrying one active api permission per code and grants the
/// role to the user.
pub async fn grant_permissions(
    state: &AppState,
    user: &user::Model,
    role_code: &str,
    codes: &[&str],
) -> role::Model {
    let daos = DaoContext::new(&state.db);
    let role = daos
        .role()
        .create(NewRole {
            name: role_code.to_string(),
            code: role_code.to_string(),
            description: None,
            sort: 0,
        })
        .await
        .expect("create role");

    let mut permission_ids = Vec::new();
    for code in codes {
        let permission = daos
            .permission()
            .create(NewPermission {
                menu_id: None,
                name: code.to_string(),
                code: code.to_string(),
                r#type: "api".to_string(),
                description: None,
                sort: 0,
                status: 1,
            })
            .await
            .expect("create permission");
        permission_ids.push(permission.id);
    }

    daos.rbac()
        .replace_role_permissions(role.id, &permission_ids)
        .await
        .expect("grant permissions");
    daos.rbac()
        .replace_user_roles(user.id, &[role.id])
        .await
        .expect("assign role");
    role
}

/// Bearer token for the user, stamped with the given role code.
pub fn token_for(state: &AppState, user: &user::Model, role_code: &str) -> String {
    state.tokens.issue(user, role_code).expect("issue token")
}
