use axum::{
    Router,
    body::{self, Body},
    http::{Request, StatusCode},
};
use serde_json::{Value, json};
use tower::ServiceExt; // for `oneshot`

use backoffice::{
    auth::bootstrap::seed_admin,
    db::dao::{DaoContext, role_dao::RoleChanges},
    test_helpers::{grant_permissions, seed_user, test_app, token_for},
};

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    payload: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match payload {
        Some(value) => builder
            .header("content-type", "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

/// Bootstraps the admin account and returns a token for it.
async fn admin_token(state: &backoffice::state::AppState) -> String {
    let daos = DaoContext::new(&state.db);
    seed_admin(&state.config.auth, &daos).await.unwrap();
    let admin = daos.user().find_by_username("admin").await.unwrap().unwrap();
    token_for(state, &admin, "super_admin")
}

#[tokio::test]
async fn management_routes_need_a_token() {
    let (app, _state) = test_app().await;

    let (status, _) = send(&app, "GET", "/api/users", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn a_user_without_the_code_is_denied() {
    let (app, state) = test_app().await;
    let bob = seed_user(&state, "bob", "password123").await;
    let token = token_for(&state, &bob, "user");

    let (status, body) = send(&app, "GET", "/api/users", Some(&token), None).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "PERMISSION_DENIED");
    assert_eq!(body["error_code"], json!(403));
}

#[tokio::test]
async fn a_grant_opens_exactly_the_granted_route() {
    let (app, state) = test_app().await;
    let bob = seed_user(&state, "bob", "password123").await;
    grant_permissions(&state, &bob, "viewer", &["user:list"]).await;
    let token = token_for(&state, &bob, "viewer");

    let (status, _) = send(&app, "GET", "/api/users", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        "POST",
        "/api/users",
        Some(&token),
        Some(json!({"username": "carol", "password": "secret123"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "PERMISSION_DENIED");
}

#[tokio::test]
async fn the_token_role_claim_grants_nothing() {
    let (app, state) = test_app().await;
    let bob = seed_user(&state, "bob", "password123").await;
    // claim says super_admin but the database says otherwise
    let token = token_for(&state, &bob, "super_admin");

    let (status, _) = send(&app, "GET", "/api/users", Some(&token), None).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn a_super_admin_passes_every_check() {
    let (app, state) = test_app().await;
    let token = admin_token(&state).await;

    let (status, body) = send(&app, "GET", "/api/roles", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["list"][0]["code"], "super_admin");

    let (status, _) = send(&app, "GET", "/api/menus", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn a_disabled_role_stops_granting() {
    let (app, state) = test_app().await;
    let bob = seed_user(&state, "bob", "password123").await;
    let role = grant_permissions(&state, &bob, "viewer", &["user:list"]).await;
    let token = token_for(&state, &bob, "viewer");

    let daos = DaoContext::new(&state.db);
    daos.role()
        .update(
            role,
            RoleChanges {
                status: Some(0),
                ..RoleChanges::default()
            },
        )
        .await
        .unwrap();

    let (status, _) = send(&app, "GET", "/api/users", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn assigning_unknown_permissions_keeps_the_old_links() {
    let (app, state) = test_app().await;
    let token = admin_token(&state).await;

    let (_, body) = send(
        &app,
        "POST",
        "/api/roles",
        Some(&token),
        Some(json!({"name": "Editors", "code": "editor"})),
    )
    .await;
    let role_id = body["data"]["id"].as_i64().unwrap();

    let (_, body) = send(
        &app,
        "POST",
        "/api/permissions",
        Some(&token),
        Some(json!({"name": "List users", "code": "user:list"})),
    )
    .await;
    let permission_id = body["data"]["id"].as_i64().unwrap();

    let uri = format!("/api/roles/{role_id}/permissions");
    let (status, _) = send(
        &app,
        "PUT",
        &uri,
        Some(&token),
        Some(json!({"permission_ids": [permission_id]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        "PUT",
        &uri,
        Some(&token),
        Some(json!({"permission_ids": [permission_id, 9999]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_PERMISSION_IDS");

    let (_, body) = send(&app, "GET", &uri, Some(&token), None).await;
    let held: Vec<i64> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_i64().unwrap())
        .collect();
    assert_eq!(held, vec![permission_id]);
}

#[tokio::test]
async fn duplicate_ids_in_an_assignment_collapse() {
    let (app, state) = test_app().await;
    let token = admin_token(&state).await;
    let bob = seed_user(&state, "bob", "password123").await;

    let (_, body) = send(
        &app,
        "POST",
        "/api/roles",
        Some(&token),
        Some(json!({"name": "Editors", "code": "editor"})),
    )
    .await;
    let role_id = body["data"]["id"].as_i64().unwrap();

    let uri = format!("/api/users/{}/roles", bob.id);
    let (status, body) = send(
        &app,
        "PUT",
        &uri,
        Some(&token),
        Some(json!({"role_ids": [role_id, role_id]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role_ids"], json!([role_id]));

    let (_, body) = send(&app, "GET", &uri, Some(&token), None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn an_empty_assignment_revokes_everything() {
    let (app, state) = test_app().await;
    let token = admin_token(&state).await;
    let bob = seed_user(&state, "bob", "password123").await;
    grant_permissions(&state, &bob, "viewer", &["user:list"]).await;

    let uri = format!("/api/users/{}/roles", bob.id);
    let (status, body) = send(&app, "PUT", &uri, Some(&token), Some(json!({"role_ids": []}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role_ids"], json!([]));

    let bob_token = token_for(&state, &bob, "viewer");
    let (status, _) = send(&app, "GET", "/api/users", Some(&bob_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn effective_permissions_come_back_sorted() {
    let (app, state) = test_app().await;
    let bob = seed_user(&state, "bob", "password123").await;
    grant_permissions(&state, &bob, "viewer", &["user:list", "menu:tree"]).await;
    let token = token_for(&state, &bob, "viewer");

    let (status, body) = send(&app, "GET", "/api/auth/permissions", Some(&token), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!(["menu:tree", "user:list"]));
}
