use axum::{
    Router,
    body::{self, Body},
    http::{Request, StatusCode},
};
use serde_json::{Value, json};
use tower::ServiceExt; // for `oneshot`

use backoffice::{
    auth::bootstrap::seed_admin,
    db::dao::DaoContext,
    state::AppState,
    test_helpers::{test_app, token_for},
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

async fn admin_app() -> (Router, std::sync::Arc<AppState>, String) {
    let (app, state) = test_app().await;
    let daos = DaoContext::new(&state.db);
    seed_admin(&state.config.auth, &daos).await.unwrap();
    let admin = daos.user().find_by_username("admin").await.unwrap().unwrap();
    let token = token_for(&state, &admin, "super_admin");
    (app, state, token)
}

#[tokio::test]
async fn creating_a_user_rejects_duplicates() {
    let (app, _state, token) = admin_app().await;
    let payload = json!({"username": "carol", "password": "secret123", "nickname": "Carol"});

    let (status, body) = send(&app, "POST", "/api/users", Some(&token), Some(payload.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "carol");
    assert!(body["data"]["id"].as_i64().is_some());

    let (status, body) = send(&app, "POST", "/api/users", Some(&token), Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "USERNAME_EXISTS");
    assert_eq!(body["error_code"], json!(400));
}

#[tokio::test]
async fn user_detail_carries_the_assigned_roles() {
    let (app, _state, token) = admin_app().await;

    let (_, body) = send(
        &app,
        "POST",
        "/api/users",
        Some(&token),
        Some(json!({"username": "carol", "password": "secret123"})),
    )
    .await;
    let user_id = body["data"]["id"].as_i64().unwrap();

    let (_, body) = send(
        &app,
        "POST",
        "/api/roles",
        Some(&token),
        Some(json!({"name": "Editors", "code": "editor"})),
    )
    .await;
    let role_id = body["data"]["id"].as_i64().unwrap();

    let uri = format!("/api/users/{user_id}/roles");
    send(
        &app,
        "PUT",
        &uri,
        Some(&token),
        Some(json!({"role_ids": [role_id]})),
    )
    .await;

    let uri = format!("/api/users/{user_id}");
    let (status, body) = send(&app, "GET", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "carol");
    assert_eq!(body["data"]["roles"][0]["code"], "editor");
}

#[tokio::test]
async fn status_updates_are_validated() {
    let (app, _state, token) = admin_app().await;
    let (_, body) = send(
        &app,
        "POST",
        "/api/users",
        Some(&token),
        Some(json!({"username": "carol", "password": "secret123"})),
    )
    .await;
    let user_id = body["data"]["id"].as_i64().unwrap();
    let uri = format!("/api/users/{user_id}/status");

    let (status, body) = send(&app, "PUT", &uri, Some(&token), Some(json!({"status": 5}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_STATUS");

    let (status, body) = send(&app, "PUT", &uri, Some(&token), Some(json!({"status": 0}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!({"id": user_id, "status": 0}));
}

#[tokio::test]
async fn password_resets_enforce_the_minimum_length() {
    let (app, _state, token) = admin_app().await;
    let (_, body) = send(
        &app,
        "POST",
        "/api/users",
        Some(&token),
        Some(json!({"username": "carol", "password": "secret123"})),
    )
    .await;
    let user_id = body["data"]["id"].as_i64().unwrap();
    let uri = format!("/api/users/{user_id}/password");

    let (status, body) = send(
        &app,
        "PUT",
        &uri,
        Some(&token),
        Some(json!({"password": "abc"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "PASSWORD_TOO_SHORT");

    let (status, _) = send(
        &app,
        "PUT",
        &uri,
        Some(&token),
        Some(json!({"password": "brand-new-secret"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // the new password works, the old one does not
    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({"username": "carol", "password": "brand-new-secret"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({"username": "carol", "password": "secret123"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn deleting_a_user_also_drops_their_links() {
    let (app, state, token) = admin_app().await;
    let (_, body) = send(
        &app,
        "POST",
        "/api/users",
        Some(&token),
        Some(json!({"username": "carol", "password": "secret123"})),
    )
    .await;
    let user_id = body["data"]["id"].as_i64().unwrap();

    let (_, body) = send(
        &app,
        "POST",
        "/api/roles",
        Some(&token),
        Some(json!({"name": "Editors", "code": "editor"})),
    )
    .await;
    let role_id = body["data"]["id"].as_i64().unwrap();
    send(
        &app,
        "PUT",
        &format!("/api/users/{user_id}/roles"),
        Some(&token),
        Some(json!({"role_ids": [role_id]})),
    )
    .await;

    let uri = format!("/api/users/{user_id}");
    let (status, body) = send(&app, "DELETE", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "user deleted");

    let (status, _) = send(&app, "GET", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let links = DaoContext::new(&state.db)
        .rbac()
        .role_ids_of_user(user_id as i32)
        .await
        .unwrap();
    assert!(links.is_empty());
}

#[tokio::test]
async fn role_codes_are_unique_and_immutable() {
    let (app, _state, token) = admin_app().await;

    let (_, body) = send(
        &app,
        "POST",
        "/api/roles",
        Some(&token),
        Some(json!({"name": "Editors", "code": "editor"})),
    )
    .await;
    let role_id = body["data"]["id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        "POST",
        "/api/roles",
        Some(&token),
        Some(json!({"name": "Other", "code": "editor"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "CODE_EXISTS");

    let uri = format!("/api/roles/{role_id}");
    let (status, _) = send(
        &app,
        "PUT",
        &uri,
        Some(&token),
        Some(json!({"name": "Writers"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, "GET", &uri, Some(&token), None).await;
    assert_eq!(body["data"]["name"], "Writers");
    assert_eq!(body["data"]["code"], "editor");
}

#[tokio::test]
async fn menu_creation_fills_in_defaults() {
    let (app, _state, token) = admin_app().await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/menus",
        Some(&token),
        Some(json!({"name": "dashboard", "title": "Dashboard"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let menu_id = body["data"]["id"].as_i64().unwrap();

    let (_, body) = send(
        &app,
        "GET",
        &format!("/api/menus/{menu_id}"),
        Some(&token),
        None,
    )
    .await;
    let menu = &body["data"];
    assert_eq!(menu["type"], "menu");
    assert_eq!(menu["parent_id"], json!(0));
    assert_eq!(menu["hidden"], json!(0));
    assert_eq!(menu["breadcrumb"], json!(1));
    assert_eq!(menu["status"], json!(1));
}

#[tokio::test]
async fn the_menu_listing_is_a_tree() {
    let (app, _state, token) = admin_app().await;

    let (_, body) = send(
        &app,
        "POST",
        "/api/menus",
        Some(&token),
        Some(json!({"name": "system", "title": "System"})),
    )
    .await;
    let parent_id = body["data"]["id"].as_i64().unwrap();
    send(
        &app,
        "POST",
        "/api/menus",
        Some(&token),
        Some(json!({"name": "users", "title": "Users", "parent_id": parent_id})),
    )
    .await;

    let (status, body) = send(&app, "GET", "/api/menus", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let roots = body["data"].as_array().unwrap();
    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0]["name"], "system");
    assert_eq!(roots[0]["children"][0]["name"], "users");
    // leaves do not carry an empty children array
    assert!(roots[0]["children"][0].get("children").is_none());
}

#[tokio::test]
async fn a_menu_with_children_cannot_be_deleted() {
    let (app, _state, token) = admin_app().await;

    let (_, body) = send(
        &app,
        "POST",
        "/api/menus",
        Some(&token),
        Some(json!({"name": "system", "title": "System"})),
    )
    .await;
    let parent_id = body["data"]["id"].as_i64().unwrap();
    let (_, body) = send(
        &app,
        "POST",
        "/api/menus",
        Some(&token),
        Some(json!({"name": "users", "title": "Users", "parent_id": parent_id})),
    )
    .await;
    let child_id = body["data"]["id"].as_i64().unwrap();

    let parent_uri = format!("/api/menus/{parent_id}");
    let (status, body) = send(&app, "DELETE", &parent_uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "HAS_CHILDREN");

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/menus/{child_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "DELETE", &parent_uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn a_menu_cannot_become_its_own_parent() {
    let (app, _state, token) = admin_app().await;

    let (_, body) = send(
        &app,
        "POST",
        "/api/menus",
        Some(&token),
        Some(json!({"name": "system", "title": "System"})),
    )
    .await;
    let menu_id = body["data"]["id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/menus/{menu_id}"),
        Some(&token),
        Some(json!({"parent_id": menu_id})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_PARENT_ID");
}

#[tokio::test]
async fn permissions_must_point_at_a_real_menu() {
    let (app, _state, token) = admin_app().await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/permissions",
        Some(&token),
        Some(json!({"name": "List users", "code": "user:list", "menu_id": 999})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "MENU_NOT_FOUND");

    let (status, body) = send(
        &app,
        "POST",
        "/api/permissions",
        Some(&token),
        Some(json!({"name": "List users", "code": "user:list"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let permission_id = body["data"]["id"].as_i64().unwrap();

    let (_, body) = send(
        &app,
        "GET",
        &format!("/api/permissions/{permission_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(body["data"]["type"], "api");
    assert_eq!(body["data"]["menu"], Value::Null);
}

#[tokio::test]
async fn grouped_permissions_bucket_by_menu_title() {
    let (app, _state, token) = admin_app().await;

    let (_, body) = send(
        &app,
        "POST",
        "/api/menus",
        Some(&token),
        Some(json!({"name": "system", "title": "System"})),
    )
    .await;
    let menu_id = body["data"]["id"].as_i64().unwrap();

    send(
        &app,
        "POST",
        "/api/permissions",
        Some(&token),
        Some(json!({"name": "List users", "code": "user:list", "menu_id": menu_id})),
    )
    .await;
    send(
        &app,
        "POST",
        "/api/permissions",
        Some(&token),
        Some(json!({"name": "Export", "code": "report:export"})),
    )
    .await;

    let (status, body) = send(&app, "GET", "/api/permissions/group", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["System"][0]["code"], "user:list");
    assert_eq!(body["data"]["ungrouped"][0]["code"], "report:export");
}

#[tokio::test]
async fn list_endpoints_return_a_page_envelope() {
    let (app, _state, token) = admin_app().await;
    for name in ["carol", "dave", "erin"] {
        send(
            &app,
            "POST",
            "/api/users",
            Some(&token),
            Some(json!({"username": name, "password": "secret123"})),
        )
        .await;
    }

    // the bootstrap admin is the fourth user
    let (status, body) = send(&app, "GET", "/api/users?page=1&limit=2", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["list"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"]["total"], json!(4));
    assert_eq!(body["data"]["page"], json!(1));
    assert_eq!(body["data"]["limit"], json!(2));

    let (status, body) = send(&app, "GET", "/api/users?page=0", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_PAGINATION");
}

#[tokio::test]
async fn unknown_paths_and_methods_answer_in_json() {
    let (app, _state, token) = admin_app().await;

    let (status, body) = send(&app, "GET", "/api/nope", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NOT_FOUND");

    let (status, body) = send(&app, "PATCH", "/api/users", Some(&token), None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["error"], "METHOD_NOT_ALLOWED");
}
