use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, put},
};
use serde::{Deserialize, Serialize};

use crate::{
    db::{
        dao::user_dao::{ProfileChanges, UserFilter},
        entities::{role, user},
    },
    response::{ApiResponse, ApiResult},
    services::{Page, ServiceContext, UserWithRoles},
    state::AppState,
};

use super::{default_limit, default_page};

#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    #[serde(default = "default_page")]
    page: u64,
    #[serde(default = "default_limit")]
    limit: u64,
    keyword: Option<String>,
    status: Option<i16>,
    role_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
    nickname: Option<String>,
    email: Option<String>,
    phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    nickname: Option<String>,
    avatar: Option<String>,
    email: Option<String>,
    phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    #[serde(default = "default_enabled")]
    status: i16,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    password: String,
}

#[derive(Debug, Deserialize)]
pub struct AssignRolesRequest {
    #[serde(default)]
    role_ids: Vec<i32>,
}

#[derive(Debug, Serialize)]
pub struct UserBrief {
    id: i32,
    username: String,
}

#[derive(Debug, Serialize)]
pub struct UserStatus {
    id: i32,
    status: i16,
}

#[derive(Debug, Serialize)]
pub struct AssignedRoles {
    user_id: i32,
    role_ids: Vec<i32>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/users", get(list).post(create))
        .route(
            "/api/users/{id}",
            get(detail).put(update).delete(remove),
        )
        .route("/api/users/{id}/roles", get(roles).put(assign_roles))
        .route("/api/users/{id}/status", put(update_status))
        .route("/api/users/{id}/password", put(reset_password))
        .with_state(state)
}

async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListUsersQuery>,
) -> ApiResult<Page<UserWithRoles>> {
    let users = ServiceContext::from_state(&state).users();
    let filter = UserFilter {
        keyword: query.keyword,
        status: query.status,
        role_id: query.role_id,
    };
    let page = users.list(query.page, query.limit, &filter).await?;
    ApiResponse::with_message("user list fetched", page)
}

async fn detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> ApiResult<UserWithRoles> {
    let users = ServiceContext::from_state(&state).users();
    ApiResponse::with_message("user detail fetched", users.detail(id).await?)
}

async fn create(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateUserRequest>,
) -> ApiResult<UserBrief> {
    let users = ServiceContext::from_state(&state).users();
    let user = users
        .create(
            body.username,
            body.password,
            body.nickname,
            body.email,
            body.phone,
        )
        .await?;
    ApiResponse::with_message("user created", UserBrief::from(user))
}

async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(body): Json<UpdateUserRequest>,
) -> ApiResult<UserBrief> {
    let users = ServiceContext::from_state(&state).users();
    let user = users.update_profile(id, ProfileChanges::from(body)).await?;
    ApiResponse::with_message("user updated", UserBrief::from(user))
}

async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(body): Json<UpdateStatusRequest>,
) -> ApiResult<UserStatus> {
    let users = ServiceContext::from_state(&state).users();
    let user = users.set_status(id, body.status).await?;
    ApiResponse::with_message(
        "user status updated",
        UserStatus {
            id: user.id,
            status: user.status,
        },
    )
}

async fn reset_password(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(body): Json<ResetPasswordRequest>,
) -> ApiResult<UserBrief> {
    let users = ServiceContext::from_state(&state).users();
    let user = users.reset_password(id, &body.password).await?;
    ApiResponse::with_message("password reset", UserBrief::from(user))
}

async fn remove(State(state): State<Arc<AppState>>, Path(id): Path<i32>) -> ApiResult<()> {
    let users = ServiceContext::from_state(&state).users();
    users.delete(id).await?;
    ApiResponse::message_only("user deleted")
}

async fn roles(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> ApiResult<Vec<role::Model>> {
    let users = ServiceContext::from_state(&state).users();
    ApiResponse::with_message("user roles fetched", users.roles_of(id).await?)
}

async fn assign_roles(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(body): Json<AssignRolesRequest>,
) -> ApiResult<AssignedRoles> {
    let users = ServiceContext::from_state(&state).users();
    let role_ids = users.assign_roles(id, &body.role_ids).await?;
    ApiResponse::with_message(
        "roles assigned",
        AssignedRoles {
            user_id: id,
            role_ids,
        },
    )
}

fn default_enabled() -> i16 {
    1
}

impl From<user::Model> for UserBrief {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
        }
    }
}

impl From<UpdateUserRequest> for ProfileChanges {
    fn from(body: UpdateUserRequest) -> Self {
        Self {
            nickname: body.nickname,
            avatar: body.avatar,
            email: body.email,
            phone: body.phone,
        }
    }
}
