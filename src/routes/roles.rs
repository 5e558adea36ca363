use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use serde::{Deserialize, Serialize};

use crate::{
    db::{
        dao::role_dao::{RoleChanges, RoleFilter},
        entities::{menu, permission, role, user},
    },
    response::{ApiResponse, ApiResult},
    services::{Page, ServiceContext},
    state::AppState,
};

use super::{default_limit, default_page};

#[derive(Debug, Deserialize)]
pub struct ListRolesQuery {
    #[serde(default = "default_page")]
    page: u64,
    #[serde(default = "default_limit")]
    limit: u64,
    keyword: Option<String>,
    status: Option<i16>,
}

#[derive(Debug, Deserialize)]
pub struct CreateRoleRequest {
    #[serde(default)]
    name: String,
    #[serde(default)]
    code: String,
    description: Option<String>,
    #[serde(default)]
    sort: i32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    name: Option<String>,
    description: Option<String>,
    sort: Option<i32>,
    status: Option<i16>,
}

#[derive(Debug, Deserialize)]
pub struct AssignPermissionsRequest {
    #[serde(default)]
    permission_ids: Vec<i32>,
}

#[derive(Debug, Deserialize)]
pub struct AssignMenusRequest {
    #[serde(default)]
    menu_ids: Vec<i32>,
}

#[derive(Debug, Serialize)]
pub struct RoleBrief {
    id: i32,
    name: String,
}

#[derive(Debug, Serialize)]
pub struct AssignedPermissions {
    role_id: i32,
    permission_ids: Vec<i32>,
}

#[derive(Debug, Serialize)]
pub struct AssignedMenus {
    role_id: i32,
    menu_ids: Vec<i32>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/roles", get(list).post(create))
        .route("/api/roles/{id}", get(detail).put(update).delete(remove))
        .route(
            "/api/roles/{id}/permissions",
            get(permissions).put(assign_permissions),
        )
        .route("/api/roles/{id}/menus", get(menus).put(assign_menus))
        .route("/api/roles/{id}/users", get(users))
        .with_state(state)
}

async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListRolesQuery>,
) -> ApiResult<Page<role::Model>> {
    let roles = ServiceContext::from_state(&state).roles();
    let filter = RoleFilter {
        keyword: query.keyword,
        status: query.status,
    };
    let page = roles.list(query.page, query.limit, &filter).await?;
    ApiResponse::with_message("role list fetched", page)
}

async fn detail(State(state): State<Arc<AppState>>, Path(id): Path<i32>) -> ApiResult<role::Model> {
    let roles = ServiceContext::from_state(&state).roles();
    ApiResponse::with_message("role detail fetched", roles.detail(id).await?)
}

async fn create(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateRoleRequest>,
) -> ApiResult<RoleBrief> {
    let roles = ServiceContext::from_state(&state).roles();
    let role = roles
        .create(body.name, body.code, body.description, body.sort)
        .await?;
    ApiResponse::with_message("role created", RoleBrief::from(role))
}

async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(body): Json<UpdateRoleRequest>,
) -> ApiResult<RoleBrief> {
    let roles = ServiceContext::from_state(&state).roles();
    let role = roles.update(id, RoleChanges::from(body)).await?;
    ApiResponse::with_message("role updated", RoleBrief::from(role))
}

async fn remove(State(state): State<Arc<AppState>>, Path(id): Path<i32>) -> ApiResult<()> {
    let roles = ServiceContext::from_state(&state).roles();
    roles.delete(id).await?;
    ApiResponse::message_only("role deleted")
}

async fn permissions(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> ApiResult<Vec<permission::Model>> {
    let roles = ServiceContext::from_state(&state).roles();
    ApiResponse::with_message("role permissions fetched", roles.permissions_of(id).await?)
}

async fn assign_permissions(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(body): Json<AssignPermissionsRequest>,
) -> ApiResult<AssignedPermissions> {
    let roles = ServiceContext::from_state(&state).roles();
    let permission_ids = roles.assign_permissions(id, &body.permission_ids).await?;
    ApiResponse::with_message(
        "permissions assigned",
        AssignedPermissions {
            role_id: id,
            permission_ids,
        },
    )
}

async fn menus(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> ApiResult<Vec<menu::Model>> {
    let roles = ServiceContext::from_state(&state).roles();
    ApiResponse::with_message("role menus fetched", roles.menus_of(id).await?)
}

async fn assign_menus(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(body): Json<AssignMenusRequest>,
) -> ApiResult<AssignedMenus> {
    let roles = ServiceContext::from_state(&state).roles();
    let menu_ids = roles.assign_menus(id, &body.menu_ids).await?;
    ApiResponse::with_message(
        "menus assigned",
        AssignedMenus {
            role_id: id,
            menu_ids,
        },
    )
}

async fn users(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> ApiResult<Vec<user::Model>> {
    let roles = ServiceContext::from_state(&state).roles();
    ApiResponse::with_message("role users fetched", roles.users_of(id).await?)
}

impl From<role::Model> for RoleBrief {
    fn from(role: role::Model) -> Self {
        Self {
            id: role.id,
            name: role.name,
        }
    }
}

impl From<UpdateRoleRequest> for RoleChanges {
    fn from(body: UpdateRoleRequest) -> Self {
        Self {
            name: body.name,
            description: body.description,
            sort: body.sort,
            status: body.status,
        }
    }
}
