use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use serde::{Deserialize, Serialize};

use crate::{
    db::{
        dao::permission_dao::{PermissionChanges, PermissionFilter},
        entities::permission,
    },
    response::{ApiResponse, ApiResult},
    services::{Page, PermissionWithMenu, ServiceContext},
    state::AppState,
};

use super::{default_limit, default_page};

#[derive(Debug, Deserialize)]
pub struct ListPermissionsQuery {
    #[serde(default = "default_page")]
    page: u64,
    #[serde(default = "default_limit")]
    limit: u64,
    keyword: Option<String>,
    r#type: Option<String>,
    menu_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePermissionRequest {
    menu_id: Option<i32>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    code: String,
    r#type: Option<String>,
    description: Option<String>,
    #[serde(default)]
    sort: i32,
    #[serde(default = "default_enabled")]
    status: i16,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePermissionRequest {
    menu_id: Option<i32>,
    name: Option<String>,
    description: Option<String>,
    sort: Option<i32>,
    status: Option<i16>,
}

#[derive(Debug, Serialize)]
pub struct PermissionBrief {
    id: i32,
    name: String,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/permissions", get(list).post(create))
        .route("/api/permissions/group", get(grouped))
        .route(
            "/api/permissions/{id}",
            get(detail).put(update).delete(remove),
        )
        .with_state(state)
}

async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListPermissionsQuery>,
) -> ApiResult<Page<permission::Model>> {
    let permissions = ServiceContext::from_state(&state).permissions();
    let filter = PermissionFilter {
        keyword: query.keyword,
        r#type: query.r#type,
        menu_id: query.menu_id,
    };
    let page = permissions.list(query.page, query.limit, &filter).await?;
    ApiResponse::with_message("permission list fetched", page)
}

async fn grouped(
    State(state): State<Arc<AppState>>,
) -> ApiResult<BTreeMap<String, Vec<permission::Model>>> {
    let permissions = ServiceContext::from_state(&state).permissions();
    ApiResponse::with_message("grouped permissions fetched", permissions.grouped().await?)
}

async fn detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> ApiResult<PermissionWithMenu> {
    let permissions = ServiceContext::from_state(&state).permissions();
    ApiResponse::with_message("permission detail fetched", permissions.detail(id).await?)
}

async fn create(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreatePermissionRequest>,
) -> ApiResult<PermissionBrief> {
    let permissions = ServiceContext::from_state(&state).permissions();
    let permission = permissions
        .create(
            body.menu_id,
            body.name,
            body.code,
            body.r#type,
            body.description,
            body.sort,
            body.status,
        )
        .await?;
    ApiResponse::with_message("permission created", PermissionBrief::from(permission))
}

async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(body): Json<UpdatePermissionRequest>,
) -> ApiResult<PermissionBrief> {
    let permissions = ServiceContext::from_state(&state).permissions();
    let permission = permissions
        .update(id, PermissionChanges::from(body))
        .await?;
    ApiResponse::with_message("permission updated", PermissionBrief::from(permission))
}

async fn remove(State(state): State<Arc<AppState>>, Path(id): Path<i32>) -> ApiResult<()> {
    let permissions = ServiceContext::from_state(&state).permissions();
    permissions.delete(id).await?;
    ApiResponse::message_only("permission deleted")
}

fn default_enabled() -> i16 {
    1
}

impl From<permission::Model> for PermissionBrief {
    fn from(permission: permission::Model) -> Self {
        Self {
            id: permission.id,
            name: permission.name,
        }
    }
}

impl From<UpdatePermissionRequest> for PermissionChanges {
    fn from(body: UpdatePermissionRequest) -> Self {
        Self {
            menu_id: body.menu_id,
            name: body.name,
            description: body.description,
            sort: body.sort,
            status: body.status,
        }
    }
}
