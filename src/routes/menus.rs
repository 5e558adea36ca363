use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use serde::{Deserialize, Serialize};

use crate::{
    db::{dao::menu_dao::MenuChanges, entities::menu},
    response::{ApiResponse, ApiResult},
    services::{MenuDraft, MenuNode, ServiceContext},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct ListMenusQuery {
    #[serde(default)]
    parent_id: i32,
    status: Option<i16>,
}

#[derive(Debug, Deserialize)]
pub struct CreateMenuRequest {
    parent_id: Option<i32>,
    #[serde(default)]
    name: String,
    r#type: Option<String>,
    path: Option<String>,
    component: Option<String>,
    redirect: Option<String>,
    icon: Option<String>,
    #[serde(default)]
    title: String,
    hidden: Option<i16>,
    always_show: Option<i16>,
    breadcrumb: Option<i16>,
    affix: Option<i16>,
    no_cache: Option<i16>,
    sort: Option<i32>,
    status: Option<i16>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMenuRequest {
    parent_id: Option<i32>,
    name: Option<String>,
    r#type: Option<String>,
    path: Option<String>,
    component: Option<String>,
    redirect: Option<String>,
    icon: Option<String>,
    title: Option<String>,
    hidden: Option<i16>,
    always_show: Option<i16>,
    breadcrumb: Option<i16>,
    affix: Option<i16>,
    no_cache: Option<i16>,
    sort: Option<i32>,
    status: Option<i16>,
}

#[derive(Debug, Serialize)]
pub struct MenuBrief {
    id: i32,
    name: String,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/menus", get(list).post(create))
        .route("/api/menus/tree", get(tree))
        .route("/api/menus/{id}", get(detail).put(update).delete(remove))
        .with_state(state)
}

async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListMenusQuery>,
) -> ApiResult<Vec<MenuNode>> {
    let menus = ServiceContext::from_state(&state).menus();
    let nodes = menus.admin_list(query.parent_id, query.status).await?;
    ApiResponse::with_message("menu list fetched", nodes)
}

async fn tree(State(state): State<Arc<AppState>>) -> ApiResult<Vec<MenuNode>> {
    let menus = ServiceContext::from_state(&state).menus();
    ApiResponse::with_message("menu tree fetched", menus.tree().await?)
}

async fn detail(State(state): State<Arc<AppState>>, Path(id): Path<i32>) -> ApiResult<menu::Model> {
    let menus = ServiceContext::from_state(&state).menus();
    ApiResponse::with_message("menu detail fetched", menus.detail(id).await?)
}

async fn create(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateMenuRequest>,
) -> ApiResult<MenuBrief> {
    let menus = ServiceContext::from_state(&state).menus();
    let menu = menus.create(MenuDraft::from(body)).await?;
    ApiResponse::with_message("menu created", MenuBrief::from(menu))
}

async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(body): Json<UpdateMenuRequest>,
) -> ApiResult<MenuBrief> {
    let menus = ServiceContext::from_state(&state).menus();
    let menu = menus.update(id, MenuChanges::from(body)).await?;
    ApiResponse::with_message("menu updated", MenuBrief::from(menu))
}

async fn remove(State(state): State<Arc<AppState>>, Path(id): Path<i32>) -> ApiResult<()> {
    let menus = ServiceContext::from_state(&state).menus();
    menus.delete(id).await?;
    ApiResponse::message_only("menu deleted")
}

impl From<menu::Model> for MenuBrief {
    fn from(menu: menu::Model) -> Self {
        Self {
            id: menu.id,
            name: menu.name,
        }
    }
}

impl From<CreateMenuRequest> for MenuDraft {
    fn from(body: CreateMenuRequest) -> Self {
        Self {
            parent_id: body.parent_id,
            name: body.name,
            r#type: body.r#type,
            path: body.path,
            component: body.component,
            redirect: body.redirect,
            icon: body.icon,
            title: body.title,
            hidden: body.hidden,
            always_show: body.always_show,
            breadcrumb: body.breadcrumb,
            affix: body.affix,
            no_cache: body.no_cache,
            sort: body.sort,
            status: body.status,
        }
    }
}

impl From<UpdateMenuRequest> for MenuChanges {
    fn from(body: UpdateMenuRequest) -> Self {
        Self {
            parent_id: body.parent_id,
            name: body.name,
            r#type: body.r#type,
            path: body.path,
            component: body.component,
            redirect: body.redirect,
            icon: body.icon,
            title: body.title,
            hidden: body.hidden,
            always_show: body.always_show,
            breadcrumb: body.breadcrumb,
            affix: body.affix,
            no_cache: body.no_cache,
            sort: body.sort,
            status: body.status,
        }
    }
}
