use std::sync::Arc;

use axum::{Router, middleware};

use crate::{access::PermissionLayer, middleware::jwt_auth, state::AppState};

pub mod auth;
pub mod menus;
pub mod permissions;
pub mod roles;
pub mod users;

pub(crate) fn default_page() -> u64 {
    1
}

pub(crate) fn default_limit() -> u64 {
    20
}

/// Full API surface. The management routers share one guard stack: the jwt
/// middleware runs first and stashes the claims, then the permission layer
/// matches the request against the route table. Routers use absolute paths
/// and are merged rather than nested so the permission layer sees the same
/// URI the route table is written against.
pub fn router(state: Arc<AppState>) -> Router {
    let admin = Router::new()
        .merge(users::router(state.clone()))
        .merge(roles::router(state.clone()))
        .merge(menus::router(state.clone()))
        .merge(permissions::router(state.clone()))
        .layer(PermissionLayer::standard(state.clone()))
        .route_layer(middleware::from_fn_with_state(state.clone(), jwt_auth));

    Router::new().merge(auth::router(state)).merge(admin)
}
