use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::HeaderMap,
    middleware,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use crate::{
    auth::Claims,
    db::entities::user,
    middleware::jwt_auth,
    response::{ApiResponse, ApiResult},
    services::{MenuNode, ServiceContext, SessionInfo},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginData {
    token: String,
    #[serde(rename = "userInfo")]
    user_info: user::Model,
}

/// Session endpoints. Login is public; everything else needs a bearer token
/// but no permission code, so only the jwt middleware guards it.
pub fn router(state: Arc<AppState>) -> Router {
    let session = Router::new()
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/userinfo", get(userinfo))
        .route("/api/auth/menus", get(menus))
        .route("/api/auth/permissions", get(permissions))
        .route("/api/auth/info", get(info))
        .route_layer(middleware::from_fn_with_state(state.clone(), jwt_auth));

    Router::new()
        .route("/api/auth/login", post(login))
        .merge(session)
        .with_state(state)
}

async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<LoginRequest>,
) -> ApiResult<LoginData> {
    let auth = ServiceContext::from_state(&state).auth();
    let (token, user) = auth
        .login(&body.username, &body.password, client_ip(&headers))
        .await?;

    tracing::info!(user_id = user.id, username = %user.username, "user logged in");
    ApiResponse::with_message(
        "login successful",
        LoginData {
            token,
            user_info: user,
        },
    )
}

async fn logout(claims: Claims) -> ApiResult<()> {
    // Tokens are stateless; nothing to revoke server-side.
    tracing::info!(user_id = claims.user_id, "user logged out");
    ApiResponse::message_only("logout successful")
}

async fn userinfo(State(state): State<Arc<AppState>>, claims: Claims) -> ApiResult<user::Model> {
    let auth = ServiceContext::from_state(&state).auth();
    ApiResponse::with_message("user info fetched", auth.user_info(claims.user_id).await?)
}

async fn menus(State(state): State<Arc<AppState>>, claims: Claims) -> ApiResult<Vec<MenuNode>> {
    let auth = ServiceContext::from_state(&state).auth();
    ApiResponse::with_message("user menus fetched", auth.user_menus(claims.user_id).await?)
}

async fn permissions(
    State(state): State<Arc<AppState>>,
    claims: Claims,
) -> ApiResult<Vec<String>> {
    let auth = ServiceContext::from_state(&state).auth();
    ApiResponse::with_message(
        "user permissions fetched",
        auth.user_permissions(claims.user_id).await?,
    )
}

async fn info(State(state): State<Arc<AppState>>, claims: Claims) -> ApiResult<SessionInfo> {
    let auth = ServiceContext::from_state(&state).auth();
    ApiResponse::with_message("session info fetched", auth.info(claims.user_id).await?)
}

/// Client address as reported by the proxy in front of us, if any.
fn client_ip(headers: &HeaderMap) -> Option<String> {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        let first = forwarded.split(',').next().unwrap_or("").trim();
        if !first.is_empty() {
            return Some(first.to_string());
        }
    }
    headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
}

#[cfg(test)]
mod tests {
    use super::client_ip;
    use axum::http::HeaderMap;

    #[test]
    fn forwarded_for_takes_the_first_hop() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "10.0.0.9, 172.16.0.1".parse().unwrap());
        headers.insert("x-real-ip", "192.168.1.1".parse().unwrap());

        assert_eq!(client_ip(&headers).as_deref(), Some("10.0.0.9"));
    }

    #[test]
    fn real_ip_is_the_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", "192.168.1.1".parse().unwrap());

        assert_eq!(client_ip(&headers).as_deref(), Some("192.168.1.1"));
    }

    #[test]
    fn no_proxy_headers_means_no_ip() {
        assert_eq!(client_ip(&HeaderMap::new()), None);
    }
}
