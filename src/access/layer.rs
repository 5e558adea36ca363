use std::{
    sync::Arc,
    task::{Context, Poll},
};

use axum::{
    body::Body,
    http::Request as HttpRequest,
    response::{IntoResponse, Response},
};
use futures_util::future::BoxFuture;
use tower::{Layer, Service};

use crate::{
    auth::Claims,
    error::{AppError, codes},
    services::ServiceContext,
    state::AppState,
};

use super::RouteTable;

/// Tower layer enforcing the route table. Must run after token auth so the
/// request extensions carry [`Claims`]; a request without them is rejected
/// outright. Routes absent from the table pass through unchecked.
#[derive(Clone)]
pub struct PermissionLayer {
    state: Arc<AppState>,
    table: Arc<RouteTable>,
}

impl PermissionLayer {
    pub fn new(state: Arc<AppState>, table: RouteTable) -> Self {
        Self {
            state,
            table: Arc::new(table),
        }
    }

    pub fn standard(state: Arc<AppState>) -> Self {
        Self::new(state, RouteTable::standard())
    }
}

impl<S> Layer<S> for PermissionLayer {
    type Service = PermissionGuard<S>;

    fn layer(&self, inner: S) -> Self::Service {
        PermissionGuard {
            inner,
            state: self.state.clone(),
            table: self.table.clone(),
        }
    }
}

#[derive(Clone)]
pub struct PermissionGuard<S> {
    inner: S,
    state: Arc<AppState>,
    table: Arc<RouteTable>,
}

impl<S> Service<HttpRequest<Body>> for PermissionGuard<S>
where
    S: Service<HttpRequest<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: HttpRequest<Body>) -> Self::Future {
        let state = self.state.clone();
        let table = self.table.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let claims = match req.extensions().get::<Claims>() {
                Some(claims) => claims.clone(),
                None => {
                    return Ok(AppError::unauthorized(
                        codes::UNAUTHORIZED,
                        "user is not logged in",
                    )
                    .into_response());
                }
            };

            let required = match table.required_permission(req.method(), req.uri().path()) {
                Some(code) => code,
                None => return inner.call(req).await,
            };

            let rbac = ServiceContext::from_state(state.as_ref()).rbac();
            match rbac.allows(claims.user_id, required).await {
                Ok(true) => inner.call(req).await,
                Ok(false) => Ok(AppError::forbidden(
                    codes::PERMISSION_DENIED,
                    format!("operation requires {required}"),
                )
                .into_response()),
                Err(err) => {
                    // fail closed when the membership data cannot be read
                    tracing::error!(permission = required, "permission check failed: {err}");
                    Ok(AppError::forbidden(
                        codes::PERMISSION_DENIED,
                        format!("operation requires {required}"),
                    )
                    .into_response())
                }
            }
        })
    }
}
