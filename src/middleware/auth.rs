use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{
    auth::Claims,
    error::{AppError, codes},
    state::AppState,
};

/// Verifies the bearer token and stores the claims in request extensions so
/// downstream layers and handlers can read them without re-decoding.
pub async fn jwt_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, Response> {
    let auth = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").ok_or_else(|| {
        AppError::unauthorized(codes::UNAUTHORIZED, "please log in first").into_response()
    })?;

    let claims = state
        .tokens
        .verify(token)
        .map_err(|err| AppError::from(err).into_response())?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

impl FromRequestParts<Arc<AppState>> for Claims {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        if let Some(claims) = parts.extensions.get::<Claims>().cloned() {
            return Ok(claims);
        }

        let auth = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("");

        let token = auth.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::unauthorized(codes::USER_NOT_LOGGED_IN, "user is not logged in")
        })?;

        let claims = state.tokens.verify(token)?;
        parts.extensions.insert(claims.clone());
        Ok(claims)
    }
}
