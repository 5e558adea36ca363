use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::error::AppError;

pub type ApiResult<T> = Result<ApiResponse<T>, AppError>;

/// Uniform wire envelope. Success responses carry `data`; failures carry the
/// machine `error` code plus `error_code`, which always equals the HTTP
/// status the envelope is sent with.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<u16>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> ApiResult<T> {
        Self::with_message("ok", data)
    }

    pub fn with_message(message: impl Into<String>, data: T) -> ApiResult<T> {
        Ok(Self {
            success: true,
            message: message.into(),
            data: Some(data),
            error: None,
            error_code: None,
        })
    }

    /// Success without a `data` key, used by deletes and logout.
    pub fn message_only(message: impl Into<String>) -> ApiResult<T> {
        Ok(Self {
            success: true,
            message: message.into(),
            data: None,
            error: None,
            error_code: None,
        })
    }
}

impl ApiResponse<serde_json::Value> {
    pub(crate) fn from_error(err: &AppError) -> Self {
        Self {
            success: false,
            message: err.message().to_string(),
            data: None,
            error: Some(err.code().to_string()),
            error_code: Some(status_for(err).as_u16()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        (status, Json(ApiResponse::from_error(&self))).into_response()
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self
            .error_code
            .and_then(|code| StatusCode::from_u16(code).ok())
            .unwrap_or(StatusCode::OK);
        (status, Json(self)).into_response()
    }
}

/// Conflict maps to 400 rather than 409: the wire contract predates this
/// server and clients key off `error_code == 400` for duplicate names.
fn status_for(err: &AppError) -> StatusCode {
    match err {
        AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        AppError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
        AppError::Forbidden { .. } => StatusCode::FORBIDDEN,
        AppError::NotFound { .. } => StatusCode::NOT_FOUND,
        AppError::Conflict { .. } => StatusCode::BAD_REQUEST,
        AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::codes;

    #[test]
    fn success_envelope_skips_error_fields() {
        let res = ApiResponse::ok(serde_json::json!({"id": 1})).unwrap();
        let value = serde_json::to_value(&res).unwrap();

        assert_eq!(value["success"], serde_json::json!(true));
        assert_eq!(value["data"]["id"], serde_json::json!(1));
        assert!(value.get("error").is_none());
        assert!(value.get("error_code").is_none());
    }

    #[test]
    fn error_envelope_mirrors_http_status() {
        let err = AppError::forbidden(codes::PERMISSION_DENIED, "no access");
        let body = ApiResponse::from_error(&err);

        assert!(!body.success);
        assert_eq!(body.error.as_deref(), Some("PERMISSION_DENIED"));
        assert_eq!(body.error_code, Some(403));
    }

    #[test]
    fn conflict_reports_bad_request_status() {
        let err = AppError::conflict(codes::USERNAME_EXISTS, "username already exists");
        let body = ApiResponse::from_error(&err);

        assert_eq!(body.error_code, Some(400));
    }

    #[test]
    fn message_only_envelope_has_no_data_key() {
        let res = ApiResponse::<serde_json::Value>::message_only("deleted").unwrap();
        let value = serde_json::to_value(&res).unwrap();

        assert!(value.get("data").is_none());
        assert_eq!(value["message"], serde_json::json!("deleted"));
    }
}
