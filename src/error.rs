/// Machine-readable error codes carried in the response envelope. Clients
/// branch on these; the human message alongside them is free text.
pub mod codes {
    pub const BAD_REQUEST: &str = "BAD_REQUEST";
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
    pub const FORBIDDEN: &str = "FORBIDDEN";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const METHOD_NOT_ALLOWED: &str = "METHOD_NOT_ALLOWED";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
    pub const DATABASE_ERROR: &str = "DATABASE_ERROR";

    pub const TOKEN_EXPIRED: &str = "TOKEN_EXPIRED";
    pub const TOKEN_INVALID: &str = "TOKEN_INVALID";
    pub const TOKEN_MALFORMED: &str = "TOKEN_MALFORMED";
    pub const USER_NOT_LOGGED_IN: &str = "USER_NOT_LOGGED_IN";
    pub const PERMISSION_DENIED: &str = "PERMISSION_DENIED";

    pub const USERNAME_EMPTY: &str = "USERNAME_EMPTY";
    pub const PASSWORD_EMPTY: &str = "PASSWORD_EMPTY";
    pub const PASSWORD_INVALID: &str = "PASSWORD_INVALID";
    pub const PASSWORD_TOO_SHORT: &str = "PASSWORD_TOO_SHORT";
    pub const USER_NOT_FOUND: &str = "USER_NOT_FOUND";
    pub const USER_DISABLED: &str = "USER_DISABLED";
    pub const USERNAME_EXISTS: &str = "USERNAME_EXISTS";

    pub const NAME_EMPTY: &str = "NAME_EMPTY";
    pub const TITLE_EMPTY: &str = "TITLE_EMPTY";
    pub const CODE_EMPTY: &str = "CODE_EMPTY";
    pub const CODE_EXISTS: &str = "CODE_EXISTS";

    pub const ROLE_NOT_FOUND: &str = "ROLE_NOT_FOUND";
    pub const MENU_NOT_FOUND: &str = "MENU_NOT_FOUND";
    pub const PERMISSION_NOT_FOUND: &str = "PERMISSION_NOT_FOUND";

    pub const INVALID_USER_ID: &str = "INVALID_USER_ID";
    pub const INVALID_ROLE_ID: &str = "INVALID_ROLE_ID";
    pub const INVALID_MENU_ID: &str = "INVALID_MENU_ID";
    pub const INVALID_PERMISSION_ID: &str = "INVALID_PERMISSION_ID";
    pub const INVALID_ROLE_IDS: &str = "INVALID_ROLE_IDS";
    pub const INVALID_PERMISSION_IDS: &str = "INVALID_PERMISSION_IDS";
    pub const INVALID_MENU_IDS: &str = "INVALID_MENU_IDS";
    pub const INVALID_STATUS: &str = "INVALID_STATUS";
    pub const INVALID_PARENT_ID: &str = "INVALID_PARENT_ID";
    pub const HAS_CHILDREN: &str = "HAS_CHILDREN";
    pub const INVALID_PAGINATION: &str = "INVALID_PAGINATION";
}

#[derive(Debug)]
pub enum AppError {
    BadRequest { code: &'static str, message: String },
    Unauthorized { code: &'static str, message: String },
    Forbidden { code: &'static str, message: String },
    NotFound { code: &'static str, message: String },
    Conflict { code: &'static str, message: String },
    Internal { code: &'static str, message: String },
}

impl AppError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            message: message.into(),
        }
    }

    pub fn unauthorized(code: &'static str, message: impl Into<String>) -> Self {
        Self::Unauthorized {
            code,
            message: message.into(),
        }
    }

    pub fn forbidden(code: &'static str, message: impl Into<String>) -> Self {
        Self::Forbidden {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        Self::NotFound {
            code,
            message: message.into(),
        }
    }

    pub fn conflict(code: &'static str, message: impl Into<String>) -> Self {
        Self::Conflict {
            code,
            message: message.into(),
        }
    }

    pub fn internal(code: &'static str, message: impl Into<String>) -> Self {
        Self::Internal {
            code,
            message: message.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::BadRequest { code, .. }
            | Self::Unauthorized { code, .. }
            | Self::Forbidden { code, .. }
            | Self::NotFound { code, .. }
            | Self::Conflict { code, .. }
            | Self::Internal { code, .. } => code,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::BadRequest { message, .. }
            | Self::Unauthorized { message, .. }
            | Self::Forbidden { message, .. }
            | Self::NotFound { message, .. }
            | Self::Conflict { message, .. }
            | Self::Internal { message, .. } => message.as_str(),
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

impl From<crate::db::dao::DaoLayerError> for AppError {
    fn from(err: crate::db::dao::DaoLayerError) -> Self {
        match err {
            crate::db::dao::DaoLayerError::NotFound { .. } => {
                AppError::not_found(codes::NOT_FOUND, err.to_string())
            }
            crate::db::dao::DaoLayerError::InvalidPagination { .. } => {
                AppError::bad_request(codes::INVALID_PAGINATION, err.to_string())
            }
            crate::db::dao::DaoLayerError::Db(_) => {
                AppError::internal(codes::DATABASE_ERROR, err.to_string())
            }
        }
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        AppError::internal(codes::DATABASE_ERROR, err.to_string())
    }
}

impl From<crate::auth::token::TokenError> for AppError {
    fn from(err: crate::auth::token::TokenError) -> Self {
        use crate::auth::token::TokenError;
        let code = match err {
            TokenError::Expired => codes::TOKEN_EXPIRED,
            TokenError::BadSignature => codes::TOKEN_INVALID,
            TokenError::Malformed(_) => codes::TOKEN_MALFORMED,
        };
        AppError::unauthorized(code, err.to_string())
    }
}
