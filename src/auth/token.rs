use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};

use crate::{config::AuthConfig, db::entities::user, error::AppError};

/// Profile snapshot embedded in the token. The `role` field is the code of
/// the user's primary role at issue time; it is informational only and never
/// consulted for authorization, which always goes back to the database.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserClaims {
    pub username: String,
    pub nickname: Option<String>,
    pub role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub aud: String,
    pub iat: usize,
    pub exp: usize,
    pub user_id: i32,
    pub user_info: UserClaims,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,
    #[error("token signature does not verify")]
    BadSignature,
    #[error("token is malformed: {0}")]
    Malformed(String),
}

/// Issues and verifies HS256 bearer tokens. Verification checks signature
/// and expiry; issuer and audience are stamped into the payload for clients
/// to inspect but are not enforced on the way back in.
#[derive(Clone)]
pub struct TokenService {
    enc: EncodingKey,
    dec: DecodingKey,
    issuer: String,
    audience: String,
    ttl_secs: u64,
}

pub fn now_unix() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as usize
}

impl TokenService {
    pub fn new(cfg: &AuthConfig) -> Self {
        Self {
            enc: EncodingKey::from_secret(cfg.jwt_secret.as_bytes()),
            dec: DecodingKey::from_secret(cfg.jwt_secret.as_bytes()),
            issuer: cfg.token_issuer.clone(),
            audience: cfg.token_audience.clone(),
            ttl_secs: cfg.token_ttl_secs,
        }
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    pub fn issue(&self, user: &user::Model, role_code: &str) -> Result<String, AppError> {
        let iat = now_unix();
        let claims = Claims {
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            iat,
            exp: iat + self.ttl_secs as usize,
            user_id: user.id,
            user_info: UserClaims {
                username: user.username.clone(),
                nickname: user.nickname.clone(),
                role: role_code.to_string(),
            },
        };

        let mut header = Header::new(Algorithm::HS256);
        header.typ = Some("JWT".into());
        encode(&header, &claims, &self.enc).map_err(|err| {
            AppError::internal(
                crate::error::codes::INTERNAL_ERROR,
                format!("token encoding failed: {err}"),
            )
        })
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        // aud is carried for clients, not checked here
        validation.validate_aud = false;

        decode::<Claims>(token, &self.dec, &validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature => TokenError::BadSignature,
                _ => TokenError::Malformed(err.to_string()),
            })
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::config::AuthConfig;

    fn service(secret: &str) -> TokenService {
        let cfg = AuthConfig {
            jwt_secret: secret.to_string(),
            ..AuthConfig::default()
        };
        TokenService::new(&cfg)
    }

    fn sample_user(id: i32, username: &str) -> user::Model {
        let ts = NaiveDate::from_ymd_opt(2026, 1, 1)
            .expect("valid date")
            .and_hms_opt(0, 0, 0)
            .expect("valid time");
        user::Model {
            id,
            username: username.to_string(),
            password_hash: "unused".to_string(),
            nickname: Some("Tester".to_string()),
            avatar: None,
            email: None,
            phone: None,
            status: 1,
            last_login_time: None,
            last_login_ip: None,
            created_at: ts,
            updated_at: ts,
        }
    }

    #[test]
    fn issued_token_verifies_and_carries_profile() {
        let tokens = service("unit-test-secret");
        let token = tokens
            .issue(&sample_user(7, "alice"), "editor")
            .expect("token should encode");

        let claims = tokens.verify(&token).expect("token should verify");
        assert_eq!(claims.user_id, 7);
        assert_eq!(claims.user_info.username, "alice");
        assert_eq!(claims.user_info.nickname.as_deref(), Some("Tester"));
        assert_eq!(claims.user_info.role, "editor");
        assert_eq!(claims.iss, "backoffice");
        assert_eq!(claims.aud, "backoffice-web");
        assert_eq!(
            claims.exp.saturating_sub(claims.iat),
            tokens.ttl_secs() as usize
        );
    }

    #[test]
    fn wrong_secret_is_a_signature_error() {
        let issuing = service("secret-a");
        let verifying = service("secret-b");
        let token = issuing
            .issue(&sample_user(1, "alice"), "user")
            .expect("token should encode");

        assert_eq!(
            verifying.verify(&token).expect_err("must not verify"),
            TokenError::BadSignature
        );
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let tokens = service("unit-test-secret");
        let iat = now_unix().saturating_sub(7200);
        let claims = Claims {
            iss: "backoffice".to_string(),
            aud: "backoffice-web".to_string(),
            iat,
            exp: iat + 60,
            user_id: 1,
            user_info: UserClaims {
                username: "alice".to_string(),
                nickname: None,
                role: "user".to_string(),
            },
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"unit-test-secret"),
        )
        .expect("token should encode");

        assert_eq!(
            tokens.verify(&token).expect_err("must be expired"),
            TokenError::Expired
        );
    }

    #[test]
    fn garbage_is_malformed() {
        let tokens = service("unit-test-secret");
        assert!(matches!(
            tokens.verify("not-a-token").expect_err("must fail"),
            TokenError::Malformed(_)
        ));
    }

    #[test]
    fn audience_mismatch_is_not_rejected() {
        let tokens = service("unit-test-secret");
        let iat = now_unix();
        let claims = Claims {
            iss: "someone-else".to_string(),
            aud: "another-frontend".to_string(),
            iat,
            exp: iat + 600,
            user_id: 1,
            user_info: UserClaims {
                username: "alice".to_string(),
                nickname: None,
                role: "user".to_string(),
            },
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"unit-test-secret"),
        )
        .expect("token should encode");

        let verified = tokens.verify(&token).expect("aud is not enforced");
        assert_eq!(verified.aud, "another-frontend");
    }
}
