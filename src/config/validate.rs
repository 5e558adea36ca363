use anyhow::{Result, bail};

use super::AppConfig;

pub fn validate(cfg: &AppConfig) -> Result<()> {
    let mut errors: Vec<String> = Vec::new();

    if cfg.general.host.trim().is_empty() {
        errors.push("general.host must not be empty".to_string());
    }

    if cfg.database.url.trim().is_empty() {
        errors.push("database.url must not be empty".to_string());
    }

    if cfg.database.min_idle > cfg.database.max_connections {
        errors.push(format!(
            "database.min_idle ({}) must be <= database.max_connections ({})",
            cfg.database.min_idle, cfg.database.max_connections
        ));
    }

    if cfg.auth.jwt_secret.trim().is_empty() {
        errors.push("auth.jwt_secret must not be empty".to_string());
    }

    if cfg.auth.token_ttl_secs == 0 {
        errors.push("auth.token_ttl_secs must be > 0".to_string());
    }

    if cfg.auth.token_issuer.trim().is_empty() {
        errors.push("auth.token_issuer must not be empty".to_string());
    }

    if cfg.auth.admin_username.trim().is_empty() {
        errors.push("auth.admin_username must not be empty".to_string());
    }

    if cfg.auth.admin_password.len() < 6 {
        errors.push("auth.admin_password must be at least 6 characters".to_string());
    }

    if errors.is_empty() {
        return Ok(());
    }

    bail!("invalid app config:\n- {}", errors.join("\n- "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn default_config_is_valid() {
        let cfg = AppConfig::default();
        assert!(validate(&cfg).is_ok());
    }

    #[test]
    fn rejects_blank_secret_and_short_admin_password() {
        let mut cfg = AppConfig::default();
        cfg.auth.jwt_secret = "  ".to_string();
        cfg.auth.admin_password = "abc".to_string();

        let err = validate(&cfg).unwrap_err().to_string();
        assert!(err.contains("auth.jwt_secret"));
        assert!(err.contains("auth.admin_password"));
    }

    #[test]
    fn rejects_idle_pool_larger_than_max() {
        let mut cfg = AppConfig::default();
        cfg.database.max_connections = 2;
        cfg.database.min_idle = 5;

        let err = validate(&cfg).unwrap_err().to_string();
        assert!(err.contains("database.min_idle"));
    }
}
