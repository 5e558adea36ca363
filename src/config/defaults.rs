pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_RUST_LOG: &str = "info,tower_http=info";
pub const DEFAULT_DATABASE_URL: &str = "sqlite://backoffice.db?mode=rwc";
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_DB_MIN_IDLE: u32 = 2;
pub const DEFAULT_JWT_SECRET: &str = "backoffice-dev-secret-change-me";
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 604_800;
pub const DEFAULT_TOKEN_ISSUER: &str = "backoffice";
pub const DEFAULT_TOKEN_AUDIENCE: &str = "backoffice-web";
pub const DEFAULT_ADMIN_USERNAME: &str = "admin";
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";
