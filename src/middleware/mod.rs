mod auth;
mod cors;
mod json_error;
mod panic;

pub use auth::jwt_auth;
pub use cors::cors_layer;
pub use json_error::json_error_middleware;
pub use panic::catch_panic_layer;
