pub mod bootstrap;
pub mod password;
pub mod token;

pub use token::{Claims, TokenError, TokenService, UserClaims};
