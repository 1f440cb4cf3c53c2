//! Authentication module
//!
//! Validates access tokens issued by the BaaS auth API.

mod jwt;
mod middleware;

#[cfg(test)]
pub(crate) use jwt::sign_test_token;
pub use jwt::{Claims, JwtService, AUTHENTICATED_AUDIENCE};
pub use middleware::AuthUser;
