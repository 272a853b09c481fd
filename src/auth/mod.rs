//! Authentication
//!
//! The server receives each user's token with the request; the operator CLI
//! resolves one from the gh CLI or environment variables.

mod github;

pub use github::{GitHubAuthConfig, get_github_auth, test_github_auth};

/// Source of authentication token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthSource {
    /// Token from the gh CLI
    Cli,
    /// Token from environment variable
    EnvVar,
}

/// Extract the token from an `Authorization` header value
///
/// Accepts `Bearer <token>` and `token <token>`; returns `None` for anything
/// else or an empty token.
pub fn token_from_authorization(header: &str) -> Option<&str> {
    let header = header.trim();
    let token = header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .or_else(|| header.strip_prefix("token "))?
        .trim();
    if token.is_empty() { None } else { Some(token) }
}
