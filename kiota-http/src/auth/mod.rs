//! Request authentication.
//!
//! An [`AuthenticationProvider`] augments a request before it is sent; a
//! failure aborts the exchange before any network I/O.

mod bearer;
mod jwt;
mod refresh_token;

use std::collections::HashMap;

use async_trait::async_trait;
use kiota_core::Result;

use crate::request_information::RequestInformation;

pub use bearer::{AccessTokenProvider, AllowedHostsValidator, BaseBearerTokenAuthenticationProvider};
pub use jwt::JwtClaims;
pub use refresh_token::{
    RefreshTokenAccessTokenProvider, DEFAULT_CLIENT_ID, DEFAULT_REFRESH_BEFORE, DEFAULT_TOKEN_URL,
    REFRESH_BEFORE_ENV, TOKEN_PATH,
};

/// Context key signalling a claims challenge from a previous response.
pub const CLAIMS_KEY: &str = "claims";

/// Extra information passed to authentication providers.
pub type AuthenticationContext = HashMap<String, String>;

/// Authenticates requests before they are sent.
#[async_trait]
pub trait AuthenticationProvider: Send + Sync {
    /// Adds credentials to `request`.
    async fn authenticate_request(
        &self,
        request: &mut RequestInformation,
        context: &AuthenticationContext,
    ) -> Result<()>;
}

/// Leaves requests unauthenticated.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnonymousAuthenticationProvider;

#[async_trait]
impl AuthenticationProvider for AnonymousAuthenticationProvider {
    async fn authenticate_request(
        &self,
        _request: &mut RequestInformation,
        _context: &AuthenticationContext,
    ) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request_information::HttpMethod;

    #[tokio::test]
    async fn test_anonymous_leaves_request_untouched() {
        let mut request = RequestInformation::new(HttpMethod::Get, "https://example.com/x");
        AnonymousAuthenticationProvider
            .authenticate_request(&mut request, &AuthenticationContext::new())
            .await
            .unwrap();
        assert!(request.headers().is_empty());
    }
}
