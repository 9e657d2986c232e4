//! Bearer token authentication.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use kiota_core::Result;
use url::Url;

use super::{AuthenticationContext, AuthenticationProvider, CLAIMS_KEY};
use crate::request_information::RequestInformation;

const AUTHORIZATION_HEADER: &str = "authorization";

/// Restricts which hosts receive tokens.
///
/// An empty validator accepts every host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowedHostsValidator {
    hosts: BTreeSet<String>,
}

impl AllowedHostsValidator {
    /// Creates a validator for `hosts`, compared case-insensitively.
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            hosts: hosts
                .into_iter()
                .map(|h| h.as_ref().trim().to_ascii_lowercase())
                .filter(|h| !h.is_empty())
                .collect(),
        }
    }

    /// Returns the allowed hosts.
    pub fn allowed_hosts(&self) -> impl Iterator<Item = &str> {
        self.hosts.iter().map(String::as_str)
    }

    /// Returns `true` if `url` targets an allowed host.
    pub fn is_url_host_valid(&self, url: &Url) -> bool {
        if self.hosts.is_empty() {
            return true;
        }
        url.host_str()
            .map(|h| self.hosts.contains(&h.to_ascii_lowercase()))
            .unwrap_or(false)
    }
}

/// Supplies access tokens for a request URL.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// Returns a token for `url`, or `None` if the URL should not carry one.
    async fn get_authorization_token(
        &self,
        url: &Url,
        context: &AuthenticationContext,
    ) -> Result<Option<String>>;

    /// Returns the hosts this provider hands tokens to.
    fn allowed_hosts_validator(&self) -> &AllowedHostsValidator;
}

#[async_trait]
impl<T: AccessTokenProvider + ?Sized> AccessTokenProvider for Arc<T> {
    async fn get_authorization_token(
        &self,
        url: &Url,
        context: &AuthenticationContext,
    ) -> Result<Option<String>> {
        (**self).get_authorization_token(url, context).await
    }

    fn allowed_hosts_validator(&self) -> &AllowedHostsValidator {
        (**self).allowed_hosts_validator()
    }
}

/// Adds an `Authorization: Bearer` header from an [`AccessTokenProvider`].
///
/// An existing `Authorization` header is kept unless the context carries a
/// claims challenge, in which case it is replaced with a fresh token.
#[derive(Debug, Clone)]
pub struct BaseBearerTokenAuthenticationProvider<P> {
    token_provider: P,
}

impl<P: AccessTokenProvider> BaseBearerTokenAuthenticationProvider<P> {
    /// Wraps `token_provider`.
    pub fn new(token_provider: P) -> Self {
        Self { token_provider }
    }

    /// Returns the token provider.
    pub fn token_provider(&self) -> &P {
        &self.token_provider
    }
}

#[async_trait]
impl<P: AccessTokenProvider> AuthenticationProvider for BaseBearerTokenAuthenticationProvider<P> {
    async fn authenticate_request(
        &self,
        request: &mut RequestInformation,
        context: &AuthenticationContext,
    ) -> Result<()> {
        if context.contains_key(CLAIMS_KEY) {
            request.headers_mut().remove(AUTHORIZATION_HEADER);
        }
        if request.headers().contains_key(AUTHORIZATION_HEADER) {
            return Ok(());
        }

        let url = request.uri()?;
        match self
            .token_provider
            .get_authorization_token(&url, context)
            .await?
        {
            Some(token) if !token.is_empty() => {
                request
                    .headers_mut()
                    .add(AUTHORIZATION_HEADER, format!("Bearer {token}"));
            }
            _ => tracing::debug!(host = ?url.host_str(), "no access token for request"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request_information::HttpMethod;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticToken {
        validator: AllowedHostsValidator,
        calls: AtomicUsize,
    }

    impl StaticToken {
        fn new(hosts: &[&str]) -> Self {
            Self {
                validator: AllowedHostsValidator::new(hosts),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl AccessTokenProvider for StaticToken {
        async fn get_authorization_token(
            &self,
            url: &Url,
            _: &AuthenticationContext,
        ) -> Result<Option<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .validator
                .is_url_host_valid(url)
                .then(|| "abc".to_string()))
        }

        fn allowed_hosts_validator(&self) -> &AllowedHostsValidator {
            &self.validator
        }
    }

    fn request(url: &str) -> RequestInformation {
        RequestInformation::new(HttpMethod::Get, url)
    }

    #[test]
    fn test_allowed_hosts_validator() {
        let validator = AllowedHostsValidator::new(["API.example.com", " "]);
        assert_eq!(validator.allowed_hosts().collect::<Vec<_>>(), vec!["api.example.com"]);
        assert!(validator.is_url_host_valid(&Url::parse("https://api.EXAMPLE.com/x").unwrap()));
        assert!(!validator.is_url_host_valid(&Url::parse("https://other.example.com").unwrap()));
        assert!(AllowedHostsValidator::default()
            .is_url_host_valid(&Url::parse("https://anything.example").unwrap()));
    }

    #[tokio::test]
    async fn test_bearer_header_added() {
        let provider = BaseBearerTokenAuthenticationProvider::new(StaticToken::new(&["api.example.com"]));
        let mut info = request("https://api.example.com/items");
        provider
            .authenticate_request(&mut info, &AuthenticationContext::new())
            .await
            .unwrap();
        assert_eq!(info.headers().first("Authorization"), Some("Bearer abc"));
    }

    #[tokio::test]
    async fn test_disallowed_host_gets_no_header() {
        let provider = BaseBearerTokenAuthenticationProvider::new(StaticToken::new(&["api.example.com"]));
        let mut info = request("https://evil.example.com/items");
        provider
            .authenticate_request(&mut info, &AuthenticationContext::new())
            .await
            .unwrap();
        assert!(!info.headers().contains_key("authorization"));
    }

    #[tokio::test]
    async fn test_existing_header_is_kept() {
        let provider = BaseBearerTokenAuthenticationProvider::new(StaticToken::new(&[]));
        let mut info = request("https://api.example.com/items").header("Authorization", "Bearer old");
        provider
            .authenticate_request(&mut info, &AuthenticationContext::new())
            .await
            .unwrap();
        assert_eq!(info.headers().first("authorization"), Some("Bearer old"));
        assert_eq!(provider.token_provider().calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_claims_challenge_replaces_header() {
        let provider = BaseBearerTokenAuthenticationProvider::new(StaticToken::new(&[]));
        let mut info = request("https://api.example.com/items").header("Authorization", "Bearer old");
        let context = AuthenticationContext::from([(CLAIMS_KEY.to_string(), "{}".to_string())]);
        provider.authenticate_request(&mut info, &context).await.unwrap();

        let values: Vec<_> = info
            .headers()
            .get("authorization")
            .unwrap()
            .iter()
            .cloned()
            .collect();
        assert_eq!(values, vec!["Bearer abc".to_string()]);
    }

    #[tokio::test]
    async fn test_invalid_url_fails_before_token_request() {
        let provider = BaseBearerTokenAuthenticationProvider::new(StaticToken::new(&[]));
        let mut info = request("{+baseurl}/items");
        assert!(provider
            .authenticate_request(&mut info, &AuthenticationContext::new())
            .await
            .is_err());
        assert_eq!(provider.token_provider().calls.load(Ordering::SeqCst), 0);
    }
}
