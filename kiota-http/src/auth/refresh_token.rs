//! Access tokens obtained with an OAuth2 refresh-token grant.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, TimeDelta, Utc};
use kiota_core::{Headers, KiotaError, Result};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::debug;
use url::Url;

use super::bearer::{AccessTokenProvider, AllowedHostsValidator};
use super::jwt::JwtClaims;
use super::AuthenticationContext;
use crate::request_information::HttpMethod;
use crate::transport::{HttpTransport, NativeRequest, ReqwestTransport};

/// Token endpoint path below an OpenID Connect issuer.
pub const TOKEN_PATH: &str = "/protocol/openid-connect/token";

/// Token endpoint used when the offline token names no issuer.
pub const DEFAULT_TOKEN_URL: &str =
    "https://sso.redhat.com/auth/realms/redhat-external/protocol/openid-connect/token";

/// Client id used when the offline token names no authorized party.
pub const DEFAULT_CLIENT_ID: &str = "cloud-services";

/// How long before expiry a cached token is refreshed.
pub const DEFAULT_REFRESH_BEFORE: Duration = Duration::from_millis(60_000);

/// Environment variable overriding [`DEFAULT_REFRESH_BEFORE`] in milliseconds.
pub const REFRESH_BEFORE_ENV: &str = "KIOTA_ACCESS_TOKEN_REFRESH_BEFORE_MS";

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<i64>,
}

/// Exchanges an offline refresh token for short-lived access tokens.
///
/// The token endpoint and client id are derived from the offline token's
/// `iss` and `azp` claims when it is a JWT. Access tokens are cached until
/// shortly before they expire, and concurrent callers share one refresh.
pub struct RefreshTokenAccessTokenProvider {
    offline_token: String,
    token_url: Url,
    client_id: String,
    validator: AllowedHostsValidator,
    refresh_before: Duration,
    transport: Arc<dyn HttpTransport>,
    cached: Mutex<Option<CachedToken>>,
}

impl RefreshTokenAccessTokenProvider {
    /// Creates a provider for `offline_token`, discovering the endpoint from
    /// its claims.
    pub fn new(offline_token: impl Into<String>) -> Result<Self> {
        let offline_token = offline_token.into();
        let claims = JwtClaims::decode(&offline_token).unwrap_or_default();

        let discovered = claims.iss.as_deref().and_then(|issuer| {
            let url = Url::parse(&format!("{}{TOKEN_PATH}", issuer.trim_end_matches('/'))).ok()?;
            let host = url.host_str()?.to_string();
            Some((url, host))
        });
        let (token_url, host) = match discovered {
            Some(found) => found,
            None => {
                debug!("offline token names no issuer, using the default token endpoint");
                let url = parse_token_url(DEFAULT_TOKEN_URL)?;
                let host = url.host_str().unwrap_or_default().to_string();
                (url, host)
            }
        };
        let client_id = claims.azp.unwrap_or_else(|| DEFAULT_CLIENT_ID.to_string());

        Self::with_endpoint(offline_token, token_url.as_str(), client_id, [host])
    }

    /// Creates a provider with an explicit endpoint, client id and allowed hosts.
    pub fn with_endpoint<I, S>(
        offline_token: impl Into<String>,
        token_url: &str,
        client_id: impl Into<String>,
        allowed_hosts: I,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let transport = ReqwestTransport::with_timeout(Duration::from_secs(30))?;
        Ok(Self {
            offline_token: offline_token.into(),
            token_url: parse_token_url(token_url)?,
            client_id: client_id.into(),
            validator: AllowedHostsValidator::new(allowed_hosts),
            refresh_before: refresh_before_from_env(),
            transport: Arc::new(transport),
            cached: Mutex::new(None),
        })
    }

    /// Replaces the transport used to reach the token endpoint.
    pub fn with_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = transport;
        self
    }

    /// Sets how long before expiry a cached token is refreshed.
    pub fn with_refresh_before(mut self, refresh_before: Duration) -> Self {
        self.refresh_before = refresh_before;
        self
    }

    /// Returns the token endpoint.
    pub fn token_url(&self) -> &Url {
        &self.token_url
    }

    /// Returns the OAuth2 client id.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Returns how long before expiry a cached token is refreshed.
    pub fn refresh_before(&self) -> Duration {
        self.refresh_before
    }

    fn is_fresh(&self, cached: &CachedToken) -> bool {
        let Some(expires_at) = cached.expires_at else {
            return false;
        };
        // A margin too large to represent always forces a refresh.
        TimeDelta::from_std(self.refresh_before)
            .ok()
            .and_then(|margin| expires_at.checked_sub_signed(margin))
            .is_some_and(|refresh_at| Utc::now() < refresh_at)
    }

    async fn fetch_token(&self) -> Result<CachedToken> {
        let form = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("grant_type", "refresh_token")
            .append_pair("client_id", &self.client_id)
            .append_pair("refresh_token", &self.offline_token)
            .finish();
        let mut headers = Headers::new();
        headers.add("content-type", "application/x-www-form-urlencoded");
        headers.add("accept", "application/json");
        let request = NativeRequest::new(
            HttpMethod::Post,
            self.token_url.clone(),
            headers,
            Some(Bytes::from(form)),
        );

        debug!(url = %self.token_url, "requesting a new access token");
        let response = self.transport.send(request).await?;
        if response.status() != 200 {
            return Err(KiotaError::Authentication(format!(
                "error issuing a new token, received answer code {}",
                response.status()
            )));
        }
        let body = response.body().cloned().unwrap_or_default();
        let parsed: TokenResponse = serde_json::from_slice(&body).map_err(|e| {
            KiotaError::Authentication(format!(
                "error issuing a new token, received answer with body {}: {e}",
                String::from_utf8_lossy(&body)
            ))
        })?;

        let expires_at = JwtClaims::decode(&parsed.access_token)
            .and_then(|claims| claims.expires_at())
            .or_else(|| parsed.expires_in.map(expiry_after));
        Ok(CachedToken {
            token: parsed.access_token,
            expires_at,
        })
    }
}

#[async_trait]
impl AccessTokenProvider for RefreshTokenAccessTokenProvider {
    async fn get_authorization_token(
        &self,
        url: &Url,
        _context: &AuthenticationContext,
    ) -> Result<Option<String>> {
        if !self.validator.is_url_host_valid(url) {
            return Ok(None);
        }
        if url.scheme() != "https" {
            return Err(KiotaError::Authentication(
                "only https is supported".to_string(),
            ));
        }

        // Held across the refresh so concurrent callers wait for one request.
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| self.is_fresh(t)) {
            return Ok(Some(token.token.clone()));
        }
        let fresh = self.fetch_token().await?;
        let token = fresh.token.clone();
        *cached = Some(fresh);
        Ok(Some(token))
    }

    fn allowed_hosts_validator(&self) -> &AllowedHostsValidator {
        &self.validator
    }
}

impl fmt::Debug for RefreshTokenAccessTokenProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshTokenAccessTokenProvider")
            .field("token_url", &self.token_url.as_str())
            .field("client_id", &self.client_id)
            .field("validator", &self.validator)
            .field("refresh_before", &self.refresh_before)
            .finish_non_exhaustive()
    }
}

fn parse_token_url(raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|e| KiotaError::Configuration(format!("invalid token url {raw}: {e}")))
}

/// Converts a token lifetime into an instant, saturating at the representable range.
fn expiry_after(secs: i64) -> DateTime<Utc> {
    let now = Utc::now();
    TimeDelta::try_seconds(secs)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .unwrap_or(if secs > 0 { DateTime::<Utc>::MAX_UTC } else { now })
}

fn refresh_before_from_env() -> Duration {
    std::env::var(REFRESH_BEFORE_ENV)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_REFRESH_BEFORE)
}
