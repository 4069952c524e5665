// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>

//! OAuth2 access tokens via the service-account jwt-bearer flow.
//!
//! No token is fetched at connect time. The first operation that needs one
//! signs a short-lived RS256 assertion with the account's private key,
//! exchanges it at the credentials' token endpoint, and caches the result.
//! Later operations reuse the cached token until it is within
//! [`TOKEN_REFRESH_MARGIN`] of expiry; a stale cache is refreshed under the
//! write lock, so concurrent callers wait for one exchange instead of
//! racing their own.

use std::time::{Duration, Instant};

use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, error};

use crate::credentials::ServiceAccountKey;
use crate::error::{Result, StoreError};

/// OAuth2 scope covering document reads and writes.
pub(crate) const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";

/// Refresh the cached token once it is this close to expiring.
pub(crate) const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(300);

const GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Cap on the token lifetime accepted from the endpoint.
const MAX_TOKEN_LIFETIME: Duration = Duration::from_secs(86_400);

/// Signs assertions and exchanges them for bearer tokens, caching the
/// current one.
pub(crate) struct TokenProvider {
    http: reqwest::Client,
    token_uri: String,
    client_email: String,
    key_id: String,
    signing_key: EncodingKey,
    scope: String,
    timeout_ms: u64,
    cached: RwLock<Option<CachedToken>>,
}

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_fresh(&self) -> bool {
        self.expires_at.saturating_duration_since(Instant::now()) > TOKEN_REFRESH_MARGIN
    }
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

/// Error body of the OAuth2 token endpoint.
#[derive(Deserialize)]
struct OAuthError {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

impl TokenProvider {
    /// Build a provider from validated credentials.
    ///
    /// Parses the PEM private key eagerly so a corrupt key fails at
    /// connect time rather than on the first operation.
    pub(crate) fn new(
        key: &ServiceAccountKey,
        http: reqwest::Client,
        scope: String,
        timeout_ms: u64,
    ) -> Result<Self> {
        let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes()).map_err(|e| {
            error!(error = %e, "service account private key does not parse");
            StoreError::InvalidPrivateKey(e)
        })?;

        Ok(Self {
            http,
            token_uri: key.token_uri.clone(),
            client_email: key.client_email.clone(),
            key_id: key.private_key_id.clone(),
            signing_key,
            scope,
            timeout_ms,
            cached: RwLock::new(None),
        })
    }

    /// A bearer token valid for at least [`TOKEN_REFRESH_MARGIN`] from now.
    pub(crate) async fn access_token(&self) -> Result<String> {
        {
            let slot = self.cached.read().await;
            if let Some(token) = slot.as_ref().filter(|t| t.is_fresh()) {
                return Ok(token.access_token.clone());
            }
        }

        let mut slot = self.cached.write().await;
        // Another task may have refreshed while we waited for the lock.
        if let Some(token) = slot.as_ref().filter(|t| t.is_fresh()) {
            return Ok(token.access_token.clone());
        }

        let token = self.exchange().await?;
        let access_token = token.access_token.clone();
        *slot = Some(token);
        Ok(access_token)
    }

    /// Force one exchange without consulting the cache, then cache the
    /// result. Confirms the credentials are accepted end to end.
    pub(crate) async fn refresh(&self) -> Result<()> {
        let mut slot = self.cached.write().await;
        let token = self.exchange().await?;
        *slot = Some(token);
        Ok(())
    }

    async fn exchange(&self) -> Result<CachedToken> {
        let assertion = self.sign_assertion()?;

        let response = self
            .http
            .post(&self.token_uri)
            .form(&[("grant_type", GRANT_TYPE), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| StoreError::from_transport(e, self.timeout_ms))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<OAuthError>(&body)
                .map(|e| match e.error_description {
                    Some(desc) => format!("{}: {desc}", e.error),
                    None => e.error,
                })
                .unwrap_or(body);
            error!(status = status.as_u16(), error = %detail, "token exchange rejected");
            // The endpoint reports bad credentials as 400 invalid_grant as
            // often as 401.
            return if matches!(
                status,
                StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
            ) {
                Err(StoreError::Unauthorized(detail))
            } else {
                Err(StoreError::Server {
                    status: status.as_u16(),
                    message: detail,
                })
            };
        }

        let token: TokenResponse = response.json().await?;
        debug!(expires_in = token.expires_in, "access token obtained");
        // The lifetime is clamped so a hostile expires_in cannot overflow
        // the Instant arithmetic.
        let now = Instant::now();
        let lifetime = Duration::from_secs(token.expires_in).min(MAX_TOKEN_LIFETIME);
        Ok(CachedToken {
            access_token: token.access_token,
            expires_at: now.checked_add(lifetime).unwrap_or(now),
        })
    }

    fn sign_assertion(&self) -> Result<String> {
        let now = Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: &self.client_email,
            scope: &self.scope,
            aud: &self.token_uri,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(self.key_id.clone());

        jsonwebtoken::encode(&header, &claims, &self.signing_key)
            .map_err(StoreError::InvalidPrivateKey)
    }
}
