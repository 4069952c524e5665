// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>

//! Client configuration, connection, and HTTP transport layer.
//!
//! [`TabulariumClient`] is the entry point for all store operations. It owns
//! the endpoint URL, HTTP client, project identity, and token provider.
//! Collection-scoped methods ([`CollectionRef`](crate::CollectionRef) and
//! the convenience document surface) are defined as `impl TabulariumClient`
//! blocks in their respective modules.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};
use url::Url;

use crate::credentials::ServiceAccountKey;
use crate::error::{Result, StoreError};
use crate::token::{TokenProvider, DATASTORE_SCOPE};
use crate::types::ErrorEnvelope;

/// Public REST endpoint of the managed store.
pub const FIRESTORE_ENDPOINT: &str = "https://firestore.googleapis.com/v1";

// ---------------------------------------------------------------------------
// ConnectOptions
// ---------------------------------------------------------------------------

/// Connection parameters beyond the credentials file.
///
/// The defaults target the production endpoint and the default database;
/// tests and emulator setups override `endpoint`.
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    /// Base URL of the REST API, without a trailing slash.
    pub endpoint: String,
    /// Database id within the project.
    pub database: String,
    /// Per-request timeout applied to every HTTP call.
    pub timeout: Duration,
    /// OAuth2 scope requested during the token exchange.
    pub scope: String,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            endpoint: FIRESTORE_ENDPOINT.to_string(),
            database: "(default)".to_string(),
            timeout: Duration::from_secs(30),
            scope: DATASTORE_SCOPE.to_string(),
        }
    }
}

impl ConnectOptions {
    /// Point the client at a different endpoint (emulator, mock server).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Select a non-default database.
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// Override the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

// ---------------------------------------------------------------------------
// TabulariumClient
// ---------------------------------------------------------------------------

/// An authenticated connection to one project's document store.
///
/// Constructed by [`connect`](TabulariumClient::connect); no global
/// instance exists, and a handle only exists if credential validation
/// succeeded. Connecting performs no network I/O; the first operation
/// triggers the token exchange.
///
/// # Examples
///
/// ```rust,no_run
/// use tabularium::TabulariumClient;
///
/// # #[tokio::main]
/// # async fn main() -> tabularium::Result<()> {
/// let client = TabulariumClient::connect("/etc/svc/service_account.json")?;
/// let users = client.collection("users")?;
/// if let Some(doc) = users.get("alice").await? {
///     println!("{}", serde_json::Value::Object(doc.data));
/// }
/// # Ok(())
/// # }
/// ```
pub struct TabulariumClient {
    /// Parsed endpoint URL (e.g. `https://firestore.googleapis.com/v1`).
    endpoint: Url,
    /// Database id, `"(default)"` unless overridden.
    database: String,
    /// Project the credentials belong to.
    project_id: String,
    /// Underlying `reqwest` HTTP client (connection-pooled, TLS-capable).
    http: reqwest::Client,
    /// Cached OAuth2 access tokens.
    tokens: TokenProvider,
    /// Per-request timeout.
    timeout: Duration,
}

impl TabulariumClient {
    // -- Constructors -------------------------------------------------------

    /// Connect using a service-account key file and default options.
    ///
    /// # Errors
    ///
    /// Any credential problem is a distinct [`StoreError`] variant: a
    /// missing file, an unreadable file, malformed JSON, the first absent
    /// required field, a non-service-account credential type, or an RSA
    /// key that does not parse.
    pub fn connect(credentials_path: impl AsRef<Path>) -> Result<Self> {
        Self::connect_with(credentials_path, ConnectOptions::default())
    }

    /// Connect using a service-account key file and explicit options.
    pub fn connect_with(
        credentials_path: impl AsRef<Path>,
        options: ConnectOptions,
    ) -> Result<Self> {
        let key = ServiceAccountKey::load(credentials_path)?;

        let endpoint = Url::parse(&options.endpoint)
            .map_err(|e| StoreError::Validation(format!("Invalid endpoint URL: {e}")))?;
        if endpoint.cannot_be_a_base() {
            return Err(StoreError::Validation(format!(
                "Endpoint URL cannot carry a path: {endpoint}"
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(options.timeout)
            .build()
            .map_err(StoreError::Network)?;

        let timeout_ms = options.timeout.as_millis() as u64;
        let tokens = TokenProvider::new(&key, http.clone(), options.scope, timeout_ms)?;

        info!(
            project = %key.project_id,
            database = %options.database,
            "document store client ready"
        );

        Ok(Self {
            endpoint,
            database: options.database,
            project_id: key.project_id,
            http,
            tokens,
            timeout: options.timeout,
        })
    }

    // -- Accessors ----------------------------------------------------------

    /// Project id taken from the credentials file.
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Database id this client addresses.
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Return the configured per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    // -- Credential verification --------------------------------------------

    /// Force a token exchange to confirm the credentials are accepted.
    ///
    /// Connecting alone proves the key file is well-formed; this proves the
    /// identity provider honors it. The obtained token is cached for
    /// subsequent operations.
    pub async fn verify(&self) -> Result<()> {
        self.tokens.refresh().await?;
        info!(project = %self.project_id, "credentials verified");
        Ok(())
    }

    // -- Internal HTTP helpers ----------------------------------------------

    /// Build a URL under this database's `documents` root.
    pub(crate) fn resource_url(&self, segments: &[&str]) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut path = url
                .path_segments_mut()
                // Unwrap is safe: the endpoint was checked at connect.
                .expect("endpoint is a base URL");
            path.pop_if_empty();
            path.extend([
                "projects",
                self.project_id.as_str(),
                "databases",
                self.database.as_str(),
                "documents",
            ]);
            path.extend(segments);
        }
        url
    }

    pub(crate) fn timeout_millis(&self) -> u64 {
        self.timeout.as_millis() as u64
    }

    /// Attach a bearer token, fetching or refreshing it if needed.
    async fn authorized(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::RequestBuilder> {
        let token = self.tokens.access_token().await?;
        Ok(builder.bearer_auth(token))
    }

    /// Perform a GET request and deserialize the JSON response body.
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let request = self.authorized(self.http.get(url)).await?;
        let response = request
            .send()
            .await
            .map_err(|e| StoreError::from_transport(e, self.timeout_millis()))?;

        self.handle_response(response).await
    }

    /// Perform a PATCH request with a JSON body and deserialize the response.
    pub(crate) async fn patch_json<B: Serialize, T: DeserializeOwned>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T> {
        let request = self.authorized(self.http.patch(url)).await?;
        let response = request
            .json(body)
            .send()
            .await
            .map_err(|e| StoreError::from_transport(e, self.timeout_millis()))?;

        self.handle_response(response).await
    }

    /// Perform a DELETE request. Returns `()` on success.
    pub(crate) async fn delete_resource(&self, url: Url) -> Result<()> {
        let request = self.authorized(self.http.delete(url)).await?;
        let response = request
            .send()
            .await
            .map_err(|e| StoreError::from_transport(e, self.timeout_millis()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(self.extract_error(response).await)
        }
    }

    // -- Response handling --------------------------------------------------

    /// Deserialize a successful response or extract an error from the body.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();

        if status.is_success() {
            let body = response.text().await.map_err(StoreError::Network)?;
            serde_json::from_str(&body).map_err(StoreError::Serialization)
        } else {
            Err(self.extract_error(response).await)
        }
    }

    /// Turn a non-2xx response into the appropriate [`StoreError`] variant.
    async fn extract_error(&self, response: reqwest::Response) -> StoreError {
        let status = response.status().as_u16();

        // Attempt to parse the provider's structured error envelope.
        let message = match response.json::<ErrorEnvelope>().await {
            Ok(envelope) => {
                debug!(
                    code = envelope.error.code,
                    rpc_status = ?envelope.error.status,
                    "provider error envelope"
                );
                envelope.error.message
            }
            Err(_) => format!("HTTP {status}"),
        };

        match status {
            404 => StoreError::NotFound(message),
            401 | 403 => StoreError::Unauthorized(message),
            _ => StoreError::Server { status, message },
        }
    }
}

impl fmt::Debug for TabulariumClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TabulariumClient")
            .field("endpoint", &self.endpoint)
            .field("database", &self.database)
            .field("project_id", &self.project_id)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
