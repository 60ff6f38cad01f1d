//! Swift object storage client
//!
//! Provides a typed HTTP client for an OpenStack-Swift-style object store
//! and implements the [`IObjectStore`] port on top of it. Handles the
//! auth-token header, container-scoped URL construction, streaming
//! transfers, and mapping of HTTP outcomes onto the storage failure
//! taxonomy.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use mirrorsync_swift::client::SwiftClient;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = SwiftClient::new(
//!     "https://storage.example.com/v1/AUTH_abc",
//!     "backups",
//!     "auth-token-here",
//! );
//! client.ensure_container().await?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::{Body, Client, RequestBuilder, Response, StatusCode};
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

use mirrorsync_core::error::{StoreError, StoreResult};
use mirrorsync_core::ports::object_store::{IObjectStore, ObjectMeta};

/// Header carrying the authentication token on every request.
const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

/// Header selecting a storage class (tier) on uploads, when configured.
const STORAGE_CLASS_HEADER: &str = "X-Storage-Class";

// ============================================================================
// SwiftClient
// ============================================================================

/// HTTP client for one container in a Swift-style object store.
///
/// Wraps `reqwest::Client` with the auth-token header and
/// `<endpoint>/<container>/<key>` URL construction. The endpoint is taken
/// as-is, so tests point it at a mock server.
pub struct SwiftClient {
    /// The underlying HTTP client
    client: Client,
    /// Storage endpoint URL, without trailing slash
    endpoint: String,
    /// Container all keys are scoped to
    container: String,
    /// Pre-obtained authentication token
    auth_token: String,
    /// Storage class applied to uploads, if any
    storage_class: Option<String>,
}

impl SwiftClient {
    /// Creates a client for `container` at the given storage endpoint.
    pub fn new(
        endpoint: impl Into<String>,
        container: impl Into<String>,
        auth_token: impl Into<String>,
    ) -> Self {
        let mut endpoint = endpoint.into();
        while endpoint.ends_with('/') {
            endpoint.pop();
        }
        Self {
            client: Client::new(),
            endpoint,
            container: container.into(),
            auth_token: auth_token.into(),
            storage_class: None,
        }
    }

    /// Sets the storage class sent with every upload.
    pub fn with_storage_class(mut self, storage_class: impl Into<String>) -> Self {
        self.storage_class = Some(storage_class.into());
        self
    }

    /// The container this client is scoped to.
    pub fn container(&self) -> &str {
        &self.container
    }

    fn container_url(&self) -> String {
        format!("{}/{}", self.endpoint, self.container)
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.endpoint, self.container, key)
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header(AUTH_TOKEN_HEADER, &self.auth_token)
    }

    /// Creates the container if it does not exist yet. Idempotent: Swift
    /// answers an existing container with 202.
    ///
    /// A container that cannot be created makes every subsequent request
    /// pointless, so any failure here is permanent.
    pub async fn ensure_container(&self) -> StoreResult<()> {
        debug!(container = %self.container, "Ensuring container exists");
        let response = self
            .authed(self.client.put(self.container_url()))
            .send()
            .await
            .map_err(|err| {
                StoreError::permanent(format!("create container {}: {err}", self.container))
            })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(StoreError::permanent(format!(
                "create container {}: HTTP {}",
                self.container,
                response.status()
            )))
        }
    }

    /// Checks the response status, mapping failures onto the storage
    /// failure taxonomy.
    fn check(&self, key: &str, response: Response) -> StoreResult<Response> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(classify_status(status, key))
        }
    }
}

/// Maps an HTTP status onto the failure taxonomy: auth rejections are
/// permanent, absence is not-found, throttling and server-side failures
/// are transient, everything else permanent.
fn classify_status(status: StatusCode, key: &str) -> StoreError {
    match status {
        StatusCode::NOT_FOUND => StoreError::not_found(key),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            StoreError::permanent(format!("{key}: HTTP {status}"))
        }
        StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => {
            StoreError::transient(format!("{key}: HTTP {status}"))
        }
        status if status.is_server_error() => {
            StoreError::transient(format!("{key}: HTTP {status}"))
        }
        status => StoreError::permanent(format!("{key}: HTTP {status}")),
    }
}

/// Maps a transport-level failure. Timeouts and connection failures are
/// retryable; anything else (malformed response, body decoding) is not.
fn classify_transport(key: &str, err: reqwest::Error) -> StoreError {
    if err.is_timeout() || err.is_connect() || err.is_request() {
        StoreError::transient(format!("{key}: {err}"))
    } else {
        StoreError::permanent(format!("{key}: {err}"))
    }
}

#[async_trait]
impl IObjectStore for SwiftClient {
    async fn get(&self, key: &str) -> StoreResult<Vec<u8>> {
        let response = self
            .authed(self.client.get(self.object_url(key)))
            .send()
            .await
            .map_err(|err| classify_transport(key, err))?;
        let response = self.check(key, response)?;
        let bytes = response
            .bytes()
            .await
            .map_err(|err| classify_transport(key, err))?;
        Ok(bytes.to_vec())
    }

    async fn download(&self, key: &str, dest: &Path) -> StoreResult<()> {
        debug!(key, dest = %dest.display(), "Downloading object");
        let response = self
            .authed(self.client.get(self.object_url(key)))
            .send()
            .await
            .map_err(|err| classify_transport(key, err))?;
        let response = self.check(key, response)?;

        let mut file = tokio::fs::File::create(dest).await.map_err(|err| {
            StoreError::transient(format!("create {}: {err}", dest.display()))
        })?;
        let mut stream = response.bytes_stream();
        let mut written = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|err| classify_transport(key, err))?;
            file.write_all(&chunk).await.map_err(|err| {
                StoreError::transient(format!("write {}: {err}", dest.display()))
            })?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(|err| {
            StoreError::transient(format!("flush {}: {err}", dest.display()))
        })?;

        debug!(key, written, "Download complete");
        Ok(())
    }

    async fn upload(&self, key: &str, src: &Path) -> StoreResult<()> {
        let file = tokio::fs::File::open(src)
            .await
            .map_err(|err| StoreError::transient(format!("open {}: {err}", src.display())))?;
        let size = file
            .metadata()
            .await
            .map_err(|err| StoreError::transient(format!("stat {}: {err}", src.display())))?
            .len();

        debug!(key, size, "Uploading object");
        let mut request = self
            .authed(self.client.put(self.object_url(key)))
            .header(reqwest::header::CONTENT_LENGTH, size)
            .body(Body::wrap_stream(ReaderStream::new(file)));
        if let Some(ref storage_class) = self.storage_class {
            request = request.header(STORAGE_CLASS_HEADER, storage_class);
        }

        let response = request
            .send()
            .await
            .map_err(|err| classify_transport(key, err))?;
        self.check(key, response)?;
        Ok(())
    }

    async fn upload_bytes(&self, key: &str, data: &[u8]) -> StoreResult<()> {
        let mut request = self
            .authed(self.client.put(self.object_url(key)))
            .body(data.to_vec());
        if let Some(ref storage_class) = self.storage_class {
            request = request.header(STORAGE_CLASS_HEADER, storage_class);
        }

        let response = request
            .send()
            .await
            .map_err(|err| classify_transport(key, err))?;
        self.check(key, response)?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        let response = self
            .authed(self.client.delete(self.object_url(key)))
            .send()
            .await
            .map_err(|err| classify_transport(key, err))?;
        self.check(key, response)?;
        Ok(())
    }

    async fn list_page(
        &self,
        prefix: Option<&str>,
        marker: Option<&str>,
    ) -> StoreResult<Vec<String>> {
        let mut query: Vec<(&str, &str)> = Vec::new();
        if let Some(prefix) = prefix {
            query.push(("prefix", prefix));
        }
        if let Some(marker) = marker {
            query.push(("marker", marker));
        }

        let response = self
            .authed(self.client.get(self.container_url()).query(&query))
            .send()
            .await
            .map_err(|err| classify_transport(&self.container, err))?;

        // Swift answers an empty listing with 204 No Content.
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(Vec::new());
        }
        let response = self.check(&self.container, response)?;
        let body = response
            .text()
            .await
            .map_err(|err| classify_transport(&self.container, err))?;

        Ok(body.lines().map(str::to_string).collect())
    }

    async fn head(&self, key: &str) -> StoreResult<ObjectMeta> {
        let response = self
            .authed(self.client.head(self.object_url(key)))
            .send()
            .await
            .map_err(|err| classify_transport(key, err))?;
        let response = self.check(key, response)?;

        let size = match response.content_length() {
            Some(size) => size,
            None => {
                warn!(key, "HEAD response carried no Content-Length");
                0
            }
        };
        Ok(ObjectMeta { size })
    }
}
