//! Shared test helpers for Swift adapter integration tests
//!
//! Provides wiremock-based mock server setup. Each helper mounts the
//! necessary mock endpoints and returns a SwiftClient pointing at the
//! mock server.

use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use mirrorsync_swift::client::SwiftClient;

pub const TEST_CONTAINER: &str = "backups";
pub const TEST_TOKEN: &str = "test-auth-token";

/// Starts a mock server and returns a client scoped to [`TEST_CONTAINER`].
pub async fn setup_swift_mock() -> (MockServer, SwiftClient) {
    let server = MockServer::start().await;
    let client = SwiftClient::new(server.uri(), TEST_CONTAINER, TEST_TOKEN);
    (server, client)
}

/// Mounts a GET for one object, requiring the auth-token header.
pub async fn mount_object(server: &MockServer, key: &str, content: &[u8]) {
    Mock::given(method("GET"))
        .and(path(format!("/{TEST_CONTAINER}/{key}")))
        .and(header("X-Auth-Token", TEST_TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(content.to_vec()))
        .mount(server)
        .await;
}

/// Mounts a PUT for one object answering 201 Created.
pub async fn mount_upload(server: &MockServer, key: &str) {
    Mock::given(method("PUT"))
        .and(path(format!("/{TEST_CONTAINER}/{key}")))
        .and(header("X-Auth-Token", TEST_TOKEN))
        .respond_with(ResponseTemplate::new(201))
        .mount(server)
        .await;
}

/// Mounts a container listing answering the given newline-separated keys.
#[allow(dead_code)]
pub async fn mount_listing(server: &MockServer, body: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/{TEST_CONTAINER}")))
        .respond_with(ResponseTemplate::new(200).set_body_string(body.to_string()))
        .mount(server)
        .await;
}
