//! Container listing tests: prefix/marker query handling and pagination
//! termination.

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use mirrorsync_core::ports::object_store::IObjectStore;

use crate::common::{mount_listing, setup_swift_mock, TEST_CONTAINER};

#[tokio::test]
async fn test_listing_splits_lines() {
    let (server, client) = setup_swift_mock().await;
    mount_listing(&server, "a.txt\nb.txt\nphotos~c.jpg\n").await;

    let page = client.list_page(None, None).await.unwrap();
    assert_eq!(page, vec!["a.txt", "b.txt", "photos~c.jpg"]);
}

#[tokio::test]
async fn test_listing_passes_prefix_and_marker() {
    let (server, client) = setup_swift_mock().await;
    Mock::given(method("GET"))
        .and(path(format!("/{TEST_CONTAINER}")))
        .and(query_param("prefix", "photos~"))
        .and(query_param("marker", "photos~b.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_string("photos~c.jpg\n"))
        .expect(1)
        .mount(&server)
        .await;

    let page = client
        .list_page(Some("photos~"), Some("photos~b.jpg"))
        .await
        .unwrap();
    assert_eq!(page, vec!["photos~c.jpg"]);
}

#[tokio::test]
async fn test_empty_listing_via_no_content() {
    let (server, client) = setup_swift_mock().await;
    Mock::given(method("GET"))
        .and(path(format!("/{TEST_CONTAINER}")))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let page = client.list_page(None, None).await.unwrap();
    assert!(page.is_empty());
}

#[tokio::test]
async fn test_empty_body_terminates_pagination() {
    let (server, client) = setup_swift_mock().await;
    mount_listing(&server, "").await;

    let page = client.list_page(None, Some("zzz")).await.unwrap();
    assert!(page.is_empty());
}
