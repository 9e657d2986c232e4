//! End-to-end tests: the reqwest transport against a local HTTP server.

mod common;

use std::time::Duration;

use common::{ArtifactState, Group, RuleViolation, StubServer, SystemInfo};
use kiota_core::KiotaError;
use kiota_http::{
    AdapterConfig, AnonymousAuthenticationProvider, ErrorMappings, HttpMethod, HttpRequestAdapter,
    RequestInformation,
};
use tokio::time::timeout;

const TEST_TIMEOUT: Duration = Duration::from_secs(10);

fn adapter_for(server: &StubServer) -> HttpRequestAdapter {
    let config = AdapterConfig::builder()
        .base_url(server.base_url.clone())
        .timeout(Duration::from_secs(5))
        .default_header("X-Tenant", "acme")
        .build()
        .unwrap();
    HttpRequestAdapter::from_config(&config, AnonymousAuthenticationProvider).unwrap()
}

fn create_group_request(adapter: &HttpRequestAdapter) -> RequestInformation {
    let group = Group {
        group_id: Some("test-group".to_string()),
        description: None,
    };
    let mut info = RequestInformation::new(HttpMethod::Post, "{+baseurl}/groups")
        .header("Accept", "application/json");
    info.set_content_from_parsable(adapter.registry(), "application/json", &group)
        .unwrap();
    info
}

#[tokio::test]
async fn test_get_system_info() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let server = StubServer::start().await;
    let adapter = adapter_for(&server);

    let info = RequestInformation::new(HttpMethod::Get, "{+baseurl}/system/info")
        .header("Accept", "application/json");
    let result = timeout(TEST_TIMEOUT, adapter.send(info, None, SystemInfo::create))
        .await
        .expect("request timed out")
        .unwrap()
        .unwrap();

    assert_eq!(result.name.as_deref(), Some("test"));
    assert_eq!(result.description.as_deref(), Some("test"));

    let recorded = server.recorded();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].method, "GET");
    assert_eq!(recorded[0].path, "/system/info");
    assert!(recorded[0]
        .headers
        .iter()
        .any(|(name, value)| name == "x-tenant" && value == "acme"));
}

#[tokio::test]
async fn test_get_with_void_result() {
    let server = StubServer::start().await;
    let adapter = adapter_for(&server);

    let info = RequestInformation::new(HttpMethod::Get, "{+baseurl}/system/info");
    let result = timeout(TEST_TIMEOUT, adapter.send_primitive::<()>(info, None))
        .await
        .expect("request timed out")
        .unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_post_with_no_content_response_does_not_hang() {
    let server = StubServer::start().await;
    let adapter = adapter_for(&server);

    for _ in 0..5 {
        let request = create_group_request(&adapter);
        let result = timeout(TEST_TIMEOUT, adapter.send(request, None, Group::create))
            .await
            .expect("request timed out")
            .unwrap();
        assert!(result.is_none());
    }

    let recorded = server.recorded();
    assert_eq!(recorded.len(), 5);
    for request in recorded {
        assert_eq!(request.method, "POST");
        assert_eq!(request.path, "/groups");
        assert_eq!(request.body, br#"{"groupId":"test-group"}"#);
        assert!(request
            .headers
            .iter()
            .any(|(name, value)| name == "content-type" && value == "application/json"));
    }
}

#[tokio::test]
async fn test_post_then_get_on_same_adapter() {
    let server = StubServer::start().await;
    let adapter = adapter_for(&server);

    timeout(
        TEST_TIMEOUT,
        adapter.send_no_content(create_group_request(&adapter), None),
    )
    .await
    .expect("request timed out")
    .unwrap();

    let info = RequestInformation::new(HttpMethod::Get, "{+baseurl}/system/info");
    let result = timeout(TEST_TIMEOUT, adapter.send(info, None, SystemInfo::create))
        .await
        .expect("request timed out")
        .unwrap();
    assert!(result.is_some());
}

#[tokio::test]
async fn test_mapped_not_found() {
    let server = StubServer::start().await;
    let adapter = adapter_for(&server);
    let mappings = ErrorMappings::new().with("4XX", RuleViolation::create);

    let info = RequestInformation::new(HttpMethod::Get, "{+baseurl}/groups/missing");
    let err = timeout(TEST_TIMEOUT, adapter.send(info, Some(&mappings), Group::create))
        .await
        .expect("request timed out")
        .unwrap_err();

    let KiotaError::Api(api) = err else {
        panic!("expected an API error, got {err:?}");
    };
    assert_eq!(api.status_code(), 404);
    assert_eq!(
        api.body_as::<RuleViolation>().and_then(|b| b.title.as_deref()),
        Some("group not found")
    );
}

#[tokio::test]
async fn test_enum_collection_over_the_wire() {
    let server = StubServer::start().await;
    let adapter = adapter_for(&server);

    let info = RequestInformation::new(HttpMethod::Get, "{+baseurl}/groups/states");
    let states = timeout(
        TEST_TIMEOUT,
        adapter.send_enum_collection::<ArtifactState>(info, None),
    )
    .await
    .expect("request timed out")
    .unwrap()
    .unwrap();
    assert_eq!(
        states,
        vec![Some(ArtifactState::Enabled), Some(ArtifactState::Deprecated)]
    );
}

#[tokio::test]
async fn test_unmapped_method_not_allowed() {
    let server = StubServer::start().await;
    let adapter = adapter_for(&server);

    let info = RequestInformation::new(HttpMethod::Delete, "{+baseurl}/groups");
    let err = timeout(TEST_TIMEOUT, adapter.send_no_content(info, None))
        .await
        .expect("request timed out")
        .unwrap_err();
    assert!(matches!(err, KiotaError::Api(ref api) if api.status_code() == 405));
}
