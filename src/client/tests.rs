//! Tests for the service client module

use super::http::classify_failure;
use super::*;
use crate::error::Error;
use crate::query::{QueryPage, QueryRequest};
use crate::types::AttributeValue;
use reqwest::StatusCode;
use serde_json::json;
use std::time::Duration;
use test_case::test_case;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> HttpQueryClient {
    let config = HttpClientConfig::builder()
        .endpoint(server.uri())
        .timeout(Duration::from_secs(5))
        .header("Authorization", "local-test")
        .build();
    HttpQueryClient::with_config(config).unwrap()
}

fn edge_request() -> QueryRequest {
    QueryRequest::new("edgestore", "hk = :hk").value(":hk", AttributeValue::s("v1"))
}

// ============================================================================
// HttpClientConfig Tests
// ============================================================================

#[test]
fn test_http_client_config_default() {
    let config = HttpClientConfig::default();
    assert_eq!(config.timeout, Duration::from_secs(30));
    assert!(config.default_headers.is_empty());
    assert!(config.user_agent.starts_with("dynamo-pager/"));
}

#[test]
fn test_http_client_config_builder() {
    let config = HttpClientConfig::builder()
        .endpoint("http://dynamodb.local:8000")
        .timeout(Duration::from_secs(3))
        .header("Authorization", "x")
        .user_agent("test-agent/1.0")
        .build();

    assert_eq!(config.endpoint, "http://dynamodb.local:8000");
    assert_eq!(config.timeout, Duration::from_secs(3));
    assert_eq!(
        config.default_headers.get("Authorization"),
        Some(&"x".to_string())
    );
    assert_eq!(config.user_agent, "test-agent/1.0");
}

#[test]
fn test_invalid_endpoint_rejected() {
    let config = HttpClientConfig::builder().endpoint("not a url").build();
    let err = HttpQueryClient::with_config(config).unwrap_err();
    assert!(matches!(err, Error::InvalidUrl(_)));
}

// ============================================================================
// HttpQueryClient Tests
// ============================================================================

#[tokio::test]
async fn test_query_sends_protocol_headers_and_parses_page() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/"))
        .and(header("X-Amz-Target", "DynamoDB_20120810.Query"))
        .and(header("Content-Type", "application/x-amz-json-1.0"))
        .and(header("Authorization", "local-test"))
        .and(body_partial_json(json!({
            "TableName": "edgestore",
            "ReturnConsumedCapacity": "TOTAL"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Items": [{"hk": {"S": "v1"}, "rk": {"S": "e1"}}],
            "Count": 1,
            "ScannedCount": 2,
            "ConsumedCapacity": {"TableName": "edgestore", "CapacityUnits": 0.5},
            "LastEvaluatedKey": {"hk": {"S": "v1"}, "rk": {"S": "e1"}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let page = client_for(&server).query(&edge_request()).await.unwrap();

    assert_eq!(page.count, 1);
    assert_eq!(page.scanned_count, 2);
    assert_eq!(page.capacity_units(), Some(0.5));
    assert!(page.has_cursor());
}

#[tokio::test]
async fn test_query_sends_cursor() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "ExclusiveStartKey": {"hk": {"S": "v1"}, "rk": {"S": "e1"}}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Items": [],
            "Count": 0,
            "ScannedCount": 0
        })))
        .expect(1)
        .mount(&server)
        .await;

    let page = QueryPage::default();
    let mut cursor = crate::types::Item::new();
    cursor.insert("hk".to_string(), AttributeValue::s("v1"));
    cursor.insert("rk".to_string(), AttributeValue::s("e1"));
    let request = edge_request().start_from(cursor);

    let result = client_for(&server).query(&request).await.unwrap();
    assert_eq!(result, page);
}

#[tokio::test]
async fn test_query_throttling_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "__type": "com.amazonaws.dynamodb.v20120810#ProvisionedThroughputExceededException",
            "message": "The level of configured provisioned throughput for the table was exceeded."
        })))
        .mount(&server)
        .await;

    let err = client_for(&server).query(&edge_request()).await.unwrap_err();
    assert!(err.is_retryable());
    match err {
        Error::Throttled { resource, code, .. } => {
            assert_eq!(resource, "edgestore");
            assert_eq!(code, "ProvisionedThroughputExceededException");
        }
        other => panic!("Expected Throttled, got {other:?}"),
    }
}

#[tokio::test]
async fn test_query_missing_table() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "__type": "com.amazonaws.dynamodb.v20120810#ResourceNotFoundException",
            "message": "Cannot do operations on a non-existent table"
        })))
        .mount(&server)
        .await;

    let err = client_for(&server).query(&edge_request()).await.unwrap_err();
    assert!(!err.is_retryable());
    assert!(matches!(err, Error::ResourceNotFound { ref resource } if resource == "edgestore"));
}

#[tokio::test]
async fn test_query_malformed_success_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy</html>"))
        .mount(&server)
        .await;

    let err = client_for(&server).query(&edge_request()).await.unwrap_err();
    assert!(matches!(err, Error::MalformedResponse { .. }));
    assert!(!err.is_retryable());
}

// ============================================================================
// Failure Classification Tests
// ============================================================================

#[test_case(400, "com.amazonaws.dynamodb.v20120810#ThrottlingException", true ; "throttling")]
#[test_case(400, "com.amazonaws.dynamodb.v20120810#RequestLimitExceeded", true ; "request limit")]
#[test_case(500, "com.amazonaws.dynamodb.v20120810#InternalServerError", true ; "internal error")]
#[test_case(503, "", true ; "unavailable without type")]
#[test_case(429, "", true ; "too many requests")]
#[test_case(400, "com.amazon.coral.validate#ValidationException", false ; "validation")]
#[test_case(400, "com.amazonaws.dynamodb.v20120810#ResourceNotFoundException", false ; "not found")]
#[test_case(400, "com.amazon.coral.service#AccessDeniedException", false ; "access denied")]
#[test_case(403, "", false ; "forbidden")]
fn test_classify_failure(status: u16, error_type: &str, retryable: bool) {
    let body = json!({"__type": error_type, "message": "m"}).to_string();
    let status = StatusCode::from_u16(status).unwrap();
    let err = classify_failure(status, &body, "edgestore");
    assert_eq!(err.is_retryable(), retryable, "{err:?}");
}

#[test]
fn test_classify_failure_plain_text_body() {
    let err = classify_failure(StatusCode::BAD_REQUEST, "bad things", "edgestore");
    match err {
        Error::Validation { code, message } => {
            assert!(code.is_empty());
            assert_eq!(message, "bad things");
        }
        other => panic!("Expected Validation, got {other:?}"),
    }
}

#[test]
fn test_classify_failure_capitalized_message() {
    let body = json!({
        "__type": "com.amazon.coral.service#UnrecognizedClientException",
        "Message": "The security token included in the request is invalid."
    })
    .to_string();
    let err = classify_failure(StatusCode::BAD_REQUEST, &body, "edgestore");
    assert!(matches!(err, Error::AccessDenied { ref message, .. } if message.contains("security token")));
}

// ============================================================================
// ScriptedClient Tests
// ============================================================================

#[tokio::test]
async fn test_scripted_client_replays_in_order() {
    let client = ScriptedClient::new([
        ScriptStep::Throttle,
        ScriptStep::page(QueryPage::default().with_scanned(3)),
    ]);

    let request = edge_request();
    let err = client.query(&request).await.unwrap_err();
    assert!(matches!(err, Error::Throttled { .. }));

    let page = client.query(&request).await.unwrap();
    assert_eq!(page.scanned_count, 3);

    assert_eq!(client.calls(), 2);
    assert_eq!(client.remaining(), 0);
    assert_eq!(client.requests()[0], request);
}

#[tokio::test]
async fn test_scripted_client_runs_dry() {
    let client = ScriptedClient::pages([]);
    let err = client.query(&edge_request()).await.unwrap_err();
    assert!(matches!(err, Error::Validation { ref code, .. } if code == "ScriptExhausted"));
}

#[test]
fn test_script_step_json_shape() {
    let steps: Vec<ScriptStep> = serde_json::from_value(json!([
        {"type": "throttle"},
        {"type": "validation", "message": "bad key"},
        {"type": "page", "page": {"Count": 0, "ScannedCount": 1}}
    ]))
    .unwrap();

    assert_eq!(steps[0], ScriptStep::Throttle);
    assert_eq!(
        steps[1],
        ScriptStep::Validation {
            message: "bad key".to_string()
        }
    );
    assert_eq!(
        steps[2],
        ScriptStep::page(QueryPage::default().with_scanned(1))
    );
}
