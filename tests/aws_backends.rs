use aws_sdk_s3::config::retry::RetryConfig;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use bytes::Bytes;
use file_relay::error::StoreError;
use file_relay::registry::{
    DynamoMetadataStore, FileMapping, IdentifierRegistry, MetadataStore, is_identifier,
};
use file_relay::storage::{ObjectStore, ResponseOverrides, S3ObjectStore};
use file_relay::utils::headers::content_disposition;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BUCKET: &str = "relay-bucket";
const TABLE: &str = "FileMapping";
const ID: &str = "a1b2c3d4e5f60718293a4b5c6d7e8f90";
const DYNAMO_JSON: &str = "application/x-amz-json-1.0";

fn credentials() -> Credentials {
    Credentials::new("test-access-key", "test-secret-key", None, None, "test")
}

fn s3_store(endpoint: &str) -> S3ObjectStore {
    let config = aws_sdk_s3::Config::builder()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new("us-west-2"))
        .credentials_provider(credentials())
        .endpoint_url(endpoint)
        .force_path_style(true)
        .retry_config(RetryConfig::disabled())
        .build();
    S3ObjectStore::new(aws_sdk_s3::Client::from_conf(config), BUCKET)
}

fn dynamo_store(endpoint: &str) -> DynamoMetadataStore {
    let config = aws_sdk_dynamodb::Config::builder()
        .behavior_version(aws_sdk_dynamodb::config::BehaviorVersion::latest())
        .region(aws_sdk_dynamodb::config::Region::new("us-west-2"))
        .credentials_provider(aws_sdk_dynamodb::config::Credentials::new(
            "test-access-key",
            "test-secret-key",
            None,
            None,
            "test",
        ))
        .endpoint_url(endpoint)
        .retry_config(aws_sdk_dynamodb::config::retry::RetryConfig::disabled())
        .build();
    DynamoMetadataStore::new(aws_sdk_dynamodb::Client::from_conf(config), TABLE)
}

fn dynamo_target(operation: &str) -> String {
    format!("DynamoDB_20120810.{operation}")
}

#[tokio::test]
async fn test_s3_exists_for_present_object() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path(format!("/{BUCKET}/{ID}")))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    assert!(s3_store(&server.uri()).exists(ID).await.unwrap());
}

#[tokio::test]
async fn test_s3_exists_false_for_missing_object() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path(format!("/{BUCKET}/{ID}")))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    assert!(!s3_store(&server.uri()).exists(ID).await.unwrap());
}

/// 403 不能当作对象不存在
#[tokio::test]
async fn test_s3_exists_reports_access_denied_as_error() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path(format!("/{BUCKET}/{ID}")))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let err = s3_store(&server.uri()).exists(ID).await.unwrap_err();
    assert!(matches!(err, StoreError::Unavailable { backend: "s3", .. }));
}

#[tokio::test]
async fn test_s3_put_object_sends_content_type() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(format!("/{BUCKET}/{ID}")))
        .and(header("content-type", "application/pdf"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    s3_store(&server.uri())
        .put_object(ID, Bytes::from_static(b"%PDF-1.4"), "application/pdf")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_s3_put_object_failure() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = s3_store(&server.uri())
        .put_object(ID, Bytes::from_static(b"data"), "text/plain")
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Unavailable { .. }));
}

/// 预签名在本地完成，不需要访问服务端
#[tokio::test]
async fn test_s3_presigned_get_carries_disposition_and_expiry() {
    let store = s3_store("http://localhost:9000");
    let overrides = ResponseOverrides {
        content_disposition: Some(content_disposition("report.pdf")),
    };

    let url = store
        .presigned_get(ID, Duration::from_secs(86_400), &overrides)
        .await
        .unwrap();

    assert!(url.starts_with(&format!("http://localhost:9000/{BUCKET}/{ID}?")));
    assert!(url.contains("X-Amz-Expires=86400"));
    assert!(url.contains("X-Amz-Signature="));
    assert!(url.contains("response-content-disposition=filename%3D%22report.pdf%22"));
}

#[tokio::test]
async fn test_dynamo_get_existing_mapping() {
    let server = MockServer::start().await;
    let body = format!(
        r#"{{"Item":{{"identifier":{{"S":"{ID}"}},"filename":{{"S":"report.pdf"}},"version":{{"N":"1"}}}}}}"#
    );
    Mock::given(method("POST"))
        .and(header("x-amz-target", dynamo_target("GetItem").as_str()))
        .and(body_string_contains(ID))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, DYNAMO_JSON))
        .expect(1)
        .mount(&server)
        .await;

    let mapping = dynamo_store(&server.uri()).get(ID).await.unwrap();
    assert_eq!(mapping, Some(FileMapping::stored(ID, "report.pdf", 1)));
}

#[tokio::test]
async fn test_dynamo_get_missing_mapping() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("x-amz-target", dynamo_target("GetItem").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{}", DYNAMO_JSON))
        .mount(&server)
        .await;

    assert_eq!(dynamo_store(&server.uri()).get(ID).await.unwrap(), None);
}

#[tokio::test]
async fn test_dynamo_put_new_mapping_is_insert_only() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("x-amz-target", dynamo_target("PutItem").as_str()))
        .and(body_string_contains("attribute_not_exists(#id)"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{}", DYNAMO_JSON))
        .expect(1)
        .mount(&server)
        .await;

    let registry = IdentifierRegistry::new(Arc::new(dynamo_store(&server.uri())));
    let saved = registry.save(FileMapping::new("report.pdf")).await.unwrap();
    assert_eq!(saved.version(), Some(1));
    assert!(saved.identifier().is_some_and(is_identifier));
}

/// 没有标识符的映射不会发送到后端
#[tokio::test]
async fn test_dynamo_put_requires_identifier() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{}", DYNAMO_JSON))
        .expect(0)
        .mount(&server)
        .await;

    let err = dynamo_store(&server.uri())
        .put(&FileMapping::new("report.pdf"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Corrupt { .. }));
}

#[tokio::test]
async fn test_dynamo_put_update_checks_version() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("x-amz-target", dynamo_target("PutItem").as_str()))
        .and(body_string_contains("#v = :expected"))
        .and(body_string_contains(r#"{":expected":{"N":"3"}}"#))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{}", DYNAMO_JSON))
        .expect(1)
        .mount(&server)
        .await;

    let version = dynamo_store(&server.uri())
        .put(&FileMapping::stored(ID, "report.pdf", 3))
        .await
        .unwrap();
    assert_eq!(version, 4);
}

#[tokio::test]
async fn test_dynamo_put_conflict() {
    let server = MockServer::start().await;
    let body = r#"{"__type":"com.amazonaws.dynamodb.v20120810#ConditionalCheckFailedException","message":"The conditional request failed"}"#;
    Mock::given(method("POST"))
        .and(header("x-amz-target", dynamo_target("PutItem").as_str()))
        .respond_with(ResponseTemplate::new(400).set_body_raw(body, DYNAMO_JSON))
        .mount(&server)
        .await;

    let err = dynamo_store(&server.uri())
        .put(&FileMapping::stored(ID, "report.pdf", 1))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Conflict { identifier } if identifier == ID));
}

#[tokio::test]
async fn test_dynamo_unreachable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = dynamo_store(&server.uri()).get(ID).await.unwrap_err();
    assert!(matches!(err, StoreError::Unavailable { backend: "dynamodb", .. }));
}
