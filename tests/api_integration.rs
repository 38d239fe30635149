//! Integration tests for the API client against a mock server.

use serde_json::json;
use tag_exporter_core::api::{ApiClient, FetchError, UNKNOWN_NAME};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> ApiClient {
    ApiClient::new(&format!("{}/api", server.uri()), "secret", "Token").unwrap()
}

async fn mount_page(server: &MockServer, endpoint: &str, page: u32, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("/api/{endpoint}/")))
        .and(query_param("page", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_fetch_collection_follows_pages_and_stops_at_null_next() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "tags",
        1,
        json!({
            "count": 3,
            "next": format!("{}/api/tags/?page=2", server.uri()),
            "results": [{"id": 1, "name": "Tax"}, {"id": 2, "name": "Invoices"}]
        }),
    )
    .await;
    mount_page(
        &server,
        "tags",
        2,
        json!({"count": 3, "next": null, "results": [{"id": 3, "name": "Misc"}]}),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/api/tags/"))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .expect(0)
        .mount(&server)
        .await;

    let tags = client_for(&server).fetch_tags().await.unwrap();

    let names: Vec<&str> = tags.iter().map(|tag| tag.name.as_str()).collect();
    assert_eq!(names, vec!["Tax", "Invoices", "Misc"]);
}

#[tokio::test]
async fn test_requests_carry_token_authorization() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/documents/"))
        .and(header("Authorization", "Token secret"))
        .and(header("Accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "next": null,
            "results": [{"id": 7, "title": "Bill", "tags": [1], "added": "2024-01-02T10:00:00Z"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let documents = client_for(&server).fetch_documents().await.unwrap();
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].tags, vec![1]);
}

#[tokio::test]
async fn test_custom_auth_scheme() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags/"))
        .and(header("Authorization", "Bearer abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::new(&format!("{}/api", server.uri()), "abc", "Bearer").unwrap();
    assert!(client.fetch_tags().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_error_status_is_fetch_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client_for(&server).fetch_tags().await.unwrap_err();
    assert_eq!(err.status(), Some(503));
}

#[tokio::test]
async fn test_non_json_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&server)
        .await;

    let err = client_for(&server).fetch_tags().await.unwrap_err();
    assert!(matches!(err, FetchError::Decode { .. }), "got: {err}");
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    let client = ApiClient::new("http://127.0.0.1:9/api", "secret", "Token").unwrap();
    let err = client.fetch_tags().await.unwrap_err();
    assert!(matches!(err, FetchError::Network { .. }), "got: {err}");
}

#[tokio::test]
async fn test_custom_field_definitions_resolve_select_options() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "custom_fields",
        1,
        json!({
            "next": null,
            "results": [
                {"id": 1, "name": "Amount", "data_type": "monetary", "extra_data": {"default_currency": "EUR"}},
                {"id": 2, "name": "Status", "data_type": "select",
                 "extra_data": {"select_options": ["open", "paid"]}},
                {"id": 3, "name": "Priority", "data_type": "select",
                 "extra_data": {"select_options": [{"id": "k1", "label": "high"}]}}
            ]
        }),
    )
    .await;

    let definitions = client_for(&server)
        .fetch_custom_field_definitions()
        .await
        .unwrap();
    assert_eq!(definitions.len(), 3);
    assert_eq!(
        definitions.get(2).unwrap().choice_label(&json!(1)),
        Some("paid")
    );
    assert_eq!(
        definitions.get(3).unwrap().choice_label(&json!("k1")),
        Some("high")
    );
}

#[tokio::test]
async fn test_document_detail_is_returned_verbatim() {
    let server = MockServer::start().await;
    let body = json!({"id": 7, "title": "Bill", "extra_server_field": {"kept": true}});
    Mock::given(method("GET"))
        .and(path("/api/documents/7/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body.clone()))
        .mount(&server)
        .await;

    let raw = client_for(&server).fetch_document_detail(7).await.unwrap();
    assert_eq!(raw, body);
}

#[tokio::test]
async fn test_resolve_name_by_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/correspondents/5/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 5, "name": "ACME"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/correspondents/6/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert_eq!(client.resolve_name_by_id("correspondents", Some(5)).await, "ACME");
    assert_eq!(
        client.resolve_name_by_id("correspondents", Some(6)).await,
        UNKNOWN_NAME
    );
    assert_eq!(client.resolve_name_by_id("correspondents", None).await, "");
}

#[tokio::test]
async fn test_download_document() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/documents/7/download/"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.7 content".to_vec()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/documents/8/download/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert_eq!(
        client.download_document(7).await.unwrap(),
        b"%PDF-1.7 content".to_vec()
    );
    let failure = client.download_document(8).await.unwrap_err();
    assert_eq!(failure.document_id, 8);
    assert_eq!(failure.source.status(), Some(404));
}
