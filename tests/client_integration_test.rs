use serde_json::json;
use storefront_api::clients::{IdentityClient, MediaClient};
use storefront_api::errors::ServiceError;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn verify_token_returns_the_identity() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/tokens:verify"))
        .and(body_partial_json(json!({"token": "good-token"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "subject": "sub-123",
            "email": "user@example.com",
            "name": "A User",
            "email_verified": true
        })))
        .mount(&server)
        .await;

    let client = IdentityClient::new(server.uri(), None);
    let identity = client.verify_token("good-token").await.unwrap();

    assert_eq!(identity.subject, "sub-123");
    assert_eq!(identity.email, "user@example.com");
    assert_eq!(identity.name.as_deref(), Some("A User"));
    assert!(identity.email_verified);
}

#[tokio::test]
async fn rejected_token_is_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/tokens:verify"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = IdentityClient::new(server.uri(), None);
    let err = client.verify_token("bad-token").await.unwrap_err();
    assert!(matches!(err, ServiceError::Unauthorized(_)));
}

#[tokio::test]
async fn provider_outage_is_an_external_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/tokens:verify"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = IdentityClient::new(server.uri(), None);
    let err = client.verify_token("any").await.unwrap_err();
    assert!(matches!(err, ServiceError::ExternalServiceError(_)));
}

#[tokio::test]
async fn delete_subject_treats_missing_as_deleted() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = IdentityClient::new(server.uri(), None);
    assert!(client.delete_subject("sub-gone").await.is_ok());
}

#[tokio::test]
async fn inline_images_are_uploaded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "secure_url": "https://media.example.com/products/tea.jpg",
            "public_id": "asset-42"
        })))
        .mount(&server)
        .await;

    let client = MediaClient::new(server.uri(), None, "storefront".to_string());
    let asset = client
        .store_image("data:image/png;base64,iVBORw0KGgo=", "products", Some("tea"))
        .await
        .unwrap();

    assert_eq!(asset.url, "https://media.example.com/products/tea.jpg");
    assert_eq!(asset.asset_id, "asset-42");
}

#[tokio::test]
async fn hosted_urls_pass_through_without_upload() {
    // No server: a network call would fail the test
    let client = MediaClient::new(
        "http://127.0.0.1:1".to_string(),
        None,
        "storefront".to_string(),
    );
    let asset = client
        .store_image("https://cdn.example.com/pic.jpg", "products", None)
        .await
        .unwrap();
    assert_eq!(asset.url, "https://cdn.example.com/pic.jpg");
}

#[tokio::test]
async fn failed_upload_surfaces_an_external_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/upload"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = MediaClient::new(server.uri(), None, "storefront".to_string());
    let err = client
        .store_image("data:image/png;base64,AAAA", "products", None)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ExternalServiceError(_)));
}
