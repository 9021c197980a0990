use indoc::indoc;
use integration_tests::{TestServer, listing_request, openai::OpenAIMock};
use serde_json::json;

#[tokio::test]
async fn missing_field_is_rejected_without_upstream_call() {
    let mock = OpenAIMock::new().spawn().await.unwrap();
    let server = TestServer::builder().completion(&mock).build("").await;

    let request = json!({
        "property_type": "house",
        "bathrooms": 1,
        "features": "garden"
    });

    let response = server.client.post("/generate-listing", &request).await;
    assert_eq!(response.status(), 400);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"]["type"], "invalid_request_error");
    assert_eq!(body["error"]["code"], 400);

    assert_eq!(mock.calls(), 0);
}

#[tokio::test]
async fn malformed_json_is_rejected_without_upstream_call() {
    let mock = OpenAIMock::new().spawn().await.unwrap();
    let server = TestServer::builder().completion(&mock).build("").await;

    let response = server.client.post_raw("/generate-listing", "{\"property_type\": ").await;
    assert_eq!(response.status(), 400);

    assert_eq!(mock.calls(), 0);
}

#[tokio::test]
async fn negative_counts_are_rejected_without_upstream_call() {
    let mock = OpenAIMock::new().spawn().await.unwrap();
    let server = TestServer::builder().completion(&mock).build("").await;

    let mut request = listing_request();
    request["bedrooms"] = json!(-2);

    let response = server.client.post("/generate-listing", &request).await;
    assert_eq!(response.status(), 400);

    assert_eq!(mock.calls(), 0);
}

#[tokio::test]
async fn upstream_error_does_not_leak_the_prompt() {
    let mock = OpenAIMock::new()
        .with_internal_error("model crashed while reading: garden, garage")
        .spawn()
        .await
        .unwrap();

    let server = TestServer::builder().completion(&mock).build("").await;
    let response = server.client.post("/generate-listing", &listing_request()).await;

    assert_eq!(response.status(), 502);

    let body = response.text().await.unwrap();
    assert!(!body.contains("garden"));
    assert!(!body.contains("real estate"));

    insta::assert_snapshot!(body, @r#"{"error":{"message":"Completion service returned an error (500)","type":"api_error","code":502}}"#);

    assert_eq!(mock.calls(), 1);
}

#[tokio::test]
async fn upstream_error_in_whole_mode() {
    let mock = OpenAIMock::new().with_internal_error("boom").spawn().await.unwrap();

    let config = indoc! {r#"
        [server]
        delivery = "whole"
    "#};

    let server = TestServer::builder().completion(&mock).build(config).await;
    let response = server.client.post("/generate-listing", &listing_request()).await;

    assert_eq!(response.status(), 502);
    assert_eq!(mock.calls(), 1);
}

#[tokio::test]
async fn rejected_credentials() {
    let mock = OpenAIMock::new()
        .with_auth_error("Incorrect API key provided")
        .spawn()
        .await
        .unwrap();

    let server = TestServer::builder().completion(&mock).build("").await;
    let response = server.client.post("/generate-listing", &listing_request()).await;

    assert_eq!(response.status(), 502);

    let body = response.text().await.unwrap();
    insta::assert_snapshot!(body, @r#"{"error":{"message":"Completion service rejected the configured credentials","type":"api_error","code":502}}"#);
}

#[tokio::test]
async fn rate_limited_upstream() {
    let mock = OpenAIMock::new().with_rate_limit("Slow down").spawn().await.unwrap();

    let server = TestServer::builder().completion(&mock).build("").await;
    let response = server.client.post("/generate-listing", &listing_request()).await;

    assert_eq!(response.status(), 502);

    let body = response.text().await.unwrap();
    insta::assert_snapshot!(body, @r#"{"error":{"message":"Completion service rate limit exceeded","type":"api_error","code":502}}"#);
}

#[tokio::test]
async fn unreachable_upstream() {
    let server = TestServer::builder().build("").await;
    let response = server.client.post("/generate-listing", &listing_request()).await;

    assert_eq!(response.status(), 502);
}

#[tokio::test]
async fn failed_request_is_not_retried() {
    let mock = OpenAIMock::new().with_internal_error("boom").spawn().await.unwrap();
    let server = TestServer::builder().completion(&mock).build("").await;

    for _ in 0..2 {
        let response = server.client.post("/generate-listing", &listing_request()).await;
        assert_eq!(response.status(), 502);
    }

    assert_eq!(mock.calls(), 2);
}
