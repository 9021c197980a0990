use futures::StreamExt;
use integration_tests::{TestServer, listing_request, openai::OpenAIMock};

#[tokio::test]
async fn streams_the_listing_as_plain_text() {
    let mock = OpenAIMock::new()
        .with_fragments(&["Spacious ", "two-bed ", "home."])
        .spawn()
        .await
        .unwrap();

    let server = TestServer::builder().completion(&mock).build("").await;
    let response = server.client.post("/generate-listing", &listing_request()).await;

    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["content-type"], "text/plain; charset=utf-8");

    let mut listing = String::new();
    let mut chunks = response.bytes_stream();

    while let Some(chunk) = chunks.next().await {
        listing.push_str(std::str::from_utf8(&chunk.unwrap()).unwrap());
    }

    assert_eq!(listing, "Spacious two-bed home.");
    assert_eq!(mock.calls(), 1);
}

#[tokio::test]
async fn upstream_request_is_a_streaming_chat_completion() {
    let mock = OpenAIMock::new().spawn().await.unwrap();
    let server = TestServer::builder().completion(&mock).build("").await;

    let response = server.client.post("/generate-listing", &listing_request()).await;
    assert_eq!(response.status(), 200);
    response.text().await.unwrap();

    let requests = mock.requests();
    assert_eq!(requests.len(), 1);

    let request = &requests[0];
    assert_eq!(request.authorization.as_deref(), Some("Bearer test-key"));
    assert_eq!(request.body["model"], "gpt-4o-mini");
    assert_eq!(request.body["stream"], true);

    let temperature = request.body["temperature"].as_f64().unwrap() as f32;
    assert_eq!(temperature, 0.3);

    let messages = request.body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "system");
    assert_eq!(messages[1]["role"], "user");

    insta::assert_snapshot!(messages[0]["content"].as_str().unwrap(), @"You are an assistant that writes real estate listings. Keep the writing factual, neutral, and descriptive. Avoid creative or exaggerated language, and do not invent details.");
    insta::assert_snapshot!(messages[1]["content"].as_str().unwrap(), @"Write a factual and descriptive real estate listing for a 2-bedroom, 1-bathroom house. Focus only on accurate details. Avoid exaggerations or assumptions. List features factually: garden, garage.");
}

#[tokio::test]
async fn temperature_above_range_is_clamped() {
    let mock = OpenAIMock::new().spawn().await.unwrap();
    let server = TestServer::builder().completion(&mock).build("").await;

    let mut request = listing_request();
    request["temperature"] = serde_json::json!(1.7);

    let response = server.client.post("/generate-listing", &request).await;
    assert_eq!(response.status(), 200);
    response.text().await.unwrap();

    let requests = mock.requests();
    assert_eq!(requests[0].body["temperature"], 0.5);
}

#[tokio::test]
async fn disconnect_after_content_truncates_the_listing() {
    let mock = OpenAIMock::new()
        .with_fragments(&["Sunny ", "cottage", " with a pool."])
        .disconnect_after(2)
        .spawn()
        .await
        .unwrap();

    let server = TestServer::builder().completion(&mock).build("").await;
    let response = server.client.post("/generate-listing", &listing_request()).await;

    assert_eq!(response.status(), 200);

    let mut listing = String::new();
    let mut chunks = response.bytes_stream();

    while let Some(Ok(chunk)) = chunks.next().await {
        listing.push_str(std::str::from_utf8(&chunk).unwrap());
    }

    assert_eq!(listing, "Sunny cottage");
}

#[tokio::test]
async fn disconnect_before_content_is_a_gateway_error() {
    let mock = OpenAIMock::new().disconnect_after(0).spawn().await.unwrap();

    let server = TestServer::builder().completion(&mock).build("").await;
    let response = server.client.post("/generate-listing", &listing_request()).await;

    assert_eq!(response.status(), 502);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"]["type"], "api_error");
}

#[tokio::test]
async fn error_event_after_content_truncates_the_listing() {
    let mock = OpenAIMock::new()
        .with_fragments(&["Sunny ", "cottage", " with a pool."])
        .error_event_after(2)
        .spawn()
        .await
        .unwrap();

    let server = TestServer::builder().completion(&mock).build("").await;
    let response = server.client.post("/generate-listing", &listing_request()).await;

    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "Sunny cottage");
}

#[tokio::test]
async fn error_event_before_content_is_a_gateway_error() {
    let mock = OpenAIMock::new().error_event_after(0).spawn().await.unwrap();

    let server = TestServer::builder().completion(&mock).build("").await;
    let response = server.client.post("/generate-listing", &listing_request()).await;

    assert_eq!(response.status(), 502);

    let body = response.text().await.unwrap();
    insta::assert_snapshot!(body, @r#"{"error":{"message":"Completion service returned an unexpected response: error event in stream","type":"api_error","code":502}}"#);
}

#[tokio::test]
async fn stream_outlasting_the_timeout_is_not_cut_off() {
    let mock = OpenAIMock::new()
        .with_fragments(&["Quiet ", "street, ", "large ", "windows, ", "new roof."])
        .with_event_interval(std::time::Duration::from_millis(300))
        .spawn()
        .await
        .unwrap();

    let server = TestServer::builder()
        .completion(&mock)
        .completion_timeout("1s")
        .build("")
        .await;

    let response = server.client.post("/generate-listing", &listing_request()).await;

    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "Quiet street, large windows, new roof.");
}

#[tokio::test]
async fn custom_listing_path() {
    let mock = OpenAIMock::new().spawn().await.unwrap();

    let config = indoc::indoc! {r#"
        [listing]
        path = "/api/listings"
    "#};

    let server = TestServer::builder().completion(&mock).build(config).await;

    let response = server.client.post("/api/listings", &listing_request()).await;
    assert_eq!(response.status(), 200);
    response.text().await.unwrap();

    let response = server.client.post("/generate-listing", &listing_request()).await;
    assert_eq!(response.status(), 404);

    assert_eq!(mock.calls(), 1);
}
