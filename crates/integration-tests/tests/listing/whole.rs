use indoc::indoc;
use integration_tests::{TestServer, listing_request, openai::OpenAIMock};

const WHOLE: &str = indoc! {r#"
    [server]
    delivery = "whole"
"#};

#[tokio::test]
async fn returns_the_listing_as_json() {
    let mock = OpenAIMock::new()
        .with_fragments(&["Spacious ", "two-bed ", "home."])
        .spawn()
        .await
        .unwrap();

    let server = TestServer::builder().completion(&mock).build(WHOLE).await;
    let response = server.client.post("/generate-listing", &listing_request()).await;

    assert_eq!(response.status(), 200);

    let body = response.text().await.unwrap();
    insta::assert_snapshot!(body, @r#"{"listing":"Spacious two-bed home."}"#);

    let requests = mock.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].body["stream"], false);
}

#[tokio::test]
async fn empty_features_are_accepted() {
    let mock = OpenAIMock::new().spawn().await.unwrap();
    let server = TestServer::builder().completion(&mock).build(WHOLE).await;

    let mut request = listing_request();
    request["features"] = serde_json::json!("");

    let response = server.client.post("/generate-listing", &request).await;
    assert_eq!(response.status(), 200);

    let requests = mock.requests();
    let prompt = requests[0].body["messages"][1]["content"].as_str().unwrap().to_string();

    assert!(prompt.ends_with("List features factually: ."));
}

#[tokio::test]
async fn slow_upstream_times_out() {
    let mock = OpenAIMock::new()
        .with_delay(std::time::Duration::from_secs(3))
        .spawn()
        .await
        .unwrap();

    let server = TestServer::builder()
        .completion(&mock)
        .completion_timeout("1s")
        .build(WHOLE)
        .await;

    let response = server.client.post("/generate-listing", &listing_request()).await;

    assert_eq!(response.status(), 504);

    let body = response.text().await.unwrap();
    insta::assert_snapshot!(body, @r#"{"error":{"message":"Completion service timed out","type":"timeout_error","code":504}}"#);
}
