pub mod openai;

use std::net::SocketAddr;
use std::time::Duration;

use config::Config;
use indoc::formatdoc;
use server::ServeConfig;
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use openai::RunningOpenAIMock;

/// Test client for making HTTP requests to the test server
pub struct TestClient {
    base_url: String,
    client: reqwest::Client,
}

impl TestClient {
    /// Create a new test client for the given base URL
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    /// Send a POST request to the given path with JSON body
    pub async fn post(&self, path: &str, body: &serde_json::Value) -> reqwest::Response {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await
            .unwrap()
    }

    /// Send a POST request with a raw body, labelled as JSON
    pub async fn post_raw(&self, path: &str, body: impl Into<reqwest::Body>) -> reqwest::Response {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .unwrap()
    }

    /// Send a GET request to the given path
    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .unwrap()
    }
}

/// A valid listing request body.
pub fn listing_request() -> serde_json::Value {
    serde_json::json!({
        "property_type": "house",
        "bedrooms": 2,
        "bathrooms": 1,
        "features": "garden, garage"
    })
}

/// Assembles the configuration of a test server.
#[derive(Default)]
pub struct TestServerBuilder {
    completion_base_url: Option<String>,
    completion_timeout: Option<String>,
}

impl TestServerBuilder {
    /// Points the completion relay at a running mock, with a test API key.
    pub fn completion(mut self, mock: &RunningOpenAIMock) -> Self {
        self.completion_base_url = Some(mock.base_url());
        self
    }

    /// Overrides the upstream timeout, e.g. `"1s"`.
    pub fn completion_timeout(mut self, timeout: &str) -> Self {
        self.completion_timeout = Some(timeout.to_string());
        self
    }

    fn config_toml(&self, config: &str) -> String {
        let mut config = config.to_string();

        // An unreachable base URL is used when no mock is attached, so startup still succeeds.
        let base_url = self
            .completion_base_url
            .clone()
            .unwrap_or_else(|| "http://127.0.0.1:9/v1".to_string());

        config.push_str(&formatdoc! {r#"

            [completion]
            api_key = "test-key"
            base_url = "{base_url}"
        "#});

        if let Some(timeout) = &self.completion_timeout {
            config.push_str(&format!("timeout = \"{timeout}\"\n"));
        }

        config
    }

    /// Start the server, panicking if it does not come up.
    pub async fn build(self, config: &str) -> TestServer {
        self.try_build(config).await.unwrap()
    }

    /// Start the server and report startup failures.
    pub async fn try_build(self, config: &str) -> anyhow::Result<TestServer> {
        let config: Config = toml::from_str(&self.config_toml(config))?;
        TestServer::start_with_config(config).await
    }
}

/// Test server that manages the lifecycle of a server instance
pub struct TestServer {
    pub client: TestClient,
    pub address: SocketAddr,
    shutdown_signal: CancellationToken,
    handle: tokio::task::JoinHandle<anyhow::Result<()>>,
}

impl TestServer {
    pub fn builder() -> TestServerBuilder {
        TestServerBuilder::default()
    }

    /// Start a server from an already assembled configuration.
    pub async fn start_with_config(config: Config) -> anyhow::Result<Self> {
        // Find an available port
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let address = listener.local_addr()?;
        drop(listener);

        let shutdown_signal = CancellationToken::new();

        let serve_config = ServeConfig {
            listen_address: address,
            config,
            shutdown_signal: shutdown_signal.clone(),
        };

        let mut handle = tokio::spawn(server::serve(serve_config));

        // Startup errors surface before the listener is bound.
        if let Ok(result) = timeout(Duration::from_millis(100), &mut handle).await {
            return match result? {
                Ok(()) => Err(anyhow::anyhow!("Server exited during startup")),
                Err(e) => Err(e),
            };
        }

        let client = TestClient::new(format!("http://{address}"));

        // Verify the server is actually accepting connections
        let mut retries = 10;
        while retries > 0 {
            if tokio::net::TcpStream::connect(address).await.is_ok() {
                break;
            }

            retries -= 1;
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        Ok(TestServer {
            client,
            address,
            shutdown_signal,
            handle,
        })
    }

    /// Trigger a graceful shutdown and wait for the server to finish.
    pub async fn shutdown(self) -> anyhow::Result<()> {
        self.shutdown_signal.cancel();
        self.handle.await?
    }
}
