//! Shared harness for the end-to-end gateway tests: a real gateway bound to
//! an ephemeral port and a spy upstream recording everything it receives.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Router,
    body::Bytes,
    extract::{Request, State},
    response::IntoResponse,
};
use config::Config;
use http::{HeaderMap, Method, StatusCode, Uri};
use server::ServeConfig;
use tokio::net::TcpListener;

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

    /// Start building a request with an arbitrary method, so callers can add
    /// headers and a body before sending
    pub fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        self.client.request(method, format!("{}{}", self.base_url, path))
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

/// One request observed by the spy upstream.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Request method as received by the upstream.
    pub method: Method,
    /// Path and query as received by the upstream.
    pub uri: Uri,
    /// Headers as received by the upstream.
    pub headers: HeaderMap,
    /// Full request body.
    pub body: Bytes,
}

type Recorded = Arc<Mutex<Vec<RecordedRequest>>>;

/// Stand-in upstream REST API recording every request it receives.
pub struct SpyUpstream {
    /// The address the spy listens on.
    pub address: SocketAddr,
    requests: Recorded,
    _handle: tokio::task::JoinHandle<()>,
}

impl SpyUpstream {
    /// Bind the spy to an ephemeral local port.
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();

        let requests: Recorded = Arc::default();

        let app = Router::new().fallback(record).with_state(requests.clone());

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        SpyUpstream {
            address,
            requests,
            _handle: handle,
        }
    }

    /// The `[upstream]` configuration section pointing at this spy.
    pub fn config_section(&self) -> String {
        format!("[upstream]\nhost = \"{}\"\nport = {}\n", self.address.ip(), self.address.port())
    }

    /// Everything the spy has received so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

async fn record(State(requests): State<Recorded>, request: Request) -> impl IntoResponse {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, usize::MAX).await.unwrap();

    requests.lock().unwrap().push(RecordedRequest {
        method: parts.method,
        uri: parts.uri,
        headers: parts.headers,
        body,
    });

    (StatusCode::OK, "upstream-ok")
}

/// Test server that manages the lifecycle of a gateway instance
pub struct TestServer {
    /// Client pointed at the gateway.
    pub client: TestClient,
    /// The address the gateway listens on.
    pub address: SocketAddr,
    _handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    /// Start a new test server with the given TOML configuration
    pub async fn start(config_toml: &str) -> Self {
        let config: Config = toml::from_str(config_toml).unwrap();

        // Find an available port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();

        let serve_config = ServeConfig {
            listen_address: address,
            config,
        };

        let (tx, mut rx) = tokio::sync::oneshot::channel();
        let handle = tokio::spawn(async move {
            // Drop the listener so the server can bind to the address
            drop(listener);

            if let Err(e) = server::serve(serve_config).await {
                let _ = tx.send(e);
            }
        });

        tokio::time::sleep(Duration::from_millis(100)).await;

        if let Ok(e) = rx.try_recv() {
            eprintln!("Server failed to start: {e}");
            std::process::exit(1);
        }

        let client = TestClient::new(format!("http://{address}"));

        // Wait until the listener answers
        let probe = reqwest::Client::new();
        let mut retries = 10;

        while retries > 0 {
            if probe.get(format!("http://{address}/")).send().await.is_ok() {
                break;
            }

            retries -= 1;
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        TestServer {
            client,
            address,
            _handle: handle,
        }
    }
}
