use async_trait::async_trait;
use axum::body::Body;
use http::{HeaderMap, HeaderName, Request, Response, StatusCode, header};
use url::Url;

/// Hop-by-hop headers, meaningful only for a single transport hop and never
/// relayed in either direction.
const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// The single-upstream reverse-proxy primitive.
///
/// One operation so the transport can be swapped for a mock in tests.
/// Transport failures do not surface as errors; the implementation answers
/// them itself, a real upstream with 502 Bad Gateway.
#[async_trait]
pub(crate) trait Upstream: Send + Sync {
    /// Relays the request to the upstream host and streams the response back.
    async fn forward(&self, request: Request<Body>) -> Response<Body>;
}

/// Reverse proxy bound to the fixed upstream base URL. Connection reuse is
/// the client pool's business.
pub(crate) struct HttpUpstream {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpUpstream {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let base_url = Url::parse(base_url)?;
        let client = reqwest::Client::builder().build()?;

        Ok(HttpUpstream { client, base_url })
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn forward(&self, request: Request<Body>) -> Response<Body> {
        let (parts, body) = request.into_parts();

        let mut url = self.base_url.clone();
        url.set_path(parts.uri.path());
        url.set_query(parts.uri.query());

        let mut headers = parts.headers;
        sanitize_request_headers(&mut headers);

        let outbound = self
            .client
            .request(parts.method, url)
            .headers(headers)
            .body(reqwest::Body::wrap_stream(body.into_data_stream()))
            .build();

        let outbound = match outbound {
            Ok(outbound) => outbound,
            Err(e) => {
                log::error!("failed to build upstream request: {e}");
                return bad_gateway();
            }
        };

        match self.client.execute(outbound).await {
            Ok(response) => into_response(response),
            Err(e) => {
                log::error!("upstream request failed: {e}");
                bad_gateway()
            }
        }
    }
}

/// Strips headers the client must not choose for the upstream hop. Host is
/// derived from the upstream URL and content-length from the streamed body.
fn sanitize_request_headers(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP {
        headers.remove(&name);
    }

    headers.remove(header::HOST);
    headers.remove(header::CONTENT_LENGTH);
}

fn into_response(response: reqwest::Response) -> Response<Body> {
    let status = response.status();
    let mut headers = response.headers().clone();

    for name in HOP_BY_HOP {
        headers.remove(&name);
    }

    let mut builder = Response::builder().status(status);

    if let Some(response_headers) = builder.headers_mut() {
        *response_headers = headers;
    }

    builder
        .body(Body::from_stream(response.bytes_stream()))
        .unwrap_or_else(|_| bad_gateway())
}

fn bad_gateway() -> Response<Body> {
    Response::builder()
        .status(StatusCode::BAD_GATEWAY)
        .body(Body::empty())
        .unwrap()
}
