use axum::body::Body;
use http::{HeaderName, HeaderValue, Request, Response, StatusCode};
use token::{GatewayClaims, TOKEN_DOMAIN, TokenSigner, session_id};

use crate::{headers, proxy::Upstream, tiers::TierTable};

/// The per-request pipeline behind the shared-secret check: classify the
/// caller's tier, mint the signed session token, relay upstream.
pub(crate) struct Gateway {
    tiers: TierTable,
    signer: Box<dyn TokenSigner>,
    upstream: Box<dyn Upstream>,
    api_key: HeaderValue,
}

impl Gateway {
    pub fn new(
        tiers: TierTable,
        signer: Box<dyn TokenSigner>,
        upstream: Box<dyn Upstream>,
        api_key: HeaderValue,
    ) -> Self {
        Gateway {
            tiers,
            signer,
            upstream,
            api_key,
        }
    }

    pub async fn handle(&self, mut request: Request<Body>) -> Response<Body> {
        let tier = self.tiers.classify(header_str(&request, &headers::SUBSCRIPTION));
        let caller = header_str(&request, &headers::USER).unwrap_or_default();

        let claims = GatewayClaims {
            rate: tier.rate.clone(),
            connections: tier.connections,
            role: tier.id.to_string(),
            session_id: session_id(caller, &tier.rate, tier.connections),
            domain: TOKEN_DOMAIN.to_string(),
        };

        let token = match self.signer.sign(claims) {
            Ok(token) => token,
            Err(e) => {
                log::error!("failed to generate token: {e}");
                return internal_server_error();
            }
        };

        let token = match HeaderValue::from_str(&token) {
            Ok(token) => token,
            Err(e) => {
                log::error!("generated token is not a valid header value: {e}");
                return internal_server_error();
            }
        };

        let outbound_headers = request.headers_mut();
        outbound_headers.insert(headers::TOKEN, token);
        outbound_headers.insert(headers::API_KEY, self.api_key.clone());

        self.upstream.forward(request).await
    }
}

fn header_str<'a>(request: &'a Request<Body>, name: &HeaderName) -> Option<&'a str> {
    request.headers().get(name).and_then(|value| value.to_str().ok())
}

fn internal_server_error() -> Response<Body> {
    Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .body(Body::empty())
        .unwrap()
}
