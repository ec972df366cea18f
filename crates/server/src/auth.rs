use std::{
    fmt::Display,
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use axum::body::Body;
use http::{Request, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use tower::Layer;

use crate::headers;

/// Shared-secret check for the trusted front door.
///
/// Runs before everything else; a request with a missing or wrong secret is
/// answered with an empty 403 and never reaches the proxy handler. Routine
/// unauthorized probing, so nothing is logged.
#[derive(Clone)]
pub(crate) struct AuthLayer(Arc<AuthLayerInner>);

struct AuthLayerInner {
    secret: SecretString,
}

impl AuthLayer {
    pub fn new(secret: SecretString) -> Self {
        Self(Arc::new(AuthLayerInner { secret }))
    }
}

impl<Service> Layer<Service> for AuthLayer
where
    Service: Send + Clone,
{
    type Service = AuthService<Service>;

    fn layer(&self, next: Service) -> Self::Service {
        AuthService {
            next,
            layer: self.0.clone(),
        }
    }
}

#[derive(Clone)]
pub(crate) struct AuthService<Service> {
    next: Service,
    layer: Arc<AuthLayerInner>,
}

impl<Service, ReqBody> tower::Service<Request<ReqBody>> for AuthService<Service>
where
    Service: tower::Service<Request<ReqBody>, Response = Response<Body>> + Send + Clone + 'static,
    Service::Future: Send,
    Service::Error: Display + 'static,
    ReqBody: http_body::Body + Send + 'static,
{
    type Response = Response<Body>;
    type Error = Service::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response<Body>, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.next.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let mut next = self.next.clone();
        let layer = self.layer.clone();

        Box::pin(async move {
            let presented = req
                .headers()
                .get(headers::PROXY_SECRET)
                .and_then(|value| value.to_str().ok());

            if presented == Some(layer.secret.expose_secret()) {
                next.call(req).await
            } else {
                let response = Response::builder()
                    .status(StatusCode::FORBIDDEN)
                    .body(Body::empty())
                    .unwrap();

                Ok(response)
            }
        })
    }
}
