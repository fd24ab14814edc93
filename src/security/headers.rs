use super::config::{SecurityConfig, XFrameOptions};
use axum::body::Body;
use axum::{
    extract::Request,
    http::{HeaderValue, Response},
};
use futures::future::BoxFuture;
use tower::Service;

/// Build a Tower layer that adds security headers to responses
pub fn build_security_headers_layer(config: &SecurityConfig) -> Option<SecurityHeadersLayer> {
    if !config.enabled {
        return None;
    }

    Some(SecurityHeadersLayer {
        config: config.clone(),
    })
}

/// Tower layer that adds security headers
#[derive(Clone)]
pub struct SecurityHeadersLayer {
    config: SecurityConfig,
}

impl<S> tower::Layer<S> for SecurityHeadersLayer {
    type Service = SecurityHeadersService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SecurityHeadersService {
            inner,
            config: self.config.clone(),
        }
    }
}

/// Tower service that adds security headers
#[derive(Clone)]
pub struct SecurityHeadersService<S> {
    inner: S,
    config: SecurityConfig,
}

impl<S> Service<Request> for SecurityHeadersService<S>
where
    S: Service<Request, Response = Response<Body>> + Send + 'static,
    S::Future: Send,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let config = self.config.clone();
        let fut = self.inner.call(req);

        Box::pin(async move {
            let mut response = fut.await?;
            add_security_headers(&mut response, &config);
            Ok(response)
        })
    }
}

fn add_security_headers<B>(response: &mut Response<B>, config: &SecurityConfig) {
    let headers = response.headers_mut();

    if config.hsts_max_age > 0 {
        let mut hsts_value = format!("max-age={}", config.hsts_max_age);
        if config.hsts_include_subdomains {
            hsts_value.push_str("; includeSubDomains");
        }
        if let Ok(header) = HeaderValue::from_str(&hsts_value) {
            headers.insert("strict-transport-security", header);
        }
    }

    if config.nosniff {
        headers.insert("x-content-type-options", HeaderValue::from_static("nosniff"));
    }

    if let Some(frame_options) = config.x_frame_options {
        let value = match frame_options {
            XFrameOptions::Deny => "DENY",
            XFrameOptions::SameOrigin => "SAMEORIGIN",
        };
        headers.insert("x-frame-options", HeaderValue::from_static(value));
    }

    if let Some(policy) = config.referrer_policy {
        headers.insert("referrer-policy", HeaderValue::from_static(policy.as_str()));
    }

    if let Some(policy) = config.cross_origin_resource_policy {
        headers.insert(
            "cross-origin-resource-policy",
            HeaderValue::from_static(policy.as_str()),
        );
    }

    if let Some(policy) = config.cross_origin_opener_policy {
        headers.insert(
            "cross-origin-opener-policy",
            HeaderValue::from_static(policy.as_str()),
        );
    }

    headers.insert("x-xss-protection", HeaderValue::from_static("0"));
    headers.insert("x-dns-prefetch-control", HeaderValue::from_static("off"));
}
