use crate::admin::Metrics;
use crate::interceptor::{Interception, ResourceInterceptor};
use crate::request::ResourceRequest;
use crate::response::InterceptedResponse;
use hudsucker::{
    hyper::{header, Body, Request, Response, StatusCode},
    HttpContext, HttpHandler, RequestOrResponse,
};
use std::collections::HashMap;
use std::sync::{atomic::Ordering, Arc};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Host adapter wiring a [`ResourceInterceptor`] into the proxy's per-request hook.
///
/// Clones share the interceptor and the metrics; no per-request state is kept.
#[derive(Clone)]
pub struct InterceptHandler {
    interceptor: Arc<ResourceInterceptor>,
    metrics: Arc<Metrics>,
}

impl InterceptHandler {
    pub fn new(interceptor: Arc<ResourceInterceptor>, metrics: Arc<Metrics>) -> Self {
        Self {
            interceptor,
            metrics,
        }
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Decide for a single proxied request: forward it, or answer it locally.
    pub async fn respond(&self, req: Request<Body>) -> RequestOrResponse {
        self.metrics.total_requests.fetch_add(1, Ordering::Relaxed);

        let req_id = Uuid::new_v4().to_string();
        let resource_request = to_resource_request(&req);
        debug!(
            "Request [{}] {} {}",
            req_id, resource_request.method, resource_request.url
        );

        match self.interceptor.intercept_request(&resource_request) {
            Interception::Unhandled => {
                self.metrics.passed_through.fetch_add(1, Ordering::Relaxed);
                RequestOrResponse::Request(req)
            }
            Interception::AssetUnavailable => {
                warn!("Request [{}] matched but asset is unavailable, forwarding", req_id);
                self.metrics.asset_failures.fetch_add(1, Ordering::Relaxed);
                self.metrics.passed_through.fetch_add(1, Ordering::Relaxed);
                RequestOrResponse::Request(req)
            }
            Interception::Substitute(substitute) => {
                info!("Request [{}] answered locally", req_id);
                RequestOrResponse::Response(self.build_response(substitute).await)
            }
        }
    }

    async fn build_response(&self, substitute: InterceptedResponse) -> Response<Body> {
        let content_type = substitute.content_type();

        if !substitute.has_body() {
            self.metrics.asset_failures.fetch_add(1, Ordering::Relaxed);
            self.metrics.degraded.fetch_add(1, Ordering::Relaxed);
            return local_response(StatusCode::NOT_FOUND, &content_type, Body::empty());
        }

        // Asset streams are blocking readers.
        let read = tokio::task::spawn_blocking(move || substitute.read_body()).await;
        match read {
            Ok(Ok(Some(bytes))) => {
                self.metrics.substituted.fetch_add(1, Ordering::Relaxed);
                local_response(StatusCode::OK, &content_type, Body::from(bytes))
            }
            Ok(Ok(None)) => {
                self.metrics.degraded.fetch_add(1, Ordering::Relaxed);
                local_response(StatusCode::NOT_FOUND, &content_type, Body::empty())
            }
            Ok(Err(e)) => {
                warn!("Failed to read substituted asset: {}", e);
                self.metrics.asset_read_errors.fetch_add(1, Ordering::Relaxed);
                local_response(StatusCode::BAD_GATEWAY, &content_type, Body::empty())
            }
            Err(e) => {
                warn!("Asset read task failed: {}", e);
                self.metrics.asset_read_errors.fetch_add(1, Ordering::Relaxed);
                local_response(StatusCode::BAD_GATEWAY, &content_type, Body::empty())
            }
        }
    }
}

fn to_resource_request(req: &Request<Body>) -> ResourceRequest {
    let mut headers = HashMap::new();
    for (k, v) in req.headers() {
        if let Ok(s) = v.to_str() {
            headers.insert(k.to_string(), s.to_string());
        }
    }

    let is_for_main_frame = headers
        .get(header::ACCEPT.as_str())
        .map_or(false, |accept| accept.contains("text/html"));

    ResourceRequest {
        url: req.uri().to_string(),
        method: req.method().to_string(),
        headers,
        is_for_main_frame,
    }
}

fn local_response(status: StatusCode, content_type: &str, body: Body) -> Response<Body> {
    let mut res = Response::new(body);
    *res.status_mut() = status;
    if let Ok(value) = header::HeaderValue::from_str(content_type) {
        res.headers_mut().insert(header::CONTENT_TYPE, value);
    }
    res.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    res
}

#[async_trait::async_trait]
impl HttpHandler for InterceptHandler {
    async fn handle_request(&mut self, _ctx: &HttpContext, req: Request<Body>) -> RequestOrResponse {
        self.respond(req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::MemoryAssetStore;
    use crate::interceptor::AssetFailurePolicy;
    use crate::rules::RuleSet;
    use hudsucker::hyper::body::to_bytes;

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\nfake";

    fn handler(store: MemoryAssetStore, policy: AssetFailurePolicy) -> InterceptHandler {
        let interceptor = ResourceInterceptor::new(RuleSet::default(), Arc::new(store))
            .with_failure_policy(policy);
        InterceptHandler::new(Arc::new(interceptor), Arc::new(Metrics::default()))
    }

    fn get(url: &str) -> Request<Body> {
        Request::builder()
            .uri(url)
            .header("accept", "image/webp,*/*")
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_matching_request_answered_with_asset() {
        let handler = handler(
            MemoryAssetStore::new().with_asset("images/error.png", PNG),
            AssetFailurePolicy::FallThrough,
        );

        let res = match handler.respond(get("http://s.ip-cdn.com/img/logo.gif")).await {
            RequestOrResponse::Response(res) => res,
            RequestOrResponse::Request(_) => panic!("expected a local response"),
        };

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(
            res.headers().get(header::CONTENT_TYPE).unwrap(),
            "image/png; charset=utf-8"
        );
        let body = to_bytes(res.into_body()).await.unwrap();
        assert_eq!(&body[..], PNG);
        assert_eq!(handler.metrics().snapshot().substituted, 1);
    }

    #[tokio::test]
    async fn test_other_request_forwarded_unchanged() {
        let handler = handler(
            MemoryAssetStore::new().with_asset("images/error.png", PNG),
            AssetFailurePolicy::FallThrough,
        );

        match handler.respond(get("http://ip.cn/")).await {
            RequestOrResponse::Request(req) => assert_eq!(req.uri(), "http://ip.cn/"),
            RequestOrResponse::Response(_) => panic!("request should be forwarded"),
        }
        let snapshot = handler.metrics().snapshot();
        assert_eq!(snapshot.total_requests, 1);
        assert_eq!(snapshot.passed_through, 1);
        assert_eq!(snapshot.asset_failures, 0);
    }

    #[tokio::test]
    async fn test_missing_asset_forwarded_under_fall_through() {
        let handler = handler(MemoryAssetStore::new(), AssetFailurePolicy::FallThrough);

        assert!(matches!(
            handler.respond(get("http://s.ip-cdn.com/img/logo.gif")).await,
            RequestOrResponse::Request(_)
        ));

        let snapshot = handler.metrics().snapshot();
        assert_eq!(snapshot.total_requests, 1);
        assert_eq!(snapshot.asset_failures, 1);
        assert_eq!(snapshot.passed_through, 1);
        assert_eq!(snapshot.substituted, 0);
    }

    #[tokio::test]
    async fn test_missing_asset_degrades_to_not_found() {
        let handler = handler(MemoryAssetStore::new(), AssetFailurePolicy::Degrade);

        let res = match handler.respond(get("http://s.ip-cdn.com/img/logo.gif")).await {
            RequestOrResponse::Response(res) => res,
            RequestOrResponse::Request(_) => panic!("expected a degraded response"),
        };
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let body = to_bytes(res.into_body()).await.unwrap();
        assert!(body.is_empty());
        let snapshot = handler.metrics().snapshot();
        assert_eq!(snapshot.degraded, 1);
        assert_eq!(snapshot.asset_failures, 1);
    }

    #[test]
    fn test_main_frame_detection() {
        let req = Request::builder()
            .uri("http://ip.cn/")
            .header("accept", "text/html,application/xhtml+xml")
            .body(Body::empty())
            .unwrap();
        let resource = to_resource_request(&req);
        assert!(resource.is_for_main_frame);
        assert_eq!(resource.method, "GET");

        let resource = to_resource_request(&get("http://s.ip-cdn.com/img/logo.gif"));
        assert!(!resource.is_for_main_frame);
    }
}
