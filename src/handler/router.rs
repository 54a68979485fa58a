//! Request routing dispatch module
//!
//! Entry point for HTTP request processing. Every request is wrapped in a
//! server span from the configured [`Tracer`](crate::telemetry::Tracer),
//! dispatched by exact path, and written to the access log.

use crate::api;
use crate::config::AppState;
use crate::handler::{health, pages};
use crate::http;
use crate::logger::{self, AccessLogEntry};
use crate::telemetry::Span;
use http_body_util::Full;
use hyper::body::{Body as _, Bytes};
use hyper::http::request::Parts;
use hyper::{HeaderMap, Method, Request, Response, Uri, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Client address, attached to each request by the connection layer
#[derive(Debug, Clone, Copy)]
pub struct ClientAddr(pub SocketAddr);

/// Request context encapsulating information needed for request processing
pub struct RequestContext<'a> {
    pub method: &'a Method,
    pub uri: &'a Uri,
    pub headers: &'a HeaderMap,
    /// Server span of this request; handlers hang child spans off it
    pub span: &'a dyn Span,
    pub trace_id: Option<&'a str>,
    pub state: &'a AppState,
}

/// Registered endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Root,
    Health,
    Version,
    Hello,
    Status,
    Feature,
    Metrics,
    Echo,
    Info,
    Time,
    Random,
}

impl Endpoint {
    /// All endpoints in landing-page order
    pub const ALL: [Self; 11] = [
        Self::Root,
        Self::Health,
        Self::Version,
        Self::Hello,
        Self::Status,
        Self::Feature,
        Self::Metrics,
        Self::Echo,
        Self::Info,
        Self::Time,
        Self::Random,
    ];

    /// Exact-match lookup
    pub fn resolve(path: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.path() == path)
    }

    pub const fn path(self) -> &'static str {
        match self {
            Self::Root => "/",
            Self::Health => "/health",
            Self::Version => "/version",
            Self::Hello => "/api/hello",
            Self::Status => "/api/status",
            Self::Feature => "/api/feature",
            Self::Metrics => "/api/metrics",
            Self::Echo => "/api/echo",
            Self::Info => "/api/info",
            Self::Time => "/api/time",
            Self::Random => "/api/random",
        }
    }

    /// Whether a hit increments the request counter
    pub const fn is_counted(self) -> bool {
        !matches!(
            self,
            Self::Health | Self::Version | Self::Hello | Self::Status
        )
    }
}

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let _in_flight = state.enter_request();
    let (parts, _) = req.into_parts();

    let mut span = state
        .tracer
        .start_request_span(&state.config.telemetry.service_name, &parts.headers);
    span.set_attribute("http.method", parts.method.as_str().into());
    span.set_attribute("http.target", parts.uri.path().into());
    let trace_id = span.trace_id();

    let response = route(&parts, span.as_ref(), trace_id.as_deref(), &state).await;

    let status = response.status();
    span.set_attribute("http.status_code", i64::from(status.as_u16()).into());
    if status.is_server_error() {
        span.record_error(status.canonical_reason().unwrap_or("server error"));
    }
    span.end();

    if state.access_log_enabled() {
        let entry = access_entry(&parts, &response, trace_id, started);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Route request to its handler
async fn route(
    parts: &Parts,
    span: &dyn Span,
    trace_id: Option<&str>,
    state: &AppState,
) -> Response<Full<Bytes>> {
    let Some(endpoint) = Endpoint::resolve(parts.uri.path()) else {
        return http::build_404_response();
    };

    if endpoint.is_counted() {
        state.metrics.record_request();
    }

    let ctx = RequestContext {
        method: &parts.method,
        uri: &parts.uri,
        headers: &parts.headers,
        span,
        trace_id,
        state,
    };

    match endpoint {
        Endpoint::Root => pages::handle_root(&ctx),
        Endpoint::Health => health::handle_health(&ctx),
        Endpoint::Version => health::handle_version(&ctx),
        Endpoint::Hello => api::handle_hello(&ctx).await,
        Endpoint::Status => api::handle_status(&ctx),
        Endpoint::Feature => api::handle_feature(&ctx),
        Endpoint::Metrics => api::handle_metrics(&ctx),
        Endpoint::Echo => api::handle_echo(&ctx).await,
        Endpoint::Info => api::handle_info(&ctx),
        Endpoint::Time => api::handle_time(&ctx),
        Endpoint::Random => api::handle_random(&ctx).await,
    }
}

/// Build the access log record for a finished request
fn access_entry(
    parts: &Parts,
    response: &Response<Full<Bytes>>,
    trace_id: Option<String>,
    started: Instant,
) -> AccessLogEntry {
    let remote_addr = parts
        .extensions
        .get::<ClientAddr>()
        .map_or_else(|| "-".to_string(), |a| a.0.ip().to_string());
    let header = |name: &str| {
        parts
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
    };

    let mut entry = AccessLogEntry::new(
        remote_addr,
        parts.method.to_string(),
        parts.uri.path().to_string(),
    );
    entry.query = parts.uri.query().map(ToString::to_string);
    entry.http_version = match parts.version {
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        _ => "1.1",
    }
    .to_string();
    entry.status = response.status().as_u16();
    entry.body_bytes = response
        .body()
        .size_hint()
        .exact()
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(0);
    entry.referer = header("referer");
    entry.user_agent = header("user-agent");
    entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
    entry.trace_id = trace_id;
    entry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use crate::telemetry::testing::{RecordingTracer, TEST_TRACE_ID};
    use http_body_util::{BodyExt, Empty};
    use hyper::StatusCode;

    fn untraced_state() -> Arc<AppState> {
        Arc::new(AppState::untraced(&test_config()))
    }

    fn get(uri: &str) -> Request<Empty<Bytes>> {
        Request::builder().uri(uri).body(Empty::new()).unwrap()
    }

    async fn call(state: &Arc<AppState>, req: Request<Empty<Bytes>>) -> (StatusCode, Bytes) {
        let resp = handle_request(req, Arc::clone(state)).await.unwrap();
        let status = resp.status();
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        (status, body)
    }

    #[test]
    fn test_endpoint_resolve_exact_only() {
        assert_eq!(Endpoint::resolve("/"), Some(Endpoint::Root));
        assert_eq!(Endpoint::resolve("/api/echo"), Some(Endpoint::Echo));
        assert_eq!(Endpoint::resolve("/api/echo/"), None);
        assert_eq!(Endpoint::resolve("/health/live"), None);
        assert_eq!(Endpoint::resolve("/favicon.ico"), None);
    }

    #[test]
    fn test_counted_endpoints() {
        let counted: Vec<_> = Endpoint::ALL
            .into_iter()
            .filter(|e| e.is_counted())
            .map(Endpoint::path)
            .collect();
        assert_eq!(
            counted,
            vec![
                "/",
                "/api/feature",
                "/api/metrics",
                "/api/echo",
                "/api/info",
                "/api/time",
                "/api/random"
            ]
        );
    }

    #[tokio::test]
    async fn test_unknown_path_is_404_and_not_counted() {
        let state = untraced_state();
        let (status, _) = call(&state, get("/nope")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(state.metrics.request_count(), 0);
    }

    #[tokio::test]
    async fn test_counter_only_moves_for_counted_routes() {
        let state = untraced_state();
        for uri in ["/health", "/version", "/api/hello", "/api/status"] {
            let (status, _) = call(&state, get(uri)).await;
            assert_eq!(status, StatusCode::OK, "{uri}");
        }
        assert_eq!(state.metrics.request_count(), 0);

        for uri in ["/", "/api/feature", "/api/info", "/api/time"] {
            let (status, _) = call(&state, get(uri)).await;
            assert_eq!(status, StatusCode::OK, "{uri}");
        }
        assert_eq!(state.metrics.request_count(), 4);
    }

    #[tokio::test]
    async fn test_any_method_is_accepted() {
        let state = untraced_state();
        for method in [Method::POST, Method::PUT, Method::DELETE, Method::HEAD] {
            let req = Request::builder()
                .method(method.clone())
                .uri("/health")
                .body(Empty::new())
                .unwrap();
            let (status, _) = call(&state, req).await;
            assert_eq!(status, StatusCode::OK, "{method}");
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_requests_lose_no_increments() {
        // Traced echo and random sleep mid-handler, so requests interleave
        let mut cfg = test_config();
        cfg.app.simulate_latency = true;
        let state = Arc::new(AppState::new(&cfg, Arc::new(RecordingTracer::new())));
        let uris = ["/api/feature", "/api/echo", "/api/random", "/api/metrics"];
        let total = 200;

        let handles: Vec<_> = (0..total)
            .map(|i| {
                let state = Arc::clone(&state);
                let uri = uris[i % uris.len()];
                tokio::spawn(async move { handle_request(get(uri), state).await })
            })
            .collect();
        for handle in handles {
            let resp = handle.await.unwrap().unwrap();
            assert_eq!(resp.status(), StatusCode::OK);
        }

        assert_eq!(state.metrics.request_count(), total as u64);
        assert_eq!(state.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_request_span_wraps_handler_spans() {
        let tracer = RecordingTracer::new();
        let state = Arc::new(AppState::new(&test_config(), Arc::new(tracer.clone())));

        let (status, body) = call(&state, get("/api/hello?name=Trace")).await;
        assert_eq!(status, StatusCode::OK);

        let greeting: api::types::Greeting = serde_json::from_slice(&body).unwrap();
        assert_eq!(greeting.trace_id.as_deref(), Some(TEST_TRACE_ID));

        let service = &state.config.telemetry.service_name;
        let root = tracer.span(service).unwrap();
        assert!(root.ended);
        assert!(root
            .attributes
            .contains(&("http.status_code", 200_i64.into())));

        let child = tracer.span("helloHandler.processGreeting").unwrap();
        assert_eq!(child.parent.as_deref(), Some(service.as_str()));
        assert!(child.ended);
    }

    #[tokio::test]
    async fn test_untraced_responses_omit_trace_id() {
        let state = untraced_state();
        let (_, body) = call(&state, get("/api/hello")).await;
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(value.get("traceId").is_none());
    }

    #[test]
    fn test_access_entry_fields() {
        let mut req = Request::builder()
            .method(Method::POST)
            .uri("/api/echo?message=hi")
            .header("user-agent", "curl/8.0")
            .body(())
            .unwrap();
        req.extensions_mut()
            .insert(ClientAddr("10.0.0.7:51000".parse().unwrap()));
        let (parts, ()) = req.into_parts();
        let response = http::build_html_response("abc".to_string());

        let entry = access_entry(&parts, &response, Some("t1".to_string()), Instant::now());
        assert_eq!(entry.remote_addr, "10.0.0.7");
        assert_eq!(entry.method, "POST");
        assert_eq!(entry.query.as_deref(), Some("message=hi"));
        assert_eq!(entry.body_bytes, 3);
        assert_eq!(entry.user_agent.as_deref(), Some("curl/8.0"));
        assert_eq!(entry.trace_id.as_deref(), Some("t1"));
    }
}
