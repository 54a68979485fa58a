// Greeting and echo endpoints

use std::collections::BTreeMap;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};

use super::types::{EchoPayload, Greeting};
use super::{simulated_delay, timestamp};
use crate::config::short_version;
use crate::handler::RequestContext;
use crate::http::{self, query_param};
use crate::logger::{self, trace_label};

const DEFAULT_NAME: &str = "World";
const DEFAULT_ECHO: &str = "Hello from Echo API with OpenTelemetry!";

/// `GET /api/hello?name=`
pub async fn handle_hello(ctx: &RequestContext<'_>) -> Response<Full<Bytes>> {
    let raw_name = query_param(ctx.uri, "name");

    let mut span = ctx.span.child("helloHandler.processGreeting");
    span.set_attribute("greeting.name", raw_name.clone().unwrap_or_default().into());
    span.set_attribute("http.method", ctx.method.as_str().into());

    let name = raw_name.unwrap_or_else(|| DEFAULT_NAME.to_string());

    // Processing time
    simulated_delay(ctx.state, 50).await;

    logger::log_info(&format!(
        "Hello endpoint called, name: {name}, traceId: {}",
        trace_label(ctx.trace_id)
    ));

    let body = Greeting {
        message: format!("Hello, {name}! 👋 (v{} with OpenTelemetry)", short_version()),
        timestamp: timestamp(),
        trace_id: ctx.trace_id.map(ToString::to_string),
    };
    span.end();
    http::build_json_response(StatusCode::OK, &body)
}

/// `GET|POST /api/echo?message=`
pub async fn handle_echo(ctx: &RequestContext<'_>) -> Response<Full<Bytes>> {
    let mut span = ctx.span.child("echoHandler.processRequest");
    span.set_attribute("http.method", ctx.method.as_str().into());
    span.set_attribute("http.path", ctx.uri.path().into());

    // First value per header name
    let mut headers = BTreeMap::new();
    for (name, value) in ctx.headers {
        if let Ok(value) = value.to_str() {
            headers
                .entry(canonical_header_name(name.as_str()))
                .or_insert_with(|| value.to_string());
        }
    }

    let echo = query_param(ctx.uri, "message").unwrap_or_else(|| DEFAULT_ECHO.to_string());

    if ctx.state.tracer.is_enabled() {
        let mut db_span = span.child("database.query");
        simulated_delay(ctx.state, 30).await;
        db_span.set_attribute("db.system", "postgresql".into());
        db_span.end();
    }

    logger::log_info(&format!(
        "Echo endpoint, method: {}, message: {echo}, traceId: {}",
        ctx.method,
        trace_label(ctx.trace_id)
    ));

    let body = EchoPayload {
        echo,
        headers,
        method: ctx.method.to_string(),
        path: ctx.uri.path().to_string(),
        timestamp: timestamp(),
        trace_id: ctx.trace_id.map(ToString::to_string),
    };
    span.end();
    http::build_json_response(StatusCode::OK, &body)
}

/// `x-custom-header` -> `X-Custom-Header`
fn canonical_header_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = true;
    for c in name.chars() {
        if upper {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c.to_ascii_lowercase());
        }
        upper = c == '-';
    }
    out
}

#[cfg(test)]
mod tests {
    use crate::api::types::{EchoPayload, Greeting};
    use crate::config::{test_config, AppState};
    use crate::handler::handle_request;
    use crate::telemetry::testing::RecordingTracer;
    use http_body_util::{BodyExt, Empty};
    use hyper::body::Bytes;
    use hyper::{Method, Request, StatusCode};
    use std::sync::Arc;

    async fn send<T: serde::de::DeserializeOwned>(
        state: Arc<AppState>,
        req: Request<Empty<Bytes>>,
    ) -> T {
        let resp = handle_request(req, state).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    fn untraced() -> Arc<AppState> {
        Arc::new(AppState::untraced(&test_config()))
    }

    #[tokio::test]
    async fn test_hello_names() {
        let cases = [
            ("default", "/api/hello", "World"),
            ("with name", "/api/hello?name=Test", "Test"),
            ("with chinese", "/api/hello?name=%E6%B5%8B%E8%AF%95", "测试"),
            ("empty name", "/api/hello?name=", "World"),
        ];

        for (label, uri, expected) in cases {
            let req = Request::builder().uri(uri).body(Empty::new()).unwrap();
            let greeting: Greeting = send(untraced(), req).await;
            assert!(
                greeting.message.contains(expected),
                "{label}: got {}",
                greeting.message
            );
            assert!(greeting.message.starts_with("Hello,"), "{label}");
            assert!(greeting.trace_id.is_none(), "{label}");
        }
    }

    #[tokio::test]
    async fn test_echo_message_and_method() {
        for method in [Method::GET, Method::POST] {
            let req = Request::builder()
                .method(method.clone())
                .uri("/api/echo?message=test")
                .header("X-Custom-Header", "custom-value")
                .body(Empty::new())
                .unwrap();
            let payload: EchoPayload = send(untraced(), req).await;
            assert_eq!(payload.echo, "test");
            assert_eq!(payload.method, method.as_str());
            assert_eq!(payload.path, "/api/echo");
            assert_eq!(
                payload.headers.get("X-Custom-Header").map(String::as_str),
                Some("custom-value")
            );
            assert!(!payload.headers.contains_key("x-custom-header"));
        }
    }

    #[test]
    fn test_canonical_header_name() {
        assert_eq!(super::canonical_header_name("x-custom-header"), "X-Custom-Header");
        assert_eq!(super::canonical_header_name("user-agent"), "User-Agent");
        assert_eq!(super::canonical_header_name("traceparent"), "Traceparent");
        assert_eq!(super::canonical_header_name("x--y"), "X--Y");
    }

    #[tokio::test]
    async fn test_echo_default_message() {
        let req = Request::builder().uri("/api/echo").body(Empty::new()).unwrap();
        let payload: EchoPayload = send(untraced(), req).await;
        assert_eq!(payload.echo, super::DEFAULT_ECHO);
    }

    #[tokio::test]
    async fn test_echo_traced_spans() {
        let tracer = RecordingTracer::new();
        let state = Arc::new(AppState::new(&test_config(), Arc::new(tracer.clone())));
        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/echo?message=hi")
            .body(Empty::new())
            .unwrap();
        let payload: EchoPayload = send(state, req).await;
        assert!(payload.trace_id.is_some());

        let db = tracer.span("database.query").unwrap();
        assert_eq!(db.parent.as_deref(), Some("echoHandler.processRequest"));
        assert!(db
            .attributes
            .contains(&("db.system", "postgresql".into())));
        assert!(db.ended);
    }
}
