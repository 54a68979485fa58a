//! Landing page
//!
//! Lists every registered endpoint, built from [`Endpoint::ALL`] so the page
//! never drifts from the router.

use std::fmt::Write as _;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;

use crate::config::{short_version, VERSION};
use crate::handler::{Endpoint, RequestContext};
use crate::http;
use crate::logger::{self, trace_label};

const PAGE_HEAD: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Demo App v{short}</title>
    <style>
        body { font-family: Arial, sans-serif; max-width: 800px; margin: 50px auto; padding: 20px; background: #f0f8ff; }
        h1 { color: #2e8b57; }
        .version-badge { background: #2e8b57; color: white; padding: 5px 10px; border-radius: 15px; font-size: 14px; }
        .endpoint { background: #fff; padding: 10px; margin: 10px 0; border-radius: 5px; border-left: 4px solid #2e8b57; }
        code { background: #e0e0e0; padding: 2px 6px; border-radius: 3px; }
        .traced { border-left-color: #7B68EE; }
        .otel-badge { background: #7B68EE; color: white; padding: 2px 8px; border-radius: 10px; font-size: 12px; margin-left: 10px; }
    </style>
</head>
<body>
    <h1>🚀 Demo App <span class="version-badge">v{short} 开发版</span> <span class="otel-badge">OpenTelemetry</span></h1>
    <p>Version: {version}</p>
    <p><strong>🆕 v{short} 新功能：</strong> 集成 OpenTelemetry 分布式追踪和结构化日志！</p>
    <h2>Available Endpoints:</h2>
"#;

const PAGE_TAIL: &str = "</body>\n</html>\n";

/// Method label and description shown on the landing page
const fn describe(endpoint: Endpoint) -> (&'static str, &'static str, bool) {
    match endpoint {
        Endpoint::Root => ("GET", "Landing page", false),
        Endpoint::Health => ("GET", "Health check", false),
        Endpoint::Version => ("GET", "Version info", false),
        Endpoint::Hello => ("GET", "Hello World (with tracing)", true),
        Endpoint::Status => ("GET", "Application status", true),
        Endpoint::Feature => ("GET", "功能展示", false),
        Endpoint::Metrics => ("GET", "应用指标", false),
        Endpoint::Echo => ("GET/POST", "请求回显 (with tracing)", true),
        Endpoint::Info => ("GET", "应用详细信息", false),
        Endpoint::Time => ("GET", "服务器时间信息", false),
        Endpoint::Random => ("GET", "随机数据生成 (with tracing)", true),
    }
}

/// Render the landing page
pub fn render_landing_page() -> String {
    let short = short_version();
    let mut html = PAGE_HEAD
        .replace("{short}", short)
        .replace("{version}", VERSION);

    for endpoint in Endpoint::ALL.into_iter().skip(1) {
        let (method, description, traced) = describe(endpoint);
        let class = if traced { "endpoint traced" } else { "endpoint" };
        let _ = writeln!(
            html,
            r#"    <div class="{class}"><strong>{method}</strong> <code>{}</code> - {description}</div>"#,
            endpoint.path()
        );
    }

    html.push_str(PAGE_TAIL);
    html
}

pub fn handle_root(ctx: &RequestContext<'_>) -> Response<Full<Bytes>> {
    let mut span = ctx.span.child("rootHandler");
    span.set_attribute("handler", "root".into());

    logger::log_info(&format!(
        "Root page accessed, request count: {}, traceId: {}",
        ctx.state.metrics.request_count(),
        trace_label(ctx.trace_id)
    ));

    let response = http::build_html_response(render_landing_page());
    span.end();
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{test_config, AppState};
    use crate::handler::handle_request;
    use http_body_util::{BodyExt, Empty};
    use hyper::{Request, StatusCode};
    use std::sync::Arc;

    #[test]
    fn test_landing_page_lists_every_endpoint() {
        let html = render_landing_page();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains(VERSION));
        assert!(!html.contains("{short}"));
        for endpoint in Endpoint::ALL.into_iter().skip(1) {
            assert!(
                html.contains(&format!("<code>{}</code>", endpoint.path())),
                "missing {}",
                endpoint.path()
            );
        }
    }

    #[tokio::test]
    async fn test_root_serves_html() {
        let state = Arc::new(AppState::untraced(&test_config()));
        let req = Request::builder().uri("/").body(Empty::<Bytes>::new()).unwrap();
        let resp = handle_request(req, Arc::clone(&state)).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["Content-Type"], "text/html; charset=utf-8");
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        assert!(String::from_utf8_lossy(&body).contains("Available Endpoints"));
        assert_eq!(state.metrics.request_count(), 1);
    }
}
