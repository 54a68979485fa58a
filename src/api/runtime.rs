// Runtime introspection endpoints: status, feature, metrics, info

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use sysinfo::System;

use super::types::{AppInfo, AppStatus, FeatureFlag, Metrics};
use super::{format_uptime, timestamp};
use crate::config::VERSION;
use crate::handler::RequestContext;
use crate::http;
use crate::logger::{self, trace_label};

const APP_NAME: &str = "Demo App";
const APP_AUTHOR: &str = "CI/CD Platform Team";
const FEATURE_NAME: &str = "OpenTelemetry 集成";
const FEATURE_DESCRIPTION: &str = "这是 v2.5 开发版，支持分布式追踪和结构化日志";

/// `GET /api/status`
pub fn handle_status(ctx: &RequestContext<'_>) -> Response<Full<Bytes>> {
    let mut span = ctx.span.child("statusHandler.getStatus");

    let environment = ctx.state.config.app.environment.clone();
    let uptime = format_uptime(ctx.state.metrics.uptime());

    logger::log_info(&format!(
        "Status check, env: {environment}, uptime: {uptime}, traceId: {}",
        trace_label(ctx.trace_id)
    ));

    let body = AppStatus {
        status: "running".to_string(),
        environment,
        uptime,
        timestamp: timestamp(),
        trace_id: ctx.trace_id.map(ToString::to_string),
    };
    span.end();
    http::build_json_response(StatusCode::OK, &body)
}

/// `GET /api/feature`
pub fn handle_feature(ctx: &RequestContext<'_>) -> Response<Full<Bytes>> {
    logger::log_info(&format!(
        "Feature endpoint called, traceId: {}",
        trace_label(ctx.trace_id)
    ));

    let body = FeatureFlag {
        feature: FEATURE_NAME.to_string(),
        description: FEATURE_DESCRIPTION.to_string(),
        version: VERSION.to_string(),
        timestamp: timestamp(),
    };
    http::build_json_response(StatusCode::OK, &body)
}

/// `GET /api/metrics`
pub fn handle_metrics(ctx: &RequestContext<'_>) -> Response<Full<Bytes>> {
    let memory_mb = resident_memory_mb();
    let request_count = ctx.state.metrics.request_count();

    logger::log_info(&format!(
        "Metrics requested, requestCount: {request_count}, memory: {memory_mb:.2} MB, traceId: {}",
        trace_label(ctx.trace_id)
    ));

    let body = Metrics {
        request_count,
        memory_usage: format!("{memory_mb:.2} MB"),
        active_tasks: ctx.state.in_flight().max(1),
        uptime: format_uptime(ctx.state.metrics.uptime()),
        timestamp: timestamp(),
    };
    http::build_json_response(StatusCode::OK, &body)
}

/// `GET /api/info`
pub fn handle_info(ctx: &RequestContext<'_>) -> Response<Full<Bytes>> {
    logger::log_info(&format!(
        "Info endpoint called, traceId: {}",
        trace_label(ctx.trace_id)
    ));

    let body = AppInfo {
        app_name: APP_NAME.to_string(),
        version: VERSION.to_string(),
        description: env!("CARGO_PKG_DESCRIPTION").to_string(),
        author: APP_AUTHOR.to_string(),
        runtime_version: format!("rust {}", env!("CARGO_PKG_RUST_VERSION")),
        os: std::env::consts::OS.to_string(),
        arch: std::env::consts::ARCH.to_string(),
        timestamp: timestamp(),
    };
    http::build_json_response(StatusCode::OK, &body)
}

/// Resident set size of this process in MiB, 0 when it cannot be read
#[allow(clippy::cast_precision_loss)]
fn resident_memory_mb() -> f64 {
    let Ok(pid) = sysinfo::get_current_pid() else {
        return 0.0;
    };
    let mut system = System::new();
    if !system.refresh_process(pid) {
        return 0.0;
    }
    system
        .process(pid)
        .map_or(0.0, |p| p.memory() as f64 / 1024.0 / 1024.0)
}

#[cfg(test)]
mod tests {
    use crate::api::types::{AppInfo, AppStatus, FeatureFlag, Metrics};
    use crate::config::{test_config, AppState, VERSION};
    use crate::handler::handle_request;
    use http_body_util::{BodyExt, Empty};
    use hyper::body::Bytes;
    use hyper::{Request, StatusCode};
    use std::sync::Arc;

    async fn get<T: serde::de::DeserializeOwned>(state: &Arc<AppState>, uri: &str) -> T {
        let req = Request::builder().uri(uri).body(Empty::<Bytes>::new()).unwrap();
        let resp = handle_request(req, Arc::clone(state)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_status() {
        let state = Arc::new(AppState::untraced(&test_config()));
        let status: AppStatus = get(&state, "/api/status").await;
        assert_eq!(status.status, "running");
        assert_eq!(status.environment, "test");
        assert!(status.uptime.ends_with('s'));
    }

    #[tokio::test]
    async fn test_feature() {
        let state = Arc::new(AppState::untraced(&test_config()));
        let feature: FeatureFlag = get(&state, "/api/feature").await;
        assert!(!feature.feature.is_empty());
        assert_eq!(feature.version, VERSION);
    }

    #[tokio::test]
    async fn test_metrics_counts_itself() {
        let state = Arc::new(AppState::untraced(&test_config()));
        let first: Metrics = get(&state, "/api/metrics").await;
        let second: Metrics = get(&state, "/api/metrics").await;

        assert_eq!(first.request_count, 1);
        assert_eq!(second.request_count, 2);
        assert!(second.active_tasks > 0);
        assert!(second.memory_usage.ends_with(" MB"));
    }

    #[tokio::test]
    async fn test_metrics_json_keys() {
        let state = Arc::new(AppState::untraced(&test_config()));
        let value: serde_json::Value = get(&state, "/api/metrics").await;
        assert!(value["goRoutines"].as_u64().unwrap() > 0);
        assert!(value["requestCount"].is_u64());
    }

    #[tokio::test]
    async fn test_info() {
        let state = Arc::new(AppState::untraced(&test_config()));
        let info: AppInfo = get(&state, "/api/info").await;
        assert_eq!(info.app_name, "Demo App");
        assert_eq!(info.version, VERSION);
        assert_eq!(info.os, std::env::consts::OS);
        assert_eq!(info.arch, std::env::consts::ARCH);
        assert!(info.runtime_version.starts_with("rust"));
    }
}
