//! Health and version endpoints used by the deployment pipeline

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};

use crate::api::timestamp;
use crate::api::types::{HealthStatus, VersionInfo};
use crate::config::{BUILD_TIME, GIT_COMMIT, VERSION};
use crate::handler::RequestContext;
use crate::http;
use crate::logger::{self, trace_label};

pub fn handle_health(ctx: &RequestContext<'_>) -> Response<Full<Bytes>> {
    logger::log_info(&format!("Health check, traceId: {}", trace_label(ctx.trace_id)));

    let body = HealthStatus {
        status: "healthy".to_string(),
        message: None,
        timestamp: timestamp(),
    };
    http::build_json_response(StatusCode::OK, &body)
}

pub fn handle_version(ctx: &RequestContext<'_>) -> Response<Full<Bytes>> {
    logger::log_info(&format!(
        "Version info requested, traceId: {}",
        trace_label(ctx.trace_id)
    ));

    let body = VersionInfo {
        version: VERSION.to_string(),
        build_time: BUILD_TIME.to_string(),
        git_commit: GIT_COMMIT.to_string(),
    };
    http::build_json_response(StatusCode::OK, &body)
}

#[cfg(test)]
mod tests {
    use crate::config::{test_config, AppState, VERSION};
    use crate::handler::handle_request;
    use http_body_util::{BodyExt, Empty};
    use hyper::body::Bytes;
    use hyper::{Request, StatusCode};
    use std::sync::Arc;

    async fn get_json(uri: &str) -> (StatusCode, serde_json::Value) {
        let state = Arc::new(AppState::untraced(&test_config()));
        let req = Request::builder().uri(uri).body(Empty::<Bytes>::new()).unwrap();
        let resp = handle_request(req, state).await.unwrap();
        let status = resp.status();
        assert_eq!(resp.headers()["Content-Type"], "application/json");
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get_json("/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert!(body.get("message").is_none());

        let ts = body["timestamp"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(ts).is_ok());
    }

    #[tokio::test]
    async fn test_version() {
        let (status, body) = get_json("/version").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["version"], VERSION);
        assert!(!body["buildTime"].as_str().unwrap().is_empty());
        assert!(!body["gitCommit"].as_str().unwrap().is_empty());
    }
}
