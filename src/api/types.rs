// API response types
// One record per endpoint; field names follow the published JSON contract

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `/health`
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub timestamp: String,
}

/// `/version`
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionInfo {
    pub version: String,
    pub build_time: String,
    pub git_commit: String,
}

/// `/api/hello`
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Greeting {
    pub message: String,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
}

/// `/api/status`
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppStatus {
    pub status: String,
    pub environment: String,
    pub uptime: String,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
}

/// `/api/feature`
#[derive(Debug, Serialize, Deserialize)]
pub struct FeatureFlag {
    pub feature: String,
    pub description: String,
    pub version: String,
    pub timestamp: String,
}

/// `/api/metrics`
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub request_count: u64,
    pub memory_usage: String,
    /// Request tasks currently running, under the key clients already read
    #[serde(rename = "goRoutines")]
    pub active_tasks: usize,
    pub uptime: String,
    pub timestamp: String,
}

/// `/api/echo`
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EchoPayload {
    pub echo: String,
    pub headers: BTreeMap<String, String>,
    pub method: String,
    pub path: String,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
}

/// `/api/info`
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppInfo {
    pub app_name: String,
    pub version: String,
    pub description: String,
    pub author: String,
    #[serde(rename = "goVersion")]
    pub runtime_version: String,
    pub os: String,
    pub arch: String,
    pub timestamp: String,
}

/// `/api/time`
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerTime {
    pub server_time: String,
    pub timezone: String,
    pub unix_time: i64,
    pub day_of_week: String,
    pub week_of_year: u32,
    pub is_weekend: bool,
    pub timestamp: String,
}

/// `/api/random`
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RandomSample {
    pub number: u32,
    pub uuid: String,
    pub color: String,
    pub quote: String,
    pub lucky_number: u32,
    pub dice: Vec<u8>,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
}
