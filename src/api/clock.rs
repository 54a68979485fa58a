// Server clock endpoint

use chrono::{DateTime, Datelike, Local, TimeZone, Weekday};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};

use super::timestamp;
use super::types::ServerTime;
use crate::handler::RequestContext;
use crate::http;
use crate::logger::{self, trace_label};

/// `GET /api/time`
pub fn handle_time(ctx: &RequestContext<'_>) -> Response<Full<Bytes>> {
    let body = describe_time(&Local::now(), zone_label());

    logger::log_info(&format!(
        "Time endpoint called, serverTime: {}, traceId: {}",
        body.server_time,
        trace_label(ctx.trace_id)
    ));

    http::build_json_response(StatusCode::OK, &body)
}

/// Break a local time down into the fields served by `/api/time`
fn describe_time<Tz: TimeZone>(now: &DateTime<Tz>, timezone: String) -> ServerTime
where
    Tz::Offset: std::fmt::Display,
{
    let weekday = now.weekday();
    ServerTime {
        server_time: now.format("%Y-%m-%d %H:%M:%S").to_string(),
        timezone,
        unix_time: now.timestamp(),
        day_of_week: now.format("%A").to_string(),
        week_of_year: now.iso_week().week(),
        is_weekend: matches!(weekday, Weekday::Sat | Weekday::Sun),
        timestamp: timestamp(),
    }
}

/// Zone name from `TZ` when set, else the current UTC offset such as `+08:00`
fn zone_label() -> String {
    std::env::var("TZ")
        .ok()
        .filter(|tz| !tz.trim().is_empty())
        .unwrap_or_else(|| Local::now().format("%:z").to_string())
}
