// API module entry
// JSON endpoints under /api plus the shared helpers they use

mod clock;
mod greeting;
mod random;
mod runtime;
pub mod types;

use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use rand::Rng;

use crate::config::AppState;

pub use clock::handle_time;
pub use greeting::{handle_echo, handle_hello};
pub use random::handle_random;
pub use runtime::{handle_feature, handle_info, handle_metrics, handle_status};

/// Current UTC time as RFC 3339 with second precision, e.g. `2024-05-01T08:00:00Z`
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Render a duration rounded to whole seconds as `1h2m3s`, `4m5s` or `6s`
pub fn format_uptime(uptime: Duration) -> String {
    let secs = (uptime.as_millis() + 500) / 1000;
    let (hours, minutes, seconds) = (secs / 3600, secs % 3600 / 60, secs % 60);
    if hours > 0 {
        format!("{hours}h{minutes}m{seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m{seconds}s")
    } else {
        format!("{seconds}s")
    }
}

/// Sleep for a random `0..max_ms` milliseconds, standing in for a downstream call
pub async fn simulated_delay(state: &AppState, max_ms: u64) {
    if !state.config.app.simulate_latency || max_ms == 0 {
        return;
    }
    let millis = rand::thread_rng().gen_range(0..max_ms);
    tokio::time::sleep(Duration::from_millis(millis)).await;
}
