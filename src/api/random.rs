// Random data endpoint with a simulated downstream call and cache lookup

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use rand::seq::SliceRandom;
use rand::Rng;
use uuid::Uuid;

use super::types::RandomSample;
use super::{simulated_delay, timestamp};
use crate::handler::RequestContext;
use crate::http;
use crate::logger::{self, trace_label};
use crate::telemetry::Span;

const COLORS: [&str; 8] = [
    "#FF6B6B", "#4ECDC4", "#45B7D1", "#96CEB4", "#FFEAA7", "#DDA0DD", "#98D8C8", "#F7DC6F",
];

const QUOTES: [&str; 5] = [
    "代码是写给人看的，顺便能在机器上运行。",
    "先让它工作，再让它正确，最后让它快。",
    "简单是可靠的先决条件。",
    "过早优化是万恶之源。",
    "好的代码是它自己最好的文档。",
];

/// Numbers above this value mark the span as failed
const ERROR_THRESHOLD: u32 = 950;
const INJECTED_ERROR: &str = "Random error for testing";

/// `GET /api/random`
pub async fn handle_random(ctx: &RequestContext<'_>) -> Response<Full<Bytes>> {
    let traced = ctx.state.tracer.is_enabled();
    let span = traced.then(|| ctx.span.child("randomHandler.generateData"));

    if let Some(span) = span.as_deref() {
        fetch_upstream(ctx, span).await;
    }

    respond(ctx, span, draw_sample())
}

/// Annotate and close the handler span, inject the test error for high
/// numbers and render the sample
fn respond(
    ctx: &RequestContext<'_>,
    mut span: Option<Box<dyn Span>>,
    mut body: RandomSample,
) -> Response<Full<Bytes>> {
    body.trace_id = ctx.trace_id.map(ToString::to_string);

    if let Some(span) = span.as_deref_mut() {
        span.set_attribute("random.number", i64::from(body.number).into());
        span.set_attribute("random.color", body.color.as_str().into());
    }

    logger::log_info(&format!(
        "Random endpoint called, number: {}, traceId: {}",
        body.number,
        trace_label(ctx.trace_id)
    ));

    if is_injected_error(body.number) {
        if let Some(span) = span.as_deref_mut() {
            span.record_error(INJECTED_ERROR);
        }
        logger::log_error(&format!(
            "Simulated error occurred, number: {}, traceId: {}",
            body.number,
            trace_label(ctx.trace_id)
        ));
    }

    if let Some(span) = span.as_deref_mut() {
        span.end();
    }
    http::build_json_response(StatusCode::OK, &body)
}

/// Stand-in for the remote generator call followed by a cache lookup
async fn fetch_upstream(ctx: &RequestContext<'_>, parent: &dyn Span) {
    let mut api_span = parent.child("external.api.call");
    api_span.set_attribute("api.name", "random-generator".into());
    simulated_delay(ctx.state, 100).await;
    api_span.end();

    let mut cache_span = parent.child("cache.lookup");
    cache_span.set_attribute("cache.type", "redis".into());
    simulated_delay(ctx.state, 10).await;
    let hit = rand::thread_rng().gen_bool(0.5);
    cache_span.set_attribute("cache.hit", hit.into());
    cache_span.end();
}

fn draw_sample() -> RandomSample {
    let mut rng = rand::thread_rng();
    RandomSample {
        number: rng.gen_range(0..1000),
        uuid: Uuid::new_v4().to_string(),
        color: COLORS.choose(&mut rng).copied().unwrap_or(COLORS[0]).to_string(),
        quote: QUOTES.choose(&mut rng).copied().unwrap_or(QUOTES[0]).to_string(),
        lucky_number: rng.gen_range(1..=100),
        dice: (0..3).map(|_| rng.gen_range(1..=6)).collect(),
        timestamp: timestamp(),
        trace_id: None,
    }
}

const fn is_injected_error(number: u32) -> bool {
    number > ERROR_THRESHOLD
}
