//! OpenTelemetry backend
//!
//! Spans are batched and exported over OTLP/HTTP (protobuf). Remote parents
//! are read from W3C `traceparent`/`tracestate` headers, and W3C `baggage`
//! rides along in the request context.

use std::sync::Arc;

use hyper::HeaderMap;
use opentelemetry::propagation::{Extractor, TextMapCompositePropagator, TextMapPropagator};
use opentelemetry::trace::{SpanKind, Status, TraceContextExt, Tracer as _, TracerProvider as _};
use opentelemetry::{Context, KeyValue, Value};
use opentelemetry_otlp::{SpanExporter, WithExportConfig};
use opentelemetry_sdk::propagation::{BaggagePropagator, TraceContextPropagator};
use opentelemetry_sdk::trace::{Sampler, TracerProvider};
use opentelemetry_sdk::{runtime, Resource};

use super::{AttributeValue, Span, TelemetryError, Tracer};
use crate::config::{TelemetryConfig, VERSION};
use crate::logger;

const INSTRUMENTATION_NAME: &str = "demo-app";
const TRACES_PATH: &str = "/v1/traces";

/// Keeps the tracer provider alive; [`TelemetryGuard::shutdown`] flushes it
pub struct TelemetryGuard {
    provider: TracerProvider,
}

impl TelemetryGuard {
    /// Flush pending spans and stop the exporter.
    ///
    /// The batch processor blocks while draining, so this runs on the
    /// blocking pool.
    pub async fn shutdown(self) {
        let provider = self.provider;
        match tokio::task::spawn_blocking(move || provider.shutdown()).await {
            Ok(Ok(())) => logger::log_info("[Telemetry] Tracer provider shut down"),
            Ok(Err(e)) => logger::log_error(&format!("Error shutting down tracer: {e}")),
            Err(e) => logger::log_error(&format!("Tracer shutdown task failed: {e}")),
        }
    }
}

/// Build the OTLP pipeline and return a tracer bound to it
pub fn init(
    cfg: &TelemetryConfig,
    environment: &str,
) -> Result<(Arc<dyn Tracer>, TelemetryGuard), TelemetryError> {
    if !cfg.enabled {
        return Err(TelemetryError::Disabled);
    }

    let endpoint = traces_endpoint(&cfg.endpoint)?;
    let exporter = SpanExporter::builder()
        .with_http()
        .with_endpoint(endpoint)
        .build()
        .map_err(|e| TelemetryError::Exporter(e.to_string()))?;

    let resource = Resource::default().merge(&Resource::new(vec![
        KeyValue::new("service.name", cfg.service_name.clone()),
        KeyValue::new("service.version", VERSION),
        KeyValue::new("environment", environment.to_string()),
    ]));

    let provider = TracerProvider::builder()
        .with_batch_exporter(exporter, runtime::Tokio)
        .with_sampler(Sampler::AlwaysOn)
        .with_resource(resource)
        .build();

    let tracer = OtelTracer {
        tracer: provider.tracer(INSTRUMENTATION_NAME),
        propagator: request_propagator(),
    };

    Ok((Arc::new(tracer), TelemetryGuard { provider }))
}

/// Normalize `host:port` or a bare URL into the OTLP/HTTP traces URL
fn traces_endpoint(raw: &str) -> Result<String, TelemetryError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(TelemetryError::InvalidEndpoint(raw.to_string()));
    }

    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    };

    let mut url = url::Url::parse(&with_scheme)
        .map_err(|_| TelemetryError::InvalidEndpoint(raw.to_string()))?;
    if url.host_str().is_none() {
        return Err(TelemetryError::InvalidEndpoint(raw.to_string()));
    }
    if url.path().is_empty() || url.path() == "/" {
        url.set_path(TRACES_PATH);
    }
    Ok(url.to_string())
}

/// Trace context plus baggage, the pair W3C clients send
fn request_propagator() -> TextMapCompositePropagator {
    TextMapCompositePropagator::new(vec![
        Box::new(TraceContextPropagator::new()),
        Box::new(BaggagePropagator::new()),
    ])
}

struct OtelTracer {
    tracer: opentelemetry_sdk::trace::Tracer,
    propagator: TextMapCompositePropagator,
}

impl Tracer for OtelTracer {
    fn start_request_span(&self, name: &str, headers: &HeaderMap) -> Box<dyn Span> {
        let parent = self.propagator.extract(&HeaderExtractor(headers));
        let span = self
            .tracer
            .span_builder(name.to_string())
            .with_kind(SpanKind::Server)
            .start_with_context(&self.tracer, &parent);

        Box::new(OtelSpan {
            cx: parent.with_span(span),
            tracer: self.tracer.clone(),
        })
    }

    fn is_enabled(&self) -> bool {
        true
    }
}

struct OtelSpan {
    cx: Context,
    tracer: opentelemetry_sdk::trace::Tracer,
}

impl Span for OtelSpan {
    fn set_attribute(&mut self, key: &'static str, value: AttributeValue) {
        let value = match value {
            AttributeValue::Str(s) => Value::from(s),
            AttributeValue::Bool(b) => Value::from(b),
            AttributeValue::Int(i) => Value::from(i),
        };
        self.cx.span().set_attribute(KeyValue::new(key, value));
    }

    fn record_error(&mut self, message: &str) {
        let span = self.cx.span();
        span.set_status(Status::error(message.to_string()));
        span.add_event(
            "exception",
            vec![KeyValue::new("exception.message", message.to_string())],
        );
    }

    fn trace_id(&self) -> Option<String> {
        let span = self.cx.span();
        let sc = span.span_context();
        sc.is_valid().then(|| sc.trace_id().to_string())
    }

    fn child(&self, name: &'static str) -> Box<dyn Span> {
        let span = self.tracer.start_with_context(name, &self.cx);
        Box::new(Self {
            cx: self.cx.with_span(span),
            tracer: self.tracer.clone(),
        })
    }

    fn end(&mut self) {
        self.cx.span().end();
    }
}

/// Read-only view of request headers for the propagator
struct HeaderExtractor<'a>(&'a HeaderMap);

impl Extractor for HeaderExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(hyper::header::HeaderName::as_str).collect()
    }
}
