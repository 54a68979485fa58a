//! Telemetry module
//!
//! Request tracing behind a small capability interface:
//! - [`Tracer`] opens one server span per request
//! - [`Span`] annotates, records errors, starts children and exposes the trace id
//!
//! The OpenTelemetry implementation lives in [`otel`]; [`NoopTracer`] is used
//! when the backend is disabled or fails to start.

mod noop;
mod otel;
#[cfg(test)]
pub mod testing;

pub use noop::NoopTracer;
pub use otel::{init, TelemetryGuard};

use hyper::HeaderMap;

/// Errors raised while bringing up the tracing backend
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("tracing disabled by configuration")]
    Disabled,
    #[error("invalid OTLP endpoint '{0}'")]
    InvalidEndpoint(String),
    #[error("failed to create OTLP exporter: {0}")]
    Exporter(String),
}

/// Attribute value attached to a span
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    Str(String),
    Bool(bool),
    Int(i64),
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<bool> for AttributeValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

/// A unit of traced work
pub trait Span: Send + Sync {
    fn set_attribute(&mut self, key: &'static str, value: AttributeValue);

    /// Mark the span as failed
    fn record_error(&mut self, message: &str);

    /// Hex trace id, `None` when the span is not recording
    fn trace_id(&self) -> Option<String>;

    /// Start a span whose parent is `self`
    fn child(&self, name: &'static str) -> Box<dyn Span>;

    /// End the span. Calling it twice is harmless.
    fn end(&mut self);
}

/// Source of request spans
pub trait Tracer: Send + Sync {
    /// Open the server span for an incoming request, continuing the remote
    /// trace carried in `headers` when there is one
    fn start_request_span(&self, name: &str, headers: &HeaderMap) -> Box<dyn Span>;

    /// Whether spans are exported anywhere
    fn is_enabled(&self) -> bool;
}
