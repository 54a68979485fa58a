// No-op tracer, used when tracing is off

use hyper::HeaderMap;

use super::{AttributeValue, Span, Tracer};

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTracer;

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSpan;

impl Tracer for NoopTracer {
    fn start_request_span(&self, _name: &str, _headers: &HeaderMap) -> Box<dyn Span> {
        Box::new(NoopSpan)
    }

    fn is_enabled(&self) -> bool {
        false
    }
}

impl Span for NoopSpan {
    fn set_attribute(&mut self, _key: &'static str, _value: AttributeValue) {}

    fn record_error(&mut self, _message: &str) {}

    fn trace_id(&self) -> Option<String> {
        None
    }

    fn child(&self, _name: &'static str) -> Box<dyn Span> {
        Box::new(Self)
    }

    fn end(&mut self) {}
}
