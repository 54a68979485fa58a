// Recording tracer test double

use std::sync::{Arc, Mutex};

use hyper::HeaderMap;

use super::{AttributeValue, Span, Tracer};

pub const TEST_TRACE_ID: &str = "4bf92f3577b34da6a3ce929d0e0e4736";

/// One finished or open span as seen by [`RecordingTracer`]
#[derive(Debug, Clone, Default)]
pub struct SpanRecord {
    pub name: String,
    pub parent: Option<String>,
    pub attributes: Vec<(&'static str, AttributeValue)>,
    pub error: Option<String>,
    pub ended: bool,
}

/// Tracer that keeps every span in memory
#[derive(Debug, Default, Clone)]
pub struct RecordingTracer {
    spans: Arc<Mutex<Vec<SpanRecord>>>,
}

impl RecordingTracer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spans(&self) -> Vec<SpanRecord> {
        self.spans.lock().unwrap().clone()
    }

    pub fn span(&self, name: &str) -> Option<SpanRecord> {
        self.spans().into_iter().find(|s| s.name == name)
    }

    fn open(&self, name: &str, parent: Option<String>) -> Box<dyn Span> {
        let mut spans = self.spans.lock().unwrap();
        spans.push(SpanRecord {
            name: name.to_string(),
            parent,
            ..SpanRecord::default()
        });
        Box::new(RecordingSpan {
            index: spans.len() - 1,
            tracer: self.clone(),
        })
    }
}

impl Tracer for RecordingTracer {
    fn start_request_span(&self, name: &str, _headers: &HeaderMap) -> Box<dyn Span> {
        self.open(name, None)
    }

    fn is_enabled(&self) -> bool {
        true
    }
}

struct RecordingSpan {
    index: usize,
    tracer: RecordingTracer,
}

impl RecordingSpan {
    fn update(&self, f: impl FnOnce(&mut SpanRecord)) {
        let mut spans = self.tracer.spans.lock().unwrap();
        f(&mut spans[self.index]);
    }
}

impl Span for RecordingSpan {
    fn set_attribute(&mut self, key: &'static str, value: AttributeValue) {
        self.update(|s| s.attributes.push((key, value)));
    }

    fn record_error(&mut self, message: &str) {
        self.update(|s| s.error = Some(message.to_string()));
    }

    fn trace_id(&self) -> Option<String> {
        Some(TEST_TRACE_ID.to_string())
    }

    fn child(&self, name: &'static str) -> Box<dyn Span> {
        let parent = self.tracer.spans.lock().unwrap()[self.index].name.clone();
        self.tracer.open(name, Some(parent))
    }

    fn end(&mut self) {
        self.update(|s| s.ended = true);
    }
}
