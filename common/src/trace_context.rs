use opentelemetry::global;
use opentelemetry::propagation::Injector;
use std::collections::HashMap;
use tracing::Span;
use tracing_opentelemetry::OpenTelemetrySpanExt;

/// Writes the current span's W3C trace context into `headers`.
pub fn inject_trace_context(headers: &mut HashMap<String, String>) {
    let cx = Span::current().context();
    global::get_text_map_propagator(|propagator| {
        propagator.inject_context(&cx, &mut HeaderInjector::new(headers))
    });
}

struct HeaderInjector<'a> {
    headers: &'a mut HashMap<String, String>,
}

impl<'a> HeaderInjector<'a> {
    fn new(headers: &'a mut HashMap<String, String>) -> Self {
        Self { headers }
    }
}

impl<'a> Injector for HeaderInjector<'a> {
    fn set(&mut self, key: &str, value: String) {
        self.headers.insert(key.to_string(), value);
    }
}

/// Attaches the current trace context to an outgoing request.
pub fn inject_trace_context_reqwest(builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    let mut headers = HashMap::new();
    inject_trace_context(&mut headers);

    let mut builder = builder;
    for (key, value) in headers {
        builder = builder.header(key, value);
    }
    builder
}
