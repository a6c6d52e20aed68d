//! Distributed tracing support.
//!
//! # Responsibilities
//! - Own the trace-context + baggage propagator
//! - Extract trace context from incoming requests
//! - Open a server span per request when tracing is enabled
//!
//! # Design Decisions
//! - Handles are passed explicitly; no global tracer provider is installed
//! - Supports W3C Trace Context and W3C Baggage headers

use std::sync::Arc;

use axum::http::{HeaderMap, HeaderName, HeaderValue, Method};
use opentelemetry::{
    propagation::{Extractor, Injector, TextMapCompositePropagator, TextMapPropagator},
    trace::{SpanKind, TraceContextExt, Tracer as _, TracerProvider as _},
    Context,
};
use opentelemetry_sdk::{
    propagation::{BaggagePropagator, TraceContextPropagator},
    trace::{Tracer, TracerProvider},
};

use crate::backend::proto::Header;
use crate::config::ObservabilityConfig;

/// Tracer and propagator handle shared by the server and the bridge.
#[derive(Clone)]
pub struct TracingHandle {
    propagator: Arc<dyn TextMapPropagator + Send + Sync>,
    tracer: Option<(TracerProvider, Tracer)>,
}

impl TracingHandle {
    pub fn from_config(config: &ObservabilityConfig) -> Self {
        if config.tracing_enabled {
            Self::with_tracer(&config.service_name)
        } else {
            Self::disabled()
        }
    }

    /// Tracing on, spans recorded by an in-process SDK provider.
    pub fn with_tracer(service_name: &str) -> Self {
        let provider = TracerProvider::builder().build();
        let tracer = provider.tracer(service_name.to_string());
        Self {
            propagator: default_propagator(),
            tracer: Some((provider, tracer)),
        }
    }

    pub fn disabled() -> Self {
        Self {
            propagator: default_propagator(),
            tracer: None,
        }
    }

    pub fn enabled(&self) -> bool {
        self.tracer.is_some()
    }

    pub fn propagator(&self) -> Arc<dyn TextMapPropagator + Send + Sync> {
        self.propagator.clone()
    }

    /// Remote parent context (span and baggage) found in `headers`.
    pub fn extract(&self, headers: &HeaderMap) -> Context {
        self.propagator.extract(&HeaderExtractor(headers))
    }

    /// Start a server span for an inbound request, parented on whatever
    /// context the caller sent. `None` when tracing is off.
    pub fn start_server_span(&self, method: &Method, path: &str, headers: &HeaderMap) -> Option<Context> {
        let (_, tracer) = self.tracer.as_ref()?;
        let parent = self.extract(headers);
        let span = tracer
            .span_builder(format!("{method} {path}"))
            .with_kind(SpanKind::Server)
            .start_with_context(tracer, &parent);
        Some(parent.with_span(span))
    }

    /// Start a span under an existing context.
    pub fn start_span(&self, name: &'static str, parent: &Context) -> Option<Context> {
        let (_, tracer) = self.tracer.as_ref()?;
        let span = tracer.start_with_context(name, parent);
        Some(parent.with_span(span))
    }
}

fn default_propagator() -> Arc<dyn TextMapPropagator + Send + Sync> {
    Arc::new(TextMapCompositePropagator::new(vec![
        Box::new(TraceContextPropagator::new()),
        Box::new(BaggagePropagator::new()),
    ]))
}

/// Reads propagator fields from HTTP headers.
pub struct HeaderExtractor<'a>(pub &'a HeaderMap);

impl Extractor for HeaderExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(|k| k.as_str()).collect()
    }
}

/// Writes propagator fields into HTTP headers.
///
/// Fields that are not valid header names or values are collected in
/// `rejected` instead of being written.
pub struct HeaderInjector<'a> {
    headers: &'a mut HeaderMap,
    rejected: Vec<String>,
}

impl<'a> HeaderInjector<'a> {
    pub fn new(headers: &'a mut HeaderMap) -> Self {
        Self {
            headers,
            rejected: Vec::new(),
        }
    }

    pub fn rejected(&self) -> &[String] {
        &self.rejected
    }
}

impl Injector for HeaderInjector<'_> {
    fn set(&mut self, key: &str, value: String) {
        match (
            HeaderName::from_bytes(key.as_bytes()),
            HeaderValue::from_str(&value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            _ => self.rejected.push(key.to_string()),
        }
    }
}

/// Reads propagator fields from the headers of a forwarded request.
///
/// Backends use this to continue the trace the bridge serialised.
pub struct ProtoHeaderExtractor<'a>(pub &'a [Header]);

impl Extractor for ProtoHeaderExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|h| h.key.eq_ignore_ascii_case(key))
            .and_then(|h| h.values.first())
            .map(String::as_str)
    }

    fn keys(&self) -> Vec<&str> {
        self.0.iter().map(|h| h.key.as_str()).collect()
    }
}
