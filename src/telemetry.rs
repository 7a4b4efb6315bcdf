//! Observability interfaces consumed (not implemented) by callers.
//!
//! The engine itself only ever talks to these two traits — plugging in a
//! real backend (structured JSON logs, OpenTelemetry spans, ...) is a
//! collaborator's job. [`TracingLogger`] is the one concrete implementation
//! this crate ships, built on `tracing`, and is what [`crate::node::RunContext`]
//! defaults to when a caller doesn't supply their own.

use std::sync::Arc;

pub trait Logger: Send + Sync {
    fn debug(&self, msg: &str);
    fn info(&self, msg: &str);
    fn error(&self, msg: &str);
}

/// A span guard is just "the thing you drop when the span ends"; returning
/// it as a boxed closure keeps `Tracer` object-safe without an associated type.
pub trait Tracer: Send + Sync {
    fn start_span(&self, name: &str) -> Box<dyn FnOnce() + Send>;
}

#[derive(Clone, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }

    fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }
}

impl Tracer for TracingLogger {
    fn start_span(&self, name: &str) -> Box<dyn FnOnce() + Send> {
        // `tracing::span::Entered` guards are deliberately `!Send` (they must
        // not be held across an await point), so rather than smuggle one
        // through this `Send` closure we just bracket the span with a pair
        // of events.
        let name = name.to_string();
        tracing::debug!(node = %name, "span start");
        Box::new(move || tracing::debug!(node = %name, "span end"))
    }
}

pub fn default_logger() -> Arc<dyn Logger> {
    Arc::new(TracingLogger)
}

pub fn default_tracer() -> Arc<dyn Tracer> {
    Arc::new(TracingLogger)
}
