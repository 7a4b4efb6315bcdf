use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::telemetry::{default_logger, default_tracer, Logger, Tracer};

/// Per-run cancellation and observability, threaded through every node
/// invocation and into combinators. Cloning a `RunContext` shares the same
/// cancellation token, logger, tracer, and run id, so cancelling one
/// instance cancels every clone derived from it.
#[derive(Clone)]
pub struct RunContext {
    run_id: Uuid,
    token: CancellationToken,
    logger: Arc<dyn Logger>,
    tracer: Arc<dyn Tracer>,
}

impl RunContext {
    pub fn new() -> Self {
        RunContext {
            run_id: Uuid::new_v4(),
            token: CancellationToken::new(),
            logger: default_logger(),
            tracer: default_tracer(),
        }
    }

    /// Identifies this run for correlating log lines across nodes.
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_tracer(mut self, tracer: Arc<dyn Tracer>) -> Self {
        self.tracer = tracer;
        self
    }

    pub fn logger(&self) -> &Arc<dyn Logger> {
        &self.logger
    }

    pub fn tracer(&self) -> &Arc<dyn Tracer> {
        &self.tracer
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// A child context whose cancellation is independent in one direction:
    /// cancelling the child does not cancel the parent, but cancelling the
    /// parent still cancels the child. Used to scope a node-local timeout's
    /// cancellation to just that node.
    pub fn child(&self) -> Self {
        RunContext {
            run_id: self.run_id,
            token: self.token.child_token(),
            logger: self.logger.clone(),
            tracer: self.tracer.clone(),
        }
    }

    /// Sleeps for `d`, racing cancellation. Returns `false` if cancelled
    /// before the sleep elapsed.
    pub async fn sleep_or_cancelled(&self, d: Duration) -> bool {
        if d.is_zero() {
            return !self.is_cancelled();
        }
        tokio::select! {
            _ = tokio::time::sleep(d) => true,
            _ = self.token.cancelled() => false,
        }
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}
