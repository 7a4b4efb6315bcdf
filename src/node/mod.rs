//! Node lifecycle: Prep (read-only store) -> Exec (no store access, retried
//! independently of Prep) -> Post (read-write store, decides the route
//! label). See [`NodeBackend`] for the typed contract implementors write
//! against and [`Node`] for the wrapper that adds retries, timeout,
//! fallback, hooks, and routing.

mod dyn_node;
mod run_context;
mod type_tag;

pub use dyn_node::DynNode;
pub use run_context::RunContext;
pub use type_tag::TypeTag;

use async_trait::async_trait;
use futures::FutureExt;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::any::type_name;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use crate::error::PocketError;
use crate::store::{Store, StoreReader, StoreWriter};

pub type Label = String;
pub const DEFAULT_LABEL: &str = "default";

/// The typed contract a node author implements. `Self::In`/`Self::Out` are
/// converted to/from the engine's erased `serde_json::Value` at the
/// boundary by [`Node`], so application code never touches `Value` directly.
#[async_trait]
pub trait NodeBackend: Send + Sync + 'static {
    type In: DeserializeOwned + Send + Sync + 'static;
    type Prep: Send + Clone + 'static;
    type Exec: Send + 'static;
    type Out: Serialize + Send + Sync + 'static;

    async fn prep(
        &self,
        store: &StoreReader<'_>,
        input: &Self::In,
    ) -> Result<Self::Prep, PocketError>;

    async fn exec(&self, prep: &Self::Prep) -> Result<Self::Exec, PocketError>;

    async fn post(
        &self,
        store: &StoreWriter<'_>,
        input: &Self::In,
        prep: &Self::Prep,
        exec: Self::Exec,
    ) -> Result<(Self::Out, Label), PocketError>;

    /// Called when every Exec attempt has been exhausted. Override together
    /// with [`has_fallback`](Self::has_fallback) to recover with a
    /// best-effort result instead (no Store access, matching Exec's rule).
    /// The default is never actually invoked — see `has_fallback`.
    async fn fallback(&self, _prep: &Self::Prep, err: PocketError) -> Result<Self::Exec, PocketError> {
        Err(err)
    }

    /// Whether this backend overrides [`fallback`](Self::fallback). A node
    /// with no fallback configured gets a plain `exec failed` error on
    /// terminal Exec failure; only a node that says `true` here pays the
    /// cost of having its fallback invoked (and, on a failing fallback,
    /// reported as `FallbackFailed` rather than `ExecFailed`).
    fn has_fallback(&self) -> bool {
        false
    }
}

#[derive(Clone)]
pub struct NodeConfig {
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub timeout: Option<Duration>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        NodeConfig {
            max_retries: 0,
            retry_delay: Duration::from_millis(0),
            timeout: None,
        }
    }
}

type SuccessHook = Arc<dyn Fn(&StoreWriter<'_>, &Value) + Send + Sync>;
type FailureHook = Arc<dyn Fn(&StoreWriter<'_>, &PocketError) + Send + Sync>;
type CompletionHook = Arc<dyn Fn(&StoreWriter<'_>) + Send + Sync>;
type ErrorHook = Arc<dyn Fn(&PocketError) + Send + Sync>;

#[derive(Default, Clone)]
struct Hooks {
    on_success: Option<SuccessHook>,
    on_failure: Option<FailureHook>,
    on_completion: Option<CompletionHook>,
    on_error: Option<ErrorHook>,
}

/// Wraps a [`NodeBackend`] with retries, timeout, fallback, lifecycle hooks,
/// and an outgoing routing table keyed by route label. Builder methods
/// consume and return `Self`; wrap the finished node in `Arc` to hand it to
/// a graph.
pub struct Node<B: NodeBackend> {
    name: String,
    backend: B,
    config: NodeConfig,
    hooks: Hooks,
    routes: RwLock<HashMap<Label, Arc<dyn DynNode>>>,
}

impl<B: NodeBackend> Node<B> {
    pub fn new(name: impl Into<String>, backend: B) -> Self {
        Node {
            name: name.into(),
            backend,
            config: NodeConfig::default(),
            hooks: Hooks::default(),
            routes: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_retry(mut self, max_retries: u32, delay: Duration) -> Self {
        self.config.max_retries = max_retries;
        self.config.retry_delay = delay;
        self
    }

    pub fn with_timeout(mut self, d: Duration) -> Self {
        self.config.timeout = Some(d);
        self
    }

    pub fn with_on_success(
        mut self,
        f: impl Fn(&StoreWriter<'_>, &Value) + Send + Sync + 'static,
    ) -> Self {
        self.hooks.on_success = Some(Arc::new(f));
        self
    }

    pub fn with_on_failure(
        mut self,
        f: impl Fn(&StoreWriter<'_>, &PocketError) + Send + Sync + 'static,
    ) -> Self {
        self.hooks.on_failure = Some(Arc::new(f));
        self
    }

    pub fn with_on_completion(mut self, f: impl Fn(&StoreWriter<'_>) + Send + Sync + 'static) -> Self {
        self.hooks.on_completion = Some(Arc::new(f));
        self
    }

    pub fn with_on_error(mut self, f: impl Fn(&PocketError) + Send + Sync + 'static) -> Self {
        self.hooks.on_error = Some(Arc::new(f));
        self
    }

    /// Registers the successor reached when `post` returns `label`. Takes
    /// `&self` so a node already shared via `Arc` (and wired into a partially
    /// built graph) can still gain new routes.
    pub fn connect(&self, label: impl Into<Label>, next: Arc<dyn DynNode>) {
        self.routes.write().insert(label.into(), next);
    }

    async fn run_typed(
        &self,
        ctx: &RunContext,
        store: &Store,
        input: B::In,
    ) -> Result<(B::Out, Label), PocketError> {
        let end_span = ctx.tracer().start_span(&self.name);
        ctx.logger().debug(&format!("node '{}' entered", self.name));

        let result = if let Some(timeout) = self.config.timeout {
            // Scoped to a child token: a timeout firing here cancels only
            // this node's in-flight work, not the caller's whole run.
            let child_ctx = ctx.child();
            match tokio::time::timeout(timeout, self.run_inner(&child_ctx, store, input)).await {
                Ok(result) => result,
                Err(_) => {
                    child_ctx.cancel();
                    let err = PocketError::Timeout {
                        node: self.name.clone(),
                        elapsed: timeout,
                    };
                    Err(self.terminal_failure(ctx, store, err))
                }
            }
        } else {
            self.run_inner(ctx, store, input).await
        };

        match &result {
            Ok(_) => ctx.logger().debug(&format!("node '{}' exited ok", self.name)),
            Err(e) => ctx
                .logger()
                .debug(&format!("node '{}' exited with error: {e}", self.name)),
        }
        end_span();
        result
    }

    async fn run_inner(
        &self,
        ctx: &RunContext,
        store: &Store,
        input: B::In,
    ) -> Result<(B::Out, Label), PocketError> {
        let reader = store.reader();
        let prep_result = AssertUnwindSafe(self.retry_prep(ctx, &reader, &input))
            .catch_unwind()
            .await;

        let prep = match prep_result {
            Ok(Ok(p)) => p,
            Ok(Err(e)) => {
                let wrapped = PocketError::PrepFailed {
                    node: self.name.clone(),
                    source: Box::new(e),
                };
                return Err(self.terminal_failure(ctx, store, wrapped));
            }
            Err(panic) => {
                let wrapped = PocketError::Panicked {
                    node: self.name.clone(),
                    message: panic_message(panic),
                };
                return Err(self.terminal_failure(ctx, store, wrapped));
            }
        };

        let exec_result = AssertUnwindSafe(self.retry_exec(ctx, &prep)).catch_unwind().await;

        let exec = match exec_result {
            Ok(Ok(e)) => e,
            Ok(Err(exec_err)) => {
                if !self.backend.has_fallback() {
                    let wrapped = PocketError::ExecFailed {
                        node: self.name.clone(),
                        source: Box::new(exec_err),
                    };
                    return Err(self.terminal_failure(ctx, store, wrapped));
                }
                // `exec_err` is about to be moved into `fallback`; keep a
                // reportable copy in case fallback itself fails too.
                let exec_err_report = PocketError::custom(exec_err.to_string());
                match AssertUnwindSafe(self.backend.fallback(&prep, exec_err))
                    .catch_unwind()
                    .await
                {
                    Ok(Ok(e)) => e,
                    Ok(Err(fallback_err)) => {
                        let wrapped = PocketError::FallbackFailed {
                            node: self.name.clone(),
                            exec_error: Box::new(exec_err_report),
                            fallback_error: Box::new(fallback_err),
                        };
                        return Err(self.terminal_failure(ctx, store, wrapped));
                    }
                    Err(panic) => {
                        let wrapped = PocketError::Panicked {
                            node: self.name.clone(),
                            message: panic_message(panic),
                        };
                        return Err(self.terminal_failure(ctx, store, wrapped));
                    }
                }
            }
            Err(panic) => {
                let wrapped = PocketError::Panicked {
                    node: self.name.clone(),
                    message: panic_message(panic),
                };
                return Err(self.terminal_failure(ctx, store, wrapped));
            }
        };

        let writer = store.writer();
        let post_result = AssertUnwindSafe(self.backend.post(&writer, &input, &prep, exec))
            .catch_unwind()
            .await;

        match post_result {
            Ok(Ok((out, label))) => {
                let value = serde_json::to_value(&out).unwrap_or(Value::Null);
                self.fire_success(ctx, store, &value);
                self.fire_completion(ctx, store);
                Ok((out, label))
            }
            Ok(Err(e)) => {
                let wrapped = PocketError::PostFailed {
                    node: self.name.clone(),
                    source: Box::new(e),
                };
                Err(self.terminal_failure(ctx, store, wrapped))
            }
            Err(panic) => {
                let wrapped = PocketError::Panicked {
                    node: self.name.clone(),
                    message: panic_message(panic),
                };
                Err(self.terminal_failure(ctx, store, wrapped))
            }
        }
    }

    /// Fires `onError` with the final wrapped error, then `onFailure` and
    /// `onCompletion`, and returns the error so call sites can `return
    /// Err(self.terminal_failure(...))` in one line. The three hooks always
    /// fire in this order on every failure path, matching the happens-before
    /// guarantee between the failure hooks and completion.
    fn terminal_failure(&self, ctx: &RunContext, store: &Store, err: PocketError) -> PocketError {
        self.fire_error(ctx, &err);
        self.fire_failure(ctx, store, &err);
        self.fire_completion(ctx, store);
        err
    }

    async fn retry_prep(
        &self,
        ctx: &RunContext,
        reader: &StoreReader<'_>,
        input: &B::In,
    ) -> Result<B::Prep, PocketError> {
        let attempts = self.config.max_retries + 1;
        let mut last_err = None;
        for attempt in 0..attempts {
            if ctx.is_cancelled() {
                return Err(PocketError::Cancelled {
                    node: self.name.clone(),
                });
            }
            match self.backend.prep(reader, input).await {
                Ok(p) => return Ok(p),
                Err(e) => {
                    last_err = Some(e);
                    if attempt + 1 < attempts {
                        ctx.logger().debug(&format!(
                            "node '{}' prep attempt {} failed, retrying",
                            self.name,
                            attempt + 1
                        ));
                        if !ctx.sleep_or_cancelled(self.config.retry_delay).await {
                            return Err(PocketError::Cancelled {
                                node: self.name.clone(),
                            });
                        }
                    }
                }
            }
        }
        Err(last_err.unwrap_or_else(|| PocketError::custom("prep exhausted retries with no error")))
    }

    async fn retry_exec(&self, ctx: &RunContext, prep: &B::Prep) -> Result<B::Exec, PocketError> {
        let attempts = self.config.max_retries + 1;
        let mut last_err = None;
        for attempt in 0..attempts {
            if ctx.is_cancelled() {
                return Err(PocketError::Cancelled {
                    node: self.name.clone(),
                });
            }
            match self.backend.exec(prep).await {
                Ok(e) => return Ok(e),
                Err(err) => {
                    last_err = Some(err);
                    if attempt + 1 < attempts {
                        ctx.logger().debug(&format!(
                            "node '{}' exec attempt {} failed, retrying",
                            self.name,
                            attempt + 1
                        ));
                        if !ctx.sleep_or_cancelled(self.config.retry_delay).await {
                            return Err(PocketError::Cancelled {
                                node: self.name.clone(),
                            });
                        }
                    }
                }
            }
        }
        Err(last_err.unwrap_or_else(|| PocketError::custom("exec exhausted retries with no error")))
    }

    fn fire_success(&self, ctx: &RunContext, store: &Store, value: &Value) {
        if let Some(f) = &self.hooks.on_success {
            ctx.logger().debug(&format!("node '{}' onSuccess hook fired", self.name));
            f(&store.writer(), value);
        }
    }

    fn fire_failure(&self, ctx: &RunContext, store: &Store, err: &PocketError) {
        if let Some(f) = &self.hooks.on_failure {
            ctx.logger().debug(&format!("node '{}' onFailure hook fired", self.name));
            f(&store.writer(), err);
        }
    }

    fn fire_completion(&self, ctx: &RunContext, store: &Store) {
        if let Some(f) = &self.hooks.on_completion {
            ctx.logger().debug(&format!("node '{}' onCompletion hook fired", self.name));
            f(&store.writer());
        }
    }

    fn fire_error(&self, ctx: &RunContext, err: &PocketError) {
        if let Some(f) = &self.hooks.on_error {
            ctx.logger().debug(&format!("node '{}' onError hook fired", self.name));
            f(err);
        }
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[async_trait]
impl<B: NodeBackend> DynNode for Node<B> {
    fn name(&self) -> &str {
        &self.name
    }

    fn input_type(&self) -> Option<TypeTag> {
        Some(TypeTag::of::<B::In>())
    }

    fn output_type(&self) -> Option<TypeTag> {
        Some(TypeTag::of::<B::Out>())
    }

    fn successors(&self) -> Vec<(Label, Arc<dyn DynNode>)> {
        self.routes
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn successor(&self, label: &str) -> Option<Arc<dyn DynNode>> {
        self.routes.read().get(label).cloned()
    }

    fn connect_erased(&self, label: Label, next: Arc<dyn DynNode>) {
        self.connect(label, next);
    }

    async fn run(
        &self,
        ctx: &RunContext,
        store: &Store,
        input: Value,
    ) -> Result<(Value, Label), PocketError> {
        let typed_input: B::In =
            serde_json::from_value(input).map_err(|e| PocketError::InvalidInput {
                node: self.name.clone(),
                expected: type_name::<B::In>().to_string(),
                actual: e.to_string(),
            })?;
        let (out, label) = self.run_typed(ctx, store, typed_input).await?;
        let value = serde_json::to_value(out)?;
        Ok((value, label))
    }
}
