use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use super::{Label, RunContext, TypeTag};
use crate::error::PocketError;
use crate::store::Store;

/// Object-safe erasure of [`super::NodeBackend`]/[`super::Node`], letting a
/// graph's routing table hold heterogeneous concrete node types behind one
/// trait object. Every boundary crossing goes through `serde_json::Value`.
#[async_trait]
pub trait DynNode: Send + Sync {
    fn name(&self) -> &str;

    fn input_type(&self) -> Option<TypeTag>;

    fn output_type(&self) -> Option<TypeTag>;

    fn successors(&self) -> Vec<(Label, Arc<dyn DynNode>)>;

    fn successor(&self, label: &str) -> Option<Arc<dyn DynNode>>;

    /// Registers `next` as the successor reached via `label`. Defaults to a
    /// no-op; both `Node<B>` and `crate::graph::Graph` override it to write
    /// into their own routing table, letting a caller wire successors onto
    /// an erased `Arc<dyn DynNode>` without knowing the concrete type.
    fn connect_erased(&self, _label: Label, _next: Arc<dyn DynNode>) {}

    async fn run(
        &self,
        ctx: &RunContext,
        store: &Store,
        input: Value,
    ) -> Result<(Value, Label), PocketError>;
}
