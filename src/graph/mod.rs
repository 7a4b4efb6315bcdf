//! The graph executor: an iterative Run loop over a routing table of
//! [`DynNode`]s, plus Graph-as-Node composition so a whole graph can nest
//! inside another graph's routing table.

mod builder;
mod validate;

pub use builder::GraphBuilder;
pub use validate::validate_graph;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::PocketError;
use crate::node::{DynNode, Label, RunContext, TypeTag, DEFAULT_LABEL};
use crate::store::Store;

/// A named, wired-up graph: a start node plus the store its nodes share.
/// Implements [`DynNode`] itself, so a `Graph` can be a successor in
/// another graph's routing table — its own `Store` stays isolated from the
/// outer one. The `routes` table here is the *outer* routing (where control
/// goes after the whole inner traversal finishes with a given label); it is
/// separate from the routing tables of the nodes inside `start`.
pub struct Graph {
    name: String,
    start: Arc<dyn DynNode>,
    store: Store,
    routes: RwLock<HashMap<Label, Arc<dyn DynNode>>>,
}

impl Graph {
    pub fn new(name: impl Into<String>, start: Arc<dyn DynNode>, store: Store) -> Self {
        Graph {
            name: name.into(),
            start,
            store,
            routes: RwLock::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Registers the outer successor reached once this graph, used as a
    /// node, finishes its internal traversal with `label` (always
    /// `DEFAULT_LABEL`, since Post here is identity routing).
    pub fn connect(&self, label: impl Into<Label>, next: Arc<dyn DynNode>) {
        self.routes.write().insert(label.into(), next);
    }

    /// Runs the graph to completion: starting at `start`, repeatedly looks
    /// up the successor for the label each node's `post` returns, stopping
    /// when a node has no successor registered for that label. Iterative,
    /// not recursive — an agent's think/act loop can run indefinitely
    /// without growing the call stack. There is no built-in cycle breaker
    /// or step limit; a graph that never routes to a dead end runs forever,
    /// and callers wanting a ceiling must check `ctx` or wrap the call in
    /// their own guard.
    pub async fn run(&self, ctx: &RunContext, input: Value) -> Result<Value, PocketError> {
        let mut current: Option<Arc<dyn DynNode>> = Some(self.start.clone());
        let mut value = input;

        while let Some(node) = current {
            if ctx.is_cancelled() {
                return Err(PocketError::Cancelled {
                    node: node.name().to_string(),
                });
            }
            let (out, label) = node.run(ctx, &self.store, value).await?;
            value = out;
            current = node.successor(&label);
        }

        Ok(value)
    }
}

#[async_trait]
impl DynNode for Graph {
    fn name(&self) -> &str {
        &self.name
    }

    // A nested graph's boundary types are opaque to the outer validator;
    // the validator only checks edges between ordinary nodes it can see
    // into. Declaring `None` here opts this edge out of the check rather
    // than guessing.
    fn input_type(&self) -> Option<TypeTag> {
        None
    }

    fn output_type(&self) -> Option<TypeTag> {
        None
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
        _outer_store: &Store,
        input: Value,
    ) -> Result<(Value, Label), PocketError> {
        let out = Graph::run(self, ctx, input).await?;
        Ok((out, DEFAULT_LABEL.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Node, NodeBackend};
    use crate::store::{StoreOptions, StoreReader, StoreWriter};
    use async_trait::async_trait;

    struct AddOne;

    #[async_trait]
    impl NodeBackend for AddOne {
        type In = i64;
        type Prep = i64;
        type Exec = i64;
        type Out = i64;

        async fn prep(&self, _store: &StoreReader<'_>, input: &i64) -> Result<i64, PocketError> {
            Ok(*input)
        }
        async fn exec(&self, prep: &i64) -> Result<i64, PocketError> {
            Ok(prep + 1)
        }
        async fn post(
            &self,
            _store: &StoreWriter<'_>,
            _input: &i64,
            _prep: &i64,
            exec: i64,
        ) -> Result<(i64, Label), PocketError> {
            let label = if exec >= 3 { "done" } else { DEFAULT_LABEL };
            Ok((exec, label.to_string()))
        }
    }

    #[tokio::test]
    async fn linear_pipeline_runs_to_completion() {
        let a = Arc::new(Node::new("a", AddOne));
        let b = Arc::new(Node::new("b", AddOne));
        let c = Arc::new(Node::new("c", AddOne));
        // wire a -default-> b -default-> c (c routes to "done" with no
        // successor registered, so the graph terminates there).
        a.connect(DEFAULT_LABEL, b.clone() as Arc<dyn DynNode>);
        b.connect(DEFAULT_LABEL, c.clone() as Arc<dyn DynNode>);

        let store = Store::new(StoreOptions::default());
        let graph = Graph::new("g", a, store);
        let ctx = RunContext::new();
        let out = graph.run(&ctx, Value::from(0)).await.unwrap();
        assert_eq!(out, Value::from(3));
    }
}
