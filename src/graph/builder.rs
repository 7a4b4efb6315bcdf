//! Fluent graph assembly with deferred name resolution: `connect` targets
//! are stored as plain strings and only resolved (and validated) at
//! `build()`, so nodes can be added and wired in any order.

use std::collections::HashMap;
use std::sync::Arc;

use super::Graph;
use crate::error::PocketError;
use crate::node::{DynNode, Label};
use crate::store::Store;

pub struct GraphBuilder {
    store: Store,
    nodes: HashMap<String, Arc<dyn DynNode>>,
    routes: Vec<(String, Label, String)>,
    start: Option<String>,
}

impl GraphBuilder {
    pub fn new(store: Store) -> Self {
        GraphBuilder {
            store,
            nodes: HashMap::new(),
            routes: Vec::new(),
            start: None,
        }
    }

    pub fn add(mut self, node: Arc<dyn DynNode>) -> Self {
        self.nodes.insert(node.name().to_string(), node);
        self
    }

    pub fn connect(mut self, from: &str, label: impl Into<Label>, to: &str) -> Self {
        self.routes.push((from.to_string(), label.into(), to.to_string()));
        self
    }

    pub fn start(mut self, name: &str) -> Self {
        self.start = Some(name.to_string());
        self
    }

    pub fn build(self) -> Result<Graph, PocketError> {
        for (from, label, to) in &self.routes {
            let from_node = self
                .nodes
                .get(from)
                .ok_or_else(|| PocketError::NodeNotFound(from.clone()))?;
            let to_node = self
                .nodes
                .get(to)
                .ok_or_else(|| PocketError::NodeNotFound(to.clone()))?;
            from_node.connect_erased(label.clone(), to_node.clone());
        }

        let start_name = self.start.ok_or_else(|| PocketError::NoStartNode {
            graph: "builder".to_string(),
        })?;
        let start_node = self
            .nodes
            .get(&start_name)
            .ok_or_else(|| PocketError::NodeNotFound(start_name.clone()))?
            .clone();

        Ok(Graph::new(start_name, start_node, self.store))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Node, NodeBackend, DEFAULT_LABEL};
    use crate::store::{StoreOptions, StoreReader, StoreWriter};
    use async_trait::async_trait;
    use serde_json::Value;

    struct Echo;

    #[async_trait]
    impl NodeBackend for Echo {
        type In = i64;
        type Prep = i64;
        type Exec = i64;
        type Out = i64;
        async fn prep(&self, _s: &StoreReader<'_>, i: &i64) -> Result<i64, PocketError> {
            Ok(*i)
        }
        async fn exec(&self, p: &i64) -> Result<i64, PocketError> {
            Ok(*p)
        }
        async fn post(
            &self,
            _s: &StoreWriter<'_>,
            _i: &i64,
            _p: &i64,
            e: i64,
        ) -> Result<(i64, Label), PocketError> {
            Ok((e, DEFAULT_LABEL.to_string()))
        }
    }

    #[tokio::test]
    async fn builder_resolves_names_at_build() {
        let a = Arc::new(Node::new("a", Echo));
        let b = Arc::new(Node::new("b", Echo));
        let graph = GraphBuilder::new(Store::new(StoreOptions::default()))
            .add(a)
            .add(b)
            .connect("a", DEFAULT_LABEL, "b")
            .start("a")
            .build()
            .unwrap();
        let ctx = crate::node::RunContext::new();
        let out = graph.run(&ctx, Value::from(5)).await.unwrap();
        assert_eq!(out, Value::from(5));
    }

    #[test]
    fn unknown_connect_target_is_node_not_found() {
        let a = Arc::new(Node::new("a", Echo));
        let err = GraphBuilder::new(Store::new(StoreOptions::default()))
            .add(a)
            .connect("a", DEFAULT_LABEL, "missing")
            .start("a")
            .build()
            .unwrap_err();
        assert!(matches!(err, PocketError::NodeNotFound(_)));
    }

    #[test]
    fn missing_start_is_no_start_node() {
        let a = Arc::new(Node::new("a", Echo));
        let err = GraphBuilder::new(Store::new(StoreOptions::default()))
            .add(a)
            .build()
            .unwrap_err();
        assert!(matches!(err, PocketError::NoStartNode { .. }));
    }
}
