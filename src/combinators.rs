//! Concurrency combinators built on top of ephemeral, one-node graphs, so
//! retries/hooks/timeouts behave identically whether a node runs solo or as
//! part of `Pipeline`/`RunConcurrent`/`FanOut`/`FanIn`.

use serde_json::Value;
use std::sync::Arc;

use crate::error::PocketError;
use crate::graph::Graph;
use crate::node::{DynNode, RunContext};
use crate::store::Store;

fn ephemeral_graph(node: Arc<dyn DynNode>, store: Store) -> Graph {
    let name = node.name().to_string();
    Graph::new(name, node, store)
}

/// Runs `nodes` in sequence against a shared `Store`, feeding each node's
/// output to the next. Fails fast on the first error.
pub async fn pipeline(
    nodes: Vec<Arc<dyn DynNode>>,
    store: &Store,
    ctx: &RunContext,
    input: Value,
) -> Result<Value, PocketError> {
    let mut value = input;
    for node in nodes {
        let graph = ephemeral_graph(node, store.clone());
        value = graph.run(ctx, value).await?;
    }
    Ok(value)
}

/// Runs one ephemeral one-node graph per `(node, input)` pair concurrently,
/// returning results in the original index order. The first reported error
/// wins (subsequent task results are discarded once one side reports an
/// error). Mismatched `nodes`/`inputs` lengths is a caller error.
pub async fn run_concurrent(
    nodes: Vec<Arc<dyn DynNode>>,
    store: &Store,
    ctx: &RunContext,
    inputs: Vec<Value>,
) -> Result<Vec<Value>, PocketError> {
    if nodes.len() != inputs.len() {
        return Err(PocketError::custom(format!(
            "run_concurrent: {} nodes but {} inputs",
            nodes.len(),
            inputs.len()
        )));
    }

    let tasks: Vec<_> = nodes
        .into_iter()
        .zip(inputs)
        .map(|(node, input)| {
            let store = store.clone();
            let ctx = ctx.clone();
            tokio::spawn(async move {
                let graph = ephemeral_graph(node, store);
                graph.run(&ctx, input).await
            })
        })
        .collect();

    let mut results = Vec::with_capacity(tasks.len());
    for task in tasks {
        match task.await {
            Ok(Ok(v)) => results.push(v),
            Ok(Err(e)) => return Err(e),
            Err(join_err) => return Err(PocketError::custom(format!("task panicked: {join_err}"))),
        }
    }
    Ok(results)
}

/// Runs the same node concurrently over every item in `items`, returning
/// results in input order.
pub async fn fan_out(
    node: Arc<dyn DynNode>,
    store: &Store,
    ctx: &RunContext,
    items: Vec<Value>,
) -> Result<Vec<Value>, PocketError> {
    let nodes = std::iter::repeat(node).take(items.len()).collect();
    run_concurrent(nodes, store, ctx, items).await
}

/// Runs every node in `sources` concurrently against the same `input`, then
/// reduces their outputs with `aggregator`.
pub async fn fan_in<F>(
    sources: Vec<Arc<dyn DynNode>>,
    store: &Store,
    ctx: &RunContext,
    input: Value,
    aggregator: F,
) -> Result<Value, PocketError>
where
    F: FnOnce(Vec<Value>) -> Value,
{
    let count = sources.len();
    let inputs = std::iter::repeat(input).take(count).collect();
    let results = run_concurrent(sources, store, ctx, inputs).await?;
    Ok(aggregator(results))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Node, NodeBackend, DEFAULT_LABEL};
    use crate::store::{StoreOptions, StoreReader, StoreWriter};
    use async_trait::async_trait;

    struct AddN(i64);

    #[async_trait]
    impl NodeBackend for AddN {
        type In = i64;
        type Prep = i64;
        type Exec = i64;
        type Out = i64;
        async fn prep(&self, _s: &StoreReader<'_>, i: &i64) -> Result<i64, PocketError> {
            Ok(*i)
        }
        async fn exec(&self, p: &i64) -> Result<i64, PocketError> {
            Ok(p + self.0)
        }
        async fn post(
            &self,
            _s: &StoreWriter<'_>,
            _i: &i64,
            _p: &i64,
            e: i64,
        ) -> Result<(i64, crate::node::Label), PocketError> {
            Ok((e, DEFAULT_LABEL.to_string()))
        }
    }

    #[tokio::test]
    async fn pipeline_chains_nodes_in_order() {
        let nodes: Vec<Arc<dyn DynNode>> = vec![
            Arc::new(Node::new("add1", AddN(1))),
            Arc::new(Node::new("add2", AddN(2))),
        ];
        let store = Store::new(StoreOptions::default());
        let ctx = RunContext::new();
        let out = pipeline(nodes, &store, &ctx, Value::from(10)).await.unwrap();
        assert_eq!(out, Value::from(13));
    }

    #[tokio::test]
    async fn run_concurrent_preserves_order() {
        let nodes: Vec<Arc<dyn DynNode>> = vec![
            Arc::new(Node::new("n0", AddN(100))),
            Arc::new(Node::new("n1", AddN(200))),
            Arc::new(Node::new("n2", AddN(300))),
        ];
        let inputs = vec![Value::from(1), Value::from(2), Value::from(3)];
        let store = Store::new(StoreOptions::default());
        let ctx = RunContext::new();
        let out = run_concurrent(nodes, &store, &ctx, inputs).await.unwrap();
        assert_eq!(out, vec![Value::from(101), Value::from(202), Value::from(303)]);
    }

    #[tokio::test]
    async fn run_concurrent_rejects_length_mismatch() {
        let nodes: Vec<Arc<dyn DynNode>> = vec![Arc::new(Node::new("n0", AddN(1)))];
        let inputs = vec![Value::from(1), Value::from(2)];
        let store = Store::new(StoreOptions::default());
        let ctx = RunContext::new();
        assert!(run_concurrent(nodes, &store, &ctx, inputs).await.is_err());
    }

    #[tokio::test]
    async fn fan_out_runs_node_over_every_item() {
        let node: Arc<dyn DynNode> = Arc::new(Node::new("double", AddN(0)));
        let items = vec![Value::from(1), Value::from(2), Value::from(3)];
        let store = Store::new(StoreOptions::default());
        let ctx = RunContext::new();
        let out = fan_out(node, &store, &ctx, items).await.unwrap();
        assert_eq!(out, vec![Value::from(1), Value::from(2), Value::from(3)]);
    }

    #[tokio::test]
    async fn fan_in_aggregates_results() {
        let sources: Vec<Arc<dyn DynNode>> = vec![
            Arc::new(Node::new("a", AddN(1))),
            Arc::new(Node::new("b", AddN(2))),
        ];
        let store = Store::new(StoreOptions::default());
        let ctx = RunContext::new();
        let total = fan_in(sources, &store, &ctx, Value::from(10), |results| {
            let sum: i64 = results.iter().filter_map(|v| v.as_i64()).sum();
            Value::from(sum)
        })
        .await
        .unwrap();
        assert_eq!(total, Value::from(23));
    }
}
