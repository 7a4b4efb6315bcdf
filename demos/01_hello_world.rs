//! Smallest possible graph: one node, no routing.
//!
//! Run with `cargo run --example hello_world`.

use async_trait::async_trait;
use pocket::error::PocketError;
use pocket::node::{Node, NodeBackend, DEFAULT_LABEL};
use pocket::store::{Store, StoreOptions, StoreReader, StoreWriter};
use pocket::{GraphBuilder, RunContext};
use serde_json::Value;
use std::sync::Arc;

struct Greet;

#[async_trait]
impl NodeBackend for Greet {
    type In = String;
    type Prep = String;
    type Exec = String;
    type Out = String;

    async fn prep(&self, _store: &StoreReader<'_>, input: &String) -> Result<String, PocketError> {
        Ok(input.clone())
    }

    async fn exec(&self, name: &String) -> Result<String, PocketError> {
        Ok(format!("hello, {name}"))
    }

    async fn post(
        &self,
        _store: &StoreWriter<'_>,
        _input: &String,
        _prep: &String,
        greeting: String,
    ) -> Result<(String, String), PocketError> {
        Ok((greeting, DEFAULT_LABEL.to_string()))
    }
}

#[tokio::main]
async fn main() -> Result<(), PocketError> {
    tracing_subscriber::fmt::init();

    let node = Arc::new(Node::new("greet", Greet));
    let graph = GraphBuilder::new(Store::new(StoreOptions::default()))
        .add(node)
        .start("greet")
        .build()?;

    let ctx = RunContext::new();
    let out = graph.run(&ctx, Value::from("world")).await?;
    println!("{out}");
    Ok(())
}
