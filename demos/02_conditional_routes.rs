//! A node that routes to one of two successors depending on its own
//! output, and a retrying node with a fallback, composed into one graph.
//!
//! Run with `cargo run --example conditional_routes`.

use async_trait::async_trait;
use pocket::error::PocketError;
use pocket::node::{Node, NodeBackend, DEFAULT_LABEL};
use pocket::store::{Store, StoreOptions, StoreReader, StoreWriter};
use pocket::{GraphBuilder, RunContext};
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

struct Classify;

#[async_trait]
impl NodeBackend for Classify {
    type In = i64;
    type Prep = i64;
    type Exec = i64;
    type Out = i64;

    async fn prep(&self, _store: &StoreReader<'_>, input: &i64) -> Result<i64, PocketError> {
        Ok(*input)
    }

    async fn exec(&self, prep: &i64) -> Result<i64, PocketError> {
        Ok(*prep)
    }

    async fn post(
        &self,
        _store: &StoreWriter<'_>,
        _input: &i64,
        _prep: &i64,
        exec: i64,
    ) -> Result<(i64, String), PocketError> {
        let label = if exec >= 0 { "positive" } else { "negative" };
        Ok((exec, label.to_string()))
    }
}

struct UnreliableService {
    attempts: AtomicU32,
}

#[async_trait]
impl NodeBackend for UnreliableService {
    type In = i64;
    type Prep = i64;
    type Exec = i64;
    type Out = i64;

    async fn prep(&self, _store: &StoreReader<'_>, input: &i64) -> Result<i64, PocketError> {
        Ok(*input)
    }

    async fn exec(&self, prep: &i64) -> Result<i64, PocketError> {
        if self.attempts.fetch_add(1, Ordering::SeqCst) < 1 {
            Err(PocketError::custom("service hiccup"))
        } else {
            Ok(*prep * 10)
        }
    }

    async fn post(
        &self,
        _store: &StoreWriter<'_>,
        _input: &i64,
        _prep: &i64,
        exec: i64,
    ) -> Result<(i64, String), PocketError> {
        Ok((exec, DEFAULT_LABEL.to_string()))
    }

    async fn fallback(&self, prep: &i64, _err: PocketError) -> Result<i64, PocketError> {
        Ok(-*prep)
    }

    fn has_fallback(&self) -> bool {
        true
    }
}

#[tokio::main]
async fn main() -> Result<(), PocketError> {
    tracing_subscriber::fmt::init();

    let classify = Arc::new(Node::new("classify", Classify));
    let positive_path = Arc::new(
        Node::new(
            "positive_path",
            UnreliableService {
                attempts: AtomicU32::new(0),
            },
        )
        .with_retry(2, Duration::from_millis(20)),
    );
    let negative_path = Arc::new(Node::new("negative_path", Classify));

    let graph = GraphBuilder::new(Store::new(StoreOptions::default()))
        .add(classify)
        .add(positive_path)
        .add(negative_path)
        .connect("classify", "positive", "positive_path")
        .connect("classify", "negative", "negative_path")
        .start("classify")
        .build()?;

    let ctx = RunContext::new();
    println!("{}", graph.run(&ctx, Value::from(7)).await?);
    println!("{}", graph.run(&ctx, Value::from(-3)).await?);
    Ok(())
}
