//! # pocket
//!
//! A typed, directed-graph workflow engine for LLM agents and data
//! pipelines. Pocket models a workflow as a **Graph + Store**:
//!
//! - [`node`]: a [`node::Node`] wraps a [`node::NodeBackend`] with retries,
//!   timeout, fallback, and lifecycle hooks around the Prep -> Exec -> Post
//!   cycle.
//! - [`graph`]: a [`graph::Graph`] wires nodes into a routing table keyed by
//!   route label and runs them with an iterative (non-recursive) loop —
//!   agent think/act cycles and other loops are first-class; there is no
//!   built-in cycle breaker or step ceiling.
//! - [`store`]: a [`store::Store`] is a bounded LRU + TTL key-value store
//!   shared between nodes, with read-only ([`store::StoreReader`]) and
//!   read-write ([`store::StoreWriter`]) capability views enforced by the
//!   type system rather than by convention.
//! - [`combinators`]: `pipeline`/`run_concurrent`/`fan_out`/`fan_in`, all
//!   built on the same ephemeral one-node-graph execution path nodes use
//!   solo, so retry/hook/timeout behavior never diverges between the two.
//!
//! ## Example
//!
//! ```rust,no_run
//! use pocket::graph::GraphBuilder;
//! use pocket::node::{Node, NodeBackend, RunContext, DEFAULT_LABEL};
//! use pocket::store::{Store, StoreOptions, StoreReader, StoreWriter};
//! use pocket::error::PocketError;
//! use async_trait::async_trait;
//! use serde_json::Value;
//!
//! struct Greet;
//!
//! #[async_trait]
//! impl NodeBackend for Greet {
//!     type In = String;
//!     type Prep = String;
//!     type Exec = String;
//!     type Out = String;
//!
//!     async fn prep(&self, _store: &StoreReader<'_>, input: &String) -> Result<String, PocketError> {
//!         Ok(input.clone())
//!     }
//!
//!     async fn exec(&self, name: &String) -> Result<String, PocketError> {
//!         Ok(format!("hello, {name}"))
//!     }
//!
//!     async fn post(
//!         &self,
//!         _store: &StoreWriter<'_>,
//!         _input: &String,
//!         _prep: &String,
//!         greeting: String,
//!     ) -> Result<(String, String), PocketError> {
//!         Ok((greeting, DEFAULT_LABEL.to_string()))
//!     }
//! }
//!
//! # async fn run() -> Result<(), PocketError> {
//! let node = std::sync::Arc::new(Node::new("greet", Greet));
//! let graph = GraphBuilder::new(Store::new(StoreOptions::default()))
//!     .add(node)
//!     .start("greet")
//!     .build()?;
//! let ctx = RunContext::new();
//! let out = graph.run(&ctx, Value::from("world")).await?;
//! assert_eq!(out, Value::from("hello, world"));
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod combinators;
pub mod error;
pub mod graph;
pub mod node;
pub mod store;
pub mod telemetry;

pub use error::PocketError;
pub use graph::{validate_graph, Graph, GraphBuilder};
pub use node::{DynNode, Node, NodeBackend, NodeConfig, RunContext, DEFAULT_LABEL};
pub use store::{Store, StoreOptions, StoreReader, StoreWriter, TypedStore};

/// Re-exports for call sites that want the common surface in one `use`.
pub mod prelude {
    pub use crate::combinators::{fan_in, fan_out, pipeline, run_concurrent};
    pub use crate::error::PocketError;
    pub use crate::graph::{validate_graph, Graph, GraphBuilder};
    pub use crate::node::{DynNode, Node, NodeBackend, RunContext, DEFAULT_LABEL};
    pub use crate::store::{Store, StoreOptions, StoreReader, StoreWriter, TypedStore};
    pub use crate::telemetry::{Logger, Tracer};
    pub use serde_json::Value;
}
