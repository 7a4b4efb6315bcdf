//! Static type validator: a DFS over the graph from its start node, checking
//! that every edge's declared output type is compatible with the declared
//! input type of the node it routes to. Unset ("any") on either side skips
//! the check for that edge.

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::PocketError;
use crate::node::{DynNode, TypeTag};

/// Walks every reachable edge exactly once (tracked by node name) and
/// returns the first [`PocketError::TypeMismatch`] found, if any. Uses an
/// explicit work-stack rather than recursion, for the same reason the Run
/// loop is iterative: a long chain of nodes must not risk a stack overflow
/// during validation either.
pub fn validate_graph(start: &Arc<dyn DynNode>) -> Result<(), PocketError> {
    let mut visited: HashSet<String> = HashSet::new();
    let mut stack: Vec<Arc<dyn DynNode>> = vec![start.clone()];

    while let Some(node) = stack.pop() {
        if !visited.insert(node.name().to_string()) {
            continue;
        }

        for (label, next) in node.successors() {
            if !TypeTag::compatible(node.output_type(), next.input_type()) {
                return Err(PocketError::TypeMismatch {
                    from: node.name().to_string(),
                    to: next.name().to_string(),
                    label,
                    from_type: node
                        .output_type()
                        .map(|t| t.name().to_string())
                        .unwrap_or_else(|| "any".to_string()),
                    to_type: next
                        .input_type()
                        .map(|t| t.name().to_string())
                        .unwrap_or_else(|| "any".to_string()),
                });
            }
            if !visited.contains(next.name()) {
                stack.push(next);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PocketError;
    use crate::node::{Node, NodeBackend, DEFAULT_LABEL};
    use crate::store::{StoreReader, StoreWriter};
    use async_trait::async_trait;

    struct IntNode;

    #[async_trait]
    impl NodeBackend for IntNode {
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
        ) -> Result<(i64, crate::node::Label), PocketError> {
            Ok((e, DEFAULT_LABEL.to_string()))
        }
    }

    struct StringNode;

    #[async_trait]
    impl NodeBackend for StringNode {
        type In = String;
        type Prep = String;
        type Exec = String;
        type Out = String;
        async fn prep(&self, _s: &StoreReader<'_>, i: &String) -> Result<String, PocketError> {
            Ok(i.clone())
        }
        async fn exec(&self, p: &String) -> Result<String, PocketError> {
            Ok(p.clone())
        }
        async fn post(
            &self,
            _s: &StoreWriter<'_>,
            _i: &String,
            _p: &String,
            e: String,
        ) -> Result<(String, crate::node::Label), PocketError> {
            Ok((e, DEFAULT_LABEL.to_string()))
        }
    }

    #[test]
    fn compatible_chain_validates() {
        let a = Arc::new(Node::new("a", IntNode));
        let b = Arc::new(Node::new("b", IntNode));
        a.connect(DEFAULT_LABEL, b.clone() as Arc<dyn crate::node::DynNode>);
        let start: Arc<dyn crate::node::DynNode> = a;
        assert!(validate_graph(&start).is_ok());
    }

    #[test]
    fn mismatched_chain_reports_both_types() {
        let a = Arc::new(Node::new("a", IntNode));
        let b = Arc::new(Node::new("b", StringNode));
        a.connect(DEFAULT_LABEL, b.clone() as Arc<dyn crate::node::DynNode>);
        let start: Arc<dyn crate::node::DynNode> = a;
        let err = validate_graph(&start).unwrap_err();
        match err {
            PocketError::TypeMismatch { from, to, .. } => {
                assert_eq!(from, "a");
                assert_eq!(to, "b");
            }
            other => panic!("expected TypeMismatch, got {other:?}"),
        }
    }
}
