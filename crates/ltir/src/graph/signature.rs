//! Arena-independent graph descriptions and the signatures derived from them.
//!
//! A [`GraphDescription`] renumbers the nodes reachable from a set of roots densely, so two
//! arenas that captured the same computation produce byte-identical descriptions even when
//! unrelated nodes were recorded in between. Its bincode encoding, hashed with FNV-1a, is the
//! [`GraphSignature`] used as compiled-graph cache key.
//!
//! Descriptions carry [`Node::signature_params`] rather than the structural node hash, so the
//! data handles bound to leaves do not reach the key: recapturing a computation over new inputs
//! of the same shapes yields the same signature.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::hashing::{fnv1a_hash, HashValue};
use crate::node::{NodeId, Value};
use crate::op_kind::OpKind;
use crate::shape::Shape;

use super::arena::Graph;

/// Serializable view of one node; operand ids refer to positions in the description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDescription {
    pub kind: OpKind,
    pub operands: Vec<Value>,
    pub shapes: Vec<Shape>,
    pub params: HashValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphDescription {
    pub nodes: Vec<NodeDescription>,
    pub roots: Vec<Value>,
}

/// Stable cache key for a rooted graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphSignature {
    pub hash: u64,
    pub num_nodes: usize,
}

impl fmt::Display for GraphSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}/{}", self.hash, self.num_nodes)
    }
}

impl GraphDescription {
    pub fn signature(&self) -> IrResult<GraphSignature> {
        let bytes = bincode::serialize(self)?;
        Ok(GraphSignature {
            hash: fnv1a_hash(&bytes),
            num_nodes: self.nodes.len(),
        })
    }

    pub fn to_json_string(&self) -> IrResult<String> {
        serde_json::to_string_pretty(self).map_err(IrError::from)
    }

    pub fn from_json_str(src: &str) -> IrResult<Self> {
        serde_json::from_str(src).map_err(IrError::from)
    }
}

impl Graph {
    /// Describes the subgraph reachable from `roots` with dense local numbering.
    pub fn describe(&self, roots: &[Value]) -> IrResult<GraphDescription> {
        let order = self.topological_order(roots)?;
        let local: HashMap<NodeId, NodeId> = order
            .iter()
            .enumerate()
            .map(|(position, id)| (*id, NodeId(position as u32)))
            .collect();
        let remap = |value: &Value| Value::new(local[&value.node], value.index);

        let nodes = order
            .iter()
            .filter_map(|id| self.get(*id))
            .map(|node| NodeDescription {
                kind: node.kind().clone(),
                operands: node.operands().iter().map(remap).collect(),
                shapes: node.shapes().to_vec(),
                params: node.signature_params(),
            })
            .collect();
        Ok(GraphDescription {
            nodes,
            roots: roots.iter().map(remap).collect(),
        })
    }

    pub fn signature(&self, roots: &[Value]) -> IrResult<GraphSignature> {
        self.describe(roots)?.signature()
    }
}
