//! Operation-node contract shared by every deferred operation.
//!
//! A node is immutable once built: its kind, operand edges, output shapes and structural hash
//! are all fixed by the constructor. Operands are referenced through [`Value`] edges that index
//! into the owning [`Graph`](crate::graph::Graph); the graph is the only owner of nodes.
//!
//! The structural hash folds the kind, every operand's own hash plus the consumed result index,
//! and the node parameters. Hashing therefore costs O(operands) while still capturing the whole
//! upstream chain, and it does not depend on arena ids.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::{IrError, IrResult};
use crate::hashing::{hash_combine, hash_value, HashValue};
use crate::op_kind::OpKind;
use crate::shape::Shape;

/// Index of a node inside its graph arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Id for arena slot `index`; fails once the slot no longer fits the 32-bit id space.
    pub fn from_index(index: usize) -> IrResult<Self> {
        u32::try_from(index)
            .map(NodeId)
            .map_err(|_| IrError::TooManyNodes { len: index })
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

/// Operand edge: a node plus which of its results is consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Value {
    pub node: NodeId,
    pub index: usize,
}

impl Value {
    pub fn new(node: NodeId, index: usize) -> Self {
        Self { node, index }
    }
}

impl From<NodeId> for Value {
    fn from(node: NodeId) -> Self {
        Self { node, index: 0 }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.index == 0 {
            write!(f, "{}", self.node)
        } else {
            write!(f, "{}.{}", self.node, self.index)
        }
    }
}

/// Read access to already-built nodes, used by constructors to inspect their operands.
pub trait NodeContext {
    fn node(&self, id: NodeId) -> Option<&Arc<dyn Node>>;

    /// Resolves an edge, failing with `UnknownOperand` for dangling ids or bad result indices.
    fn resolve(&self, value: Value) -> IrResult<&Arc<dyn Node>> {
        let node = self
            .node(value.node)
            .ok_or_else(|| IrError::unknown_operand(value, "node does not exist"))?;
        if value.index >= node.num_outputs() {
            return Err(IrError::unknown_operand(
                value,
                format!(
                    "{} produces {} result(s)",
                    node.kind(),
                    node.num_outputs()
                ),
            ));
        }
        Ok(node)
    }

    fn shape_of(&self, value: Value) -> IrResult<&Shape> {
        let node = self.resolve(value)?;
        node.shape_at(value.index)
            .ok_or_else(|| IrError::unknown_operand(value, "result has no shape"))
    }

    /// Hash of the edge itself: the target's structural hash mixed with the result index.
    fn operand_hash(&self, value: Value) -> IrResult<HashValue> {
        let node = self.resolve(value)?;
        Ok(hash_combine(node.hash(), hash_value(&value.index)))
    }
}

/// Fields every node carries; concrete families embed one and expose it through [`Node::base`].
#[derive(Debug, Clone)]
pub struct NodeBase {
    kind: OpKind,
    operands: Vec<Value>,
    // Edge hashes seen at construction, one per operand.
    operand_hashes: SmallVec<[HashValue; 2]>,
    shapes: Vec<Shape>,
    params_hash: HashValue,
    hash: HashValue,
}

impl NodeBase {
    /// Builds the base for a node with operands; operand hashes are read from `ctx`.
    pub fn new(
        ctx: &dyn NodeContext,
        kind: OpKind,
        operands: Vec<Value>,
        shapes: Vec<Shape>,
        params_hash: HashValue,
    ) -> IrResult<Self> {
        if shapes.is_empty() {
            return Err(IrError::invalid_argument(
                &kind,
                "node must produce at least one result",
            ));
        }
        let operand_hashes = operands
            .iter()
            .map(|operand| ctx.operand_hash(*operand))
            .collect::<IrResult<SmallVec<[HashValue; 2]>>>()?;
        let hash = operand_hashes
            .iter()
            .fold(kind.hash_value(), |hash, edge| hash_combine(hash, *edge));
        Ok(Self {
            kind,
            operands,
            operand_hashes,
            shapes,
            params_hash,
            hash: hash_combine(hash, params_hash),
        })
    }

    /// Builds the base for a leaf node.
    pub fn leaf(kind: OpKind, shape: Shape, params_hash: HashValue) -> Self {
        let hash = hash_combine(kind.hash_value(), params_hash);
        Self {
            kind,
            operands: Vec::new(),
            operand_hashes: SmallVec::new(),
            shapes: vec![shape],
            params_hash,
            hash,
        }
    }

    pub fn operand_hashes(&self) -> &[HashValue] {
        &self.operand_hashes
    }

    pub fn params_hash(&self) -> HashValue {
        self.params_hash
    }
}

/// Behaviour shared by all operation nodes.
///
/// `Display` renders the kind followed by the node parameters (see [`write_node`]), which gives
/// every node a deterministic `to_string()` suitable for diagnostics and textual cache keys.
pub trait Node: fmt::Debug + fmt::Display + Send + Sync + 'static {
    fn base(&self) -> &NodeBase;

    /// Parameter-level comparison with a node already known to share kind and operands.
    fn equivalent(&self, other: &dyn Node) -> bool;

    /// Writes the parameter suffix (e.g. `, dims=(0, 2, 1)`); empty for parameterless nodes.
    fn fmt_params(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Ok(())
    }

    fn as_any(&self) -> &dyn Any;

    fn kind(&self) -> &OpKind {
        &self.base().kind
    }

    fn operands(&self) -> &[Value] {
        &self.base().operands
    }

    fn operand(&self, index: usize) -> Option<Value> {
        self.base().operands.get(index).copied()
    }

    /// Shape of result 0.
    fn shape(&self) -> &Shape {
        &self.base().shapes[0]
    }

    fn shapes(&self) -> &[Shape] {
        &self.base().shapes
    }

    /// Shape of result `index`, or `None` when the node has fewer results.
    fn shape_at(&self, index: usize) -> Option<&Shape> {
        self.base().shapes.get(index)
    }

    fn num_outputs(&self) -> usize {
        self.base().shapes.len()
    }

    fn hash(&self) -> HashValue {
        self.base().hash
    }

    /// Parameter hash used by graph signatures.
    ///
    /// Defaults to the structural parameter hash. Leaves bound to concrete data override it so
    /// that recapturing a computation over fresh inputs keeps its signature.
    fn signature_params(&self) -> HashValue {
        self.base().params_hash
    }
}

impl dyn Node {
    pub fn downcast_ref<T: Node>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn is<T: Node>(&self) -> bool {
        self.as_any().is::<T>()
    }
}

/// Standard `Display` body for nodes: kind name followed by [`Node::fmt_params`].
pub fn write_node(node: &dyn Node, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", node.kind())?;
    node.fmt_params(f)
}

/// Full structural equality as the reuse layer sees it.
pub fn structurally_equal(lhs: &dyn Node, rhs: &dyn Node) -> bool {
    lhs.hash() == rhs.hash()
        && lhs.kind() == rhs.kind()
        && lhs.operands() == rhs.operands()
        && lhs.shapes() == rhs.shapes()
        && lhs.equivalent(rhs)
}

/// Writes `name=(a, b, c)` for a parameter list.
pub(crate) fn write_list<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    name: &str,
    values: &[T],
) -> fmt::Result {
    write!(f, ", {name}=(")?;
    for (idx, value) in values.iter().enumerate() {
        if idx > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{value}")?;
    }
    f.write_str(")")
}
