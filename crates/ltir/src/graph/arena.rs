//! Arena that owns every node of a lazy graph.
//!
//! Nodes are appended in construction order and never removed, so an operand always has a
//! smaller id than its consumers and the graph cannot contain cycles. Edges are plain
//! [`NodeId`] indices; dropping the graph frees all nodes at once.
//!
//! ## Node reuse
//!
//! When [`GraphConfig::reuse_nodes`] is set, [`Graph::add`] looks up nodes with the same
//! structural hash and returns an existing id when kind, operands, shapes and parameters all
//! agree. Equal requests therefore collapse onto one node (common-subexpression elimination at
//! capture time).

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::error::{IrError, IrResult};
use crate::hashing::HashValue;
use crate::node::{structurally_equal, Node, NodeContext, NodeId, Value};
use crate::ops::dims::{canonical_dim, canonical_dims};
use crate::ops::{
    DeviceData, Expand, Narrow, Permute, Split, Squeeze, Transpose, Unsqueeze, View,
};
use crate::shape::Shape;

use super::GraphConfig;

static GRAPH_ID_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Append-only node storage with optional structural reuse.
pub struct Graph {
    id: usize,
    config: GraphConfig,
    nodes: Vec<Arc<dyn Node>>,
    reuse_index: HashMap<HashValue, SmallVec<[NodeId; 1]>>,
    reused: usize,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new(GraphConfig::default())
    }
}

impl NodeContext for Graph {
    fn node(&self, id: NodeId) -> Option<&Arc<dyn Node>> {
        self.nodes.get(id.index())
    }
}

impl Graph {
    pub fn new(config: GraphConfig) -> Self {
        Self {
            id: GRAPH_ID_COUNTER.fetch_add(1, Ordering::Relaxed),
            config,
            nodes: Vec::new(),
            reuse_index: HashMap::new(),
            reused: 0,
        }
    }

    /// Process-unique identifier, useful to tell graphs apart in logs.
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of `add` calls answered with an existing node.
    pub fn reused_count(&self) -> usize {
        self.reused
    }

    pub fn get(&self, id: NodeId) -> Option<&dyn Node> {
        self.nodes.get(id.index()).map(|node| node.as_ref())
    }

    /// Nodes in insertion (topological) order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &dyn Node)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            // `add` keeps every slot within the 32-bit id space.
            .map(|(idx, node)| (NodeId(idx as u32), node.as_ref()))
    }

    /// Records `node`, or returns the id of a structurally equal node already in the graph.
    pub fn add<N: Node>(&mut self, node: N) -> IrResult<NodeId> {
        self.add_arc(Arc::new(node))
    }

    pub fn add_arc(&mut self, node: Arc<dyn Node>) -> IrResult<NodeId> {
        self.check_operands(node.as_ref())?;

        let hash = node.hash();
        if self.config.reuse_nodes {
            if let Some(existing) = self.find_equivalent(node.as_ref()) {
                self.reused += 1;
                debug!(
                    graph = self.id,
                    node = %existing,
                    kind = %node.kind(),
                    "reusing existing node"
                );
                return Ok(existing);
            }
        }

        let id = NodeId::from_index(self.nodes.len())?;
        trace!(graph = self.id, id = %id, hash, "recorded {node}");
        self.nodes.push(node);
        if self.config.reuse_nodes {
            self.reuse_index.entry(hash).or_default().push(id);
        }
        Ok(id)
    }

    /// Operand edges must hash as they did when `node` was built, which rejects nodes
    /// constructed against a different arena.
    fn check_operands(&self, node: &dyn Node) -> IrResult<()> {
        let recorded = node.base().operand_hashes();
        for (position, operand) in node.operands().iter().enumerate() {
            let current = self.operand_hash(*operand)?;
            if recorded.get(position) != Some(&current) {
                return Err(IrError::unknown_operand(
                    *operand,
                    format!(
                        "{} was built against a different node at {operand}",
                        node.kind()
                    ),
                ));
            }
        }
        Ok(())
    }

    fn find_equivalent(&self, node: &dyn Node) -> Option<NodeId> {
        let candidates = self.reuse_index.get(&node.hash())?;
        candidates
            .iter()
            .copied()
            .find(|id| structurally_equal(self.nodes[id.index()].as_ref(), node))
    }

    /// Every node reachable from `roots`, operands before consumers, in ascending id order.
    pub fn topological_order(&self, roots: &[Value]) -> IrResult<Vec<NodeId>> {
        let mut visited = HashSet::new();
        let mut stack = Vec::with_capacity(roots.len());
        for root in roots {
            self.resolve(*root)?;
            stack.push(root.node);
        }
        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            if let Some(node) = self.nodes.get(id.index()) {
                stack.extend(node.operands().iter().map(|operand| operand.node));
            }
        }
        let mut order = visited.into_iter().collect::<Vec<_>>();
        order.sort_unstable();
        Ok(order)
    }

    fn add_single(&mut self, node: impl Node) -> IrResult<Value> {
        Ok(Value::from(self.add(node)?))
    }

    fn rank_of(&self, value: Value) -> IrResult<usize> {
        Ok(self.shape_of(value)?.rank())
    }

    pub fn device_data(&mut self, handle: u64, shape: Shape) -> IrResult<Value> {
        self.add_single(DeviceData::new(handle, shape))
    }

    /// Permutes the axes of `input`; negative entries count from the last axis.
    pub fn permute(&mut self, input: Value, dims: &[i64]) -> IrResult<Value> {
        let dims = canonical_dims(&Permute::class_op_kind(), dims, self.rank_of(input)?)?;
        let node = Permute::new(&*self, input, dims)?;
        self.add_single(node)
    }

    pub fn transpose(&mut self, input: Value, dim0: i64, dim1: i64) -> IrResult<Value> {
        let kind = Transpose::class_op_kind();
        let rank = self.rank_of(input)?;
        let dim0 = canonical_dim(&kind, dim0, rank)?;
        let dim1 = canonical_dim(&kind, dim1, rank)?;
        let node = Transpose::new(&*self, input, dim0, dim1)?;
        self.add_single(node)
    }

    pub fn expand(&mut self, input: Value, size: &[i64]) -> IrResult<Value> {
        let node = Expand::new(&*self, input, size)?;
        self.add_single(node)
    }

    pub fn narrow(
        &mut self,
        input: Value,
        dim: i64,
        start: usize,
        length: usize,
    ) -> IrResult<Value> {
        let dim = canonical_dim(&Narrow::class_op_kind(), dim, self.rank_of(input)?)?;
        let node = Narrow::new(&*self, input, dim, start, length)?;
        self.add_single(node)
    }

    pub fn squeeze(&mut self, input: Value, dim: Option<i64>) -> IrResult<Value> {
        let dim = match dim {
            Some(dim) => Some(canonical_dim(
                &Squeeze::class_op_kind(),
                dim,
                self.rank_of(input)?,
            )?),
            None => None,
        };
        let node = Squeeze::new(&*self, input, dim)?;
        self.add_single(node)
    }

    /// Inserts a unit axis; `-1` appends after the current last axis.
    pub fn unsqueeze(&mut self, input: Value, dim: i64) -> IrResult<Value> {
        let dim = canonical_dim(&Unsqueeze::class_op_kind(), dim, self.rank_of(input)? + 1)?;
        let node = Unsqueeze::new(&*self, input, dim)?;
        self.add_single(node)
    }

    pub fn view(&mut self, input: Value, size: &[i64]) -> IrResult<Value> {
        let node = View::new(&*self, input, size)?;
        self.add_single(node)
    }

    /// Splits `input` along `dim`, returning one edge per chunk.
    pub fn split(&mut self, input: Value, split_size: usize, dim: i64) -> IrResult<Vec<Value>> {
        let dim = canonical_dim(&Split::class_op_kind(), dim, self.rank_of(input)?)?;
        let node = Split::new(&*self, input, split_size, dim)?;
        let outputs = node.num_outputs();
        let id = self.add(node)?;
        Ok((0..outputs).map(|index| Value::new(id, index)).collect())
    }

    /// Downcasts the node behind `value` to a concrete family.
    pub fn node_as<T: Node>(&self, value: Value) -> IrResult<&T> {
        let node = self.resolve(value)?;
        node.downcast_ref::<T>().ok_or_else(|| {
            IrError::invalid_argument(
                node.kind(),
                format!("{value} is not a {}", std::any::type_name::<T>()),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reuse_collapses_equal_requests() {
        let mut graph = Graph::default();
        let x = graph.device_data(0, Shape::from_static(&[2, 3, 4])).unwrap();
        let a = graph.permute(x, &[0, 2, 1]).unwrap();
        let b = graph.permute(x, &[0, -1, 1]).unwrap();
        assert_eq!(a, b);
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.reused_count(), 1);
    }

    #[test]
    fn reuse_can_be_disabled() {
        let mut graph = Graph::new(GraphConfig {
            reuse_nodes: false,
            ..GraphConfig::default()
        });
        let x = graph.device_data(0, Shape::from_static(&[2, 3])).unwrap();
        let a = graph.transpose(x, 0, 1).unwrap();
        let b = graph.transpose(x, 0, 1).unwrap();
        assert_ne!(a, b);
        assert_eq!(graph.len(), 3);
        assert_eq!(graph.get(a.node).unwrap().hash(), graph.get(b.node).unwrap().hash());
    }

    #[test]
    fn dangling_operand_is_rejected() {
        let graph = Graph::default();
        let err = Permute::new(&graph, Value::from(NodeId(7)), Vec::<usize>::new()).unwrap_err();
        assert!(err.is_unknown_operand(), "{err}");
    }

    #[test]
    fn topological_order_skips_unreachable_nodes() {
        let mut graph = Graph::default();
        let x = graph.device_data(0, Shape::from_static(&[2, 3])).unwrap();
        let unused = graph.device_data(1, Shape::from_static(&[4])).unwrap();
        let t = graph.transpose(x, 0, 1).unwrap();
        let v = graph.view(t, &[-1]).unwrap();
        let order = graph.topological_order(&[v]).unwrap();
        assert_eq!(order, vec![x.node, t.node, v.node]);
        assert!(!order.contains(&unused.node));
    }

    #[test]
    fn node_as_checks_family() {
        let mut graph = Graph::default();
        let x = graph.device_data(3, Shape::from_static(&[2])).unwrap();
        assert_eq!(graph.node_as::<DeviceData>(x).unwrap().handle(), 3);
        assert!(graph.node_as::<Permute>(x).is_err());
    }
}
