//! `aten::permute`: reorders the axes of its operand.

use std::any::Any;
use std::fmt;

use once_cell::sync::Lazy;

use crate::error::IrResult;
use crate::hashing::hash_value;
use crate::node::{write_list, write_node, Node, NodeBase, NodeContext, Value};
use crate::op_kind::{symbols, OpKind};
use crate::ops::dims::{check_permutation, Dims};
use crate::shape::Shape;

static KIND: Lazy<OpKind> = Lazy::new(|| OpKind::new(symbols::PERMUTE));

#[derive(Debug, Clone)]
pub struct Permute {
    base: NodeBase,
    // The permutation of dimensions.
    dims: Dims,
}

impl Permute {
    pub fn class_op_kind() -> OpKind {
        KIND.clone()
    }

    /// Builds a permute of `input`; `dims` must be a permutation of the operand's axes.
    pub fn new(ctx: &dyn NodeContext, input: Value, dims: impl Into<Dims>) -> IrResult<Self> {
        let dims = dims.into();
        let shape = permute_shape(ctx.shape_of(input)?, &dims)?;
        let base = NodeBase::new(
            ctx,
            Self::class_op_kind(),
            vec![input],
            vec![shape],
            hash_value(dims.as_slice()),
        )?;
        Ok(Self { base, dims })
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }
}

/// Output shape of permuting `input` by `dims`: `out[i] = input[dims[i]]`.
///
/// Dynamic dims keep their symbol and move to their permuted position.
pub fn permute_shape(input: &Shape, dims: &[usize]) -> IrResult<Shape> {
    check_permutation(&KIND, dims, input.rank())?;
    Ok(Shape::new(
        dims.iter()
            .map(|&axis| input.dims()[axis].clone())
            .collect::<Vec<_>>(),
    ))
}

impl Node for Permute {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn equivalent(&self, other: &dyn Node) -> bool {
        other
            .downcast_ref::<Self>()
            .is_some_and(|other| other.dims == self.dims)
    }

    fn fmt_params(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_list(f, "dims", &self.dims)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Display for Permute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_node(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dims;
    use crate::graph::Graph;
    use crate::shape::Dimension;

    #[test]
    fn permute_swaps_trailing_axes() {
        let mut graph = Graph::default();
        let x = graph.device_data(0, Shape::from_static(&[2, 3, 4])).unwrap();
        let node = Permute::new(&graph, x, dims![0, 2, 1]).unwrap();
        assert_eq!(node.shape(), &Shape::from_static(&[2, 4, 3]));
        assert_eq!(node.dims(), &[0, 2, 1]);
        assert_eq!(node.to_string(), "aten::permute, dims=(0, 2, 1)");
    }

    #[test]
    fn dynamic_dims_follow_the_permutation() {
        let mut graph = Graph::default();
        let x = graph
            .device_data(0, Shape::mixed(&[None, Some(8), Some(16)]))
            .unwrap();
        let node = Permute::new(&graph, x, dims![2, 0, 1]).unwrap();
        assert_eq!(
            node.shape().dims(),
            &[
                Dimension::Static(16),
                Dimension::dynamic("d0"),
                Dimension::Static(8)
            ]
        );
    }

    #[test]
    fn rejects_non_permutations() {
        let mut graph = Graph::default();
        let x = graph.device_data(0, Shape::from_static(&[2, 3])).unwrap();
        for dims in [dims![0], dims![0, 0], dims![0, 2], dims![1, 0, 2]] {
            let err = Permute::new(&graph, x, dims.clone()).unwrap_err();
            assert!(err.is_invalid_argument(), "{dims:?}: {err}");
        }
    }

    #[test]
    fn scalar_identity_permutation() {
        let mut graph = Graph::default();
        let x = graph.device_data(0, Shape::scalar()).unwrap();
        let node = Permute::new(&graph, x, Dims::new()).unwrap();
        assert_eq!(node.shape(), &Shape::scalar());
        assert_eq!(node.to_string(), "aten::permute, dims=()");
    }
}
