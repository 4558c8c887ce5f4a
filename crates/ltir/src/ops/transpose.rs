//! `aten::transpose`: swaps two axes.

use std::any::Any;
use std::fmt;

use once_cell::sync::Lazy;

use crate::error::{IrError, IrResult};
use crate::hashing::hash_value;
use crate::node::{write_node, Node, NodeBase, NodeContext, Value};
use crate::op_kind::{symbols, OpKind};
use crate::shape::Shape;

static KIND: Lazy<OpKind> = Lazy::new(|| OpKind::new(symbols::TRANSPOSE));

#[derive(Debug, Clone)]
pub struct Transpose {
    base: NodeBase,
    dim0: usize,
    dim1: usize,
}

impl Transpose {
    pub fn class_op_kind() -> OpKind {
        KIND.clone()
    }

    pub fn new(ctx: &dyn NodeContext, input: Value, dim0: usize, dim1: usize) -> IrResult<Self> {
        let input_shape = ctx.shape_of(input)?;
        let rank = input_shape.rank();
        if dim0 >= rank || dim1 >= rank {
            return Err(IrError::invalid_argument(
                &KIND,
                format!("dims ({dim0}, {dim1}) out of range for rank {rank}"),
            ));
        }
        let mut dims = input_shape.dims().to_vec();
        dims.swap(dim0, dim1);
        let base = NodeBase::new(
            ctx,
            Self::class_op_kind(),
            vec![input],
            vec![Shape::new(dims)],
            hash_value(&(dim0, dim1)),
        )?;
        Ok(Self { base, dim0, dim1 })
    }

    pub fn dim0(&self) -> usize {
        self.dim0
    }

    pub fn dim1(&self) -> usize {
        self.dim1
    }
}

impl Node for Transpose {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn equivalent(&self, other: &dyn Node) -> bool {
        other
            .downcast_ref::<Self>()
            .is_some_and(|other| (other.dim0, other.dim1) == (self.dim0, self.dim1))
    }

    fn fmt_params(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ", dim0={}, dim1={}", self.dim0, self.dim1)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Display for Transpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_node(self, f)
    }
}
