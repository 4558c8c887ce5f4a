//! `aten::narrow`: static slice of `length` elements along one axis.

use std::any::Any;
use std::fmt;

use once_cell::sync::Lazy;

use crate::error::{IrError, IrResult};
use crate::hashing::hash_value;
use crate::node::{write_node, Node, NodeBase, NodeContext, Value};
use crate::op_kind::{symbols, OpKind};
use crate::shape::{Dimension, Shape};

static KIND: Lazy<OpKind> = Lazy::new(|| OpKind::new(symbols::NARROW));

#[derive(Debug, Clone)]
pub struct Narrow {
    base: NodeBase,
    dim: usize,
    start: usize,
    length: usize,
}

impl Narrow {
    pub fn class_op_kind() -> OpKind {
        KIND.clone()
    }

    pub fn new(
        ctx: &dyn NodeContext,
        input: Value,
        dim: usize,
        start: usize,
        length: usize,
    ) -> IrResult<Self> {
        let input_shape = ctx.shape_of(input)?;
        let extent = input_shape.dim(dim).ok_or_else(|| {
            IrError::invalid_argument(
                &KIND,
                format!("dim {dim} out of range for rank {}", input_shape.rank()),
            )
        })?;
        if let Dimension::Static(size) = extent {
            let end = start.checked_add(length);
            if end.map_or(true, |end| end > *size) {
                return Err(IrError::invalid_argument(
                    &KIND,
                    format!("range {start}..{start}+{length} exceeds extent {size} of dim {dim}"),
                ));
            }
        }
        let mut dims = input_shape.dims().to_vec();
        dims[dim] = Dimension::Static(length);
        let base = NodeBase::new(
            ctx,
            Self::class_op_kind(),
            vec![input],
            vec![Shape::new(dims)],
            hash_value(&(dim, start, length)),
        )?;
        Ok(Self {
            base,
            dim,
            start,
            length,
        })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn length(&self) -> usize {
        self.length
    }
}

impl Node for Narrow {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn equivalent(&self, other: &dyn Node) -> bool {
        other.downcast_ref::<Self>().is_some_and(|other| {
            (other.dim, other.start, other.length) == (self.dim, self.start, self.length)
        })
    }

    fn fmt_params(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            ", dim={}, start={}, length={}",
            self.dim, self.start, self.length
        )
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Display for Narrow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_node(self, f)
    }
}
