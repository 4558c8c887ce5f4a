//! `aten::split`: cuts an axis into `split_size` chunks, one result per chunk.

use std::any::Any;
use std::fmt;

use once_cell::sync::Lazy;

use crate::error::{IrError, IrResult};
use crate::hashing::hash_value;
use crate::node::{write_node, Node, NodeBase, NodeContext, Value};
use crate::op_kind::{symbols, OpKind};
use crate::shape::{Dimension, Shape};

static KIND: Lazy<OpKind> = Lazy::new(|| OpKind::new(symbols::SPLIT));

#[derive(Debug, Clone)]
pub struct Split {
    base: NodeBase,
    split_size: usize,
    dim: usize,
}

impl Split {
    pub fn class_op_kind() -> OpKind {
        KIND.clone()
    }

    pub fn new(
        ctx: &dyn NodeContext,
        input: Value,
        split_size: usize,
        dim: usize,
    ) -> IrResult<Self> {
        let shapes = split_shapes(ctx.shape_of(input)?, split_size, dim)?;
        let base = NodeBase::new(
            ctx,
            Self::class_op_kind(),
            vec![input],
            shapes,
            hash_value(&(split_size, dim)),
        )?;
        Ok(Self {
            base,
            split_size,
            dim,
        })
    }

    pub fn split_size(&self) -> usize {
        self.split_size
    }

    pub fn dim(&self) -> usize {
        self.dim
    }
}

/// Chunk shapes: every chunk spans `split_size` except a possibly shorter last one.
/// An empty axis still yields one empty chunk.
pub fn split_shapes(input: &Shape, split_size: usize, dim: usize) -> IrResult<Vec<Shape>> {
    let extent = match input.dim(dim) {
        Some(Dimension::Static(extent)) => *extent,
        Some(Dimension::Dynamic(symbol)) => {
            return Err(IrError::invalid_argument(
                &KIND,
                format!("cannot split dynamic dim {dim} (?{})", symbol.as_str()),
            ))
        }
        None => {
            return Err(IrError::invalid_argument(
                &KIND,
                format!("dim {dim} out of range for rank {}", input.rank()),
            ))
        }
    };
    if split_size == 0 {
        return Err(IrError::invalid_argument(&KIND, "split_size must be positive"));
    }
    let chunks = extent.div_ceil(split_size).max(1);
    let shapes = (0..chunks)
        .map(|chunk| {
            let start = chunk * split_size;
            let mut dims = input.dims().to_vec();
            dims[dim] = Dimension::Static(split_size.min(extent - start));
            Shape::new(dims)
        })
        .collect();
    Ok(shapes)
}

impl Node for Split {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn equivalent(&self, other: &dyn Node) -> bool {
        other
            .downcast_ref::<Self>()
            .is_some_and(|other| (other.split_size, other.dim) == (self.split_size, self.dim))
    }

    fn fmt_params(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ", split_size={}, dim={}", self.split_size, self.dim)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_node(self, f)
    }
}
