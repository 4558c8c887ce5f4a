//! `aten::squeeze` and `aten::unsqueeze`: remove or insert size-1 axes.

use std::any::Any;
use std::fmt;

use once_cell::sync::Lazy;

use crate::error::{IrError, IrResult};
use crate::hashing::hash_value;
use crate::node::{write_node, Node, NodeBase, NodeContext, Value};
use crate::op_kind::{symbols, OpKind};
use crate::shape::{Dimension, Shape};

static SQUEEZE: Lazy<OpKind> = Lazy::new(|| OpKind::new(symbols::SQUEEZE));
static UNSQUEEZE: Lazy<OpKind> = Lazy::new(|| OpKind::new(symbols::UNSQUEEZE));

/// Drops one static size-1 axis, or every one of them when `dim` is `None`.
///
/// Squeezing an axis whose extent is not a static 1 leaves the shape unchanged.
#[derive(Debug, Clone)]
pub struct Squeeze {
    base: NodeBase,
    dim: Option<usize>,
}

impl Squeeze {
    pub fn class_op_kind() -> OpKind {
        SQUEEZE.clone()
    }

    pub fn new(ctx: &dyn NodeContext, input: Value, dim: Option<usize>) -> IrResult<Self> {
        let input_shape = ctx.shape_of(input)?;
        let unit = Dimension::Static(1);
        let dims = match dim {
            Some(dim) if dim >= input_shape.rank() => {
                return Err(IrError::invalid_argument(
                    &SQUEEZE,
                    format!("dim {dim} out of range for rank {}", input_shape.rank()),
                ))
            }
            Some(dim) => input_shape
                .dims()
                .iter()
                .enumerate()
                .filter(|(axis, extent)| *axis != dim || **extent != unit)
                .map(|(_, extent)| extent.clone())
                .collect::<Vec<_>>(),
            None => input_shape
                .dims()
                .iter()
                .filter(|extent| **extent != unit)
                .cloned()
                .collect::<Vec<_>>(),
        };
        let base = NodeBase::new(
            ctx,
            Self::class_op_kind(),
            vec![input],
            vec![Shape::new(dims)],
            hash_value(&dim),
        )?;
        Ok(Self { base, dim })
    }

    pub fn dim(&self) -> Option<usize> {
        self.dim
    }
}

impl Node for Squeeze {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn equivalent(&self, other: &dyn Node) -> bool {
        other
            .downcast_ref::<Self>()
            .is_some_and(|other| other.dim == self.dim)
    }

    fn fmt_params(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.dim {
            Some(dim) => write!(f, ", dim={dim}"),
            None => Ok(()),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Display for Squeeze {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_node(self, f)
    }
}

/// Inserts a size-1 axis at `dim`, which may equal the input rank.
#[derive(Debug, Clone)]
pub struct Unsqueeze {
    base: NodeBase,
    dim: usize,
}

impl Unsqueeze {
    pub fn class_op_kind() -> OpKind {
        UNSQUEEZE.clone()
    }

    pub fn new(ctx: &dyn NodeContext, input: Value, dim: usize) -> IrResult<Self> {
        let input_shape = ctx.shape_of(input)?;
        if dim > input_shape.rank() {
            return Err(IrError::invalid_argument(
                &UNSQUEEZE,
                format!("dim {dim} out of range for rank {}", input_shape.rank()),
            ));
        }
        let mut dims = input_shape.dims().to_vec();
        dims.insert(dim, Dimension::Static(1));
        let base = NodeBase::new(
            ctx,
            Self::class_op_kind(),
            vec![input],
            vec![Shape::new(dims)],
            hash_value(&dim),
        )?;
        Ok(Self { base, dim })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }
}

impl Node for Unsqueeze {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn equivalent(&self, other: &dyn Node) -> bool {
        other
            .downcast_ref::<Self>()
            .is_some_and(|other| other.dim == self.dim)
    }

    fn fmt_params(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ", dim={}", self.dim)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Display for Unsqueeze {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_node(self, f)
    }
}
