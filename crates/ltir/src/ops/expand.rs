//! `aten::expand`: broadcasts size-1 axes to larger extents without copying.

use std::any::Any;
use std::fmt;

use once_cell::sync::Lazy;
use smallvec::SmallVec;

use crate::error::{IrError, IrResult};
use crate::hashing::hash_value;
use crate::node::{write_list, write_node, Node, NodeBase, NodeContext, Value};
use crate::op_kind::{symbols, OpKind};
use crate::shape::{Dimension, Shape};

static KIND: Lazy<OpKind> = Lazy::new(|| OpKind::new(symbols::EXPAND));

/// Requested extents; `-1` keeps the input extent of an aligned axis.
pub type ExpandSizes = SmallVec<[i64; 4]>;

#[derive(Debug, Clone)]
pub struct Expand {
    base: NodeBase,
    size: ExpandSizes,
}

impl Expand {
    pub fn class_op_kind() -> OpKind {
        KIND.clone()
    }

    pub fn new(
        ctx: &dyn NodeContext,
        input: Value,
        size: impl Into<ExpandSizes>,
    ) -> IrResult<Self> {
        let size = size.into();
        let shape = expand_shape(ctx.shape_of(input)?, &size)?;
        let base = NodeBase::new(
            ctx,
            Self::class_op_kind(),
            vec![input],
            vec![shape],
            hash_value(size.as_slice()),
        )?;
        Ok(Self { base, size })
    }

    pub fn size(&self) -> &[i64] {
        &self.size
    }
}

/// Input axes align with the trailing entries of `size`; extra leading entries add new axes.
///
/// A dynamic input axis keeps its symbol for `-1` and otherwise takes the requested static
/// extent, which the executor must confirm at run time.
pub fn expand_shape(input: &Shape, size: &[i64]) -> IrResult<Shape> {
    let rank = input.rank();
    if size.len() < rank {
        return Err(IrError::invalid_argument(
            &KIND,
            format!(
                "target rank {} is smaller than input rank {rank}",
                size.len()
            ),
        ));
    }
    let leading = size.len() - rank;
    let mut dims = Vec::with_capacity(size.len());
    for (axis, &target) in size.iter().enumerate() {
        if axis < leading {
            if target < 0 {
                return Err(IrError::invalid_argument(
                    &KIND,
                    format!("new leading axis {axis} needs an explicit extent, got {target}"),
                ));
            }
            dims.push(Dimension::Static(target as usize));
            continue;
        }
        let current = &input.dims()[axis - leading];
        let dim = match (current, target) {
            (_, -1) => current.clone(),
            (_, t) if t < -1 => {
                return Err(IrError::invalid_argument(
                    &KIND,
                    format!("invalid extent {t} at axis {axis}"),
                ))
            }
            (Dimension::Static(1), t) => Dimension::Static(t as usize),
            (Dimension::Static(n), t) if *n == t as usize => Dimension::Static(*n),
            (Dimension::Static(n), t) => {
                return Err(IrError::invalid_argument(
                    &KIND,
                    format!("cannot expand axis {axis} of extent {n} to {t}"),
                ))
            }
            (Dimension::Dynamic(_), t) => Dimension::Static(t as usize),
        };
        dims.push(dim);
    }
    Ok(Shape::new(dims))
}

impl Node for Expand {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn equivalent(&self, other: &dyn Node) -> bool {
        other
            .downcast_ref::<Self>()
            .is_some_and(|other| other.size == self.size)
    }

    fn fmt_params(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_list(f, "size", &self.size)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Display for Expand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_node(self, f)
    }
}
