//! `aten::view`: reinterprets the operand with a new shape of equal element count.

use std::any::Any;
use std::fmt;

use once_cell::sync::Lazy;

use crate::error::{IrError, IrResult};
use crate::hashing::hash_value;
use crate::node::{write_list, write_node, Node, NodeBase, NodeContext, Value};
use crate::op_kind::{symbols, OpKind};
use crate::ops::expand::ExpandSizes;
use crate::shape::Shape;

static KIND: Lazy<OpKind> = Lazy::new(|| OpKind::new(symbols::VIEW));

#[derive(Debug, Clone)]
pub struct View {
    base: NodeBase,
    size: ExpandSizes,
}

impl View {
    pub fn class_op_kind() -> OpKind {
        KIND.clone()
    }

    /// `size` may contain one `-1`, inferred from the input element count.
    pub fn new(
        ctx: &dyn NodeContext,
        input: Value,
        size: impl Into<ExpandSizes>,
    ) -> IrResult<Self> {
        let size = size.into();
        let shape = view_shape(ctx.shape_of(input)?, &size)?;
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

/// Resolves the requested view shape.
///
/// With a fully static input the element counts must match. Inputs carrying dynamic dims cannot
/// infer a `-1` entry; the requested count only has to be a multiple of their static dims, the
/// exact match is left to the executor.
pub fn view_shape(input: &Shape, size: &[i64]) -> IrResult<Shape> {
    let mut infer_axis = None;
    let mut known = 1usize;
    for (axis, &extent) in size.iter().enumerate() {
        match extent {
            -1 if infer_axis.is_some() => {
                return Err(IrError::invalid_argument(
                    &KIND,
                    "only one dimension can be inferred",
                ))
            }
            -1 => infer_axis = Some(axis),
            e if e < 0 => {
                return Err(IrError::invalid_argument(
                    &KIND,
                    format!("invalid extent {e} at axis {axis}"),
                ))
            }
            e => {
                known = known.checked_mul(e as usize).ok_or_else(|| {
                    IrError::invalid_argument(&KIND, "requested element count overflows")
                })?
            }
        }
    }

    let mut dims = size
        .iter()
        .map(|&extent| extent.max(0) as usize)
        .collect::<Vec<_>>();
    match (input.element_count(), infer_axis) {
        (Some(total), Some(axis)) => {
            if known == 0 || total % known != 0 {
                return Err(IrError::invalid_argument(
                    &KIND,
                    format!(
                        "cannot infer axis {axis}: {total} elements into [{known}]-sized chunks"
                    ),
                ));
            }
            dims[axis] = total / known;
        }
        (Some(total), None) if total != known => {
            return Err(IrError::invalid_argument(
                &KIND,
                format!("shape {input} has {total} elements, view requests {known}"),
            ))
        }
        (Some(_), None) => {}
        (None, Some(axis)) => {
            return Err(IrError::invalid_argument(
                &KIND,
                format!("cannot infer axis {axis} from dynamic shape {input}"),
            ))
        }
        (None, None) => {
            // Dynamic dims may take any extent, but the static ones still divide the total.
            let fixed = input
                .dims()
                .iter()
                .filter_map(|dim| dim.as_static())
                .product::<usize>();
            let fits = if fixed == 0 {
                known == 0
            } else {
                known % fixed == 0
            };
            if !fits {
                return Err(IrError::invalid_argument(
                    &KIND,
                    format!("shape {input} cannot hold {known} elements"),
                ));
            }
        }
    }
    Ok(Shape::from_static(&dims))
}

impl Node for View {
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

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_node(self, f)
    }
}
