//! `ltc::device_data`: leaf node standing for backend-resident tensor data.

use std::any::Any;
use std::fmt;

use once_cell::sync::Lazy;

use crate::hashing::{hash_value, HashValue};
use crate::node::{write_node, Node, NodeBase};
use crate::op_kind::{symbols, OpKind};
use crate::shape::Shape;

static KIND: Lazy<OpKind> = Lazy::new(|| OpKind::new(symbols::DEVICE_DATA));

/// Placeholder for data owned by the executor, identified by an opaque handle id.
#[derive(Debug, Clone)]
pub struct DeviceData {
    base: NodeBase,
    handle: u64,
}

impl DeviceData {
    pub fn class_op_kind() -> OpKind {
        KIND.clone()
    }

    pub fn new(handle: u64, shape: Shape) -> Self {
        let params_hash = hash_value(&(handle, &shape));
        Self {
            base: NodeBase::leaf(Self::class_op_kind(), shape, params_hash),
            handle,
        }
    }

    pub fn handle(&self) -> u64 {
        self.handle
    }
}

impl Node for DeviceData {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn equivalent(&self, other: &dyn Node) -> bool {
        other
            .downcast_ref::<Self>()
            .is_some_and(|other| other.handle == self.handle && other.shape() == self.shape())
    }

    fn fmt_params(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ", device={}", self.handle)
    }

    // Only the shape binds a compiled graph; the handle changes with every input.
    fn signature_params(&self) -> HashValue {
        hash_value(self.shape())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Display for DeviceData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_node(self, f)
    }
}
