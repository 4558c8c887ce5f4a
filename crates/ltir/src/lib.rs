//! Lazy tensor IR.
//!
//! Deferred tensor operations are recorded as immutable nodes in a [`Graph`] arena instead of
//! running eagerly. Every node carries its [`OpKind`], ordered operand edges, output shapes
//! inferred at construction, and a structural hash that lets equal subgraphs be reused and
//! compiled graphs be cached by [`GraphSignature`].
mod env;
pub mod error;
pub mod graph;
pub mod hashing;
pub mod node;
pub mod op_kind;
pub mod ops;
pub mod shape;

pub use error::{IrError, IrResult};
pub use graph::{ComputationCache, Graph, GraphConfig, GraphSignature};
pub use hashing::HashValue;
pub use node::{Node, NodeBase, NodeContext, NodeId, Value};
pub use op_kind::OpKind;
pub use shape::{DimSymbol, Dimension, Shape};
