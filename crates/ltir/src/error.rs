use thiserror::Error;

use crate::node::{NodeId, Value};
use crate::op_kind::OpKind;

/// Failures raised while building nodes or deriving graph signatures.
#[derive(Debug, Error)]
pub enum IrError {
    /// Structural precondition of an operation does not hold.
    #[error("invalid argument to {op}: {reason}")]
    InvalidArgument { op: OpKind, reason: String },
    /// Operand edge points at a node that does not exist or at a result it does not have.
    #[error("unknown operand {node}.{index}: {detail}")]
    UnknownOperand {
        node: NodeId,
        index: usize,
        detail: String,
    },
    /// Arena already holds every node a 32-bit [`NodeId`] can address.
    #[error("graph cannot hold node {len}: node ids are 32-bit")]
    TooManyNodes { len: usize },
    #[error("graph signature encoding failed: {0}")]
    Encode(#[from] bincode::Error),
    #[error("graph description serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl IrError {
    pub fn invalid_argument(op: &OpKind, reason: impl Into<String>) -> Self {
        IrError::InvalidArgument {
            op: op.clone(),
            reason: reason.into(),
        }
    }

    pub fn unknown_operand(value: Value, detail: impl Into<String>) -> Self {
        IrError::UnknownOperand {
            node: value.node,
            index: value.index,
            detail: detail.into(),
        }
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, IrError::InvalidArgument { .. })
    }

    pub fn is_unknown_operand(&self) -> bool {
        matches!(self, IrError::UnknownOperand { .. })
    }
}

/// Convenience alias for fallible IR routines.
pub type IrResult<T> = Result<T, IrError>;
