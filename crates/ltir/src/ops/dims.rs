//! Axis helpers shared by the view operations.

use smallvec::SmallVec;

use crate::error::{IrError, IrResult};
use crate::op_kind::OpKind;

/// Compact list of axis indices.
pub type Dims = SmallVec<[usize; 4]>;

/// Collects arguments into a [`Dims`].
#[macro_export]
macro_rules! dims {
    ($($axis:expr),* $(,)?) => {{
        let mut tmp = $crate::ops::dims::Dims::new();
        $(tmp.push($axis as usize);)*
        tmp
    }};
}

/// Maps a possibly negative axis into `[0, rank)`; `-1` is the last axis.
pub fn canonical_dim(op: &OpKind, dim: i64, rank: usize) -> IrResult<usize> {
    let rank_i = rank as i64;
    let wrapped = if dim < 0 { dim + rank_i } else { dim };
    if wrapped < 0 || wrapped >= rank_i {
        return Err(IrError::invalid_argument(
            op,
            format!("dimension {dim} out of range for rank {rank}"),
        ));
    }
    Ok(wrapped as usize)
}

pub fn canonical_dims(op: &OpKind, dims: &[i64], rank: usize) -> IrResult<Dims> {
    dims.iter()
        .map(|&dim| canonical_dim(op, dim, rank))
        .collect()
}

/// Checks that `dims` lists every axis of `[0, rank)` exactly once.
pub fn check_permutation(op: &OpKind, dims: &[usize], rank: usize) -> IrResult<()> {
    if dims.len() != rank {
        return Err(IrError::invalid_argument(
            op,
            format!(
                "permutation length {} must equal input rank {rank}",
                dims.len()
            ),
        ));
    }
    let mut seen: SmallVec<[bool; 8]> = SmallVec::from_elem(false, rank);
    for &axis in dims {
        if axis >= rank {
            return Err(IrError::invalid_argument(
                op,
                format!("axis {axis} out of range for rank {rank}"),
            ));
        }
        if std::mem::replace(&mut seen[axis], true) {
            return Err(IrError::invalid_argument(
                op,
                format!("axis {axis} appears more than once"),
            ));
        }
    }
    Ok(())
}
