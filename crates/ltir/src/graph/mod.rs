//! Graph arena, node reuse, IR dumps, signatures and the computation cache.
//!
//! ```text
//! Graph::permute / Graph::add ...
//!        |
//!        | validate operands, reuse equal nodes
//!        v
//! Graph (append-only arena)
//!        |
//!        +-- to_text(roots)     diagnostics
//!        +-- describe(roots)    serializable description
//!        +-- signature(roots)   ComputationCache key
//! ```
pub mod arena;
pub mod cache;
pub mod signature;
pub mod text;

pub use arena::Graph;
pub use cache::ComputationCache;
pub use signature::{GraphDescription, GraphSignature, NodeDescription};

use crate::env;

/// Default number of compiled computations kept by a [`ComputationCache`].
pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

/// Knobs controlling graph capture and computation caching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphConfig {
    /// Return existing nodes for structurally equal requests.
    pub reuse_nodes: bool,
    pub cache_capacity: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            reuse_nodes: true,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl GraphConfig {
    /// Reads `LTIR_REUSE_NODES` and `LTIR_CACHE_CAPACITY`, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            reuse_nodes: env::reuse_nodes_enabled(),
            cache_capacity: env::cache_capacity().unwrap_or(DEFAULT_CACHE_CAPACITY),
        }
    }
}
