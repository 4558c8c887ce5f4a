//! Interned operation-family identifiers.
//!
//! An [`OpKind`] names a family such as `aten::permute`. Kinds are interned in a process-wide
//! [`OpKindRegistry`] so every node of a family shares the same backing string; equality and
//! hashing still go by name, which keeps kinds comparable across registries and after
//! deserialization.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, PoisonError, RwLock};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::hashing::{hash_value, HashValue};

/// Canonical names of the families shipped with this crate.
pub mod symbols {
    pub const DEVICE_DATA: &str = "ltc::device_data";
    pub const PERMUTE: &str = "aten::permute";
    pub const TRANSPOSE: &str = "aten::transpose";
    pub const EXPAND: &str = "aten::expand";
    pub const NARROW: &str = "aten::narrow";
    pub const SQUEEZE: &str = "aten::squeeze";
    pub const UNSQUEEZE: &str = "aten::unsqueeze";
    pub const VIEW: &str = "aten::view";
    pub const SPLIT: &str = "aten::split";
}

/// Identifier of an operation family.
#[derive(Clone)]
pub struct OpKind {
    name: Arc<str>,
}

impl OpKind {
    /// Returns the interned kind for `name`, registering it on first use.
    pub fn new(name: &str) -> Self {
        registry().intern(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Part before the first `::`, or `""` for unqualified names.
    pub fn namespace(&self) -> &str {
        self.name
            .split_once("::")
            .map(|(namespace, _)| namespace)
            .unwrap_or("")
    }

    /// Part after the first `::`, or the whole name for unqualified names.
    pub fn op_name(&self) -> &str {
        self.name
            .split_once("::")
            .map(|(_, op)| op)
            .unwrap_or(&self.name)
    }

    pub fn hash_value(&self) -> HashValue {
        hash_value(self.name())
    }
}

impl PartialEq for OpKind {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.name, &other.name) || self.name == other.name
    }
}

impl Eq for OpKind {}

impl Hash for OpKind {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name().hash(state);
    }
}

impl fmt::Debug for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("OpKind").field(&self.name()).finish()
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for OpKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for OpKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        Ok(OpKind::new(&name))
    }
}

/// Interning table mapping operation names to their canonical [`OpKind`].
#[derive(Default)]
pub struct OpKindRegistry {
    kinds: RwLock<HashMap<Arc<str>, OpKind>>,
}

static REGISTRY: Lazy<OpKindRegistry> = Lazy::new(OpKindRegistry::default);

/// Process-wide registry used by [`OpKind::new`].
pub fn registry() -> &'static OpKindRegistry {
    &REGISTRY
}

impl OpKindRegistry {
    /// Looks up `name`, inserting it when absent. Concurrent callers observe a single kind.
    pub fn intern(&self, name: &str) -> OpKind {
        if let Some(kind) = self.lookup(name) {
            return kind;
        }
        // The table is append-only, so a poisoned lock still holds consistent data.
        let mut kinds = self.kinds.write().unwrap_or_else(PoisonError::into_inner);
        kinds
            .entry(Arc::<str>::from(name))
            .or_insert_with_key(|key| OpKind {
                name: Arc::clone(key),
            })
            .clone()
    }

    pub fn lookup(&self, name: &str) -> Option<OpKind> {
        let kinds = self.kinds.read().unwrap_or_else(PoisonError::into_inner);
        kinds.get(name).cloned()
    }

    /// Registered kinds sorted by name.
    pub fn kinds(&self) -> Vec<OpKind> {
        let kinds = self.kinds.read().unwrap_or_else(PoisonError::into_inner);
        let mut out = kinds.values().cloned().collect::<Vec<_>>();
        out.sort_by(|a, b| a.name().cmp(b.name()));
        out
    }

    pub fn len(&self) -> usize {
        self.kinds
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
