//! Identity-bearing value nodes

use super::Value;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::fmt;
use std::sync::Arc;

/// A value node with reference identity.
///
/// Clones share the node. Placing a clone inside its own contents builds a
/// cycle, which the encoder breaks with a recursion sentinel.
#[derive(Clone)]
pub struct SharedValue {
    inner: Arc<RwLock<Value>>,
}

impl SharedValue {
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(value.into())),
        }
    }

    /// Read the contents. Recursive so a traversal can re-enter the same
    /// node on a cyclic path without deadlocking against a queued writer.
    pub fn read(&self) -> RwLockReadGuard<'_, Value> {
        self.inner.read_recursive()
    }

    /// Replace or mutate the contents
    pub fn write(&self) -> RwLockWriteGuard<'_, Value> {
        self.inner.write()
    }

    /// Stable identity of the node, shared by all clones
    pub fn identity(&self) -> usize {
        Arc::as_ptr(&self.inner) as *const () as usize
    }

    pub fn ptr_eq(&self, other: &SharedValue) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for SharedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SharedValue(0x{:x})", self.identity())
    }
}
