//! Reconstruction hooks of registered classes

use crate::value::{Attributes, SnapshotDecodable, SnapshotObject, StateError, Value};
use std::fmt;
use std::sync::Arc;

type DecodeFn = fn(&Value) -> Result<Arc<dyn SnapshotObject>, StateError>;
type FromAttributesFn = fn(&Attributes) -> Result<Arc<dyn SnapshotObject>, StateError>;

/// How to rebuild instances of one class
#[derive(Clone)]
pub struct ClassEntry {
    qualified_name: &'static str,
    decode: DecodeFn,
    from_attributes: FromAttributesFn,
}

impl ClassEntry {
    /// Entry backed by a type's [`SnapshotDecodable`] implementation
    pub fn of<T: SnapshotDecodable>() -> Self {
        Self {
            qualified_name: T::QUALIFIED_NAME,
            decode: decode_with::<T>,
            from_attributes: from_attributes_with::<T>,
        }
    }

    pub fn qualified_name(&self) -> &str {
        self.qualified_name
    }

    /// Rebuild from a custom-encoded payload
    pub fn decode(&self, payload: &Value) -> Result<Arc<dyn SnapshotObject>, StateError> {
        (self.decode)(payload)
    }

    /// Rebuild by assigning attributes
    pub fn from_attributes(
        &self,
        attributes: &Attributes,
    ) -> Result<Arc<dyn SnapshotObject>, StateError> {
        (self.from_attributes)(attributes)
    }
}

fn decode_with<T: SnapshotDecodable>(payload: &Value) -> Result<Arc<dyn SnapshotObject>, StateError> {
    T::snapshot_decode(payload).map(|object| Arc::new(object) as Arc<dyn SnapshotObject>)
}

fn from_attributes_with<T: SnapshotDecodable>(
    attributes: &Attributes,
) -> Result<Arc<dyn SnapshotObject>, StateError> {
    T::from_attributes(attributes).map(|object| Arc::new(object) as Arc<dyn SnapshotObject>)
}

impl fmt::Debug for ClassEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassEntry")
            .field("qualified_name", &self.qualified_name)
            .finish_non_exhaustive()
    }
}
