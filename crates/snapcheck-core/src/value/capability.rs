//! Capability interfaces for user-defined snapshot types
//!
//! A user type implements [`SnapshotObject`] and overrides the `as_*`
//! accessors for the capabilities it supports. Classification walks the
//! accessors in a fixed order, see [`Capability::of`].

use super::Value;
use std::fmt;
use thiserror::Error;

/// Ordered attribute storage of a class instance
#[derive(Debug, Clone, Default)]
pub struct Attributes {
    entries: Vec<(String, Value)>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an attribute, replacing an existing one with the same name in place
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    /// Look up an attribute that must be present
    pub fn require(&self, name: &str) -> Result<&Value, StateError> {
        self.get(name)
            .ok_or_else(|| StateError::MissingAttribute(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attributes = Attributes::new();
        for (name, value) in iter {
            attributes.insert(name, value);
        }
        attributes
    }
}

impl IntoIterator for Attributes {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Why a class could not be rebuilt from stored state
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("the class does not support this kind of reconstruction")]
    Unsupported,

    #[error("missing attribute '{0}'")]
    MissingAttribute(String),

    #[error("invalid attribute '{name}': {message}")]
    InvalidAttribute { name: String, message: String },

    #[error("{0}")]
    Invalid(String),
}

impl StateError {
    pub fn invalid_attribute(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidAttribute {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Custom encoding hook. The returned value is encoded in place of the
/// object's state and tagged `class-custom-encoded`.
pub trait SnapshotEncodable {
    fn snapshot_encode(&self) -> Value;
}

/// Encoding hook used only when the object appears among test metadata
pub trait MetadataEncodable {
    fn metadata_encode(&self) -> Value;
}

/// Dynamic attribute dictionary
pub trait AttributeState {
    fn attributes(&self) -> Attributes;
}

/// Fixed list of named slots; unset slots return `None` and are skipped
pub trait SlotState {
    fn slot_names(&self) -> &'static [&'static str];
    fn slot(&self, name: &str) -> Option<Value>;
}

/// Explicit conversion into a dictionary of fields
pub trait DictState {
    fn to_dict(&self) -> Attributes;
}

/// Domain objects carrying a magnitude and a unit
pub trait UnitQuantity {
    fn magnitude(&self) -> Value;
    fn unit(&self) -> String;
}

/// A user-defined object that can appear in a snapshot.
///
/// Every accessor must be total and free of side effects.
pub trait SnapshotObject: fmt::Debug + Send + Sync + 'static {
    /// Fully qualified name used to find the class again at decode time
    fn qualified_name(&self) -> &str;

    fn as_quantity(&self) -> Option<&dyn UnitQuantity> {
        None
    }

    fn as_encodable(&self) -> Option<&dyn SnapshotEncodable> {
        None
    }

    fn as_metadata_encodable(&self) -> Option<&dyn MetadataEncodable> {
        None
    }

    fn as_attribute_state(&self) -> Option<&dyn AttributeState> {
        None
    }

    fn as_slot_state(&self) -> Option<&dyn SlotState> {
        None
    }

    fn as_dict_state(&self) -> Option<&dyn DictState> {
        None
    }
}

/// Reconstruction hooks for a registered class
pub trait SnapshotDecodable: SnapshotObject + Sized {
    /// Must match [`SnapshotObject::qualified_name`] of encoded instances
    const QUALIFIED_NAME: &'static str;

    /// Inverse of [`SnapshotEncodable::snapshot_encode`]
    fn snapshot_decode(payload: &Value) -> Result<Self, StateError> {
        let _ = payload;
        Err(StateError::Unsupported)
    }

    /// Rebuild an instance by assigning stored attributes
    fn from_attributes(attributes: &Attributes) -> Result<Self, StateError> {
        let _ = attributes;
        Err(StateError::Unsupported)
    }
}

/// The capability an object is snapshotted through
pub enum Capability<'a> {
    Quantity(&'a dyn UnitQuantity),
    CustomEncoded(&'a dyn SnapshotEncodable),
    Attributes(&'a dyn AttributeState),
    Slots(&'a dyn SlotState),
    Dict(&'a dyn DictState),
    None,
}

impl<'a> Capability<'a> {
    /// First matching capability, most specific first
    pub fn of(object: &'a dyn SnapshotObject) -> Self {
        if let Some(quantity) = object.as_quantity() {
            return Capability::Quantity(quantity);
        }
        if let Some(encodable) = object.as_encodable() {
            return Capability::CustomEncoded(encodable);
        }
        if let Some(state) = object.as_attribute_state() {
            return Capability::Attributes(state);
        }
        if let Some(state) = object.as_slot_state() {
            return Capability::Slots(state);
        }
        if let Some(state) = object.as_dict_state() {
            return Capability::Dict(state);
        }
        Capability::None
    }

    /// Instance state for introspectable objects
    pub fn state(&self) -> Option<Attributes> {
        match self {
            Capability::Attributes(state) => Some(state.attributes()),
            Capability::Slots(state) => Some(
                state
                    .slot_names()
                    .iter()
                    .filter_map(|name| state.slot(name).map(|value| (*name, value)))
                    .collect(),
            ),
            Capability::Dict(state) => Some(state.to_dict()),
            _ => None,
        }
    }
}
