//! Type markers carried by every record node

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Semantic category of an encoded node
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeTag {
    /// Null, booleans and strings
    Primitive,
    /// Integers
    NumericExact,
    /// Floats, compared with tolerance
    NumericFloat,
    NumericComplex,
    Bytes,
    /// Lists and tuples, told apart by the record kind
    Sequence,
    Set,
    /// Mapping whose keys are all strings
    Mapping,
    /// Mapping with arbitrary keys, stored as a list of pairs
    KeyListMapping,
    ClassInstance,
    ClassCustomEncoded,
    UnitQuantity,
    Path,
    DateTime,
    Unrecognized,
    /// Sentinel written where a cycle was cut
    RecursiveReference,
    /// Tag provided by a registered extension handler, or by a newer build
    Extension(String),
}

impl TypeTag {
    /// Every tag this build knows, in classification order
    pub const BUILTIN: [TypeTag; 16] = [
        TypeTag::UnitQuantity,
        TypeTag::ClassCustomEncoded,
        TypeTag::ClassInstance,
        TypeTag::Primitive,
        TypeTag::NumericExact,
        TypeTag::NumericFloat,
        TypeTag::NumericComplex,
        TypeTag::Bytes,
        TypeTag::Sequence,
        TypeTag::Set,
        TypeTag::Mapping,
        TypeTag::KeyListMapping,
        TypeTag::Path,
        TypeTag::DateTime,
        TypeTag::Unrecognized,
        TypeTag::RecursiveReference,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            TypeTag::Primitive => "primitive",
            TypeTag::NumericExact => "numeric-exact",
            TypeTag::NumericFloat => "numeric-float",
            TypeTag::NumericComplex => "numeric-complex",
            TypeTag::Bytes => "bytes",
            TypeTag::Sequence => "sequence",
            TypeTag::Set => "set",
            TypeTag::Mapping => "mapping",
            TypeTag::KeyListMapping => "mapping-key-list",
            TypeTag::ClassInstance => "class-instance",
            TypeTag::ClassCustomEncoded => "class-custom-encoded",
            TypeTag::UnitQuantity => "unit-quantity",
            TypeTag::Path => "path",
            TypeTag::DateTime => "datetime",
            TypeTag::Unrecognized => "unrecognized",
            TypeTag::RecursiveReference => "recursive-reference",
            TypeTag::Extension(tag) => tag,
        }
    }

    /// Parse a tag; strings that name no builtin become extension tags
    pub fn parse(tag: &str) -> Self {
        Self::BUILTIN
            .iter()
            .find(|builtin| builtin.as_str() == tag)
            .cloned()
            .unwrap_or_else(|| TypeTag::Extension(tag.to_string()))
    }

    pub fn is_extension(&self) -> bool {
        matches!(self, TypeTag::Extension(_))
    }

    /// Tags whose records name a class
    pub fn is_class(&self) -> bool {
        matches!(self, TypeTag::ClassInstance | TypeTag::ClassCustomEncoded)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TypeTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TypeTag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(TypeTag::parse(&tag))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_tags_parse_back() {
        for tag in TypeTag::BUILTIN.iter() {
            assert_eq!(&TypeTag::parse(tag.as_str()), tag);
        }
    }

    #[test]
    fn test_unknown_tag_is_extension() {
        let tag = TypeTag::parse("numpy-array");
        assert_eq!(tag, TypeTag::Extension("numpy-array".to_string()));
        assert!(tag.is_extension());
        assert_eq!(tag.to_string(), "numpy-array");
    }

    #[test]
    fn test_serde_uses_kebab_strings() {
        let json = serde_json::to_string(&TypeTag::KeyListMapping).unwrap();
        assert_eq!(json, "\"mapping-key-list\"");
        let tag: TypeTag = serde_json::from_str("\"unit-quantity\"").unwrap();
        assert_eq!(tag, TypeTag::UnitQuantity);
    }
}
