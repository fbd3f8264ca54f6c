//! Snapcheck core: encoding, decoding and structural comparison of snapshots
//!
//! Values produced by tests are turned into tagged [`Record`] trees by the
//! [`Encoder`], persisted by a record store, turned back into values by the
//! [`Decoder`] and compared against fresh values by the [`Comparator`].
//! Dispatch by type goes through an explicitly built [`TypeRegistry`].

pub mod compare;
pub mod config;
pub mod decoder;
pub mod encoder;
pub mod engine;
pub mod error;
pub mod location;
pub mod metadata;
pub mod record;
pub mod registry;
pub mod value;

pub use compare::{
    CompareOptions, Comparator, MatchResult, MismatchEntry, MismatchKind, MismatchReport,
    RecursionPolicy,
};
pub use config::{ConfigValidator, FileFormat, SnapcheckConfig, ToleranceConfig};
pub use decoder::Decoder;
pub use encoder::{EncodeMode, Encoder};
pub use engine::SnapshotEngine;
pub use error::{ErrorCode, SnapcheckError, SnapcheckResult, SnapshotWarning};
pub use location::{Location, Segment};
pub use metadata::{MetadataDigest, SnapshotMetadata};
pub use record::{Payload, Record, TypeTag};
pub use registry::{ClassEntry, TypeHandler, TypeRegistry, TypeRegistryBuilder};
pub use value::{
    AttributeState, Attributes, Capability, Complex, DateTimeValue, DecodedPlaceholder, DictState,
    MetadataEncodable, Quantity, SharedValue, SlotState, SnapshotDecodable, SnapshotEncodable,
    SnapshotObject, StateError, UnitQuantity, Value,
};

/// Crate version written into snapshot files
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
