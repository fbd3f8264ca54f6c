//! Test-call metadata and its digest
//!
//! A test function may record several snapshots per call, and may be called
//! with different arguments (parametrized tests). The digest of the encoded
//! arguments plus the call names selects which stored entry a call reads.

use crate::encoder::Encoder;
use crate::record::{canonical_json, Record};
use crate::registry::TypeRegistry;
use crate::value::{Attributes, Value};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fmt;

/// Inputs identifying one test call
#[derive(Debug, Clone, Default)]
pub struct SnapshotMetadata {
    /// Test function identity, e.g. `tests::parsing::test_numbers`
    pub test_id: String,
    /// Call arguments in declaration order
    pub arguments: Attributes,
    /// Argument names excluded from the digest
    pub ignored: BTreeSet<String>,
    pub user_provided_name: String,
    pub test_runner_provided_name: String,
    /// Re-record this call's snapshots on the next run
    pub update_on_next_run: bool,
}

impl SnapshotMetadata {
    pub fn new(test_id: impl Into<String>) -> Self {
        Self {
            test_id: test_id.into(),
            ..Default::default()
        }
    }

    pub fn with_argument(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.arguments.insert(name, value);
        self
    }

    /// Exclude an argument from the digest
    pub fn ignore(mut self, name: impl Into<String>) -> Self {
        self.ignored.insert(name.into());
        self
    }

    pub fn with_user_name(mut self, name: impl Into<String>) -> Self {
        self.user_provided_name = name.into();
        self
    }

    pub fn with_runner_name(mut self, name: impl Into<String>) -> Self {
        self.test_runner_provided_name = name.into();
        self
    }

    pub fn with_update_on_next_run(mut self, update: bool) -> Self {
        self.update_on_next_run = update;
        self
    }

    /// Encode the non-ignored arguments in metadata mode
    pub fn encode_arguments(&self, registry: &TypeRegistry) -> Record {
        let arguments = Value::Map(
            self.arguments
                .iter()
                .filter(|(name, _)| !self.ignored.contains(*name))
                .map(|(name, value)| (Value::Str(name.to_string()), value.clone()))
                .collect(),
        );
        Encoder::for_metadata(registry).encode(&arguments)
    }

    pub fn digest(&self, registry: &TypeRegistry) -> MetadataDigest {
        MetadataDigest::compute(
            &self.encode_arguments(registry),
            &self.user_provided_name,
            &self.test_runner_provided_name,
        )
    }
}

/// SHA-256 of the canonical metadata JSON, hex encoded
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetadataDigest(String);

impl MetadataDigest {
    /// Digest of encoded arguments and call names
    pub fn compute(arguments: &Record, user_provided_name: &str, runner_provided_name: &str) -> Self {
        let document = json!({
            "arguments": arguments.to_json(),
            "user_provided_name": user_provided_name,
            "test_runner_provided_name": runner_provided_name,
        });
        let mut hasher = Sha256::new();
        hasher.update(canonical_json(&document).as_bytes());
        Self(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First characters, for display
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for MetadataDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
