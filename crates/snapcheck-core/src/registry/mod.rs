//! Type registry
//!
//! The registry owns the ordered list of type handlers used to classify
//! values, the tag table used to resolve records, and the class table used
//! to rebuild user objects. It is built once, then shared read-only.

mod class_table;
mod handlers;

pub use class_table::ClassEntry;
pub use handlers::builtin_handlers;

use crate::compare::Walk;
use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::SnapcheckResult;
use crate::record::{Record, TypeTag};
use crate::value::{SnapshotDecodable, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// Encode, decode and compare logic for one type tag
pub trait TypeHandler: Send + Sync {
    /// Tag written on records this handler produces
    fn tag(&self) -> TypeTag;

    /// Whether this handler claims the value. Must be total and free of side
    /// effects; shared nodes and placeholders never reach it.
    fn accepts(&self, value: &Value) -> bool;

    fn encode(&self, value: &Value, encoder: &mut Encoder<'_>) -> Record;

    fn decode(&self, record: &Record, decoder: &mut Decoder<'_>) -> SnapcheckResult<Value>;

    /// Compare two records carrying this handler's tag
    fn compare(&self, expected: &Record, actual: &Record, walk: &mut Walk<'_>);
}

/// Registry of type handlers and decodable classes
pub struct TypeRegistry {
    /// Classification order: extensions first, then builtins
    handlers: Vec<Arc<dyn TypeHandler>>,
    by_tag: HashMap<TypeTag, Arc<dyn TypeHandler>>,
    /// Claims values no other handler accepts
    fallback: Arc<dyn TypeHandler>,
    classes: HashMap<String, ClassEntry>,
}

impl TypeRegistry {
    /// Registry with the builtin handlers and no classes
    pub fn new() -> Self {
        TypeRegistryBuilder::new().build()
    }

    pub fn builder() -> TypeRegistryBuilder {
        TypeRegistryBuilder::new()
    }

    /// Handler that claims a value; the final builtin accepts everything
    pub fn handler_for(&self, value: &Value) -> &Arc<dyn TypeHandler> {
        self.handlers
            .iter()
            .find(|handler| handler.accepts(value))
            .unwrap_or(&self.fallback)
    }

    /// Tag a value would be encoded with
    pub fn classify(&self, value: &Value) -> TypeTag {
        self.classify_in(value, &mut HashSet::new())
    }

    fn classify_in(&self, value: &Value, seen: &mut HashSet<usize>) -> TypeTag {
        match value {
            Value::Shared(node) => {
                if !seen.insert(node.identity()) {
                    return TypeTag::RecursiveReference;
                }
                let inner = node.read();
                self.classify_in(&inner, seen)
            }
            Value::Placeholder(placeholder) => placeholder.tag().clone(),
            other => self.handler_for(other).tag(),
        }
    }

    /// Handler for a record tag
    pub fn resolve(&self, tag: &TypeTag) -> Option<&Arc<dyn TypeHandler>> {
        self.by_tag.get(tag)
    }

    /// Reconstruction hooks for a qualified class name
    pub fn class(&self, qualified_name: &str) -> Option<&ClassEntry> {
        let entry = self.classes.get(qualified_name);
        if entry.is_none() {
            debug!("Class '{}' is not registered", qualified_name);
        }
        entry
    }

    pub fn has_class(&self, qualified_name: &str) -> bool {
        self.classes.contains_key(qualified_name)
    }

    /// Registered tags in classification order
    pub fn tags(&self) -> Vec<TypeTag> {
        self.handlers.iter().map(|handler| handler.tag()).collect()
    }

    /// Registered class names, sorted
    pub fn class_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.classes.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for the type registry
pub struct TypeRegistryBuilder {
    extensions: Vec<Arc<dyn TypeHandler>>,
    classes: Vec<ClassEntry>,
}

impl TypeRegistryBuilder {
    pub fn new() -> Self {
        Self {
            extensions: Vec::new(),
            classes: Vec::new(),
        }
    }

    /// Add an extension handler. Extensions are consulted before the builtin
    /// handlers, in registration order; one that reuses a builtin tag
    /// replaces that builtin for decoding and comparison.
    pub fn with_handler(mut self, handler: Arc<dyn TypeHandler>) -> Self {
        self.extensions.push(handler);
        self
    }

    /// Make a class decodable
    pub fn register_class<T: SnapshotDecodable>(mut self) -> Self {
        self.classes.push(ClassEntry::of::<T>());
        self
    }

    pub fn with_class(mut self, entry: ClassEntry) -> Self {
        self.classes.push(entry);
        self
    }

    pub fn build(self) -> TypeRegistry {
        let mut ordered: Vec<Arc<dyn TypeHandler>> = self.extensions;
        let extension_count = ordered.len();
        ordered.extend(builtin_handlers());

        let mut by_tag = HashMap::new();
        // builtins first so extensions override them
        for handler in ordered[extension_count..]
            .iter()
            .chain(&ordered[..extension_count])
        {
            by_tag.insert(handler.tag(), Arc::clone(handler));
        }
        by_tag.insert(
            TypeTag::RecursiveReference,
            Arc::new(handlers::RecursionHandler) as Arc<dyn TypeHandler>,
        );

        let classes = self
            .classes
            .into_iter()
            .map(|entry| (entry.qualified_name().to_string(), entry))
            .collect();

        debug!(
            "Built type registry with {} handler(s), {} extension(s)",
            ordered.len(),
            extension_count
        );

        TypeRegistry {
            handlers: ordered,
            by_tag,
            fallback: Arc::new(handlers::UnrecognizedHandler),
            classes,
        }
    }
}

impl Default for TypeRegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests;
