//! Builtin type handlers

mod collection;
mod object;
mod scalar;

pub use collection::{KeyListMappingHandler, MappingHandler, SequenceHandler, SetHandler};
pub use object::{ClassInstanceHandler, CustomEncodedHandler, QuantityHandler};
pub use scalar::{
    BytesHandler, ComplexHandler, DateTimeHandler, ExactHandler, FloatHandler, PathHandler,
    PrimitiveHandler, RecursionHandler, UnrecognizedHandler,
};

use super::TypeHandler;
use crate::decoder::Decoder;
use crate::error::SnapcheckError;
use crate::record::Record;
use std::sync::Arc;

/// Builtin handlers in classification order: specific object capabilities
/// first, the catch-all last
pub fn builtin_handlers() -> Vec<Arc<dyn TypeHandler>> {
    vec![
        Arc::new(QuantityHandler),
        Arc::new(CustomEncodedHandler),
        Arc::new(ClassInstanceHandler),
        Arc::new(PrimitiveHandler),
        Arc::new(ExactHandler),
        Arc::new(FloatHandler),
        Arc::new(ComplexHandler),
        Arc::new(BytesHandler),
        Arc::new(SequenceHandler),
        Arc::new(SetHandler),
        Arc::new(MappingHandler),
        Arc::new(KeyListMappingHandler),
        Arc::new(PathHandler),
        Arc::new(DateTimeHandler),
        Arc::new(UnrecognizedHandler),
    ]
}

/// Error for a record whose payload does not fit its tag
fn unexpected_payload(record: &Record, decoder: &Decoder<'_>) -> SnapcheckError {
    decoder.error(format!(
        "unexpected payload for '{}' record: {}",
        record.tag,
        record.payload_json()
    ))
}
