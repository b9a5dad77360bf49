//! Re-export public algorithms.

pub mod append;

pub use append::{Appender, ArraySchema, ArraySignature, SchemaMismatch};
