mod pointer;
mod types;

pub use pointer::{SchemaNamespace, SchemaPointer};
pub use types::*;
