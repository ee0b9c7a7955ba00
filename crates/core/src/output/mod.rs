//! Wire types shared by the introspector, the extractor and the CLI

pub mod schema;

pub use schema::*;
