pub mod schema;
pub mod source;
pub mod warehouse;

pub use source::{ExtractStrategy, SourceDb};
pub use warehouse::Warehouse;
