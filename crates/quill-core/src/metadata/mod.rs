//! Entity-to-table metadata.
//!
//! Reflection of an entity type into its physical mapping happens once; the
//! result is kept in a [`MetadataCache`] that every query builder consults.
//!
//! - [`TableMetadata`] - Schema, table name, row alias, and ordered columns
//! - [`Entity`] - The metadata source implemented by queryable types
//! - [`MetadataCache`] - Write-once-per-key concurrent store

mod cache;
mod table;

pub use cache::MetadataCache;
pub use table::{ColumnMap, Entity, TableMetadata};
