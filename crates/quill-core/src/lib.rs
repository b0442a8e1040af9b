//! # quill-core
//!
//! Core layer for Quill: entity metadata, predicate trees, and parameter
//! binding.
//!
//! This crate holds the data the compiler works on. It depends only on
//! `quill-common`.
//!
//! ## Modules
//!
//! - [`metadata`] - Table metadata and the concurrent metadata cache
//! - [`expr`] - The predicate expression tree handed over by tree producers
//! - [`params`] - Synthetic parameter naming and the ordered parameter set

#![warn(missing_docs)]

pub mod expr;
pub mod metadata;
pub mod params;

// Re-export commonly used types
pub use expr::{BinaryOp, ColumnRef, Expr, MatchKind, UnaryOp};
pub use metadata::{ColumnMap, Entity, MetadataCache, TableMetadata};
pub use params::{ParameterBinder, Parameters};
