//! # quill-common
//!
//! Foundation layer for Quill: values, entity identity, and error types.
//!
//! This crate provides the fundamental building blocks used by all other
//! Quill crates. It has no internal dependencies and should be kept minimal.
//!
//! ## Modules
//!
//! - [`types`] - Core type definitions (Value, EntityKey)
//! - [`utils`] - Utility functions and helpers (hashing, errors)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod types;
pub mod utils;

// Re-export commonly used types at crate root
pub use types::{EntityKey, Value};
pub use utils::error::{Error, Result, TranslationError};
