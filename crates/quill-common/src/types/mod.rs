//! Core type definitions for Quill.
//!
//! - Literal values bound into statements ([`Value`])
//! - Identity of a queryable entity type ([`EntityKey`])

mod entity;
mod value;

pub use entity::EntityKey;
pub use value::Value;
