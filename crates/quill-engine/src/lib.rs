//! # quill-engine
//!
//! Turns predicate trees and query modifiers into a single parameterized
//! SQL statement.
//!
//! ## Modules
//!
//! - [`config`] - Configuration options
//! - [`compiler`] - Predicate compiler (WHERE-clause lowering)
//! - [`dialect`] - Statement assembly per SQL dialect
//! - [`builder`] - Query builder and the assembled statement
//! - [`context`] - Entry point owning the shared metadata cache

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod builder;
pub mod compiler;
pub mod config;
pub mod context;
pub mod dialect;

pub use builder::{QueryBuilder, SqlStatement};
pub use compiler::{Fragment, PredicateCompiler};
pub use config::Config;
pub use context::QueryContext;
pub use dialect::{Dialect, LimitDialect, SqlDialect, StatementParts, TopDialect};
