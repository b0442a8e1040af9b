//! # Quill
//!
//! Compiles predicate trees over typed entities into parameterized SQL.
//!
//! Start with [`QueryContext`]: it owns the metadata cache and hands out a
//! [`QueryBuilder`] per query. Entities describe their table by implementing
//! [`Entity`]; predicates are [`Expr`] trees, built in code or deserialized
//! from an external producer.
//!
//! ## Dialects
//!
//! | Dialect | Paging |
//! | ------- | ------ |
//! | [`Dialect::Standard`] | `... LIMIT(n)` |
//! | [`Dialect::TransactSql`] | `SELECT TOP(n) ...` |
//!
//! ## Quick Start
//!
//! ```rust
//! use quill::{Entity, Expr, QueryContext, TableMetadata};
//!
//! struct DataType;
//!
//! impl Entity for DataType {
//!     fn metadata() -> TableMetadata {
//!         TableMetadata::new("datatype")
//!             .with_alias("d")
//!             .with_column("Id", "data_type_id")
//!             .with_column("Name", "name")
//!     }
//! }
//!
//! let ctx = QueryContext::default();
//! let mut query = ctx.query::<DataType>();
//! query.filter(&Expr::column("name").contains("te"))?.take(5);
//!
//! let statement = query.build()?;
//! assert_eq!(
//!     statement.sql,
//!     "SELECT d.data_type_id , d.name FROM datatype d \
//!      WHERE name LIKE '%' || @ld__1 || '%' LIMIT(5)"
//! );
//! # Ok::<(), quill::Error>(())
//! ```

// Entry points and statement assembly
pub use quill_engine::{
    Config, Dialect, Fragment, PredicateCompiler, QueryBuilder, QueryContext, SqlDialect,
    SqlStatement,
};

// Predicate trees, metadata, and parameters
pub use quill_core::{
    BinaryOp, ColumnMap, ColumnRef, Entity, Expr, MatchKind, MetadataCache, ParameterBinder,
    Parameters, TableMetadata, UnaryOp,
};

// Values and errors
pub use quill_common::{EntityKey, Error, Result, TranslationError, Value};
