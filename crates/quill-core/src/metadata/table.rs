//! Physical mapping of one entity type.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Ordered mapping from logical field name to physical column name.
///
/// Insertion order is the SELECT column order.
pub type ColumnMap = IndexMap<String, String>;

/// A queryable entity type.
///
/// Implementations describe how the type maps onto a table. How the mapping
/// is discovered (derive macro, configuration, naming convention) is up to
/// the implementor; the cache stores whatever the first call returns.
///
/// ```
/// use quill_core::{Entity, TableMetadata};
///
/// struct DataType;
///
/// impl Entity for DataType {
///     fn metadata() -> TableMetadata {
///         TableMetadata::new("datatype")
///             .with_alias("d")
///             .with_column("Id", "data_type_id")
///             .with_column("Name", "name")
///     }
/// }
/// ```
pub trait Entity: 'static {
    /// Describes the table this entity is stored in.
    fn metadata() -> TableMetadata;
}

/// Schema, table name, alias, and column mapping of one entity type.
///
/// Values are built once and then shared read-only through the cache.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMetadata {
    identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    schema: Option<String>,
    name: String,
    columns: ColumnMap,
}

impl TableMetadata {
    /// Creates metadata for the named table with no alias and no columns.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            identifier: String::new(),
            schema: None,
            name: name.into(),
            columns: ColumnMap::new(),
        }
    }

    /// Returns the empty placeholder handed out for unknown entities.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Sets the row alias used to qualify columns.
    #[must_use]
    pub fn with_alias(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = identifier.into();
        self
    }

    /// Sets the schema (namespace) prefix.
    #[must_use]
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Appends a logical field to physical column mapping.
    ///
    /// Re-adding a field keeps its original position and replaces the column.
    #[must_use]
    pub fn with_column(mut self, field: impl Into<String>, column: impl Into<String>) -> Self {
        self.columns.insert(field.into(), column.into());
        self
    }

    /// Appends several mappings in order.
    #[must_use]
    pub fn with_columns<F, C>(mut self, columns: impl IntoIterator<Item = (F, C)>) -> Self
    where
        F: Into<String>,
        C: Into<String>,
    {
        self.columns
            .extend(columns.into_iter().map(|(f, c)| (f.into(), c.into())));
        self
    }

    /// Row alias.
    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Schema prefix, if any.
    #[must_use]
    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    /// Physical table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Column mapping in SELECT order.
    #[must_use]
    pub fn columns(&self) -> &ColumnMap {
        &self.columns
    }

    /// Physical column for a logical field.
    #[must_use]
    pub fn column(&self, field: &str) -> Option<&str> {
        self.columns.get(field).map(String::as_str)
    }

    /// `schema.name` when a schema is set, otherwise `name`.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        match &self.schema {
            Some(schema) if !schema.is_empty() => format!("{schema}.{}", self.name),
            _ => self.name.clone(),
        }
    }

    /// `true` when there are no columns, i.e. no usable metadata.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
