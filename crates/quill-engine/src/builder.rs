//! Query builder.
//!
//! A [`QueryBuilder`] collects the modifiers of one query (filters, joins,
//! ordering, projection, distinct, limit) and assembles them into a single
//! statement under the configured dialect.

use crate::compiler::{Fragment, PredicateCompiler};
use crate::config::Config;
use crate::dialect::StatementParts;
use quill_common::types::EntityKey;
use quill_common::utils::error::{Error, Result};
use quill_core::expr::{ColumnRef, Expr};
use quill_core::metadata::{ColumnMap, Entity, MetadataCache, TableMetadata};
use quill_core::params::{ParameterBinder, Parameters};
use serde::Serialize;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// SQL text plus its bound parameters, ready for an execution layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SqlStatement {
    /// Statement text with placeholders.
    pub sql: String,
    /// Parameter values keyed by name, in binding order.
    pub parameters: Parameters,
}

impl fmt::Display for SqlStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// Select-list override.
#[derive(Debug, Clone)]
enum Projection {
    /// Every column of the select entity.
    All,
    /// Logical fields, resolved against the select entity at assembly time.
    Fields(Vec<String>),
    /// Physical columns, used as given.
    Columns(ColumnMap),
}

/// Builds one SELECT statement over entity `T`.
///
/// A builder is single-owner and compiles exactly one query. Modifier
/// methods return `&mut Self` so they chain; the ones that can fail return
/// `Result<&mut Self>`.
///
/// ```
/// use quill_core::{Entity, Expr, TableMetadata};
/// use quill_engine::QueryContext;
///
/// struct DataType;
///
/// impl Entity for DataType {
///     fn metadata() -> TableMetadata {
///         TableMetadata::new("datatype")
///             .with_alias("d")
///             .with_column("Id", "data_type_id")
///             .with_column("Name", "name")
///             .with_column("Created", "created")
///     }
/// }
///
/// let ctx = QueryContext::default();
/// let mut query = ctx.query::<DataType>();
/// query
///     .filter(&Expr::column("name").eq("text").and(Expr::column("created").has_value()))
///     .unwrap();
///
/// let statement = query.build().unwrap();
/// assert_eq!(
///     statement.sql,
///     "SELECT d.data_type_id , d.name , d.created FROM datatype d \
///      WHERE name = @ld__1 AND created IS NOT NULL"
/// );
/// assert_eq!(statement.parameters.len(), 1);
/// ```
pub struct QueryBuilder<T: Entity> {
    cache: Arc<MetadataCache>,
    config: Config,
    binder: ParameterBinder,
    filters: Vec<Fragment>,
    joins: String,
    order_by: String,
    select: Option<EntityKey>,
    projection: Projection,
    distinct: bool,
    limit: Option<u64>,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> QueryBuilder<T> {
    /// Creates a builder, registering `T` with the cache if needed.
    ///
    /// The configuration is used as given; builders are only handed out by
    /// [`QueryContext`](crate::QueryContext), which validates it up front.
    #[must_use]
    pub(crate) fn new(cache: Arc<MetadataCache>, config: Config) -> Self {
        cache.resolve::<T>();
        let binder = ParameterBinder::with_naming(
            config.parameter_prefix.clone(),
            config.placeholder_sigil,
        );
        Self {
            cache,
            config,
            binder,
            filters: Vec::new(),
            joins: String::new(),
            order_by: String::new(),
            select: None,
            projection: Projection::All,
            distinct: false,
            limit: None,
            _entity: PhantomData,
        }
    }

    /// Adds a predicate. Several predicates are combined with AND.
    ///
    /// # Errors
    ///
    /// Returns a translation error if the predicate has a shape with no SQL
    /// lowering. The builder is left unchanged in that case.
    pub fn filter(&mut self, predicate: &Expr) -> Result<&mut Self> {
        let mut scratch = self.binder.clone();
        let fragment = PredicateCompiler::new(&mut scratch).compile(predicate)?;
        tracing::trace!(fragment = %fragment.sql, "compiled predicate");
        self.binder = scratch;
        self.filters.push(fragment);
        Ok(self)
    }

    /// Resolves a logical field of `T` to its physical column.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownField`] if `T` has no such field.
    pub fn column(&self, field: &str) -> Result<ColumnRef> {
        let key = EntityKey::of::<T>();
        let table = self.cache.get(key);
        table
            .column(field)
            .map(ColumnRef::new)
            .ok_or_else(|| unknown_field(key, field))
    }

    /// Resolves a logical field of `U` to its alias-qualified column, for
    /// join conditions and cross-table predicates.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownField`] if `U` has no such field.
    pub fn column_of<U: Entity>(&self, field: &str) -> Result<ColumnRef> {
        let table = self.cache.resolve::<U>();
        table
            .column(field)
            .map(|column| ColumnRef::qualified(table.identifier(), column))
            .ok_or_else(|| unknown_field(EntityKey::of::<U>(), field))
    }

    /// Adds an ascending sort key. The newest key becomes the primary one.
    pub fn order_by(&mut self, column: ColumnRef) -> &mut Self {
        self.push_order(&column.to_string());
        self
    }

    /// Adds a descending sort key. The newest key becomes the primary one.
    pub fn order_by_descending(&mut self, column: ColumnRef) -> &mut Self {
        self.push_order(&format!("{column} DESC"));
        self
    }

    fn push_order(&mut self, key: &str) {
        if self.order_by.is_empty() {
            self.order_by = key.to_string();
        } else {
            self.order_by = format!("{key}, {}", self.order_by);
        }
    }

    /// Joins the table of `U` on `left = right`.
    pub fn join<U: Entity>(&mut self, left: ColumnRef, right: ColumnRef) -> &mut Self {
        let table = self.cache.resolve::<U>();
        self.config
            .dialect
            .strategy()
            .write_join(&table, &left, &right, &mut self.joins);
        self
    }

    /// Selects the columns of `U` (typically a joined entity) instead of
    /// those of `T`.
    pub fn select_as<U: Entity>(&mut self) -> &mut Self {
        self.cache.resolve::<U>();
        self.select = Some(EntityKey::of::<U>());
        self
    }

    /// Restricts the selected columns to the named logical fields of the
    /// select entity, in the given order.
    ///
    /// The fields are mapped to columns when the statement is assembled, so
    /// a later [`select_as`](Self::select_as) applies to them too.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownField`] for a field the current select entity
    /// lacks.
    pub fn select_fields(&mut self, fields: &[&str]) -> Result<&mut Self> {
        let key = self.select_key();
        let fields: Vec<String> = fields.iter().map(|f| (*f).to_string()).collect();
        resolve_fields(key, &self.cache.get(key), &fields)?;
        self.projection = Projection::Fields(fields);
        Ok(self)
    }

    /// Replaces the selected columns with an explicit physical mapping.
    pub fn select_columns(&mut self, columns: ColumnMap) -> &mut Self {
        self.projection = Projection::Columns(columns);
        self
    }

    /// Emits `SELECT DISTINCT`.
    pub fn distinct(&mut self) -> &mut Self {
        self.distinct = true;
        self
    }

    /// Limits the result to `n` rows; `0` removes the limit.
    pub fn take(&mut self, n: u64) -> &mut Self {
        self.limit = (n > 0).then_some(n);
        self
    }

    /// Limits the result to one row.
    pub fn first(&mut self) -> &mut Self {
        self.take(1)
    }

    /// Parameters bound so far.
    #[must_use]
    pub fn parameters(&self) -> &Parameters {
        self.binder.parameters()
    }

    /// Assembles the statement text. Calling it again without changes yields
    /// the same text.
    ///
    /// # Errors
    ///
    /// With `strict_metadata` set, returns [`Error::MissingMetadata`] when
    /// the primary or select entity has no columns. Returns
    /// [`Error::UnknownField`] when a field chosen with
    /// [`select_fields`](Self::select_fields) is not part of the final select
    /// entity.
    pub fn sql(&self) -> Result<String> {
        let primary_key = EntityKey::of::<T>();
        let primary = self.cache.get(primary_key);
        let select = match self.select {
            Some(key) => self.cache.get(key),
            None => Arc::clone(&primary),
        };
        let resolved;
        let columns = match &self.projection {
            Projection::All => select.columns(),
            Projection::Columns(columns) => columns,
            Projection::Fields(fields) => {
                resolved = resolve_fields(self.select_key(), &select, fields)?;
                &resolved
            }
        };

        if primary.is_empty() {
            self.missing_metadata(primary_key)?;
        }
        if columns.is_empty() {
            self.missing_metadata(self.select_key())?;
        }

        let where_clause = self.where_clause();
        let parts = StatementParts {
            distinct: self.distinct,
            limit: self.limit,
            select_alias: select.identifier(),
            columns,
            from: &primary,
            joins: &self.joins,
            where_clause: where_clause.as_deref(),
            order_by: (!self.order_by.is_empty()).then_some(self.order_by.as_str()),
        };

        let dialect = self.config.dialect.strategy();
        let mut sql = String::with_capacity(128);
        dialect.write_select(&parts, &mut sql);
        tracing::debug!(
            dialect = dialect.name(),
            entity = primary_key.short_name(),
            parameters = self.binder.parameters().len(),
            "assembled statement"
        );
        Ok(sql)
    }

    /// Assembles the statement together with its parameters.
    ///
    /// # Errors
    ///
    /// See [`sql`](Self::sql).
    pub fn build(&self) -> Result<SqlStatement> {
        Ok(SqlStatement {
            sql: self.sql()?,
            parameters: self.binder.parameters().clone(),
        })
    }

    fn select_key(&self) -> EntityKey {
        self.select.unwrap_or_else(EntityKey::of::<T>)
    }

    fn where_clause(&self) -> Option<String> {
        match self.filters.as_slice() {
            [] => None,
            [only] => Some(only.sql.clone()),
            many => Some(
                many.iter()
                    .map(Fragment::grouped)
                    .collect::<Vec<_>>()
                    .join(" AND "),
            ),
        }
    }

    fn missing_metadata(&self, key: EntityKey) -> Result<()> {
        if self.config.strict_metadata {
            return Err(Error::MissingMetadata {
                entity: key.short_name().to_string(),
            });
        }
        tracing::warn!(
            entity = key.short_name(),
            "assembling statement without table metadata"
        );
        Ok(())
    }
}

fn resolve_fields(key: EntityKey, table: &TableMetadata, fields: &[String]) -> Result<ColumnMap> {
    let mut columns = ColumnMap::with_capacity(fields.len());
    for field in fields {
        let column = table.column(field).ok_or_else(|| unknown_field(key, field))?;
        columns.insert(field.clone(), column.to_string());
    }
    Ok(columns)
}

fn unknown_field(key: EntityKey, field: &str) -> Error {
    Error::UnknownField {
        entity: key.short_name().to_string(),
        field: field.to_string(),
    }
}
