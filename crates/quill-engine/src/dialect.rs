//! Statement assembly per SQL dialect.
//!
//! Dialects differ only in how the SELECT list and paging are written and in
//! join formatting. Predicate lowering is dialect-independent and lives in
//! [`compiler`](crate::compiler).
//!
//! | Dialect | Paging | Column separator |
//! | ------- | ------ | ---------------- |
//! | [`Dialect::Standard`] | trailing `LIMIT(n)` | `" , "` |
//! | [`Dialect::TransactSql`] | `TOP(n)` right after `SELECT [DISTINCT]` | `", "` |

use quill_core::expr::ColumnRef;
use quill_core::metadata::{ColumnMap, TableMetadata};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Everything a dialect needs to write one SELECT statement.
#[derive(Debug, Clone, Copy)]
pub struct StatementParts<'a> {
    /// Emit `DISTINCT`.
    pub distinct: bool,
    /// Result limit; `None` means unlimited.
    pub limit: Option<u64>,
    /// Alias qualifying the selected columns.
    pub select_alias: &'a str,
    /// Columns to select, in order.
    pub columns: &'a ColumnMap,
    /// Primary table.
    pub from: &'a TableMetadata,
    /// Accumulated join fragments, each starting with a space.
    pub joins: &'a str,
    /// WHERE fragment, without the keyword.
    pub where_clause: Option<&'a str>,
    /// ORDER BY fragment, without the keyword.
    pub order_by: Option<&'a str>,
}

/// Statement assembly strategy.
pub trait SqlDialect: Send + Sync {
    /// Name for diagnostics.
    fn name(&self) -> &'static str;

    /// Writes the full SELECT statement.
    fn write_select(&self, parts: &StatementParts<'_>, out: &mut String);

    /// Appends one join fragment: ` JOIN table alias ON left = right`.
    fn write_join(
        &self,
        table: &TableMetadata,
        left: &ColumnRef,
        right: &ColumnRef,
        out: &mut String,
    ) {
        let _ = write!(out, " JOIN {}", table.qualified_name());
        if !table.identifier().is_empty() {
            let _ = write!(out, " {}", table.identifier());
        }
        let _ = write!(out, " ON {left} = {right}");
    }
}

/// Dialect with trailing `LIMIT(n)` paging.
#[derive(Debug, Clone, Copy, Default)]
pub struct LimitDialect;

impl SqlDialect for LimitDialect {
    fn name(&self) -> &'static str {
        "standard"
    }

    fn write_select(&self, parts: &StatementParts<'_>, out: &mut String) {
        out.push_str("SELECT ");
        if parts.distinct {
            out.push_str("DISTINCT ");
        }
        write_columns(parts, " , ", out);
        write_body(parts, out);
        if let Some(n) = parts.limit {
            let _ = write!(out, " LIMIT({n})");
        }
    }
}

/// Dialect with leading `TOP(n)` paging.
#[derive(Debug, Clone, Copy, Default)]
pub struct TopDialect;

impl SqlDialect for TopDialect {
    fn name(&self) -> &'static str {
        "transact-sql"
    }

    fn write_select(&self, parts: &StatementParts<'_>, out: &mut String) {
        out.push_str("SELECT ");
        if parts.distinct {
            out.push_str("DISTINCT ");
        }
        if let Some(n) = parts.limit {
            let _ = write!(out, "TOP({n}) ");
        }
        write_columns(parts, ", ", out);
        write_body(parts, out);
    }
}

/// Selectable dialects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dialect {
    /// `LIMIT(n)` paging.
    #[default]
    Standard,
    /// `TOP(n)` paging.
    TransactSql,
}

impl Dialect {
    /// The assembly strategy for this dialect.
    #[must_use]
    pub fn strategy(self) -> &'static dyn SqlDialect {
        match self {
            Dialect::Standard => &LimitDialect,
            Dialect::TransactSql => &TopDialect,
        }
    }
}

fn write_columns(parts: &StatementParts<'_>, separator: &str, out: &mut String) {
    for (i, column) in parts.columns.values().enumerate() {
        if i > 0 {
            out.push_str(separator);
        }
        if parts.select_alias.is_empty() {
            out.push_str(column);
        } else {
            let _ = write!(out, "{}.{column}", parts.select_alias);
        }
    }
    if !parts.columns.is_empty() {
        out.push(' ');
    }
}

/// FROM, joins, WHERE and ORDER BY; identical across dialects.
fn write_body(parts: &StatementParts<'_>, out: &mut String) {
    let _ = write!(out, "FROM {}", parts.from.qualified_name());
    if !parts.from.identifier().is_empty() {
        let _ = write!(out, " {}", parts.from.identifier());
    }
    out.push_str(parts.joins);
    if let Some(clause) = parts.where_clause {
        let _ = write!(out, " WHERE {clause}");
    }
    if let Some(order) = parts.order_by {
        let _ = write!(out, " ORDER BY {order}");
    }
}
