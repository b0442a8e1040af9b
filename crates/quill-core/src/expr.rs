//! Predicate expression tree.
//!
//! This is the contract between an external tree producer (a derive macro, a
//! fluent API, a deserialized request) and the compiler. The tree is
//! normalized: columns are already physical names, literals are plain
//! [`Value`]s, and negation is an explicit [`UnaryOp::Not`] node.
//!
//! The tree can represent more than the compiler lowers: arithmetic, unary
//! minus, and arbitrary function calls are valid nodes, and the compiler
//! rejects them with a translation error.
//!
//! With serde the tree has an externally tagged JSON form:
//!
//! ```json
//! { "Binary": {
//!     "left":  { "Column": { "name": "name" } },
//!     "op":    "Eq",
//!     "right": { "Literal": { "String": "text" } } } }
//! ```

use quill_common::types::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference to a physical column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnRef {
    /// Physical column name.
    pub name: String,
    /// Table alias to qualify the column with, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualifier: Option<String>,
}

impl ColumnRef {
    /// An unqualified column.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            qualifier: None,
        }
    }

    /// A column qualified with a table alias (`alias.name`).
    #[must_use]
    pub fn qualified(qualifier: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            qualifier: Some(qualifier.into()),
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(q) if !q.is_empty() => write!(f, "{q}.{}", self.name),
            _ => f.write_str(&self.name),
        }
    }
}

/// A node of the predicate tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// A column reference.
    Column(ColumnRef),

    /// A literal value.
    Literal(Value),

    /// A literal collection, the right-hand side of `In`.
    List(Vec<Expr>),

    /// A binary operation.
    Binary {
        /// Left operand.
        left: Box<Expr>,
        /// Operator.
        op: BinaryOp,
        /// Right operand.
        right: Box<Expr>,
    },

    /// A unary operation.
    Unary {
        /// Operator.
        op: UnaryOp,
        /// Operand.
        operand: Box<Expr>,
    },

    /// String pattern match (contains / starts with / ends with).
    Match {
        /// The string being tested.
        operand: Box<Expr>,
        /// Kind of match.
        kind: MatchKind,
        /// The pattern text.
        pattern: Box<Expr>,
        /// Whether the source asked for a case-insensitive comparison.
        /// Accepted but lowered the same way; case folding belongs to the
        /// database collation.
        #[serde(default)]
        ignore_case: bool,
    },

    /// A function or method call with no direct SQL counterpart.
    FunctionCall {
        /// Function name.
        name: String,
        /// Arguments.
        args: Vec<Expr>,
    },
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    /// Logical AND.
    And,
    /// Logical OR.
    Or,
    /// Equal.
    Eq,
    /// Not equal.
    Ne,
    /// Less than.
    Lt,
    /// Less than or equal.
    Le,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Ge,
    /// Set membership.
    In,
    /// Addition.
    Add,
    /// Subtraction.
    Sub,
    /// Multiplication.
    Mul,
    /// Division.
    Div,
    /// Modulo.
    Mod,
    /// String concatenation.
    Concat,
}

impl BinaryOp {
    /// `true` for AND / OR.
    #[must_use]
    pub const fn is_logical(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }

    /// `true` for the six comparison operators.
    #[must_use]
    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }

    /// The logical complement of a comparison (`=` and `<>`, `<` and `>=`,
    /// `<=` and `>`).
    #[must_use]
    pub const fn complement(self) -> Option<BinaryOp> {
        match self {
            BinaryOp::Eq => Some(BinaryOp::Ne),
            BinaryOp::Ne => Some(BinaryOp::Eq),
            BinaryOp::Lt => Some(BinaryOp::Ge),
            BinaryOp::Ge => Some(BinaryOp::Lt),
            BinaryOp::Le => Some(BinaryOp::Gt),
            BinaryOp::Gt => Some(BinaryOp::Le),
            _ => None,
        }
    }

    /// SQL spelling of the operator.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            BinaryOp::And => "AND",
            BinaryOp::Or => "OR",
            BinaryOp::Eq => "=",
            BinaryOp::Ne => "<>",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::In => "IN",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Concat => "||",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    /// Logical NOT.
    Not,
    /// Arithmetic negation.
    Neg,
    /// Property null-check: true when the operand has a value.
    HasValue,
    /// Null-check written as a predicate function: true when the operand is
    /// null.
    IsNull,
    /// True when the operand is null or the empty string.
    IsNullOrEmpty,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UnaryOp::Not => "NOT",
            UnaryOp::Neg => "-",
            UnaryOp::HasValue => "HAS VALUE",
            UnaryOp::IsNull => "IS NULL",
            UnaryOp::IsNullOrEmpty => "IS NULL OR EMPTY",
        };
        f.write_str(s)
    }
}

/// String pattern kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchKind {
    /// Pattern anywhere in the string.
    Contains,
    /// String begins with the pattern.
    StartsWith,
    /// String ends with the pattern.
    EndsWith,
}

impl MatchKind {
    /// Whether a `%` wildcard goes before the pattern.
    #[must_use]
    pub const fn leading_wildcard(self) -> bool {
        matches!(self, MatchKind::Contains | MatchKind::EndsWith)
    }

    /// Whether a `%` wildcard goes after the pattern.
    #[must_use]
    pub const fn trailing_wildcard(self) -> bool {
        matches!(self, MatchKind::Contains | MatchKind::StartsWith)
    }
}

impl Expr {
    /// An unqualified column reference.
    #[must_use]
    pub fn column(name: impl Into<String>) -> Self {
        Expr::Column(ColumnRef::new(name))
    }

    /// A qualified column reference (`alias.name`).
    #[must_use]
    pub fn qualified(qualifier: impl Into<String>, name: impl Into<String>) -> Self {
        Expr::Column(ColumnRef::qualified(qualifier, name))
    }

    /// A literal value.
    #[must_use]
    pub fn literal(value: impl Into<Value>) -> Self {
        Expr::Literal(value.into())
    }

    /// The `NULL` literal.
    #[must_use]
    pub fn null() -> Self {
        Expr::Literal(Value::Null)
    }

    /// A literal collection.
    #[must_use]
    pub fn list<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Self {
        Expr::List(
            values
                .into_iter()
                .map(|v| Expr::Literal(v.into()))
                .collect(),
        )
    }

    /// A function call.
    #[must_use]
    pub fn function(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::FunctionCall {
            name: name.into(),
            args,
        }
    }

    /// Builds `self <op> rhs`.
    #[must_use]
    pub fn binary(self, op: BinaryOp, rhs: impl Into<Expr>) -> Self {
        Expr::Binary {
            left: Box::new(self),
            op,
            right: Box::new(rhs.into()),
        }
    }

    /// `self AND rhs`.
    #[must_use]
    pub fn and(self, rhs: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::And, rhs)
    }

    /// `self OR rhs`.
    #[must_use]
    pub fn or(self, rhs: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Or, rhs)
    }

    /// `NOT self`.
    #[must_use]
    pub fn not(self) -> Self {
        Expr::Unary {
            op: UnaryOp::Not,
            operand: Box::new(self),
        }
    }

    /// `self = rhs`.
    #[must_use]
    pub fn eq(self, rhs: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Eq, rhs)
    }

    /// `self <> rhs`.
    #[must_use]
    pub fn ne(self, rhs: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Ne, rhs)
    }

    /// `self < rhs`.
    #[must_use]
    pub fn lt(self, rhs: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Lt, rhs)
    }

    /// `self <= rhs`.
    #[must_use]
    pub fn le(self, rhs: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Le, rhs)
    }

    /// `self > rhs`.
    #[must_use]
    pub fn gt(self, rhs: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Gt, rhs)
    }

    /// `self >= rhs`.
    #[must_use]
    pub fn ge(self, rhs: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Ge, rhs)
    }

    /// `self IN (values...)`.
    #[must_use]
    pub fn is_in<V: Into<Value>>(self, values: impl IntoIterator<Item = V>) -> Self {
        self.binary(BinaryOp::In, Expr::list(values))
    }

    /// Property null-check: true when `self` has a value.
    #[must_use]
    pub fn has_value(self) -> Self {
        Expr::Unary {
            op: UnaryOp::HasValue,
            operand: Box::new(self),
        }
    }

    /// Function-style null-check: true when `self` is null.
    #[must_use]
    pub fn is_null(self) -> Self {
        Expr::Unary {
            op: UnaryOp::IsNull,
            operand: Box::new(self),
        }
    }

    /// True when `self` is null or the empty string.
    #[must_use]
    pub fn is_null_or_empty(self) -> Self {
        Expr::Unary {
            op: UnaryOp::IsNullOrEmpty,
            operand: Box::new(self),
        }
    }

    fn pattern(self, kind: MatchKind, pattern: impl Into<Expr>) -> Self {
        Expr::Match {
            operand: Box::new(self),
            kind,
            pattern: Box::new(pattern.into()),
            ignore_case: false,
        }
    }

    /// `self` contains `pattern`.
    #[must_use]
    pub fn contains(self, pattern: impl Into<Expr>) -> Self {
        self.pattern(MatchKind::Contains, pattern)
    }

    /// `self` starts with `pattern`.
    #[must_use]
    pub fn starts_with(self, pattern: impl Into<Expr>) -> Self {
        self.pattern(MatchKind::StartsWith, pattern)
    }

    /// `self` ends with `pattern`.
    #[must_use]
    pub fn ends_with(self, pattern: impl Into<Expr>) -> Self {
        self.pattern(MatchKind::EndsWith, pattern)
    }

    /// Marks a pattern match as case-insensitive. No effect on other nodes.
    #[must_use]
    pub fn ignore_case(self) -> Self {
        match self {
            Expr::Match {
                operand,
                kind,
                pattern,
                ..
            } => Expr::Match {
                operand,
                kind,
                pattern,
                ignore_case: true,
            },
            other => other,
        }
    }

    /// `true` for an AND / OR node.
    #[must_use]
    pub fn is_compound(&self) -> bool {
        matches!(self, Expr::Binary { op, .. } if op.is_logical())
    }

    /// Number of non-null literal leaves in the tree.
    #[must_use]
    pub fn bound_literal_count(&self) -> usize {
        match self {
            Expr::Column(_) => 0,
            Expr::Literal(v) => usize::from(!v.is_null()),
            Expr::List(items) => items.iter().map(Expr::bound_literal_count).sum(),
            Expr::Binary { left, right, .. } => {
                left.bound_literal_count() + right.bound_literal_count()
            }
            Expr::Unary { operand, .. } => operand.bound_literal_count(),
            Expr::Match {
                operand, pattern, ..
            } => operand.bound_literal_count() + pattern.bound_literal_count(),
            Expr::FunctionCall { args, .. } => args.iter().map(Expr::bound_literal_count).sum(),
        }
    }
}

impl From<ColumnRef> for Expr {
    fn from(column: ColumnRef) -> Self {
        Expr::Column(column)
    }
}

impl From<Value> for Expr {
    fn from(value: Value) -> Self {
        Expr::Literal(value)
    }
}

impl From<&str> for Expr {
    fn from(s: &str) -> Self {
        Expr::Literal(s.into())
    }
}

impl From<String> for Expr {
    fn from(s: String) -> Self {
        Expr::Literal(s.into())
    }
}

impl From<i32> for Expr {
    fn from(i: i32) -> Self {
        Expr::Literal(i.into())
    }
}

impl From<i64> for Expr {
    fn from(i: i64) -> Self {
        Expr::Literal(i.into())
    }
}

impl From<f64> for Expr {
    fn from(x: f64) -> Self {
        Expr::Literal(x.into())
    }
}

impl From<bool> for Expr {
    fn from(b: bool) -> Self {
        Expr::Literal(b.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_shape() {
        let expr = Expr::column("name").eq("text").and(Expr::column("created").has_value());

        let Expr::Binary { left, op, right } = &expr else {
            panic!("Expected binary expression");
        };
        assert_eq!(*op, BinaryOp::And);
        assert!(matches!(left.as_ref(), Expr::Binary { op: BinaryOp::Eq, .. }));
        assert!(matches!(
            right.as_ref(),
            Expr::Unary {
                op: UnaryOp::HasValue,
                ..
            }
        ));
        assert!(expr.is_compound());
    }

    #[test]
    fn test_complement_is_involution() {
        for op in [
            BinaryOp::Eq,
            BinaryOp::Ne,
            BinaryOp::Lt,
            BinaryOp::Le,
            BinaryOp::Gt,
            BinaryOp::Ge,
        ] {
            let flipped = op.complement().unwrap();
            assert_ne!(flipped, op);
            assert_eq!(flipped.complement(), Some(op));
        }
        assert_eq!(BinaryOp::And.complement(), None);
    }

    #[test]
    fn test_wildcards() {
        assert!(MatchKind::Contains.leading_wildcard() && MatchKind::Contains.trailing_wildcard());
        assert!(!MatchKind::StartsWith.leading_wildcard());
        assert!(MatchKind::StartsWith.trailing_wildcard());
        assert!(MatchKind::EndsWith.leading_wildcard());
        assert!(!MatchKind::EndsWith.trailing_wildcard());
    }

    #[test]
    fn test_ignore_case_only_touches_matches() {
        let m = Expr::column("name").starts_with("te").ignore_case();
        assert!(matches!(m, Expr::Match { ignore_case: true, .. }));

        let c = Expr::column("name").ignore_case();
        assert_eq!(c, Expr::column("name"));
    }

    #[test]
    fn test_bound_literal_count() {
        let expr = Expr::column("name")
            .is_in(["a", "b", "a"])
            .or(Expr::column("id").eq(Expr::null()))
            .and(Expr::column("name").contains(""));
        assert_eq!(expr.bound_literal_count(), 4);
    }

    #[test]
    fn test_column_display() {
        assert_eq!(ColumnRef::new("name").to_string(), "name");
        assert_eq!(ColumnRef::qualified("d", "name").to_string(), "d.name");
    }

    #[test]
    fn test_json_contract() {
        let json = r#"{
            "Binary": {
                "left": { "Column": { "name": "name" } },
                "op": "Eq",
                "right": { "Literal": { "String": "text" } }
            }
        }"#;
        let parsed: Expr = serde_json::from_str(json).unwrap();
        assert_eq!(parsed, Expr::column("name").eq("text"));

        let m: Expr = serde_json::from_str(
            r#"{ "Match": {
                "operand": { "Column": { "name": "name", "qualifier": "d" } },
                "kind": "Contains",
                "pattern": { "Literal": { "String": "te" } }
            } }"#,
        )
        .unwrap();
        assert_eq!(m, Expr::qualified("d", "name").contains("te"));
    }
}
