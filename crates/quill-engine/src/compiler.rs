//! Predicate compiler.
//!
//! Lowers an [`Expr`] tree into a WHERE-clause fragment. Every non-null
//! literal goes through the [`ParameterBinder`]; only its placeholder reaches
//! the SQL text.
//!
//! Negation is threaded through the recursion as a flag that applies to the
//! subtree it was introduced for, so it can never reach a sibling:
//!
//! | Positive | Negated |
//! | -------- | ------- |
//! | `a = b` | `a <> b` (full complement for `<`, `<=`, `>`, `>=`) |
//! | `a IS NOT NULL` (has value) | `a IS NULL` |
//! | `a IS NULL` (is-null function) | `a IS NOT NULL` |
//! | `a LIKE p` | `a NOT LIKE p` |
//! | `a IN (...)` | `a NOT IN (...)` |
//! | `(a IS NULL OR a = '')` | `(a IS NOT NULL AND a <> '')` |
//! | `x AND y` | `NOT (x AND y)` |

use quill_common::types::Value;
use quill_common::utils::error::{Result, TranslationError};
use quill_core::expr::{BinaryOp, ColumnRef, Expr, MatchKind, UnaryOp};
use quill_core::params::ParameterBinder;

/// A compiled WHERE fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    /// SQL text, without the `WHERE` keyword.
    pub sql: String,
    /// `true` when the top level is an unparenthesized AND / OR.
    pub compound: bool,
}

impl Fragment {
    fn simple(sql: String) -> Self {
        Self {
            sql,
            compound: false,
        }
    }

    /// The fragment text, parenthesized if it is compound.
    #[must_use]
    pub fn grouped(&self) -> String {
        if self.compound {
            format!("({})", self.sql)
        } else {
            self.sql.clone()
        }
    }
}

/// Walks a predicate tree and writes SQL.
///
/// The compiler borrows the statement's binder, so every predicate compiled
/// for one statement shares one parameter sequence.
///
/// ```
/// use quill_core::{Expr, ParameterBinder};
/// use quill_engine::PredicateCompiler;
///
/// let mut binder = ParameterBinder::new();
/// let where_clause = PredicateCompiler::new(&mut binder)
///     .compile(&Expr::column("name").eq("text").and(Expr::column("created").has_value()))
///     .unwrap();
/// assert_eq!(where_clause.sql, "name = @ld__1 AND created IS NOT NULL");
/// assert_eq!(binder.parameters().len(), 1);
/// ```
pub struct PredicateCompiler<'a> {
    binder: &'a mut ParameterBinder,
}

impl<'a> PredicateCompiler<'a> {
    /// Creates a compiler writing parameters into `binder`.
    pub fn new(binder: &'a mut ParameterBinder) -> Self {
        Self { binder }
    }

    /// Compiles a predicate.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Translation`](quill_common::Error::Translation) for
    /// any node that has no SQL lowering in its position. Parameters bound
    /// before the failure stay in the binder; callers that need atomicity
    /// compile into a scratch binder.
    pub fn compile(&mut self, expr: &Expr) -> Result<Fragment> {
        self.predicate(expr, false)
    }

    fn predicate(&mut self, expr: &Expr, negated: bool) -> Result<Fragment> {
        match expr {
            Expr::Binary { left, op, right } => match op {
                BinaryOp::And | BinaryOp::Or => {
                    let sql = self.logical(left, *op, right)?;
                    if negated {
                        Ok(Fragment::simple(format!("NOT ({sql})")))
                    } else {
                        Ok(Fragment { sql, compound: true })
                    }
                }
                op if op.is_comparison() => self.comparison(left, *op, right, negated),
                BinaryOp::In => self.membership(left, right, negated),
                other => Err(TranslationError::UnsupportedOperator {
                    op: other.to_string(),
                    context: "predicate position",
                }
                .into()),
            },
            Expr::Unary { op, operand } => match op {
                UnaryOp::Not => self.predicate(operand, !negated),
                // Property form: positive means the value is present.
                UnaryOp::HasValue => self.null_check(operand, negated),
                // Function form: positive means the value is absent.
                UnaryOp::IsNull => self.null_check(operand, !negated),
                UnaryOp::IsNullOrEmpty => self.null_or_empty(operand, negated),
                UnaryOp::Neg => Err(TranslationError::UnsupportedOperator {
                    op: op.to_string(),
                    context: "predicate position",
                }
                .into()),
            },
            Expr::Match {
                operand,
                kind,
                pattern,
                ..
            } => self.pattern_match(operand, *kind, pattern, negated),
            Expr::Column(column) => Ok(Fragment::simple(boolean_column(column, negated))),
            Expr::FunctionCall { name, args } => match args.as_slice() {
                [operand] if name.eq_ignore_ascii_case(NULL_OR_EMPTY_FUNCTION) => {
                    self.null_or_empty(operand, negated)
                }
                _ => Err(TranslationError::UnsupportedFunction(name.clone()).into()),
            },
            Expr::Literal(_) | Expr::List(_) => Err(TranslationError::UnexpectedOperand {
                context: "a predicate",
                found: describe(expr),
            }
            .into()),
        }
    }

    fn logical(&mut self, left: &Expr, op: BinaryOp, right: &Expr) -> Result<String> {
        let left = self.predicate(left, false)?;
        let right = self.predicate(right, false)?;
        Ok(format!("{} {op} {}", left.grouped(), right.grouped()))
    }

    fn comparison(
        &mut self,
        left: &Expr,
        op: BinaryOp,
        right: &Expr,
        negated: bool,
    ) -> Result<Fragment> {
        let op = if negated {
            op.complement().unwrap_or(op)
        } else {
            op
        };

        if matches!(op, BinaryOp::Eq | BinaryOp::Ne) {
            let operand = match (is_null_literal(left), is_null_literal(right)) {
                (false, true) => Some(left),
                (true, false) => Some(right),
                _ => None,
            };
            if let Some(operand) = operand {
                let operand = self.value(operand)?;
                let test = if op == BinaryOp::Eq {
                    "IS NULL"
                } else {
                    "IS NOT NULL"
                };
                return Ok(Fragment::simple(format!("{operand} {test}")));
            }
        }

        let left = self.value(left)?;
        let right = self.value(right)?;
        Ok(Fragment::simple(format!("{left} {op} {right}")))
    }

    fn membership(&mut self, left: &Expr, right: &Expr, negated: bool) -> Result<Fragment> {
        let Expr::List(items) = right else {
            return Err(TranslationError::UnexpectedOperand {
                context: "a literal list after IN",
                found: describe(right),
            }
            .into());
        };
        if items.is_empty() {
            if !matches!(left, Expr::Column(_)) {
                return Err(TranslationError::UnexpectedOperand {
                    context: "a column before an empty IN list",
                    found: describe(left),
                }
                .into());
            }
            let constant = if negated { "1 = 1" } else { "1 = 0" };
            return Ok(Fragment::simple(constant.to_string()));
        }
        let operand = self.value(left)?;

        let mut values = Vec::with_capacity(items.len());
        for item in items {
            if !matches!(item, Expr::Literal(_)) {
                return Err(TranslationError::UnexpectedOperand {
                    context: "a literal list element",
                    found: describe(item),
                }
                .into());
            }
            values.push(self.value(item)?);
        }
        let keyword = if negated { "NOT IN" } else { "IN" };
        Ok(Fragment::simple(format!(
            "{operand} {keyword} ({})",
            values.join(", ")
        )))
    }

    fn null_check(&mut self, operand: &Expr, is_null: bool) -> Result<Fragment> {
        let operand = self.value(operand)?;
        let test = if is_null { "IS NULL" } else { "IS NOT NULL" };
        Ok(Fragment::simple(format!("{operand} {test}")))
    }

    /// The empty string is written as `''`, not bound.
    fn null_or_empty(&mut self, operand: &Expr, negated: bool) -> Result<Fragment> {
        let Expr::Column(column) = operand else {
            return Err(TranslationError::UnexpectedOperand {
                context: "a column in a null-or-empty check",
                found: describe(operand),
            }
            .into());
        };
        let sql = if negated {
            format!("({column} IS NOT NULL AND {column} <> '')")
        } else {
            format!("({column} IS NULL OR {column} = '')")
        };
        Ok(Fragment::simple(sql))
    }

    fn pattern_match(
        &mut self,
        operand: &Expr,
        kind: MatchKind,
        pattern: &Expr,
        negated: bool,
    ) -> Result<Fragment> {
        match pattern {
            Expr::Literal(Value::String(_)) | Expr::Column(_) => {}
            Expr::Literal(other) => {
                return Err(TranslationError::InvalidPattern(other.type_name().to_string()).into());
            }
            other => return Err(TranslationError::InvalidPattern(describe(other)).into()),
        }

        let operand = self.value(operand)?;
        let pattern = self.value(pattern)?;
        let mut sql = operand;
        sql.push_str(if negated { " NOT LIKE " } else { " LIKE " });
        if kind.leading_wildcard() {
            sql.push_str("'%' || ");
        }
        sql.push_str(&pattern);
        if kind.trailing_wildcard() {
            sql.push_str(" || '%'");
        }
        Ok(Fragment::simple(sql))
    }

    /// Lowers a node in value position: a column or a literal.
    fn value(&mut self, expr: &Expr) -> Result<String> {
        match expr {
            Expr::Column(column) => Ok(column.to_string()),
            Expr::Literal(value) => Ok(self.binder.bind(value.clone())),
            Expr::Binary { op, .. } => Err(TranslationError::UnsupportedOperator {
                op: op.to_string(),
                context: "value position",
            }
            .into()),
            Expr::Unary { op, .. } => Err(TranslationError::UnsupportedOperator {
                op: op.to_string(),
                context: "value position",
            }
            .into()),
            Expr::FunctionCall { name, .. } => {
                Err(TranslationError::UnsupportedFunction(name.clone()).into())
            }
            Expr::List(_) | Expr::Match { .. } => Err(TranslationError::UnexpectedOperand {
                context: "a column or literal",
                found: describe(expr),
            }
            .into()),
        }
    }
}

/// Name under which producers may send the null-or-empty check as a call.
const NULL_OR_EMPTY_FUNCTION: &str = "IsNullOrEmpty";

fn boolean_column(column: &ColumnRef, negated: bool) -> String {
    if negated {
        format!("{column} <> TRUE")
    } else {
        format!("{column} = TRUE")
    }
}

fn is_null_literal(expr: &Expr) -> bool {
    matches!(expr, Expr::Literal(Value::Null))
}

fn describe(expr: &Expr) -> String {
    match expr {
        Expr::Column(column) => format!("column `{column}`"),
        Expr::Literal(value) => format!("{} literal", value.type_name()),
        Expr::List(_) => "list".to_string(),
        Expr::Binary { op, .. } => format!("`{op}` expression"),
        Expr::Unary { op, .. } => format!("`{op}` expression"),
        Expr::Match { .. } => "pattern match".to_string(),
        Expr::FunctionCall { name, .. } => format!("call to `{name}`"),
    }
}
