//! Error types shared by all Quill crates.

use thiserror::Error;

/// Result alias using the crate-wide [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The predicate tree contains a shape that cannot be lowered to SQL.
    #[error("translation failed: {0}")]
    Translation(#[from] TranslationError),

    /// No table metadata is available for an entity.
    #[error("no table metadata registered for entity `{entity}`")]
    MissingMetadata {
        /// Entity type name.
        entity: String,
    },

    /// A logical field name is not part of the entity's column mapping.
    #[error("entity `{entity}` has no field `{field}`")]
    UnknownField {
        /// Entity type name.
        entity: String,
        /// Requested logical field name.
        field: String,
    },

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Internal invariant violation.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Reasons a predicate tree cannot be translated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranslationError {
    /// Operator with no SQL lowering in the given position.
    #[error("operator `{op}` is not supported in {context}")]
    UnsupportedOperator {
        /// Operator name.
        op: String,
        /// Where the operator was found.
        context: &'static str,
    },

    /// Function call with no SQL lowering.
    #[error("function `{0}` cannot be translated")]
    UnsupportedFunction(String),

    /// A node appeared where a different kind of node was required.
    #[error("expected {context}, found {found}")]
    UnexpectedOperand {
        /// What the compiler expected.
        context: &'static str,
        /// What it found instead.
        found: String,
    },

    /// A pattern match whose pattern is not a string.
    #[error("pattern must be a string or column, found {0}")]
    InvalidPattern(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err: Error = TranslationError::UnsupportedFunction("upper".to_string()).into();
        assert_eq!(
            err.to_string(),
            "translation failed: function `upper` cannot be translated"
        );

        let err = Error::UnknownField {
            entity: "DataType".to_string(),
            field: "Missing".to_string(),
        };
        assert_eq!(err.to_string(), "entity `DataType` has no field `Missing`");
    }
}
