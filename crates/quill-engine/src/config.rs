//! Configuration options.

use crate::dialect::Dialect;
use quill_common::utils::error::{Error, Result};
use quill_core::params::{DEFAULT_PREFIX, DEFAULT_SIGIL};
use serde::{Deserialize, Serialize};

/// Statement generation settings.
///
/// ```
/// use quill_engine::{Config, Dialect};
///
/// let config = Config::default()
///     .with_dialect(Dialect::TransactSql)
///     .with_parameter_prefix("p");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQL dialect used for statement assembly.
    pub dialect: Dialect,
    /// Prefix of synthetic parameter names (`ld__` gives `ld__1`, `ld__2`, ...).
    pub parameter_prefix: String,
    /// Character that introduces a placeholder in SQL text.
    pub placeholder_sigil: char,
    /// Fail instead of emitting a degraded statement when an entity has no
    /// columns.
    pub strict_metadata: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dialect: Dialect::Standard,
            parameter_prefix: DEFAULT_PREFIX.to_string(),
            placeholder_sigil: DEFAULT_SIGIL,
            strict_metadata: true,
        }
    }
}

impl Config {
    /// Default configuration for the `TOP(n)` dialect.
    #[must_use]
    pub fn transact_sql() -> Self {
        Self::default().with_dialect(Dialect::TransactSql)
    }

    /// Sets the dialect.
    #[must_use]
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Sets the parameter name prefix.
    #[must_use]
    pub fn with_parameter_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.parameter_prefix = prefix.into();
        self
    }

    /// Sets the placeholder sigil.
    #[must_use]
    pub fn with_placeholder_sigil(mut self, sigil: char) -> Self {
        self.placeholder_sigil = sigil;
        self
    }

    /// Enables or disables strict metadata checks.
    #[must_use]
    pub fn with_strict_metadata(mut self, strict: bool) -> Self {
        self.strict_metadata = strict;
        self
    }

    /// Checks that the settings produce well-formed placeholders.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the prefix is empty or contains anything
    /// but ASCII alphanumerics and `_`, or if the sigil is alphanumeric.
    pub fn validate(&self) -> Result<()> {
        if self.parameter_prefix.is_empty() {
            return Err(Error::Config("parameter prefix must not be empty".to_string()));
        }
        if let Some(bad) = self
            .parameter_prefix
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '_'))
        {
            return Err(Error::Config(format!(
                "parameter prefix contains invalid character {bad:?}"
            )));
        }
        if self.placeholder_sigil.is_alphanumeric() || self.placeholder_sigil.is_whitespace() {
            return Err(Error::Config(format!(
                "placeholder sigil {:?} is not a symbol",
                self.placeholder_sigil
            )));
        }
        Ok(())
    }
}
