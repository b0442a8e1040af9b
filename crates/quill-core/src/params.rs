//! Synthetic parameter naming.
//!
//! Every non-null literal in a predicate is registered with a
//! [`ParameterBinder`] under a fresh name (`ld__1`, `ld__2`, ...) and only the
//! placeholder (`@ld__1`) appears in the SQL text.

use indexmap::IndexMap;
use quill_common::types::Value;
use serde::Serialize;

/// Default parameter name prefix.
pub const DEFAULT_PREFIX: &str = "ld__";

/// Default placeholder sigil.
pub const DEFAULT_SIGIL: char = '@';

/// Ordered set of bound parameters, in binding order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Parameters {
    values: IndexMap<String, Value>,
}

impl Parameters {
    /// Number of bound parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// `true` if nothing was bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value bound under `name` (without sigil).
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Iterates `(name, value)` pairs in binding order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Parameter names in binding order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Values in binding order, for positional binding.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.values.values()
    }
}

impl IntoIterator for Parameters {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

/// Hands out synthetic parameter names and records their values.
///
/// One binder serves exactly one statement. The counter only moves forward,
/// so names are never reused within a statement no matter how the tree is
/// traversed.
#[derive(Debug, Clone)]
pub struct ParameterBinder {
    prefix: String,
    sigil: char,
    counter: u32,
    parameters: Parameters,
}

impl ParameterBinder {
    /// Creates a binder producing `@ld__N` placeholders.
    #[must_use]
    pub fn new() -> Self {
        Self::with_naming(DEFAULT_PREFIX, DEFAULT_SIGIL)
    }

    /// Creates a binder with a custom name prefix and placeholder sigil.
    #[must_use]
    pub fn with_naming(prefix: impl Into<String>, sigil: char) -> Self {
        Self {
            prefix: prefix.into(),
            sigil,
            counter: 0,
            parameters: Parameters::default(),
        }
    }

    /// Binds a value and returns the text to splice into SQL.
    ///
    /// `Null` is not bound; the `NULL` keyword is returned instead.
    pub fn bind(&mut self, value: Value) -> String {
        if value.is_null() {
            return "NULL".to_string();
        }
        self.counter += 1;
        let name = format!("{}{}", self.prefix, self.counter);
        let placeholder = format!("{}{}", self.sigil, name);
        self.parameters.values.insert(name, value);
        placeholder
    }

    /// Parameters bound so far.
    #[must_use]
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Consumes the binder, returning the bound parameters.
    #[must_use]
    pub fn into_parameters(self) -> Parameters {
        self.parameters
    }
}

impl Default for ParameterBinder {
    fn default() -> Self {
        Self::new()
    }
}
