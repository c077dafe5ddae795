//! Parser configuration.

use serde::{Deserialize, Serialize};

/// Tunables for a parse.
///
/// Deserializable with every field optional, so a JSON config file only needs
/// the values it changes:
///
/// ```
/// use shard_sql_core::ParserOptions;
///
/// let options: ParserOptions = serde_json::from_str(r#"{ "recover": true }"#).unwrap();
/// assert!(options.recover);
/// assert_eq!(options.max_depth, ParserOptions::default().max_depth);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserOptions {
    /// Use single-token recovery and keep parsing after a failed statement.
    /// When false the first syntax error ends the script.
    pub recover: bool,
    /// Tokens that speculative parsing may examine per statement.
    pub lookahead_budget: usize,
    /// Maximum nesting of expressions and queries.
    pub max_depth: usize,
    /// Error records kept per script before giving up.
    pub max_errors: usize,
}

impl ParserOptions {
    /// Strict parsing with default limits.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            recover: false,
            lookahead_budget: 4096,
            max_depth: 64,
            max_errors: 64,
        }
    }

    /// Enables or disables recovery.
    #[must_use]
    pub const fn with_recovery(mut self, recover: bool) -> Self {
        self.recover = recover;
        self
    }

    /// Sets the maximum nesting depth.
    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Sets the lookahead budget.
    #[must_use]
    pub const fn with_lookahead_budget(mut self, budget: usize) -> Self {
        self.lookahead_budget = budget;
        self
    }
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self::new()
    }
}
