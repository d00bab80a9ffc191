//! Rule options for physical combat.
//!
//! [`RuleOptions`] gathers the optional rules that change how a round resolves.
//! Options are plain data: they deserialize from JSON with every field
//! optional, so a host only needs to name the options it turns on.
//!
//! # Example
//!
//! ```
//! use hexbrawl_core::config::RuleOptions;
//!
//! let options = RuleOptions::from_json(r#"{ "double_blind": true, "glancing_blows": true }"#)
//!     .unwrap();
//! assert!(options.double_blind);
//! assert!(!options.direct_blows);
//! assert_eq!(options.cluster_size, 5);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Optional rules and engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleOptions {
    /// Partial-information mode: observers only receive units they can perceive.
    pub double_blind: bool,
    /// Halve damage when the attack roll exactly equals the to-hit value.
    pub glancing_blows: bool,
    /// Add margin-of-success / 3 bonus damage.
    pub direct_blows: bool,
    /// Destroyed units roughen the hex they die in.
    pub battlefield_wreckage: bool,
    /// Cache line-of-sight results for the duration of a round.
    pub use_visibility_cache: bool,
    /// Damage group size for clustered attacks (charge, DFA, ram).
    pub cluster_size: u32,
    /// Seed for the round's dice.
    pub seed: u64,
}

impl Default for RuleOptions {
    fn default() -> Self {
        Self {
            double_blind: false,
            glancing_blows: false,
            direct_blows: false,
            battlefield_wreckage: false,
            use_visibility_cache: true,
            cluster_size: 5,
            seed: 0,
        }
    }
}

impl RuleOptions {
    /// Parses options from JSON and validates them.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Checks option values for consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `cluster_size` is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cluster_size == 0 {
            return Err(ConfigError::Invalid("cluster_size must be positive".into()));
        }
        Ok(())
    }

    /// Builder: set double-blind mode.
    #[must_use]
    pub fn with_double_blind(mut self, enabled: bool) -> Self {
        self.double_blind = enabled;
        self
    }

    /// Builder: set the glancing-blow rule.
    #[must_use]
    pub fn with_glancing_blows(mut self, enabled: bool) -> Self {
        self.glancing_blows = enabled;
        self
    }

    /// Builder: set the direct-blow rule.
    #[must_use]
    pub fn with_direct_blows(mut self, enabled: bool) -> Self {
        self.direct_blows = enabled;
        self
    }

    /// Builder: set the battlefield-wreckage rule.
    #[must_use]
    pub fn with_wreckage(mut self, enabled: bool) -> Self {
        self.battlefield_wreckage = enabled;
        self
    }

    /// Builder: set the dice seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}
