//! Builder configuration.
//!
//! The only switch is `strict_step_ordering`. When it is on (the default) a
//! step or match event that arrives before the previous one was resolved
//! aborts the parse. When it is off the stale pending state is logged and
//! discarded, which lets reports from runners that omit step results still
//! load.

use std::env;

use crate::error::ConfigError;

/// Environment variable overriding [`BuilderConfig::strict_step_ordering`].
pub const STRICT_STEP_ORDERING_ENV: &str = "CUCUMBER_RESULTS_STRICT_STEP_ORDERING";

const TRUTHY: [&str; 4] = ["1", "true", "yes", "on"];
const FALSY: [&str; 4] = ["0", "false", "no", "off"];

/// Interpret a switch value, ignoring surrounding whitespace and ASCII case.
fn parse_switch(value: &str) -> Option<bool> {
    let value = value.trim();
    let matches = |words: &[&str]| words.iter().any(|word| word.eq_ignore_ascii_case(value));
    if matches(&TRUTHY) {
        Some(true)
    } else if matches(&FALSY) {
        Some(false)
    } else {
        None
    }
}

/// Configuration consumed by the [`TreeBuilder`](crate::TreeBuilder).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BuilderConfig {
    /// Treat duplicated step or match events as fatal.
    pub strict_step_ordering: bool,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            strict_step_ordering: true,
        }
    }
}

impl BuilderConfig {
    /// Load configuration from the environment.
    ///
    /// Reads `CUCUMBER_RESULTS_STRICT_STEP_ORDERING` and falls back to the
    /// defaults when it is unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when the variable is set to
    /// something that is not a recognised boolean.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_value(env::var(STRICT_STEP_ORDERING_ENV).ok())
    }

    fn from_env_value(value: Option<String>) -> Result<Self, ConfigError> {
        let strict_step_ordering = match value {
            Some(value) => parse_switch(&value).ok_or(ConfigError::InvalidValue {
                variable: STRICT_STEP_ORDERING_ENV,
                value,
            })?,
            None => Self::default().strict_step_ordering,
        };
        Ok(Self {
            strict_step_ordering,
        })
    }

    /// Create a configuration with the given step ordering policy.
    ///
    /// # Examples
    /// ```
    /// use cucumber_results::BuilderConfig;
    ///
    /// let config = BuilderConfig::default().with_strict_step_ordering(false);
    /// assert!(!config.strict_step_ordering);
    /// ```
    #[must_use]
    pub fn with_strict_step_ordering(mut self, strict: bool) -> Self {
        self.strict_step_ordering = strict;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn default_is_strict() {
        assert!(BuilderConfig::default().strict_step_ordering);
    }

    #[test]
    fn unset_variable_keeps_default() {
        let config = BuilderConfig::from_env_value(None).ok();
        assert_eq!(config, Some(BuilderConfig::default()));
    }

    #[test]
    fn variable_overrides_default() {
        let config = BuilderConfig::from_env_value(Some("off".into())).ok();
        assert_eq!(
            config.map(|config| config.strict_step_ordering),
            Some(false)
        );
    }

    #[test]
    fn garbage_value_is_rejected() {
        let Err(err) = BuilderConfig::from_env_value(Some("sometimes".into())) else {
            panic!("garbage value should be rejected");
        };
        assert_eq!(
            err.to_string(),
            "invalid value 'sometimes' for CUCUMBER_RESULTS_STRICT_STEP_ORDERING, expected a boolean"
        );
    }

    #[rstest]
    #[case("1", Some(true))]
    #[case("TRUE", Some(true))]
    #[case(" yes ", Some(true))]
    #[case("On", Some(true))]
    #[case("0", Some(false))]
    #[case("False", Some(false))]
    #[case("NO", Some(false))]
    #[case("oFf", Some(false))]
    #[case("maybe", None)]
    #[case("", None)]
    fn switch_values_ignore_case(#[case] value: &str, #[case] expected: Option<bool>) {
        assert_eq!(parse_switch(value), expected);
    }
}
