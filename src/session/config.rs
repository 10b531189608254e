//! Session configuration: file filters and the report output target.
//!
//! The `trace` and `ignore` options are regular expressions matched against
//! allocation file paths. Options are validated in full before any of them
//! is applied, so a bad pattern never leaves the config half-updated.

use crate::utils::error::ConfigError;
use regex::Regex;
use std::path::PathBuf;

/// Where the report pipeline writes its JSON
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OutputTarget {
    /// Standard output (the default)
    #[default]
    Stdout,

    /// A file path
    File(PathBuf),
}

/// Raw configuration options, as handed to `configure`.
///
/// Applying options replaces the whole filter set: a `None` pattern clears
/// any previously configured one.
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    /// Only include records whose file matches this pattern
    pub trace: Option<String>,

    /// Exclude records whose file matches this pattern
    pub ignore: Option<String>,

    /// Report sink; `None` keeps the current target
    pub output: Option<OutputTarget>,
}

/// Validated session configuration
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    trace: Option<Regex>,
    ignore: Option<Regex>,
    output: OutputTarget,
}

impl SessionConfig {
    /// Apply raw options, validating every pattern first
    ///
    /// # Errors
    /// * `ConfigError::InvalidTracePattern` / `InvalidIgnorePattern` - the
    ///   pattern does not compile. No state is mutated on error.
    pub fn apply(&mut self, opts: SessionOptions) -> Result<(), ConfigError> {
        let trace = opts
            .trace
            .map(|p| Regex::new(&p))
            .transpose()
            .map_err(ConfigError::InvalidTracePattern)?;
        let ignore = opts
            .ignore
            .map(|p| Regex::new(&p))
            .transpose()
            .map_err(ConfigError::InvalidIgnorePattern)?;

        self.trace = trace;
        self.ignore = ignore;
        if let Some(output) = opts.output {
            self.output = output;
        }
        Ok(())
    }

    /// Does a record from this file belong in the report?
    pub fn includes_file(&self, file: &str) -> bool {
        if let Some(trace) = &self.trace {
            if !trace.is_match(file) {
                return false;
            }
        }
        if let Some(ignore) = &self.ignore {
            if ignore.is_match(file) {
                return false;
            }
        }
        true
    }

    /// Configured report sink
    pub fn output(&self) -> &OutputTarget {
        &self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_includes_everything() {
        let config = SessionConfig::default();
        assert!(config.includes_file("anything.rb"));
    }

    #[test]
    fn test_trace_pattern_narrows() {
        let mut config = SessionConfig::default();
        config
            .apply(SessionOptions {
                trace: Some(r"app/".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert!(config.includes_file("app/models/user.rb"));
        assert!(!config.includes_file("vendor/gem.rb"));
    }

    #[test]
    fn test_ignore_pattern_excludes() {
        let mut config = SessionConfig::default();
        config
            .apply(SessionOptions {
                ignore: Some(r"vendor/".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert!(config.includes_file("app/models/user.rb"));
        assert!(!config.includes_file("vendor/gem.rb"));
    }

    #[test]
    fn test_invalid_trace_pattern_is_an_error() {
        let mut config = SessionConfig::default();
        let err = config
            .apply(SessionOptions {
                trace: Some("(".to_string()),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTracePattern(_)));
    }

    #[test]
    fn test_invalid_ignore_leaves_config_untouched() {
        let mut config = SessionConfig::default();
        config
            .apply(SessionOptions {
                trace: Some(r"app/".to_string()),
                ..Default::default()
            })
            .unwrap();

        let result = config.apply(SessionOptions {
            trace: Some(r"lib/".to_string()),
            ignore: Some("[".to_string()),
            ..Default::default()
        });

        assert!(matches!(result, Err(ConfigError::InvalidIgnorePattern(_))));
        // The earlier trace filter still applies.
        assert!(config.includes_file("app/models/user.rb"));
        assert!(!config.includes_file("lib/util.rb"));
    }

    #[test]
    fn test_reapplying_clears_old_filters() {
        let mut config = SessionConfig::default();
        config
            .apply(SessionOptions {
                ignore: Some(r"vendor/".to_string()),
                ..Default::default()
            })
            .unwrap();
        config.apply(SessionOptions::default()).unwrap();
        assert!(config.includes_file("vendor/gem.rb"));
    }
}
