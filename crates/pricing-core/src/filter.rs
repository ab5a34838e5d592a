//! Instance-type inclusion filter.

use regex::Regex;

use crate::error::{ConfigError, ConfigResult};

/// Pattern used when no instance regexes are configured.
pub const MATCH_ALL: &str = ".*";

/// A set of compiled patterns; an instance type is kept iff any matches.
#[derive(Debug, Clone)]
pub struct InstanceFilter {
    patterns: Vec<Regex>,
}

impl InstanceFilter {
    /// Compile the given patterns. An empty list means "match everything".
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> ConfigResult<Self> {
        if patterns.is_empty() {
            return Ok(Self::match_all());
        }

        let patterns = patterns
            .iter()
            .map(|p| {
                Regex::new(p.as_ref()).map_err(|source| ConfigError::Regex {
                    pattern: p.as_ref().to_string(),
                    source,
                })
            })
            .collect::<ConfigResult<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    pub fn match_all() -> Self {
        Self {
            patterns: vec![Regex::new(MATCH_ALL).expect("static pattern")],
        }
    }

    pub fn matches(&self, instance_type: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(instance_type))
    }

    /// Source text of the compiled patterns.
    pub fn patterns(&self) -> Vec<&str> {
        self.patterns.iter().map(Regex::as_str).collect()
    }
}

impl Default for InstanceFilter {
    fn default() -> Self {
        Self::match_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_list_matches_everything() {
        let filter = InstanceFilter::new::<&str>(&[]).unwrap();
        assert!(filter.matches("m5.large"));
        assert!(filter.matches(""));
        assert_eq!(filter.patterns(), vec![MATCH_ALL]);
    }

    #[test]
    fn any_pattern_keeps_the_type() {
        let filter = InstanceFilter::new(&["^m5\\.", "^c6g\\."]).unwrap();
        assert!(filter.matches("m5.xlarge"));
        assert!(filter.matches("c6g.medium"));
        assert!(!filter.matches("t3.micro"));
        assert!(!filter.matches("m5a.large"));
    }

    #[test]
    fn invalid_pattern_is_a_config_error() {
        let err = InstanceFilter::new(&["m5.(large"]).unwrap_err();
        match err {
            ConfigError::Regex { pattern, .. } => assert_eq!(pattern, "m5.(large"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
