//! Pattern path: grading by regex match on the raw submission text.
//!
//! Used for drills that cannot be graded by execution (templating/decorator
//! syntax, declarative markup, call shapes in a non-executable language).
//! Alternatives are a logical OR; the first match wins and its index is
//! reported. The `regex` crate guarantees linear-time matching, so authored
//! patterns cannot backtrack catastrophically on adversarial-length input.

use crate::errors::{GradeError, Result};
use regex::RegexBuilder;
use tracing::debug;

/// Upper bound on each compiled pattern, in bytes. Authored patterns are
/// short; anything past this is an authoring defect.
const PATTERN_SIZE_LIMIT: usize = 1 << 20;

#[derive(Debug)]
pub struct PatternMatcher {
    patterns: Vec<regex::Regex>,
}

impl PatternMatcher {
    /// Compile an ordered list of authored patterns. A pattern outside the
    /// supported dialect (backreferences, lookaround) or over the size limit
    /// fails compilation and is reported as an invalid problem.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| {
                RegexBuilder::new(p.as_ref())
                    .size_limit(PATTERN_SIZE_LIMIT)
                    .build()
                    .map_err(|e| {
                        GradeError::InvalidProblem(format!(
                            "pattern {:?} failed to compile: {e}",
                            p.as_ref()
                        ))
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// Index of the first pattern matching anywhere in the text.
    pub fn find_match(&self, text: &str) -> Option<usize> {
        let index = self.patterns.iter().position(|p| p.is_match(text));
        debug!(?index, candidates = self.patterns.len(), "pattern match");
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_matching_alternative_wins() {
        let matcher =
            PatternMatcher::new(&["<img src=\\S+ alt=\\S+>", "<img alt=\\S+ src=\\S+>"]).unwrap();
        assert_eq!(matcher.find_match("<img src=x.png alt=cat>"), Some(0));
        assert_eq!(matcher.find_match("<img alt=cat src=x.png>"), Some(1));
        assert_eq!(matcher.find_match("<img src=x.png>"), None);
    }

    #[test]
    fn only_the_second_pattern_matching_reports_index_one() {
        let matcher = PatternMatcher::new(&["^a+$", "^b+$"]).unwrap();
        assert_eq!(matcher.find_match("bbb"), Some(1));
    }

    #[test]
    fn unsupported_dialect_is_an_invalid_problem() {
        let err = PatternMatcher::new(&[r"(\w+)\s\1"]).unwrap_err();
        assert!(matches!(err, GradeError::InvalidProblem(_)));
    }

    #[test]
    fn adversarial_length_input_stays_fast() {
        let matcher = PatternMatcher::new(&["(a|aa)+$"]).unwrap();
        let text = "a".repeat(4096) + "b";
        let start = std::time::Instant::now();
        assert_eq!(matcher.find_match(&text), None);
        assert!(start.elapsed() < std::time::Duration::from_secs(1));
    }
}
