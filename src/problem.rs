use serde::{Deserialize, Serialize};

/// What a correct submission must evaluate to.
///
/// Modeled as an explicit tagged variant rather than an ad-hoc "sentinel
/// string inside the literal" so the comparator's dispatch stays exhaustive
/// and new sentinel kinds are additive.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Expected {
    /// A concrete value the submission must deep-equal (primitive, array,
    /// or key/value map, arbitrarily nested).
    Literal(serde_json::Value),
    /// Any callable satisfies this, regardless of arity, body, or captured
    /// state. Used by drills that only require producing *a* function.
    Callable,
}

/// One authored drill problem, owned by the content catalog and consumed
/// read-only by the engine. Never mutated during grading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemSpec {
    /// Unique within its collection.
    pub id: String,

    /// Preamble establishing variables/helpers the submission may reference.
    #[serde(default)]
    pub fixture_code: String,

    /// The authored sample solution; graded in self-test mode to prove the
    /// problem is solvable as written.
    #[serde(default)]
    pub submission_code: String,

    /// Required for the execute-and-compare path; irrelevant (and ignored)
    /// when `valid_patterns` is non-empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<Expected>,

    /// Non-empty selects the pattern path: each entry is an independently
    /// sufficient regex proof of correctness (logical OR, ordered).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub valid_patterns: Vec<String>,
}

impl ProblemSpec {
    /// Whether this problem grades by pattern matching instead of execution.
    pub fn is_pattern_graded(&self) -> bool {
        !self.valid_patterns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn expected_tagged_representation_round_trips() {
        let literal: Expected =
            serde_json::from_value(json!({"type": "literal", "value": [1, 2, 3]})).unwrap();
        assert_eq!(literal, Expected::Literal(json!([1, 2, 3])));

        let callable: Expected = serde_json::from_value(json!({"type": "callable"})).unwrap();
        assert_eq!(callable, Expected::Callable);
    }

    #[test]
    fn problem_defaults_allow_minimal_records() {
        let problem: ProblemSpec = serde_json::from_value(json!({
            "id": "arrays/filter-by-tag",
            "fixture_code": "let xs = [1, 2, 3];",
            "expected": {"type": "literal", "value": [2]}
        }))
        .unwrap();

        assert!(!problem.is_pattern_graded());
        assert!(problem.submission_code.is_empty());
    }

    #[test]
    fn patterns_mark_problem_as_pattern_graded() {
        let problem: ProblemSpec = serde_json::from_value(json!({
            "id": "markup/attr-order",
            "valid_patterns": ["<a b>", "<b a>"]
        }))
        .unwrap();

        assert!(problem.is_pattern_graded());
    }
}
