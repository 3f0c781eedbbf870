//! drillbox — the answer-validation engine behind an interactive coding-drill
//! platform.
//!
//! Given a drill problem (fixture code plus either an expected value or a
//! list of acceptable regex patterns) and a learner submission, the engine
//! decides correctness and returns one normalized [`Verdict`]. Executable
//! submissions run in a fresh, denylist-guarded, time-bounded embedded
//! interpreter; non-executable drills are graded by pattern matching on the
//! raw submission text.
//!
//! ```rust
//! use drillbox::{Expected, ProblemSpec, Validator};
//! use serde_json::json;
//!
//! let validator = Validator::default();
//! let problem = ProblemSpec {
//!     id: "arrays/filter-evens".into(),
//!     fixture_code: "let xs = [1, 2, 3, 4];".into(),
//!     submission_code: "xs.filter(|x| x % 2 == 0)".into(),
//!     expected: Some(Expected::Literal(json!([2, 4]))),
//!     valid_patterns: vec![],
//! };
//!
//! let verdict = validator.validate(&problem, "xs.filter(|x| x % 2 == 0)");
//! assert!(verdict.success);
//! ```
//!
//! Grading is request-scoped and synchronous: one submission in, one verdict
//! out. Concurrent gradings share nothing but the read-only problem catalog.

mod compare;
mod config;
mod dispatch;
mod errors;
mod executor;
mod guard;
mod matcher;
mod problem;
mod verdict;

pub use compare::{compare, is_callable};
pub use config::{Denylist, SandboxLimits, ValidatorConfig};
pub use dispatch::Validator;
pub use errors::{GradeError, Result};
pub use executor::{ExecutionOutcome, SandboxExecutor};
pub use guard::DenylistGuard;
pub use matcher::PatternMatcher;
pub use problem::{Expected, ProblemSpec};
pub use verdict::{ErrorKind, Verdict};
