//! The validation dispatcher: per problem, pick the execute-and-compare path
//! or the pattern path, and normalize either into one [`Verdict`]. Nothing —
//! not a panic, not a timeout, not a malformed problem — escapes this
//! boundary as anything but a typed verdict.

use crate::compare::compare;
use crate::config::ValidatorConfig;
use crate::errors::GradeError;
use crate::executor::{snapshot, ExecutionOutcome, SandboxExecutor};
use crate::guard::DenylistGuard;
use crate::matcher::PatternMatcher;
use crate::problem::{Expected, ProblemSpec};
use crate::verdict::Verdict;
use tracing::debug;

pub struct Validator {
    config: ValidatorConfig,
    executor: SandboxExecutor,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(ValidatorConfig::default())
    }
}

impl Validator {
    pub fn new(config: ValidatorConfig) -> Self {
        let executor = SandboxExecutor::new(config.denylist.clone(), config.limits.clone());
        Self { config, executor }
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Grade one submission against one problem. Pure with respect to the
    /// problem: the record is read-only and repeated calls with the same
    /// inputs yield the same `success`.
    pub fn validate(&self, problem: &ProblemSpec, submission: &str) -> Verdict {
        debug!(problem = %problem.id, pattern_graded = problem.is_pattern_graded(), "validate");

        if problem.is_pattern_graded() {
            return self.validate_patterns(submission, &problem.valid_patterns);
        }

        let Some(expected) = &problem.expected else {
            return Verdict::fail(GradeError::InvalidProblem(format!(
                "problem {:?} declares neither an expected value nor patterns",
                problem.id
            )));
        };

        self.validate_execution(&problem.fixture_code, submission, expected)
    }

    /// Execute-and-compare path: guard, then sandboxed run, then deep
    /// comparison.
    pub fn validate_execution(
        &self,
        fixture_code: &str,
        submission_code: &str,
        expected: &Expected,
    ) -> Verdict {
        let guard = DenylistGuard::new(&self.config.denylist);
        if let Err(err) = guard.check(fixture_code, submission_code) {
            return Verdict::fail(err);
        }

        let outcome = self
            .executor
            .run(fixture_code, submission_code, self.config.time_budget);

        match outcome {
            ExecutionOutcome::TimedOut => Verdict::fail(GradeError::Timeout),
            ExecutionOutcome::Threw(message) => Verdict::fail(GradeError::Runtime(message)),
            ExecutionOutcome::Forbidden(name) => {
                Verdict::fail(GradeError::ForbiddenGlobal(name))
            }
            ExecutionOutcome::Returned(actual) => {
                let actual_output = snapshot(&actual);
                if compare(&actual, expected) {
                    Verdict::pass(actual_output)
                } else {
                    Verdict::fail(GradeError::Mismatch).with_actual_output(actual_output)
                }
            }
        }
    }

    /// Pattern path: no execution, no timeout risk; the first matching
    /// alternative decides.
    pub fn validate_patterns<S: AsRef<str>>(&self, submission_text: &str, patterns: &[S]) -> Verdict {
        let matcher = match PatternMatcher::new(patterns) {
            Ok(matcher) => matcher,
            Err(err) => return Verdict::fail(err),
        };
        match matcher.find_match(submission_text) {
            Some(index) => Verdict::pass_pattern(index),
            None => Verdict::fail(GradeError::PatternMismatch),
        }
    }

    /// Self-test mode: grade the problem's own authored sample solution, to
    /// prove the problem is solvable as written.
    pub fn check_sample(&self, problem: &ProblemSpec) -> Verdict {
        self.validate(problem, &problem.submission_code)
    }
}
