use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;

/// The fixed set of host capabilities a submission may never reach.
///
/// Passed into the guard and the executor as a value so grading behavior is
/// reproducible and testable in isolation; there is no process-wide denylist.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Denylist {
    names: BTreeSet<String>,
}

impl Default for Denylist {
    fn default() -> Self {
        // The browser/DOM global object, the document, network fetch, and
        // dynamic code evaluation.
        Self::new(["window", "globalThis", "document", "fetch", "eval"])
    }
}

impl Denylist {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Interpreter resource caps applied to every evaluation, independent of the
/// wall-clock budget. These bound memory and stack use so a submission cannot
/// exhaust the host before the deadline fires.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxLimits {
    /// Operations between deadline checks; also the granularity at which a
    /// runaway loop is interrupted.
    pub operation_check_interval: u64,
    /// Maximum function-call nesting.
    pub max_call_levels: usize,
    /// Maximum expression nesting depth (global, per-function).
    pub max_expr_depth: usize,
    /// Maximum string length, in bytes.
    pub max_string_size: usize,
    /// Maximum array length.
    pub max_array_size: usize,
    /// Maximum map size.
    pub max_map_size: usize,
}

impl Default for SandboxLimits {
    fn default() -> Self {
        Self {
            operation_check_interval: 1_000,
            max_call_levels: 64,
            max_expr_depth: 64,
            max_string_size: 1 << 20,
            max_array_size: 1 << 16,
            max_map_size: 1 << 16,
        }
    }
}

/// Everything the validator needs to grade one submission: the wall-clock
/// budget, the denylist, and the interpreter limits. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatorConfig {
    /// Hard wall-clock budget per evaluation.
    pub time_budget: Duration,
    pub denylist: Denylist,
    pub limits: SandboxLimits,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            time_budget: Duration::from_millis(1_000),
            denylist: Denylist::default(),
            limits: SandboxLimits::default(),
        }
    }
}

impl ValidatorConfig {
    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = budget;
        self
    }

    pub fn with_denylist(mut self, denylist: Denylist) -> Self {
        self.denylist = denylist;
        self
    }
}
