//! Sandboxed, time-bounded evaluation of fixture + submission.
//!
//! Every invocation builds a fresh interpreter and scope on a dedicated
//! worker thread; nothing survives between gradings. The wall-clock budget is
//! enforced twice: a progress callback terminates the interpreter from inside
//! once the deadline passes, and the caller's bounded channel receive
//! guarantees a prompt `TimedOut` even if the worker is wedged. A runaway
//! submission therefore costs at most one worker thread's lifetime.

use crate::config::{Denylist, SandboxLimits};
use rhai::{Dynamic, Engine, EvalAltResult, FnPtr, NativeCallContext, Position, Scope};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Out-of-band payload carried by resolver errors so the denylist layer can
/// be told apart from ordinary runtime errors. A native type: script code can
/// throw any string it likes but cannot counterfeit this.
#[derive(Debug, Clone)]
struct ForbiddenCapability(String);

/// Slack granted past the budget for the in-engine deadline to fire and the
/// worker to report back before the caller gives up on the channel.
const BUDGET_GRACE: Duration = Duration::from_millis(250);

/// What happened when a submission ran.
#[derive(Debug)]
pub enum ExecutionOutcome {
    /// The submission's final evaluated value.
    Returned(Dynamic),
    /// The first uncaught error, including explicit `throw` and parse
    /// failures.
    Threw(String),
    /// A denylisted capability was reached at the binding level.
    Forbidden(String),
    /// The wall-clock budget was exceeded.
    TimedOut,
}

pub struct SandboxExecutor {
    denylist: Denylist,
    limits: SandboxLimits,
}

impl SandboxExecutor {
    pub fn new(denylist: Denylist, limits: SandboxLimits) -> Self {
        Self { denylist, limits }
    }

    /// Run `fixture_code` then `submission_code` in a disposable context and
    /// capture the result. Never panics and never blocks past the budget
    /// (plus a small grace period).
    pub fn run(
        &self,
        fixture_code: &str,
        submission_code: &str,
        time_budget: Duration,
    ) -> ExecutionOutcome {
        // One script so fixture-defined functions stay visible to the
        // submission; the submission's last expression is the result.
        let source = if fixture_code.trim().is_empty() {
            submission_code.to_string()
        } else {
            format!("{fixture_code}\n{submission_code}")
        };

        let denylist = self.denylist.clone();
        let limits = self.limits.clone();
        let deadline = Instant::now() + time_budget;
        let (tx, rx) = mpsc::channel();

        let worker = thread::Builder::new()
            .name("drillbox-eval".into())
            .spawn(move || {
                let outcome = evaluate(&source, &denylist, &limits, deadline);
                // The receiver may already have given up; that is fine.
                let _ = tx.send(outcome);
            });

        if let Err(e) = worker {
            warn!(error = %e, "failed to spawn evaluation worker");
            return ExecutionOutcome::Threw(format!("could not start evaluation: {e}"));
        }

        match rx.recv_timeout(time_budget + BUDGET_GRACE) {
            Ok(outcome) => {
                debug!(?outcome, "evaluation finished");
                outcome
            }
            Err(_) => {
                warn!(budget_ms = time_budget.as_millis() as u64, "evaluation timed out");
                ExecutionOutcome::TimedOut
            }
        }
    }
}

fn evaluate(
    source: &str,
    denylist: &Denylist,
    limits: &SandboxLimits,
    deadline: Instant,
) -> ExecutionOutcome {
    let engine = build_engine(denylist, limits, deadline);
    let mut scope = Scope::new();

    match engine.eval_with_scope::<Dynamic>(&mut scope, source) {
        Ok(value) => ExecutionOutcome::Returned(value),
        Err(err) => outcome_from_error(*err, denylist),
    }
}

/// A fresh, capability-scoped engine: resource limits applied, the deadline
/// wired into the progress hook, denylisted names unresolvable, and the
/// deterministic timer shims registered.
fn build_engine(denylist: &Denylist, limits: &SandboxLimits, deadline: Instant) -> Engine {
    let mut engine = Engine::new();

    engine.set_max_call_levels(limits.max_call_levels);
    engine.set_max_expr_depths(limits.max_expr_depth, limits.max_expr_depth);
    engine.set_max_string_size(limits.max_string_size);
    engine.set_max_array_size(limits.max_array_size);
    engine.set_max_map_size(limits.max_map_size);

    let interval = limits.operation_check_interval.max(1);
    engine.on_progress(move |ops| {
        if ops % interval == 0 && Instant::now() >= deadline {
            Some(Dynamic::UNIT)
        } else {
            None
        }
    });

    // Binding-level denylist: these names must simply not exist in the
    // evaluation scope, whatever the lexical guard did or did not catch.
    let denied = denylist.clone();
    engine.on_var(move |name, _, _| {
        if denied.contains(name) {
            Err(EvalAltResult::ErrorRuntime(
                Dynamic::from(ForbiddenCapability(name.to_string())),
                Position::NONE,
            )
            .into())
        } else {
            Ok(None)
        }
    });

    // Dynamic code evaluation is syntax, not a variable; reserve the symbol
    // so it cannot even parse.
    if denylist.contains("eval") {
        engine.disable_symbol("eval");
    }

    register_timer_shims(&mut engine);

    engine
}

/// Deterministic stand-ins for timer-driven fixtures (debounce, throttle,
/// polling). Callbacks fire immediately and synchronously, so results are
/// already observable when the submission's value is read. Intentionally not
/// an event loop.
fn register_timer_shims(engine: &mut Engine) {
    engine.register_fn(
        "set_timeout",
        |ctx: NativeCallContext, callback: FnPtr, _delay_ms: i64| -> Result<Dynamic, Box<EvalAltResult>> {
            callback.call_within_context(&ctx, ())
        },
    );
    engine.register_fn(
        "set_timeout",
        |ctx: NativeCallContext, callback: FnPtr| -> Result<Dynamic, Box<EvalAltResult>> {
            callback.call_within_context(&ctx, ())
        },
    );
    engine.register_fn(
        "set_interval",
        |ctx: NativeCallContext,
         callback: FnPtr,
         _delay_ms: i64,
         iterations: i64|
         -> Result<(), Box<EvalAltResult>> {
            for _ in 0..iterations.max(0) {
                let _: Dynamic = callback.call_within_context(&ctx, ())?;
            }
            Ok(())
        },
    );
}

fn outcome_from_error(err: EvalAltResult, denylist: &Denylist) -> ExecutionOutcome {
    match err {
        EvalAltResult::ErrorTerminated(..) => ExecutionOutcome::TimedOut,
        EvalAltResult::ErrorRuntime(ref value, _) => {
            if let Some(forbidden) = value.clone().try_cast::<ForbiddenCapability>() {
                return ExecutionOutcome::Forbidden(forbidden.0);
            }
            ExecutionOutcome::Threw(err.to_string())
        }
        EvalAltResult::ErrorFunctionNotFound(ref signature, _) => {
            // Calling a denylisted capability (`fetch("...")`) fails lookup;
            // report it as the denylist violation it is.
            let name = signature
                .split(|c: char| c == ' ' || c == '(')
                .next()
                .unwrap_or_default();
            if denylist.contains(name) {
                return ExecutionOutcome::Forbidden(name.to_string());
            }
            ExecutionOutcome::Threw(err.to_string())
        }
        EvalAltResult::ErrorParsing(ref inner, _) => {
            // A reserved (disabled) symbol surfaces at parse time — as a
            // reserved-symbol parse error, or as an improper-symbol lex error
            // when the symbol was explicitly disabled. Any other parse
            // failure is an ordinary runtime-kind error.
            if let rhai::ParseErrorType::Reserved(symbol) = inner {
                if denylist.contains(symbol) {
                    return ExecutionOutcome::Forbidden(symbol.clone());
                }
            }
            if let rhai::ParseErrorType::BadInput(rhai::LexError::ImproperSymbol(symbol, _)) =
                inner
            {
                if denylist.contains(symbol) {
                    return ExecutionOutcome::Forbidden(symbol.clone());
                }
            }
            ExecutionOutcome::Threw(err.to_string())
        }
        other => ExecutionOutcome::Threw(other.to_string()),
    }
}

/// A JSON snapshot of a captured value, for reporting in a verdict. Lossy by
/// design: callables and non-finite numbers have no JSON form and are
/// rendered as descriptive strings.
pub fn snapshot(value: &Dynamic) -> serde_json::Value {
    use serde_json::Value;

    if value.is_unit() {
        return Value::Null;
    }
    if let Ok(b) = value.as_bool() {
        return Value::Bool(b);
    }
    if let Ok(i) = value.as_int() {
        return Value::from(i);
    }
    if let Ok(f) = value.as_float() {
        return serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(f.to_string()));
    }
    if let Some(c) = value.clone().try_cast::<char>() {
        return Value::String(c.to_string());
    }
    if let Ok(s) = value.clone().into_immutable_string() {
        return Value::String(s.to_string());
    }
    if let Some(arr) = value.clone().try_cast::<rhai::Array>() {
        return Value::Array(arr.iter().map(snapshot).collect());
    }
    if let Some(map) = value.clone().try_cast::<rhai::Map>() {
        return Value::Object(
            map.iter()
                .map(|(k, v)| (k.to_string(), snapshot(v)))
                .collect(),
        );
    }
    if let Some(f) = value.clone().try_cast::<FnPtr>() {
        return Value::String(format!("<function {}>", f.fn_name()));
    }
    Value::String(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn executor() -> SandboxExecutor {
        SandboxExecutor::new(Denylist::default(), SandboxLimits::default())
    }

    fn budget() -> Duration {
        Duration::from_millis(1_000)
    }

    #[test]
    fn fixture_variables_are_visible_to_the_submission() {
        match executor().run("let base = 40;", "base + 2", budget()) {
            ExecutionOutcome::Returned(v) => assert_eq!(v.as_int(), Ok(42)),
            other => panic!("expected Returned, got {other:?}"),
        }
    }

    #[test]
    fn fixture_functions_are_visible_to_the_submission() {
        match executor().run("fn double(x) { x * 2 }", "double(21)", budget()) {
            ExecutionOutcome::Returned(v) => assert_eq!(v.as_int(), Ok(42)),
            other => panic!("expected Returned, got {other:?}"),
        }
    }

    #[test]
    fn thrown_errors_are_captured_not_propagated() {
        match executor().run("", "throw \"boom\"", budget()) {
            ExecutionOutcome::Threw(msg) => assert!(msg.contains("boom")),
            other => panic!("expected Threw, got {other:?}"),
        }
    }

    #[test]
    fn malformed_syntax_is_captured_as_a_throw() {
        assert!(matches!(
            executor().run("", "let = ;;;", budget()),
            ExecutionOutcome::Threw(_)
        ));
    }

    #[test]
    fn infinite_loop_times_out_within_a_bounded_margin() {
        let budget = Duration::from_millis(200);
        let start = Instant::now();
        let outcome = executor().run("", "loop { }", budget);
        assert!(matches!(outcome, ExecutionOutcome::TimedOut));
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn denylisted_binding_is_unreachable() {
        match executor().run("", "document", budget()) {
            ExecutionOutcome::Forbidden(name) => assert_eq!(name, "document"),
            other => panic!("expected Forbidden, got {other:?}"),
        }
    }

    #[test]
    fn denylisted_call_is_unreachable() {
        match executor().run("", "fetch(\"https://example.com\")", budget()) {
            ExecutionOutcome::Forbidden(name) => assert_eq!(name, "fetch"),
            other => panic!("expected Forbidden, got {other:?}"),
        }
    }

    #[test]
    fn dynamic_eval_is_a_denylist_violation() {
        match executor().run("", "eval(\"1 + 1\")", budget()) {
            ExecutionOutcome::Forbidden(name) => assert_eq!(name, "eval"),
            other => panic!("expected Forbidden, got {other:?}"),
        }
    }

    #[test]
    fn syntax_error_echoing_a_denylisted_name_is_a_throw_not_a_violation() {
        // "evaluated" contains "eval"; a learner typo must still grade as an
        // ordinary error, not a denylist violation.
        match executor().run("", "fn evaluated( {", budget()) {
            ExecutionOutcome::Threw(_) => {}
            other => panic!("expected Threw, got {other:?}"),
        }
    }

    #[test]
    fn thrown_text_cannot_impersonate_the_denylist_layer() {
        match executor().run("", "throw \"__forbidden_global__:window\"", budget()) {
            ExecutionOutcome::Threw(msg) => assert!(msg.contains("window")),
            other => panic!("expected Threw, got {other:?}"),
        }
    }

    #[test]
    fn contexts_are_disposable_and_share_nothing() {
        let exec = executor();
        assert!(matches!(
            exec.run("", "let leak = 7; leak", budget()),
            ExecutionOutcome::Returned(_)
        ));
        // A second run must not see `leak`.
        assert!(matches!(
            exec.run("", "leak", budget()),
            ExecutionOutcome::Threw(_)
        ));
    }

    #[test]
    fn timer_shims_fire_synchronously() {
        let fixture = "let hits = 0;";
        let submission = "set_timeout(|| hits += 1, 50); set_interval(|| hits += 1, 10, 3); hits";
        match executor().run(fixture, submission, budget()) {
            ExecutionOutcome::Returned(v) => assert_eq!(v.as_int(), Ok(4)),
            other => panic!("expected Returned, got {other:?}"),
        }
    }

    #[test]
    fn snapshot_renders_json_like_values() {
        let exec = executor();
        let ExecutionOutcome::Returned(v) =
            exec.run("", "#{n: 1, ok: true, xs: [1.5, \"s\"]}", budget())
        else {
            panic!("expected Returned");
        };
        assert_eq!(
            snapshot(&v),
            serde_json::json!({"n": 1, "ok": true, "xs": [1.5, "s"]})
        );
    }

    #[test]
    fn snapshot_renders_callables_as_descriptive_strings() {
        let ExecutionOutcome::Returned(v) = executor().run("", "|a| a", budget()) else {
            panic!("expected Returned");
        };
        assert!(snapshot(&v).as_str().unwrap().starts_with("<function"));
    }
}
