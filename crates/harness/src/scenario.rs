//! Scenario state machine
//!
//! Each scenario drives a fresh heap through the strict phase sequence
//! `Setup → Act → Assert → Teardown`. Phases only move forward; regressing
//! is a harness bug and panics. Assertions never panic; they record, so a
//! scenario always produces exactly one [`Report`].
//!
//! ## Ownership accounting
//!
//! The context keeps a ledger of references the scenario currently owns.
//! Allocation helpers register automatically; scenarios mark ownership
//! transfers explicitly (`disown` after handing a reference to a stealing
//! operation, `own` after an acquire). Teardown releases every ledger entry
//! exactly once, newest first, then takes a census:
//!
//! - a scenario demonstrating a documented leak declares it with
//!   [`ScenarioCtx::expect_leaked`], and the census must match;
//! - a scenario demonstrating the modeled use-after-free declares the
//!   expected teardown error with [`ScenarioCtx::expect_teardown_error`];
//! - anything else left alive after teardown fails the scenario.

use refmodel_core::{Error, ObjId, Report, Result};
use refmodel_heap::Heap;
use std::fmt;
use tracing::{debug, info};

/// Phases of a scenario, strictly ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    /// Allocate fresh, uniquely tagged objects and containers.
    Setup,
    /// Perform the mutation contract call (or the short deliberate sequence
    /// a multi-step hazard needs).
    Act,
    /// Compare observed refcounts and signals against the contract.
    Assert,
    /// Release everything the scenario still owns; census the heap.
    Teardown,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Setup => "setup",
            Phase::Act => "act",
            Phase::Assert => "assert",
            Phase::Teardown => "teardown",
        };
        f.write_str(name)
    }
}

/// A named verification scenario.
#[derive(Clone, Copy)]
pub struct Scenario {
    /// Unique name, used as the report key.
    pub name: &'static str,
    /// Scenario body. An `Err` return means an operation the scenario relied
    /// on failed unexpectedly; it is reported, not propagated.
    pub run: fn(&mut ScenarioCtx) -> Result<()>,
}

impl Scenario {
    /// Run this scenario on a fresh heap and produce its report.
    pub fn execute(&self) -> Report {
        info!(target: "refmodel::harness", scenario = self.name, "scenario start");
        let mut ctx = ScenarioCtx::new();
        if let Err(err) = (self.run)(&mut ctx) {
            ctx.fail(format!("scenario aborted: {err}"));
        }
        let report = ctx.finish(self.name);
        info!(
            target: "refmodel::harness",
            scenario = self.name,
            passed = report.passed,
            "scenario end"
        );
        report
    }
}

impl fmt::Debug for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scenario").field("name", &self.name).finish()
    }
}

/// Per-scenario execution context: heap, phase, ownership ledger, failures.
pub struct ScenarioCtx {
    heap: Heap,
    phase: Phase,
    owned: Vec<ObjId>,
    failures: Vec<String>,
    expected_leaks: usize,
    expected_teardown_error: Option<Error>,
}

impl ScenarioCtx {
    fn new() -> Self {
        Self {
            heap: Heap::new(),
            phase: Phase::Setup,
            owned: Vec::new(),
            failures: Vec::new(),
            expected_leaks: 0,
            expected_teardown_error: None,
        }
    }

    /// Advance to `phase`. Monotonic: regressing panics.
    pub fn begin(&mut self, phase: Phase) {
        assert!(
            phase >= self.phase,
            "harness bug: phase regressed from {} to {}",
            self.phase,
            phase
        );
        debug!(target: "refmodel::harness", phase = %phase, "phase");
        self.phase = phase;
    }

    /// Shared heap access.
    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    /// Mutable heap access for operations.
    pub fn heap_mut(&mut self) -> &mut Heap {
        &mut self.heap
    }

    // ========== Setup helpers (allocate and register) ==========

    /// Allocate a uniquely tagged string; the scenario owns the reference.
    pub fn alloc(&mut self, label: &str) -> ObjId {
        let id = self.heap.alloc_str(label);
        self.owned.push(id);
        id
    }

    /// Allocate a string with exact text; the scenario owns the reference.
    pub fn alloc_exact(&mut self, text: &str) -> ObjId {
        let id = self.heap.alloc_str_exact(text);
        self.owned.push(id);
        id
    }

    /// Allocate a fixed sequence; the scenario owns the reference.
    pub fn new_fixed(&mut self, len: usize) -> ObjId {
        let id = self.heap.new_fixed(len);
        self.owned.push(id);
        id
    }

    /// Allocate a growable sequence with `len` empty slots; the scenario
    /// owns the reference.
    pub fn new_grow(&mut self, len: usize) -> ObjId {
        let id = self.heap.new_grow(len);
        self.owned.push(id);
        id
    }

    /// Allocate a map; the scenario owns the reference.
    pub fn new_map(&mut self) -> ObjId {
        let id = self.heap.new_map();
        self.owned.push(id);
        id
    }

    /// Allocate a record; the scenario owns the reference.
    pub fn new_record(&mut self) -> ObjId {
        let id = self.heap.new_record();
        self.owned.push(id);
        id
    }

    // ========== Ownership ledger ==========

    /// Register one owned reference (after an acquire, or after receiving a
    /// strong result). Teardown will release it once.
    pub fn own(&mut self, id: ObjId) {
        self.owned.push(id);
    }

    /// Drop one ledger entry for `id` (after a stealing operation consumed
    /// the reference, on success or failure).
    pub fn disown(&mut self, id: ObjId) {
        match self.owned.iter().rposition(|owned| *owned == id) {
            Some(position) => {
                self.owned.remove(position);
            }
            None => self.fail(format!("ledger: disown of {id} which is not owned")),
        }
    }

    // ========== Declarations ==========

    /// Declare that this scenario demonstrates `count` leaked objects; the
    /// teardown census must find exactly that many.
    pub fn expect_leaked(&mut self, count: usize) {
        self.expected_leaks = count;
    }

    /// Declare that teardown must fail with exactly this error (the modeled
    /// use-after-free scenarios).
    pub fn expect_teardown_error(&mut self, error: Error) {
        self.expected_teardown_error = Some(error);
    }

    // ========== Assertions (record, never panic) ==========

    /// Record a failure.
    pub fn fail(&mut self, detail: impl Into<String>) {
        let detail = detail.into();
        debug!(target: "refmodel::harness", phase = %self.phase, detail = %detail, "assertion failed");
        self.failures.push(detail);
    }

    /// Assert the refcount of a live object.
    pub fn expect_refcount(&mut self, id: ObjId, expected: usize) {
        match self.heap.refcount(id) {
            Ok(observed) if observed == expected => {}
            Ok(observed) => self.fail(format!(
                "refcount of {id}: expected {expected}, observed {observed}"
            )),
            Err(err) => self.fail(format!(
                "refcount of {id}: expected {expected}, observed {err}"
            )),
        }
    }

    /// Assert the object is live.
    pub fn expect_live(&mut self, id: ObjId) {
        if !self.heap.is_live(id) {
            self.fail(format!("{id}: expected live, observed destroyed"));
        }
    }

    /// Assert the identity is stale (object destroyed).
    pub fn expect_dead(&mut self, id: ObjId) {
        if self.heap.is_live(id) {
            self.fail(format!("{id}: expected destroyed, observed live"));
        }
    }

    /// Assert two handles address the same object.
    pub fn expect_same(&mut self, what: &str, observed: ObjId, expected: ObjId) {
        if !observed.same(&expected) {
            self.fail(format!("{what}: expected {expected}, observed {observed}"));
        }
    }

    /// Assert equality of an observation against the contract.
    pub fn expect_eq<T: PartialEq + fmt::Debug>(&mut self, what: &str, observed: T, expected: T) {
        if observed != expected {
            self.fail(format!(
                "{what}: expected {expected:?}, observed {observed:?}"
            ));
        }
    }

    /// Assert an operation failed with exactly this error.
    pub fn expect_err<T: fmt::Debug>(&mut self, what: &str, result: Result<T>, expected: &Error) {
        match result {
            Err(observed) if observed == *expected => {}
            Err(observed) => self.fail(format!(
                "{what}: expected error {expected}, observed error {observed}"
            )),
            Ok(value) => self.fail(format!(
                "{what}: expected error {expected}, observed success {value:?}"
            )),
        }
    }

    // ========== Teardown ==========

    fn finish(mut self, name: &str) -> Report {
        self.begin(Phase::Teardown);
        let mut teardown_error: Option<Error> = None;
        while let Some(id) = self.owned.pop() {
            match self.heap.release(id) {
                Ok(_) => {}
                Err(err) => {
                    // One expected error may be declared; anything further
                    // (or an undeclared one) is a failure.
                    if teardown_error.is_none() {
                        teardown_error = Some(err);
                    } else {
                        self.fail(format!("teardown: second release failure on {id}"));
                    }
                }
            }
        }
        let expected = self.expected_teardown_error.take();
        match (expected, teardown_error) {
            (None, None) => {}
            (Some(expected), Some(observed)) if expected == observed => {}
            (Some(expected), observed) => self.fail(format!(
                "teardown: expected error {expected}, observed {observed:?}"
            )),
            (None, Some(observed)) => {
                self.fail(format!("teardown: unexpected release failure: {observed}"))
            }
        }
        let live = self.heap.live_count();
        if live != self.expected_leaks {
            let stray: Vec<String> = self
                .heap
                .live_ids()
                .into_iter()
                .map(|id| id.to_string())
                .collect();
            self.fail(format!(
                "census: expected {} leaked object(s), observed {} [{}]",
                self.expected_leaks,
                live,
                stray.join(", ")
            ));
        }
        if self.failures.is_empty() {
            Report::pass(name)
        } else {
            Report::fail(name, self.failures.join("; "))
        }
    }
}
