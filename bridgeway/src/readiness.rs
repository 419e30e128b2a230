//! Readiness gate that defers work until the engine reaches a stage.
//!
//! ## Usage
//!
//! Queue calls into the engine before it is ready and let the launcher thread
//! flush them as the engine advances.
//!
//! ```
//! use std::sync::{
//!     Arc,
//!     atomic::{AtomicUsize, Ordering},
//! };
//!
//! use bridgeway::{ReadinessGate, Stage};
//!
//! let gate = ReadinessGate::new();
//! let calls = Arc::new(AtomicUsize::new(0));
//! let counter = calls.clone();
//!
//! gate.run_at_stage(Stage::Running, "attach", move || {
//!     counter.fetch_add(1, Ordering::SeqCst);
//! });
//! assert_eq!(calls.load(Ordering::SeqCst), 0);
//!
//! gate.advance(Stage::Running);
//! assert_eq!(calls.load(Ordering::SeqCst), 1);
//! ```

use std::{
    borrow::Cow,
    cell::RefCell,
    collections::VecDeque,
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU8, Ordering},
    },
    time::Duration,
};

use parking_lot::{Condvar, Mutex, ReentrantMutex};
use tracing::{debug, trace};

use crate::stage::Stage;

type DeferredOp = Box<dyn FnOnce() + Send + 'static>;

/// An operation waiting for a minimum stage.
pub struct DeferredCall {
    label: Cow<'static, str>,
    required: Stage,
    op: DeferredOp,
}

impl DeferredCall {
    fn new(
        label: impl Into<Cow<'static, str>>,
        required: Stage,
        op: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            label: label.into(),
            required,
            op: Box::new(op),
        }
    }

    /// Returns the label used to identify the operation in logs.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the minimum stage the operation waits for.
    pub fn required(&self) -> Stage {
        self.required
    }

    fn run(self) {
        trace!(call = %self.label, required = %self.required, "running deferred call");
        (self.op)();
    }
}

impl fmt::Debug for DeferredCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredCall")
            .field("label", &self.label)
            .field("required", &self.required)
            .finish_non_exhaustive()
    }
}

/// Tracks the current [`Stage`] and the calls waiting for a later one.
///
/// One thread owns the transitions (the launcher thread); any thread may read
/// the stage or queue work. Deferred calls run on the thread that advances the
/// stage, before the new stage is published, in the order they were queued.
///
/// The queue lock is re-entrant, so a deferred call may queue further work
/// from the advancing thread. Work queued this way that the new stage already
/// satisfies runs in the same flush.
pub struct ReadinessGate {
    current: AtomicU8,
    pending: ReentrantMutex<RefCell<VecDeque<DeferredCall>>>,
}

impl ReadinessGate {
    /// Creates a gate in [`Stage::Initial`].
    pub fn new() -> Self {
        Self::with_stage(Stage::Initial)
    }

    /// Creates a gate starting at `stage`.
    pub fn with_stage(stage: Stage) -> Self {
        Self {
            current: AtomicU8::new(stage.to_raw()),
            pending: ReentrantMutex::new(RefCell::new(VecDeque::new())),
        }
    }

    /// Returns the current stage.
    pub fn current(&self) -> Stage {
        Stage::from_raw(self.current.load(Ordering::Acquire))
    }

    /// Returns whether the current stage is exactly `stage`.
    pub fn is(&self, stage: Stage) -> bool {
        self.current() == stage
    }

    /// Returns whether the current stage ranks at least as high as `stage`.
    pub fn is_at_least(&self, stage: Stage) -> bool {
        self.current().satisfies(stage)
    }

    /// Returns whether the current stage ranks at most as high as `stage`.
    pub fn is_at_most(&self, stage: Stage) -> bool {
        stage.satisfies(self.current())
    }

    /// Returns whether the current rank lies within `low..=high`.
    pub fn is_between(&self, low: Stage, high: Stage) -> bool {
        let current = self.current();
        current.satisfies(low) && high.satisfies(current)
    }

    /// Returns the number of calls still waiting.
    pub fn pending_len(&self) -> usize {
        self.pending.lock().borrow().len()
    }

    /// Moves the gate to `stage`, flushing every call the new stage satisfies.
    ///
    /// Monotonicity is not checked: the exit stages deliberately rank lower
    /// than the stages before them.
    pub fn advance(&self, stage: Stage) {
        let pending = self.pending.lock();
        self.transition_locked(&pending, stage);
    }

    /// Moves the gate to `stage` only if it is currently at `expected`.
    ///
    /// Returns `false` without side effects when another transition won the
    /// race.
    pub fn compare_and_advance(&self, expected: Stage, stage: Stage) -> bool {
        let pending = self.pending.lock();
        let current = self.current();
        if current != expected {
            debug!(%expected, %current, target_stage = %stage, "stage transition skipped");
            return false;
        }
        self.transition_locked(&pending, stage);
        true
    }

    /// Runs `op` now if the current stage satisfies `required`, otherwise
    /// queues it until a transition does.
    ///
    /// Returns `true` when `op` ran on the calling thread.
    pub fn run_at_stage<F>(
        &self,
        required: Stage,
        label: impl Into<Cow<'static, str>>,
        op: F,
    ) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        let call = DeferredCall::new(label, required, op);
        {
            let pending = self.pending.lock();
            if !self.current().satisfies(required) {
                trace!(call = %call.label, %required, "queued deferred call");
                pending.borrow_mut().push_back(call);
                return false;
            }
        }
        call.run();
        true
    }

    /// Blocks until `stage` is reached or `timeout` elapses.
    ///
    /// Must not be called from the advancing thread, which would never reach
    /// the stage while blocked.
    pub fn wait_for(&self, stage: Stage, timeout: Duration) -> bool {
        let signal = Arc::new((Mutex::new(false), Condvar::new()));
        let notifier = signal.clone();
        self.run_at_stage(stage, "wait_for", move || {
            let (reached, condvar) = &*notifier;
            *reached.lock() = true;
            condvar.notify_all();
        });

        let (reached, condvar) = &*signal;
        let mut reached = reached.lock();
        if !*reached {
            let _ = condvar.wait_while_for(&mut reached, |reached| !*reached, timeout);
        }
        *reached
    }

    fn transition_locked(&self, pending: &RefCell<VecDeque<DeferredCall>>, stage: Stage) {
        let previous = self.current();
        let mut flushed = 0usize;
        loop {
            let ready = take_satisfied(&mut pending.borrow_mut(), stage);
            if ready.is_empty() {
                break;
            }
            flushed += ready.len();
            for call in ready {
                call.run();
            }
        }
        self.current.store(stage.to_raw(), Ordering::Release);
        debug!(from = %previous, to = %stage, flushed, "readiness stage advanced");
    }
}

impl Default for ReadinessGate {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ReadinessGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadinessGate")
            .field("current", &self.current())
            .field("pending", &self.pending_len())
            .finish()
    }
}

fn take_satisfied(queue: &mut VecDeque<DeferredCall>, stage: Stage) -> Vec<DeferredCall> {
    let mut ready = Vec::new();
    let mut waiting = VecDeque::with_capacity(queue.len());
    for call in queue.drain(..) {
        if stage.satisfies(call.required) {
            ready.push(call);
        } else {
            waiting.push_back(call);
        }
    }
    *queue = waiting;
    ready
}
