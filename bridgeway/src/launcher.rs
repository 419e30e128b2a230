//! Launcher thread that drives the engine through its stages.
//!
//! ## Usage
//!
//! Implement [`Engine`] for the native engine binding. The launcher loads the
//! libraries, hands a [`StageAdvancer`] to [`Engine::run`] and marks the engine
//! exited once `run` returns.

use std::{
    sync::Arc,
    thread::{self, JoinHandle},
    time::Duration,
};

use parking_lot::{Condvar, Mutex};
use tracing::{error, info, warn};

use crate::{error::LaunchError, readiness::ReadinessGate, stage::Stage};

/// The engine being embedded.
///
/// Both methods run on the launcher thread, the only thread that advances the
/// readiness gate during startup.
pub trait Engine: Send + 'static {
    /// Loads the native libraries.
    ///
    /// Return [`LaunchError::CorruptedLibraries`] when the libraries are
    /// damaged; the gate then moves to [`Stage::CorruptedLibraries`].
    fn load_libraries(&mut self) -> Result<(), LaunchError>;

    /// Runs the engine until it exits.
    ///
    /// The engine reports [`Stage::JniReady`], [`Stage::ProfileReady`] and
    /// [`Stage::Running`] through `advancer` as it comes up, and should return
    /// once [`StageAdvancer::exit_requested`] turns true.
    fn run(&mut self, advancer: &StageAdvancer) -> Result<(), LaunchError>;
}

#[derive(Default)]
struct ExitSignal {
    requested: Mutex<bool>,
    condvar: Condvar,
}

impl ExitSignal {
    fn request(&self) {
        *self.requested.lock() = true;
        self.condvar.notify_all();
    }

    fn is_requested(&self) -> bool {
        *self.requested.lock()
    }

    fn wait(&self, timeout: Duration) -> bool {
        let mut requested = self.requested.lock();
        if !*requested {
            let _ = self
                .condvar
                .wait_while_for(&mut requested, |requested| !*requested, timeout);
        }
        *requested
    }
}

/// Handle given to the engine for reporting stage transitions.
pub struct StageAdvancer {
    gate: Arc<ReadinessGate>,
    exit: Arc<ExitSignal>,
}

impl StageAdvancer {
    /// Moves the gate to `stage`, running the calls that were waiting for it.
    pub fn advance(&self, stage: Stage) {
        self.gate.advance(stage);
    }

    /// Returns the current stage.
    pub fn current(&self) -> Stage {
        self.gate.current()
    }

    /// Returns the readiness gate.
    pub fn gate(&self) -> &ReadinessGate {
        &self.gate
    }

    /// Returns whether the host asked the engine to exit.
    pub fn exit_requested(&self) -> bool {
        self.exit.is_requested()
    }

    /// Blocks until an exit is requested or `timeout` elapses.
    pub fn wait_for_exit_request(&self, timeout: Duration) -> bool {
        self.exit.wait(timeout)
    }
}

pub(crate) struct Launcher {
    handle: Mutex<Option<JoinHandle<()>>>,
    exit: Arc<ExitSignal>,
}

impl Launcher {
    pub(crate) fn spawn<E: Engine>(
        engine: E,
        gate: Arc<ReadinessGate>,
        thread_name: &str,
    ) -> Result<Self, LaunchError> {
        if !gate.compare_and_advance(Stage::Initial, Stage::Launched) {
            return Err(LaunchError::AlreadyLaunched(gate.current()));
        }

        let exit = Arc::new(ExitSignal::default());
        let advancer = StageAdvancer {
            gate: gate.clone(),
            exit: exit.clone(),
        };
        let handle = thread::Builder::new()
            .name(thread_name.to_owned())
            .spawn(move || run_engine(engine, advancer))
            .inspect_err(|_| gate.advance(Stage::Exited))?;

        Ok(Self {
            handle: Mutex::new(Some(handle)),
            exit,
        })
    }

    pub(crate) fn request_exit(&self) {
        self.exit.request();
    }

    /// Waits for the launcher thread. Returns `false` if it panicked.
    pub(crate) fn join(&self) -> bool {
        let Some(handle) = self.handle.lock().take() else {
            return true;
        };
        if handle.thread().id() == thread::current().id() {
            warn!("launcher thread cannot join itself; detaching");
            return true;
        }
        handle.join().is_ok()
    }
}

fn run_engine<E: Engine>(mut engine: E, advancer: StageAdvancer) {
    advancer.advance(Stage::LoaderReady);
    match engine.load_libraries() {
        Ok(()) => advancer.advance(Stage::LibsReady),
        Err(LaunchError::CorruptedLibraries(reason)) => {
            error!(%reason, "native libraries are corrupted");
            advancer.advance(Stage::CorruptedLibraries);
            return;
        }
        Err(err) => {
            error!("failed to load native libraries: {err}");
            advancer.advance(Stage::Exited);
            return;
        }
    }

    if let Err(err) = engine.run(&advancer) {
        error!("engine exited with an error: {err}");
    }
    advancer.advance(Stage::Exited);
    info!("engine exited");
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use super::{Engine, Launcher, StageAdvancer};
    use crate::{error::LaunchError, readiness::ReadinessGate, stage::Stage};

    struct BrokenLibraries;

    impl Engine for BrokenLibraries {
        fn load_libraries(&mut self) -> Result<(), LaunchError> {
            Err(LaunchError::CorruptedLibraries("libxul.so checksum".into()))
        }

        fn run(&mut self, _advancer: &StageAdvancer) -> Result<(), LaunchError> {
            unreachable!("run must not be reached without libraries")
        }
    }

    struct UntilExit;

    impl Engine for UntilExit {
        fn load_libraries(&mut self) -> Result<(), LaunchError> {
            Ok(())
        }

        fn run(&mut self, advancer: &StageAdvancer) -> Result<(), LaunchError> {
            advancer.advance(Stage::JniReady);
            advancer.advance(Stage::ProfileReady);
            advancer.advance(Stage::Running);
            while !advancer.wait_for_exit_request(Duration::from_millis(50)) {}
            Ok(())
        }
    }

    #[test]
    fn corrupted_libraries_stop_startup() {
        let gate = Arc::new(ReadinessGate::new());
        let launcher = Launcher::spawn(BrokenLibraries, gate.clone(), "test-broken")
            .expect("launcher spawns");
        assert!(launcher.join());
        assert!(gate.is(Stage::CorruptedLibraries));
    }

    #[test]
    fn engine_runs_until_exit_is_requested() {
        let gate = Arc::new(ReadinessGate::new());
        let launcher =
            Launcher::spawn(UntilExit, gate.clone(), "test-engine").expect("launcher spawns");

        assert!(gate.wait_for(Stage::Running, Duration::from_secs(5)));
        launcher.request_exit();
        assert!(launcher.join());
        assert!(gate.is(Stage::Exited));
    }

    #[test]
    fn second_launch_is_rejected() {
        let gate = Arc::new(ReadinessGate::with_stage(Stage::Running));
        let result = Launcher::spawn(UntilExit, gate.clone(), "test-twice");
        assert!(matches!(
            result,
            Err(LaunchError::AlreadyLaunched(Stage::Running))
        ));
    }
}
