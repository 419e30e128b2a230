//! The running host: owns the gate, the plugins and the launcher thread.

use std::{fmt, sync::Arc, time::Duration};

use tracing::{debug, info, warn};

use crate::{
    config::HostConfig,
    launcher::Launcher,
    plugin::{Plugin, PluginContext, PluginHost},
    readiness::ReadinessGate,
    stage::Stage,
};

/// A launched engine together with its platform plugins.
///
/// Created by [`EntryPoint::launch`](crate::EntryPoint::launch) and torn down
/// by [`Host::shutdown`], which also runs on drop.
pub struct Host {
    gate: Arc<ReadinessGate>,
    config: Arc<HostConfig>,
    plugins: PluginHost,
    launcher: Launcher,
}

impl Host {
    pub(crate) fn new(
        gate: Arc<ReadinessGate>,
        plugins: PluginHost,
        config: Arc<HostConfig>,
        launcher: Launcher,
    ) -> Self {
        info!(plugins = plugins.len(), "host launched");
        Self {
            gate,
            config,
            plugins,
            launcher,
        }
    }

    /// Returns the readiness gate of the engine.
    pub fn gate(&self) -> &Arc<ReadinessGate> {
        &self.gate
    }

    /// Returns the current engine stage.
    pub fn stage(&self) -> Stage {
        self.gate.current()
    }

    /// Returns the host configuration.
    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// Returns the registered plugin of type `T`.
    pub fn plugin<T: Plugin>(&self) -> Option<Arc<T>> {
        self.plugins.get::<T>()
    }

    /// Blocks until the engine reaches `stage` or `timeout` elapses.
    pub fn wait_until(&self, stage: Stage, timeout: Duration) -> bool {
        self.gate.wait_for(stage, timeout)
    }

    /// Notifies plugins that the app came to the foreground.
    pub fn resume(&self) {
        debug!(stage = %self.stage(), "host resumed");
        self.plugins.resumed(&self.context());
    }

    /// Notifies plugins that the app went to the background.
    pub fn suspend(&self) {
        debug!(stage = %self.stage(), "host suspended");
        self.plugins.suspended(&self.context());
    }

    /// Asks the engine to exit, shuts plugins down and joins the launcher.
    ///
    /// Calling it again is a no-op.
    pub fn shutdown(&self) {
        if self.gate.compare_and_advance(Stage::Running, Stage::Exiting) {
            info!("engine exiting");
        }
        self.launcher.request_exit();
        self.plugins.shutdown(&self.context());
        if !self.launcher.join() {
            warn!("launcher thread panicked");
        }
    }

    fn context(&self) -> PluginContext {
        PluginContext::new(self.gate.clone(), self.config.clone())
    }
}

impl Drop for Host {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host")
            .field("stage", &self.stage())
            .field("plugins", &self.plugins.len())
            .finish_non_exhaustive()
    }
}
