//! Entry package registry for host startup.
//!
//! ## Usage
//!
//! Bundle platform plugins into a [`HostPackage`] and register it at startup.
use std::sync::Arc;

use crate::{
    error::RegistryError,
    plugin::{Plugin, PluginHost},
    readiness::ReadinessGate,
};

/// Registers plugins for a host entry point.
pub trait HostPackage {
    /// Registers this package into the provided registry.
    fn register(self, registry: &mut EntryRegistry) -> Result<(), RegistryError>;
}

/// Collects plugins for an application entry.
pub struct EntryRegistry {
    gate: Arc<ReadinessGate>,
    plugins: PluginHost,
}

impl EntryRegistry {
    pub(crate) fn new(gate: Arc<ReadinessGate>) -> Self {
        Self {
            gate,
            plugins: PluginHost::default(),
        }
    }

    /// Returns the readiness gate the host will drive.
    ///
    /// Packages use it to defer work until the engine is up.
    pub fn gate(&self) -> &Arc<ReadinessGate> {
        &self.gate
    }

    /// Registers a plugin instance.
    pub fn register_plugin<P: Plugin>(&mut self, plugin: P) -> Result<(), RegistryError> {
        self.plugins.register(Arc::new(plugin))
    }

    /// Registers a shared plugin instance, keeping a handle for the caller.
    pub fn register_plugin_arc<P: Plugin>(&mut self, plugin: Arc<P>) -> Result<(), RegistryError> {
        self.plugins.register(plugin)
    }

    /// Registers a package into the entry registry.
    pub fn register_package<P: HostPackage>(&mut self, package: P) -> Result<(), RegistryError> {
        package.register(self)
    }

    pub(crate) fn finish(self) -> PluginHost {
        self.plugins
    }
}

impl std::fmt::Debug for EntryRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryRegistry")
            .field("gate", &self.gate)
            .field("plugins", &self.plugins.len())
            .finish()
    }
}
