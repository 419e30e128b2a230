//! Plugin lifecycle hooks for platform integrations.
//!
//! ## Usage
//!
//! Implement [`Plugin`] for a platform service and register it on the
//! [`EntryPoint`](crate::EntryPoint). The host calls the hooks as the app moves
//! between foreground, background and shutdown.

use std::{
    any::{Any, TypeId},
    error::Error,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use rustc_hash::FxHashMap;
use tracing::error;

use crate::{config::HostConfig, error::RegistryError, readiness::ReadinessGate, stage::Stage};

/// The result type used by plugin lifecycle hooks.
pub type PluginResult = Result<(), Box<dyn Error + Send + Sync>>;

/// Lifecycle hooks for platform plugins.
pub trait Plugin: Send + Sync + 'static {
    /// Returns the plugin name for logging and diagnostics.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Called when the host app comes to the foreground.
    fn on_resumed(&self, _context: &PluginContext) -> PluginResult {
        Ok(())
    }

    /// Called when the host app goes to the background.
    fn on_suspended(&self, _context: &PluginContext) -> PluginResult {
        Ok(())
    }

    /// Called once when the host shuts down.
    fn on_shutdown(&self, _context: &PluginContext) -> PluginResult {
        Ok(())
    }
}

/// Host state shared with plugins during lifecycle events.
#[derive(Clone, Debug)]
pub struct PluginContext {
    gate: Arc<ReadinessGate>,
    config: Arc<HostConfig>,
}

impl PluginContext {
    pub(crate) fn new(gate: Arc<ReadinessGate>, config: Arc<HostConfig>) -> Self {
        Self { gate, config }
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
}

/// Owns the registered plugins and fans lifecycle hooks out to them.
#[derive(Default)]
pub(crate) struct PluginHost {
    plugins: Vec<Arc<dyn Plugin>>,
    instances: FxHashMap<TypeId, Arc<dyn Any + Send + Sync>>,
    shutdown_called: AtomicBool,
}

impl PluginHost {
    pub(crate) fn register<P: Plugin>(&mut self, plugin: Arc<P>) -> Result<(), RegistryError> {
        let type_id = TypeId::of::<P>();
        if self.instances.contains_key(&type_id) {
            return Err(RegistryError::DuplicatePlugin(std::any::type_name::<P>()));
        }
        self.plugins.push(plugin.clone() as Arc<dyn Plugin>);
        self.instances
            .insert(type_id, plugin as Arc<dyn Any + Send + Sync>);
        Ok(())
    }

    pub(crate) fn get<T: Plugin>(&self) -> Option<Arc<T>> {
        let plugin = self.instances.get(&TypeId::of::<T>())?.clone();
        plugin.downcast::<T>().ok()
    }

    pub(crate) fn len(&self) -> usize {
        self.plugins.len()
    }

    pub(crate) fn resumed(&self, context: &PluginContext) {
        self.dispatch("resumed", context, Plugin::on_resumed);
    }

    pub(crate) fn suspended(&self, context: &PluginContext) {
        self.dispatch("suspended", context, Plugin::on_suspended);
    }

    pub(crate) fn shutdown(&self, context: &PluginContext) {
        if self.shutdown_called.swap(true, Ordering::AcqRel) {
            return;
        }
        self.dispatch("shutdown", context, Plugin::on_shutdown);
    }

    fn dispatch(
        &self,
        stage: &'static str,
        context: &PluginContext,
        handler: fn(&dyn Plugin, &PluginContext) -> PluginResult,
    ) {
        for plugin in &self.plugins {
            if let Err(err) = handler(plugin.as_ref(), context) {
                error!("Plugin '{}' {} hook failed: {}", plugin.name(), stage, err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use super::{Plugin, PluginContext, PluginHost, PluginResult};
    use crate::{config::HostConfig, error::RegistryError, readiness::ReadinessGate};

    #[derive(Default)]
    struct Counting {
        resumed: AtomicUsize,
        shutdowns: AtomicUsize,
    }

    impl Plugin for Counting {
        fn on_resumed(&self, _context: &PluginContext) -> PluginResult {
            self.resumed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn on_shutdown(&self, _context: &PluginContext) -> PluginResult {
            self.shutdowns.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Failing;

    impl Plugin for Failing {
        fn on_resumed(&self, _context: &PluginContext) -> PluginResult {
            Err("device unavailable".into())
        }
    }

    fn context() -> PluginContext {
        PluginContext::new(
            Arc::new(ReadinessGate::new()),
            Arc::new(HostConfig::default()),
        )
    }

    #[test]
    fn failing_hook_does_not_stop_other_plugins() {
        let mut host = PluginHost::default();
        let counting = Arc::new(Counting::default());
        host.register(Arc::new(Failing)).expect("first registration");
        host.register(counting.clone()).expect("first registration");

        host.resumed(&context());
        assert_eq!(counting.resumed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn shutdown_is_dispatched_once() {
        let mut host = PluginHost::default();
        let counting = Arc::new(Counting::default());
        host.register(counting.clone()).expect("first registration");

        let context = context();
        host.shutdown(&context);
        host.shutdown(&context);
        assert_eq!(counting.shutdowns.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn plugins_are_looked_up_by_type() {
        let mut host = PluginHost::default();
        let counting = Arc::new(Counting::default());
        host.register(counting.clone()).expect("first registration");

        let found = host.get::<Counting>().expect("registered");
        assert!(Arc::ptr_eq(&found, &counting));
        assert!(host.get::<Failing>().is_none());
    }

    #[test]
    fn duplicate_plugin_type_is_rejected() {
        let mut host = PluginHost::default();
        host.register(Arc::new(Failing)).expect("first registration");
        let err = host.register(Arc::new(Failing)).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicatePlugin(_)));
        assert_eq!(host.len(), 1);
    }
}
