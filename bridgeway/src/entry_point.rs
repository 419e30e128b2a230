//! Application entry builder for registering packages and launching the
//! engine.
//!
//! ## Usage
//!
//! Configure app startup with packages and plugins, then launch the engine to
//! get a [`Host`].

use std::sync::Arc;

use crate::{
    config::HostConfig,
    entry_registry::{EntryRegistry, HostPackage},
    error::{LaunchError, RegistryError},
    host::Host,
    launcher::{Engine, Launcher},
    plugin::Plugin,
    readiness::ReadinessGate,
};

/// Builder for application entry configuration and startup.
pub struct EntryPoint<E: Engine> {
    engine: E,
    registry: EntryRegistry,
    config: HostConfig,
    registration_error: Option<RegistryError>,
}

impl<E: Engine> EntryPoint<E> {
    /// Creates a new entry point builder for `engine`.
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            registry: EntryRegistry::new(Arc::new(ReadinessGate::new())),
            config: HostConfig::default(),
            registration_error: None,
        }
    }

    /// Registers a plugin instance.
    pub fn plugin(mut self, plugin: impl Plugin) -> Self {
        let result = self.registry.register_plugin(plugin);
        self.record(result);
        self
    }

    /// Registers a shared plugin instance.
    pub fn plugin_arc<P: Plugin>(mut self, plugin: Arc<P>) -> Self {
        let result = self.registry.register_plugin_arc(plugin);
        self.record(result);
        self
    }

    /// Registers a package into the entry registry.
    pub fn package(mut self, package: impl HostPackage) -> Self {
        let result = self.registry.register_package(package);
        self.record(result);
        self
    }

    /// Overrides the host configuration for this entry.
    pub fn config(mut self, config: HostConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the readiness gate, so work can be queued before launch.
    pub fn gate(&self) -> Arc<ReadinessGate> {
        self.registry.gate().clone()
    }

    /// Installs logging and starts the launcher thread.
    ///
    /// Fails with the first registration error, if any.
    pub fn launch(self) -> Result<Host, LaunchError> {
        if let Some(err) = self.registration_error {
            return Err(err.into());
        }

        init_tracing(&self.config);
        if self.config.deadlock_detection {
            init_deadlock_detection();
        }

        let gate = self.registry.gate().clone();
        let plugins = self.registry.finish();
        let launcher =
            Launcher::spawn(self.engine, gate.clone(), &self.config.launcher_thread_name)?;
        Ok(Host::new(gate, plugins, Arc::new(self.config), launcher))
    }

    fn record(&mut self, result: Result<(), RegistryError>) {
        if let Err(err) = result {
            self.registration_error.get_or_insert(err);
        }
    }
}

fn init_deadlock_detection() {
    #[cfg(debug_assertions)]
    {
        use std::{sync::Once, thread, time::Duration};

        static INIT: Once = Once::new();
        INIT.call_once(|| {
            let spawned = thread::Builder::new()
                .name("deadlock-detector".into())
                .spawn(|| {
                    loop {
                        thread::sleep(Duration::from_secs(10));
                        let deadlocks = parking_lot::deadlock::check_deadlock();
                        if deadlocks.is_empty() {
                            continue;
                        }

                        tracing::error!("{} deadlocks detected", deadlocks.len());
                        for (idx, threads) in deadlocks.iter().enumerate() {
                            tracing::error!("Deadlock #{}", idx);
                            for thread in threads {
                                tracing::error!("Thread Id {:#?}", thread.thread_id());
                                tracing::error!("{:?}", thread.backtrace());
                            }
                        }
                    }
                });
            if let Err(err) = spawned {
                tracing::warn!("failed to spawn deadlock detector: {err}");
            }
        });
    }
}

fn init_tracing(config: &HostConfig) {
    let filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => match tracing_subscriber::EnvFilter::try_new(&config.default_log_filter) {
            Ok(filter) => filter,
            Err(_) => tracing_subscriber::EnvFilter::new("error"),
        },
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .try_init();
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
        time::Duration,
    };

    use super::EntryPoint;
    use crate::{
        config::HostConfig,
        entry_registry::{EntryRegistry, HostPackage},
        error::{LaunchError, RegistryError},
        launcher::{Engine, StageAdvancer},
        plugin::{Plugin, PluginContext, PluginResult},
        stage::Stage,
    };

    struct QuickEngine;

    impl Engine for QuickEngine {
        fn load_libraries(&mut self) -> Result<(), LaunchError> {
            Ok(())
        }

        fn run(&mut self, advancer: &StageAdvancer) -> Result<(), LaunchError> {
            advancer.advance(Stage::JniReady);
            advancer.advance(Stage::ProfileReady);
            advancer.advance(Stage::Running);
            while !advancer.wait_for_exit_request(Duration::from_millis(20)) {}
            Ok(())
        }
    }

    #[derive(Default)]
    struct Lifecycle {
        resumed: AtomicUsize,
        suspended: AtomicUsize,
        shutdown: AtomicUsize,
    }

    impl Plugin for Lifecycle {
        fn on_resumed(&self, _context: &PluginContext) -> PluginResult {
            self.resumed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn on_suspended(&self, _context: &PluginContext) -> PluginResult {
            self.suspended.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn on_shutdown(&self, _context: &PluginContext) -> PluginResult {
            self.shutdown.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Marker;

    impl Plugin for Marker {}

    struct TwoMarkers;

    impl HostPackage for TwoMarkers {
        fn register(self, registry: &mut EntryRegistry) -> Result<(), RegistryError> {
            registry.register_plugin(Marker)?;
            registry.register_plugin(Marker)
        }
    }

    fn quiet_config(name: &str) -> HostConfig {
        HostConfig {
            launcher_thread_name: name.to_owned(),
            deadlock_detection: false,
            ..HostConfig::default()
        }
    }

    #[test]
    fn host_drives_plugins_and_deferred_work() {
        let lifecycle = Arc::new(Lifecycle::default());
        let entry = EntryPoint::new(QuickEngine)
            .config(quiet_config("entry-test"))
            .plugin_arc(lifecycle.clone());

        let deferred = Arc::new(AtomicUsize::new(0));
        let hits = deferred.clone();
        entry.gate().run_at_stage(Stage::Running, "before-launch", move || {
            hits.fetch_add(1, Ordering::SeqCst);
        });

        let host = entry.launch().expect("host launches");
        assert!(host.wait_until(Stage::Running, Duration::from_secs(5)));
        assert_eq!(deferred.load(Ordering::SeqCst), 1);

        host.resume();
        host.suspend();
        assert!(host.plugin::<Lifecycle>().is_some());

        host.shutdown();
        host.shutdown();
        assert_eq!(lifecycle.resumed.load(Ordering::SeqCst), 1);
        assert_eq!(lifecycle.suspended.load(Ordering::SeqCst), 1);
        assert_eq!(lifecycle.shutdown.load(Ordering::SeqCst), 1);
        assert_eq!(host.stage(), Stage::Exited);
    }

    #[test]
    fn registration_errors_surface_at_launch() {
        let result = EntryPoint::new(QuickEngine)
            .config(quiet_config("entry-dup"))
            .package(TwoMarkers)
            .launch();
        assert!(matches!(
            result,
            Err(LaunchError::Registry(RegistryError::DuplicatePlugin(_)))
        ));
    }
}
