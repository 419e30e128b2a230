//! Host plugin that runs the connectivity monitor.
//!
//! ## Usage
//!
//! Register a [`NetworkPackage`] with a platform backend, then subscribe to
//! [`NetworkEvent`]s through the [`NetworkPlugin`] the host hands back.
use std::{fmt, sync::Arc};

use bridgeway::{
    EntryRegistry, EventDispatcher, HandlerId, HostPackage, Plugin, PluginContext, PluginResult,
    ReadinessGate, RegistryError, Stage,
};
use tracing::debug;

use super::{
    monitor::ConnectivityMonitor,
    platform::ConnectivityPlatform,
    sink::{DispatchSink, GatedSink, NetworkEvent, NetworkEventKind},
    types::ConnectionChange,
};

/// Settings of the network plugin.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct NetworkConfig {
    /// Stage the engine must reach before notifications are delivered.
    pub notify_after: Stage,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            notify_after: Stage::Running,
        }
    }
}

/// Keeps a [`ConnectivityMonitor`] in step with the host lifecycle and
/// subscribers.
///
/// The monitor starts when the host resumes and stops when it is suspended or
/// shut down. Notifications are enabled while at least one subscriber exists.
pub struct NetworkPlugin {
    monitor: Arc<ConnectivityMonitor>,
    dispatcher: Arc<EventDispatcher<NetworkEvent>>,
}

impl NetworkPlugin {
    /// Creates a plugin whose notifications wait on `gate`.
    pub fn new(
        platform: Arc<dyn ConnectivityPlatform>,
        gate: Arc<ReadinessGate>,
        config: NetworkConfig,
    ) -> Self {
        let dispatcher = Arc::new(EventDispatcher::new());
        let sink = GatedSink::new(
            gate,
            config.notify_after,
            DispatchSink::new(dispatcher.clone()),
        );
        Self {
            monitor: ConnectivityMonitor::new(platform, Arc::new(sink)),
            dispatcher,
        }
    }

    /// Returns the underlying monitor.
    pub fn monitor(&self) -> &Arc<ConnectivityMonitor> {
        &self.monitor
    }

    /// Describes the last known connection.
    pub fn current_information(&self) -> ConnectionChange {
        self.monitor.current_information()
    }

    /// Registers `handler` for events of `kind`.
    ///
    /// The first subscriber enables notifications.
    pub fn subscribe(
        &self,
        kind: NetworkEventKind,
        handler: impl Fn(&NetworkEvent) + Send + Sync + 'static,
    ) -> HandlerId {
        let id = self.dispatcher.register(kind, handler);
        self.sync_notifications();
        id
    }

    /// Removes a subscriber. Returns `false` if `id` was not subscribed.
    ///
    /// Removing the last subscriber disables notifications.
    pub fn unsubscribe(&self, id: HandlerId) -> bool {
        if !self.dispatcher.unregister(id) {
            return false;
        }
        self.sync_notifications();
        true
    }

    /// Brings the monitor in line with the subscriber count. Repeats until a
    /// pass changes nothing, since other threads may subscribe meanwhile.
    /// No lock is held while the monitor delivers, so handlers may
    /// unsubscribe.
    fn sync_notifications(&self) {
        while self
            .monitor
            .set_notifications(self.dispatcher.listener_count() > 0)
        {}
    }
}

impl Plugin for NetworkPlugin {
    fn name(&self) -> &'static str {
        "network"
    }

    fn on_resumed(&self, context: &PluginContext) -> PluginResult {
        debug!(stage = %context.stage(), "starting connectivity monitor");
        self.monitor.start();
        Ok(())
    }

    fn on_suspended(&self, _context: &PluginContext) -> PluginResult {
        if self.monitor.state().is_on() {
            self.monitor.stop();
        }
        Ok(())
    }

    fn on_shutdown(&self, _context: &PluginContext) -> PluginResult {
        if self.monitor.state().is_on() {
            self.monitor.stop();
        }
        Ok(())
    }
}

impl fmt::Debug for NetworkPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkPlugin")
            .field("monitor", &self.monitor)
            .field("subscribers", &self.dispatcher.listener_count())
            .finish()
    }
}

/// Package that registers a [`NetworkPlugin`].
pub struct NetworkPackage {
    platform: Arc<dyn ConnectivityPlatform>,
    config: NetworkConfig,
}

impl NetworkPackage {
    /// Creates a package backed by `platform`.
    pub fn new(platform: Arc<dyn ConnectivityPlatform>) -> Self {
        Self {
            platform,
            config: NetworkConfig::default(),
        }
    }

    /// Overrides the plugin settings.
    pub fn config(mut self, config: NetworkConfig) -> Self {
        self.config = config;
        self
    }
}

impl HostPackage for NetworkPackage {
    fn register(self, registry: &mut EntryRegistry) -> Result<(), RegistryError> {
        let plugin = NetworkPlugin::new(self.platform, registry.gate().clone(), self.config);
        registry.register_plugin(plugin)
    }
}

impl fmt::Debug for NetworkPackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkPackage")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{Arc, Weak, mpsc},
        thread,
        time::Duration,
    };

    use bridgeway::{
        Engine, EntryPoint, HandlerId, HostConfig, LaunchError, ReadinessGate, Stage,
        StageAdvancer,
    };
    use parking_lot::Mutex;

    use super::{NetworkConfig, NetworkPackage, NetworkPlugin};
    use crate::network::{
        sink::{NetworkEvent, NetworkEventKind},
        state::ManagerState,
        testing::{FakePlatform, wifi},
        types::{NetworkStatus, StatusSignal},
    };

    #[test]
    fn subscribers_toggle_notifications() {
        let platform = FakePlatform::new(wifi(NetworkStatus::Up));
        let gate = Arc::new(ReadinessGate::with_stage(Stage::Running));
        let plugin = NetworkPlugin::new(platform.clone(), gate, NetworkConfig::default());
        plugin.monitor().start();

        let first = plugin.subscribe(NetworkEventKind::StatusChanged, |_| {});
        let second = plugin.subscribe(NetworkEventKind::ConnectionChanged, |_| {});
        assert_eq!(plugin.monitor().state(), ManagerState::OnWithListeners);
        assert_eq!(platform.registrations(), 1);

        assert!(plugin.unsubscribe(first));
        assert_eq!(plugin.monitor().state(), ManagerState::OnWithListeners);
        assert!(!plugin.unsubscribe(first));

        assert!(plugin.unsubscribe(second));
        assert_eq!(plugin.monitor().state(), ManagerState::OnNoListeners);
    }

    #[test]
    fn handlers_unsubscribe_while_others_subscribe() {
        const ROUNDS: usize = 200;
        let platform = FakePlatform::new(wifi(NetworkStatus::Up));
        let gate = Arc::new(ReadinessGate::with_stage(Stage::Running));
        let plugin = Arc::new(NetworkPlugin::new(
            platform.clone(),
            gate,
            NetworkConfig::default(),
        ));
        plugin.monitor().start();

        let churn = {
            let plugin = plugin.clone();
            thread::spawn(move || {
                for _ in 0..ROUNDS {
                    let id = plugin.subscribe(NetworkEventKind::ConnectionChanged, |_| {});
                    plugin.unsubscribe(id);
                }
            })
        };

        for round in 0..ROUNDS {
            let slot: Arc<Mutex<Option<HandlerId>>> = Arc::new(Mutex::new(None));
            let own = slot.clone();
            let weak: Weak<NetworkPlugin> = Arc::downgrade(&plugin);
            let id = plugin.subscribe(NetworkEventKind::StatusChanged, move |_| {
                let id = own.lock().take();
                if let (Some(id), Some(plugin)) = (id, weak.upgrade()) {
                    plugin.unsubscribe(id);
                }
            });
            *slot.lock() = Some(id);

            let status = if round % 2 == 0 {
                NetworkStatus::Down
            } else {
                NetworkStatus::Up
            };
            platform.set_reading(wifi(status));
            platform.fire();

            let leftover = slot.lock().take();
            if let Some(id) = leftover {
                plugin.unsubscribe(id);
            }
        }
        churn.join().expect("subscriber thread panicked");

        assert_eq!(plugin.monitor().state(), ManagerState::OnNoListeners);
    }

    struct HeldEngine {
        release: mpsc::Receiver<()>,
    }

    impl Engine for HeldEngine {
        fn load_libraries(&mut self) -> Result<(), LaunchError> {
            Ok(())
        }

        fn run(&mut self, advancer: &StageAdvancer) -> Result<(), LaunchError> {
            advancer.advance(Stage::JniReady);
            advancer.advance(Stage::ProfileReady);
            let _ = self.release.recv();
            advancer.advance(Stage::Running);
            while !advancer.wait_for_exit_request(Duration::from_millis(20)) {}
            Ok(())
        }
    }

    #[test]
    fn notifications_wait_for_running_engine() {
        let platform = FakePlatform::new(wifi(NetworkStatus::Up));
        let (release, held) = mpsc::channel();
        let host = EntryPoint::new(HeldEngine { release: held })
            .config(HostConfig {
                launcher_thread_name: "network-test".to_owned(),
                deadlock_detection: false,
                ..HostConfig::default()
            })
            .package(NetworkPackage::new(platform.clone()))
            .launch()
            .expect("host launches");
        assert!(host.wait_until(Stage::ProfileReady, Duration::from_secs(5)));

        let plugin = host.plugin::<NetworkPlugin>().expect("network plugin");
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let id = plugin.subscribe(NetworkEventKind::StatusChanged, move |event| {
            sink.lock().push(*event);
        });
        assert_eq!(plugin.monitor().state(), ManagerState::OffWithListeners);

        host.suspend();
        assert_eq!(plugin.monitor().state(), ManagerState::OffWithListeners);
        assert_eq!(platform.unregistrations(), 0);

        host.resume();
        assert_eq!(plugin.monitor().state(), ManagerState::OnWithListeners);

        platform.set_reading(wifi(NetworkStatus::Down));
        assert!(platform.fire());
        assert!(seen.lock().is_empty());

        release.send(()).expect("engine waiting");
        assert!(host.wait_until(Stage::Running, Duration::from_secs(5)));
        assert_eq!(
            *seen.lock(),
            vec![NetworkEvent::StatusChanged(StatusSignal::Down)]
        );

        host.suspend();
        assert_eq!(plugin.monitor().state(), ManagerState::OffWithListeners);
        assert_eq!(platform.unregistrations(), 1);

        assert!(plugin.unsubscribe(id));
        host.shutdown();
        assert_eq!(plugin.monitor().state(), ManagerState::OffNoListeners);
        assert_eq!(platform.unregistrations(), 1);
    }
}
