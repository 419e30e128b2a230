//! Drives a simulated engine and network through a foreground session.

use std::{sync::Arc, thread, time::Duration};

use bridgeway::{Engine, EntryPoint, HostConfig, LaunchError, Stage, StageAdvancer};
use bridgeway_platform::{
    NetworkPlugin, PlatformPackage,
    network::{
        ConnectionSnapshot, ConnectionSubType, ConnectionType, ConnectivityError,
        ConnectivityPlatform, ConnectivityReceiver, NetworkEvent, NetworkEventKind, NetworkStatus,
    },
};
use parking_lot::Mutex;
use tracing::info;

/// Engine that takes a little while to boot.
struct SimulatedEngine;

impl Engine for SimulatedEngine {
    fn load_libraries(&mut self) -> Result<(), LaunchError> {
        thread::sleep(Duration::from_millis(50));
        Ok(())
    }

    fn run(&mut self, advancer: &StageAdvancer) -> Result<(), LaunchError> {
        for stage in [Stage::JniReady, Stage::ProfileReady, Stage::Running] {
            thread::sleep(Duration::from_millis(50));
            advancer.advance(stage);
        }
        while !advancer.wait_for_exit_request(Duration::from_millis(100)) {}
        Ok(())
    }
}

/// Connectivity backend whose readings are set by hand.
struct ScriptedNetwork {
    reading: Mutex<ConnectionSnapshot>,
    receiver: Mutex<Option<ConnectivityReceiver>>,
}

impl ScriptedNetwork {
    fn new(reading: ConnectionSnapshot) -> Arc<Self> {
        Arc::new(Self {
            reading: Mutex::new(reading),
            receiver: Mutex::new(None),
        })
    }

    fn switch_to(&self, reading: ConnectionSnapshot) {
        *self.reading.lock() = reading;
        let receiver = self.receiver.lock().clone();
        if let Some(receiver) = receiver {
            receiver.on_receive();
        }
    }
}

impl ConnectivityPlatform for ScriptedNetwork {
    fn query(&self) -> Result<ConnectionSnapshot, ConnectivityError> {
        Ok(*self.reading.lock())
    }

    fn wifi_gateway(&self) -> Result<u32, ConnectivityError> {
        // 192.168.1.1 in network byte order
        Ok(0x0101_a8c0)
    }

    fn register_receiver(&self, receiver: ConnectivityReceiver) -> Result<(), ConnectivityError> {
        *self.receiver.lock() = Some(receiver);
        Ok(())
    }

    fn unregister_receiver(&self) {
        *self.receiver.lock() = None;
    }
}

fn main() -> Result<(), LaunchError> {
    let network = ScriptedNetwork::new(ConnectionSnapshot::new(
        ConnectionType::Wifi,
        ConnectionSubType::Wifi,
        NetworkStatus::Up,
    ));

    let config = HostConfig {
        default_log_filter: "info".to_owned(),
        ..HostConfig::default()
    };
    let host = EntryPoint::new(SimulatedEngine)
        .config(config)
        .package(PlatformPackage::new(network.clone()))
        .launch()?;

    if let Some(plugin) = host.plugin::<NetworkPlugin>() {
        for kind in [NetworkEventKind::ConnectionChanged, NetworkEventKind::StatusChanged] {
            plugin.subscribe(kind, |event: &NetworkEvent| info!(?event, "network"));
        }
        info!(current = ?plugin.current_information(), "subscribed before engine start");
    }

    host.resume();
    network.switch_to(ConnectionSnapshot::new(
        ConnectionType::Cellular,
        ConnectionSubType::from_telephony_type(13),
        NetworkStatus::Up,
    ));

    if !host.wait_until(Stage::Running, Duration::from_secs(5)) {
        info!(stage = %host.stage(), "engine did not reach running");
    }

    network.switch_to(ConnectionSnapshot::new(
        ConnectionType::None,
        ConnectionSubType::Unknown,
        NetworkStatus::Down,
    ));

    host.suspend();
    network.switch_to(ConnectionSnapshot::new(
        ConnectionType::Wifi,
        ConnectionSubType::Wifi,
        NetworkStatus::Up,
    ));
    host.resume();

    host.shutdown();
    info!(stage = %host.stage(), "done");
    Ok(())
}
