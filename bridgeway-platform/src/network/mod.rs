//! Connectivity monitoring.
//!
//! A [`ConnectivityMonitor`] follows the host through the foreground and
//! background and reports link and status changes to a [`ConnectivitySink`]
//! while notifications are enabled. [`NetworkPlugin`] wires it into a
//! bridgeway host.

mod monitor;
mod platform;
mod plugin;
mod sink;
mod state;
#[cfg(test)]
mod testing;
mod types;

pub use self::{
    monitor::{ConnectivityMonitor, ConnectivityReceiver},
    platform::{ConnectivityError, ConnectivityPlatform, ConnectivitySink},
    plugin::{NetworkConfig, NetworkPackage, NetworkPlugin},
    sink::{DispatchSink, GatedSink, NetworkEvent, NetworkEventKind},
    state::{ManagerEvent, ManagerState},
    types::{
        ConnectionChange, ConnectionSnapshot, ConnectionSubType, ConnectionType, NetworkStatus,
        StatusSignal,
    },
};
