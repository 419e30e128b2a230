//! Collaborators the connectivity monitor talks to.

use thiserror::Error;

use super::{
    monitor::ConnectivityReceiver,
    types::{ConnectionChange, ConnectionSnapshot, StatusSignal},
};

/// Failures reported by a [`ConnectivityPlatform`].
#[derive(Debug, Error)]
pub enum ConnectivityError {
    /// The platform connectivity service is not reachable.
    #[error("connectivity service unavailable: {0}")]
    ServiceUnavailable(String),
    /// The app lacks a permission needed for the query.
    #[error("missing permission {0}")]
    PermissionDenied(&'static str),
    /// The change receiver could not be registered.
    #[error("failed to register connectivity receiver: {0}")]
    Registration(String),
}

/// OS connectivity services.
///
/// The monitor calls every method while holding its transition lock, so none
/// of them may call back into the monitor. In particular
/// [`register_receiver`](ConnectivityPlatform::register_receiver) must not
/// invoke [`ConnectivityReceiver::on_receive`] before returning.
pub trait ConnectivityPlatform: Send + Sync + 'static {
    /// Reads the current connectivity.
    fn query(&self) -> Result<ConnectionSnapshot, ConnectivityError>;

    /// Reads the DHCP gateway of the Wi-Fi link.
    fn wifi_gateway(&self) -> Result<u32, ConnectivityError>;

    /// Starts delivering connectivity changes to `receiver`.
    fn register_receiver(&self, receiver: ConnectivityReceiver) -> Result<(), ConnectivityError>;

    /// Stops delivering connectivity changes.
    fn unregister_receiver(&self);
}

/// Consumer of connectivity notifications, normally the engine.
pub trait ConnectivitySink: Send + Sync + 'static {
    /// The link type or subtype changed.
    fn connection_changed(&self, change: ConnectionChange);

    /// The network status changed.
    fn status_changed(&self, status: StatusSignal);
}
