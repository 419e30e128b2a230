//! In-memory platform and sink used by the unit tests.

use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use parking_lot::Mutex;

use super::{
    monitor::ConnectivityReceiver,
    platform::{ConnectivityError, ConnectivityPlatform, ConnectivitySink},
    types::{
        ConnectionChange, ConnectionSnapshot, ConnectionSubType, ConnectionType, NetworkStatus,
        StatusSignal,
    },
};

pub(crate) fn wifi(status: NetworkStatus) -> ConnectionSnapshot {
    ConnectionSnapshot::new(ConnectionType::Wifi, ConnectionSubType::Wifi, status)
}

pub(crate) fn cellular(subtype: ConnectionSubType, status: NetworkStatus) -> ConnectionSnapshot {
    ConnectionSnapshot::new(ConnectionType::Cellular, subtype, status)
}

pub(crate) struct FakePlatform {
    reading: Mutex<Option<ConnectionSnapshot>>,
    gateway: Mutex<Result<u32, &'static str>>,
    receiver: Mutex<Option<ConnectivityReceiver>>,
    fail_registrations: AtomicBool,
    queries: AtomicUsize,
    registrations: AtomicUsize,
    unregistrations: AtomicUsize,
}

impl FakePlatform {
    pub(crate) fn new(reading: ConnectionSnapshot) -> Arc<Self> {
        Arc::new(Self {
            reading: Mutex::new(Some(reading)),
            gateway: Mutex::new(Ok(0)),
            receiver: Mutex::new(None),
            fail_registrations: AtomicBool::new(false),
            queries: AtomicUsize::new(0),
            registrations: AtomicUsize::new(0),
            unregistrations: AtomicUsize::new(0),
        })
    }

    pub(crate) fn set_reading(&self, reading: ConnectionSnapshot) {
        *self.reading.lock() = Some(reading);
    }

    pub(crate) fn fail_queries(&self) {
        *self.reading.lock() = None;
    }

    pub(crate) fn set_gateway(&self, gateway: Result<u32, &'static str>) {
        *self.gateway.lock() = gateway;
    }

    pub(crate) fn fail_registrations(&self, fail: bool) {
        self.fail_registrations.store(fail, Ordering::SeqCst);
    }

    /// Delivers a change through the registered receiver, like the OS would.
    pub(crate) fn fire(&self) -> bool {
        let receiver = self.receiver.lock().clone();
        receiver.is_some_and(|receiver| receiver.on_receive())
    }

    pub(crate) fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub(crate) fn registrations(&self) -> usize {
        self.registrations.load(Ordering::SeqCst)
    }

    pub(crate) fn unregistrations(&self) -> usize {
        self.unregistrations.load(Ordering::SeqCst)
    }
}

impl ConnectivityPlatform for FakePlatform {
    fn query(&self) -> Result<ConnectionSnapshot, ConnectivityError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        (*self.reading.lock())
            .ok_or_else(|| ConnectivityError::PermissionDenied("ACCESS_NETWORK_STATE"))
    }

    fn wifi_gateway(&self) -> Result<u32, ConnectivityError> {
        (*self.gateway.lock()).map_err(|err| ConnectivityError::ServiceUnavailable(err.into()))
    }

    fn register_receiver(&self, receiver: ConnectivityReceiver) -> Result<(), ConnectivityError> {
        if self.fail_registrations.load(Ordering::SeqCst) {
            return Err(ConnectivityError::Registration("receiver rejected".into()));
        }
        self.registrations.fetch_add(1, Ordering::SeqCst);
        *self.receiver.lock() = Some(receiver);
        Ok(())
    }

    fn unregister_receiver(&self) {
        self.unregistrations.fetch_add(1, Ordering::SeqCst);
        *self.receiver.lock() = None;
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Recorded {
    Connection(ConnectionChange),
    Status(StatusSignal),
}

#[derive(Default)]
pub(crate) struct RecordingSink {
    recorded: Mutex<Vec<Recorded>>,
}

impl RecordingSink {
    pub(crate) fn take(&self) -> Vec<Recorded> {
        std::mem::take(&mut *self.recorded.lock())
    }
}

impl ConnectivitySink for RecordingSink {
    fn connection_changed(&self, change: ConnectionChange) {
        self.recorded.lock().push(Recorded::Connection(change));
    }

    fn status_changed(&self, status: StatusSignal) {
        self.recorded.lock().push(Recorded::Status(status));
    }
}
