//! Sinks that route connectivity notifications to the engine.

use std::{fmt, sync::Arc};

use bridgeway::{Event, EventDispatcher, ReadinessGate, Stage};

use super::{
    platform::ConnectivitySink,
    types::{ConnectionChange, StatusSignal},
};

/// A connectivity notification.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NetworkEvent {
    /// The link type or subtype changed.
    ConnectionChanged(ConnectionChange),
    /// The network status changed.
    StatusChanged(StatusSignal),
}

/// Kind of a [`NetworkEvent`], used to subscribe.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum NetworkEventKind {
    /// [`NetworkEvent::ConnectionChanged`].
    ConnectionChanged,
    /// [`NetworkEvent::StatusChanged`].
    StatusChanged,
}

impl Event for NetworkEvent {
    type Kind = NetworkEventKind;

    fn kind(&self) -> NetworkEventKind {
        match self {
            NetworkEvent::ConnectionChanged(_) => NetworkEventKind::ConnectionChanged,
            NetworkEvent::StatusChanged(_) => NetworkEventKind::StatusChanged,
        }
    }
}

/// Publishes notifications on an [`EventDispatcher`].
#[derive(Clone, Debug)]
pub struct DispatchSink {
    dispatcher: Arc<EventDispatcher<NetworkEvent>>,
}

impl DispatchSink {
    /// Creates a sink publishing on `dispatcher`.
    pub fn new(dispatcher: Arc<EventDispatcher<NetworkEvent>>) -> Self {
        Self { dispatcher }
    }
}

impl ConnectivitySink for DispatchSink {
    fn connection_changed(&self, change: ConnectionChange) {
        self.dispatcher
            .dispatch(&NetworkEvent::ConnectionChanged(change));
    }

    fn status_changed(&self, status: StatusSignal) {
        self.dispatcher.dispatch(&NetworkEvent::StatusChanged(status));
    }
}

/// Holds notifications back until the engine reaches a stage.
///
/// Notifications sent earlier are queued on the gate in order.
pub struct GatedSink<S> {
    gate: Arc<ReadinessGate>,
    stage: Stage,
    inner: Arc<S>,
}

impl<S: ConnectivitySink> GatedSink<S> {
    /// Wraps `inner`, delivering to it once `gate` satisfies `stage`.
    pub fn new(gate: Arc<ReadinessGate>, stage: Stage, inner: S) -> Self {
        Self {
            gate,
            stage,
            inner: Arc::new(inner),
        }
    }
}

impl<S: ConnectivitySink> ConnectivitySink for GatedSink<S> {
    fn connection_changed(&self, change: ConnectionChange) {
        let inner = self.inner.clone();
        self.gate
            .run_at_stage(self.stage, "network:connection-changed", move || {
                inner.connection_changed(change)
            });
    }

    fn status_changed(&self, status: StatusSignal) {
        let inner = self.inner.clone();
        self.gate
            .run_at_stage(self.stage, "network:status-changed", move || {
                inner.status_changed(status)
            });
    }
}

impl<S> fmt::Debug for GatedSink<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatedSink")
            .field("stage", &self.stage)
            .field("current", &self.gate.current())
            .finish_non_exhaustive()
    }
}
