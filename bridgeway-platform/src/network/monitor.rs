//! Connectivity state machine.
//!
//! The monitor registers the platform receiver only while the host is in the
//! foreground and only reports changes while someone listens. Every event runs
//! the actions of the state being left, then switches state.
//!
//! Changes are measured against what listeners were last told, so a change
//! that happens while the host is in the background is reported on the next
//! start.
//!
//! Notifications are queued during the transition and delivered in order
//! after the transition lock is released, so a sink may call back into the
//! monitor.

use std::{
    collections::VecDeque,
    fmt,
    sync::{Arc, Weak},
};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use super::{
    platform::{ConnectivityPlatform, ConnectivitySink},
    state::{ManagerEvent, ManagerState},
    types::{ConnectionChange, ConnectionSnapshot, StatusSignal},
};

#[derive(Clone, Copy, Debug)]
enum Emission {
    Connection(ConnectionChange),
    Status(StatusSignal),
}

struct Machine {
    state: ManagerState,
    receiver_registered: bool,
    /// What listeners were last told, `None` until listening begins while
    /// started.
    emitted: Option<ConnectionSnapshot>,
    outbox: VecDeque<Emission>,
    draining: bool,
}

impl Default for Machine {
    fn default() -> Self {
        Self {
            state: ManagerState::OffNoListeners,
            receiver_registered: false,
            emitted: None,
            outbox: VecDeque::new(),
            draining: false,
        }
    }
}

/// Tracks connectivity and forwards changes to a [`ConnectivitySink`].
pub struct ConnectivityMonitor {
    this: Weak<ConnectivityMonitor>,
    platform: Arc<dyn ConnectivityPlatform>,
    sink: Arc<dyn ConnectivitySink>,
    machine: Mutex<Machine>,
    snapshot: RwLock<ConnectionSnapshot>,
}

impl ConnectivityMonitor {
    /// Creates a monitor in [`ManagerState::OffNoListeners`].
    pub fn new(
        platform: Arc<dyn ConnectivityPlatform>,
        sink: Arc<dyn ConnectivitySink>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            this: this.clone(),
            platform,
            sink,
            machine: Mutex::new(Machine::default()),
            snapshot: RwLock::new(ConnectionSnapshot::UNKNOWN),
        })
    }

    /// Returns the current manager state.
    pub fn state(&self) -> ManagerState {
        self.machine.lock().state
    }

    /// Returns whether the platform receiver is registered.
    pub fn receiver_registered(&self) -> bool {
        self.machine.lock().receiver_registered
    }

    /// Returns the last refreshed reading, [`ConnectionSnapshot::UNKNOWN`]
    /// before the first start.
    pub fn current_snapshot(&self) -> ConnectionSnapshot {
        *self.snapshot.read()
    }

    /// Describes the last refreshed reading the way change notifications do.
    pub fn current_information(&self) -> ConnectionChange {
        self.describe(&self.current_snapshot())
    }

    /// Handles [`ManagerEvent::Start`].
    pub fn start(&self) -> bool {
        self.handle_event(ManagerEvent::Start)
    }

    /// Handles [`ManagerEvent::Stop`].
    pub fn stop(&self) -> bool {
        self.handle_event(ManagerEvent::Stop)
    }

    /// Handles [`ManagerEvent::EnableNotifications`].
    pub fn enable_notifications(&self) -> bool {
        self.handle_event(ManagerEvent::EnableNotifications)
    }

    /// Handles [`ManagerEvent::DisableNotifications`].
    pub fn disable_notifications(&self) -> bool {
        self.handle_event(ManagerEvent::DisableNotifications)
    }

    /// Enables or disables notifications unless they already are.
    ///
    /// Returns `false`, without logging, when nothing had to change.
    pub fn set_notifications(&self, enabled: bool) -> bool {
        let event = if enabled {
            ManagerEvent::EnableNotifications
        } else {
            ManagerEvent::DisableNotifications
        };
        self.transition(event, |state| state.has_listeners() != enabled)
    }

    /// Runs the transition for `event`.
    ///
    /// Returns `false`, with no side effects, if the event is not valid in the
    /// current state.
    pub fn handle_event(&self, event: ManagerEvent) -> bool {
        self.transition(event, |_| true)
    }

    fn transition(&self, event: ManagerEvent, wanted: impl FnOnce(ManagerState) -> bool) -> bool {
        {
            let mut machine = self.machine.lock();
            let current = machine.state;
            if !wanted(current) {
                return false;
            }
            let Some(next) = current.next(event) else {
                warn!(state = %current, %event, "ignoring connectivity event");
                return false;
            };
            self.perform_actions(&mut machine, current, event);
            machine.state = next;
            debug!(from = %current, to = %next, %event, "connectivity state changed");
        }
        self.drain_outbox();
        true
    }

    fn perform_actions(&self, machine: &mut Machine, state: ManagerState, event: ManagerEvent) {
        use ManagerEvent::*;
        use ManagerState::*;

        match (state, event) {
            (OffNoListeners, Start) => {
                self.refresh();
                self.register_receiver(machine);
            }
            (OnNoListeners, EnableNotifications) => {
                machine.emitted = Some(self.refresh());
                self.register_receiver(machine);
            }
            (OffWithListeners, Start) => {
                let snapshot = self.refresh();
                self.queue_changes(machine, snapshot);
                self.register_receiver(machine);
            }
            (OnNoListeners, ReceivedUpdate) => {
                self.refresh();
            }
            (OnWithListeners, ReceivedUpdate) => {
                let snapshot = self.refresh();
                self.queue_changes(machine, snapshot);
            }
            (OnNoListeners | OnWithListeners, Stop) => self.unregister_receiver(machine),
            (OnWithListeners | OffWithListeners, DisableNotifications) => machine.emitted = None,
            _ => {}
        }
    }

    fn refresh(&self) -> ConnectionSnapshot {
        let snapshot = match self.platform.query() {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!("connectivity query failed: {err}");
                ConnectionSnapshot::UNKNOWN
            }
        };
        *self.snapshot.write() = snapshot;
        snapshot
    }

    /// Queues what changed since listeners were last told. Listening that
    /// began while stopped only takes the baseline.
    fn queue_changes(&self, machine: &mut Machine, snapshot: ConnectionSnapshot) {
        let Some(previous) = machine.emitted.replace(snapshot) else {
            return;
        };
        let link_changed = snapshot.link_differs(&previous);
        if link_changed {
            let change = self.describe(&snapshot);
            machine.outbox.push_back(Emission::Connection(change));
        }
        if snapshot.status != previous.status {
            machine
                .outbox
                .push_back(Emission::Status(snapshot.status.into()));
        } else if link_changed {
            machine.outbox.push_back(Emission::Status(StatusSignal::Changed));
        }
    }

    fn describe(&self, snapshot: &ConnectionSnapshot) -> ConnectionChange {
        let is_wifi = snapshot.connection_type.is_wifi();
        let gateway = if is_wifi {
            self.platform.wifi_gateway().unwrap_or_else(|err| {
                warn!("wifi gateway query failed: {err}");
                0
            })
        } else {
            0
        };
        ConnectionChange {
            connection_type: snapshot.connection_type,
            subtype: snapshot.subtype,
            is_wifi,
            gateway,
        }
    }

    fn register_receiver(&self, machine: &mut Machine) {
        if machine.receiver_registered {
            return;
        }
        let receiver = ConnectivityReceiver {
            monitor: self.this.clone(),
        };
        match self.platform.register_receiver(receiver) {
            Ok(()) => machine.receiver_registered = true,
            Err(err) => warn!("{err}"),
        }
    }

    fn unregister_receiver(&self, machine: &mut Machine) {
        if !machine.receiver_registered {
            return;
        }
        self.platform.unregister_receiver();
        machine.receiver_registered = false;
    }

    fn drain_outbox(&self) {
        {
            let mut machine = self.machine.lock();
            if machine.draining || machine.outbox.is_empty() {
                return;
            }
            machine.draining = true;
        }

        let _guard = DrainGuard {
            machine: &self.machine,
        };
        loop {
            let next = {
                let mut machine = self.machine.lock();
                let next = machine.outbox.pop_front();
                if next.is_none() {
                    machine.draining = false;
                }
                next
            };
            match next {
                Some(Emission::Connection(change)) => self.sink.connection_changed(change),
                Some(Emission::Status(status)) => self.sink.status_changed(status),
                None => break,
            }
        }
    }
}

impl fmt::Debug for ConnectivityMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectivityMonitor")
            .field("state", &self.state())
            .field("snapshot", &self.current_snapshot())
            .finish_non_exhaustive()
    }
}

/// Releases the drain role if a sink panics mid-delivery.
struct DrainGuard<'a> {
    machine: &'a Mutex<Machine>,
}

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.machine.lock().draining = false;
        }
    }
}

/// Handle the platform uses to report connectivity changes.
#[derive(Clone)]
pub struct ConnectivityReceiver {
    monitor: Weak<ConnectivityMonitor>,
}

impl ConnectivityReceiver {
    /// Reports that connectivity changed.
    ///
    /// Returns `false` if the monitor is gone or not started.
    pub fn on_receive(&self) -> bool {
        match self.monitor.upgrade() {
            Some(monitor) => monitor.handle_event(ManagerEvent::ReceivedUpdate),
            None => false,
        }
    }
}

impl fmt::Debug for ConnectivityReceiver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectivityReceiver")
            .field("attached", &(self.monitor.strong_count() > 0))
            .finish()
    }
}
