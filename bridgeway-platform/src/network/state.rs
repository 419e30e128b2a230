//! Connectivity manager states, events and the transition table.

use std::fmt;

/// Lifecycle state of the connectivity manager.
///
/// "On" means the host is in the foreground and the platform receiver may be
/// registered. "Listeners" means the engine asked for notifications.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ManagerState {
    /// Stopped, nobody listening.
    OffNoListeners,
    /// Stopped, with listeners waiting for the next start.
    OffWithListeners,
    /// Started, nobody listening.
    OnNoListeners,
    /// Started and delivering notifications.
    OnWithListeners,
}

/// Input driving the connectivity manager.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ManagerEvent {
    /// The host came to the foreground.
    Start,
    /// The host went to the background.
    Stop,
    /// A listener asked for notifications.
    EnableNotifications,
    /// The last listener went away.
    DisableNotifications,
    /// The platform reported a connectivity change.
    ReceivedUpdate,
}

impl ManagerState {
    /// Every state.
    pub const ALL: [ManagerState; 4] = [
        ManagerState::OffNoListeners,
        ManagerState::OffWithListeners,
        ManagerState::OnNoListeners,
        ManagerState::OnWithListeners,
    ];

    /// Returns the state reached by handling `event`, or `None` when the event
    /// is not valid here.
    pub const fn next(self, event: ManagerEvent) -> Option<ManagerState> {
        use ManagerEvent::*;
        use ManagerState::*;

        match (self, event) {
            (OffNoListeners, Start) => Some(OnNoListeners),
            (OffNoListeners, EnableNotifications) => Some(OffWithListeners),

            (OnNoListeners, Stop) => Some(OffNoListeners),
            (OnNoListeners, EnableNotifications) => Some(OnWithListeners),
            (OnNoListeners, ReceivedUpdate) => Some(OnNoListeners),

            (OnWithListeners, Stop) => Some(OffWithListeners),
            (OnWithListeners, DisableNotifications) => Some(OnNoListeners),
            (OnWithListeners, ReceivedUpdate) => Some(OnWithListeners),

            (OffWithListeners, Start) => Some(OnWithListeners),
            (OffWithListeners, DisableNotifications) => Some(OffNoListeners),

            _ => None,
        }
    }

    /// Returns whether the manager is started.
    pub const fn is_on(self) -> bool {
        matches!(self, ManagerState::OnNoListeners | ManagerState::OnWithListeners)
    }

    /// Returns whether notifications were requested.
    pub const fn has_listeners(self) -> bool {
        matches!(
            self,
            ManagerState::OffWithListeners | ManagerState::OnWithListeners
        )
    }
}

impl ManagerEvent {
    /// Every event.
    pub const ALL: [ManagerEvent; 5] = [
        ManagerEvent::Start,
        ManagerEvent::Stop,
        ManagerEvent::EnableNotifications,
        ManagerEvent::DisableNotifications,
        ManagerEvent::ReceivedUpdate,
    ];
}

impl fmt::Display for ManagerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl fmt::Display for ManagerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
