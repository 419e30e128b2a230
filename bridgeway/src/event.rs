//! Typed event fan-out.
//!
//! ## Usage
//!
//! Describe the events of a subsystem as an enum, give each variant a kind,
//! and register handlers per kind.
//!
//! ```
//! use bridgeway::event::{Event, EventDispatcher};
//!
//! #[derive(Debug)]
//! enum Power {
//!     Low(u8),
//!     Charging,
//! }
//!
//! #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
//! enum PowerKind {
//!     Low,
//!     Charging,
//! }
//!
//! impl Event for Power {
//!     type Kind = PowerKind;
//!
//!     fn kind(&self) -> PowerKind {
//!         match self {
//!             Power::Low(_) => PowerKind::Low,
//!             Power::Charging => PowerKind::Charging,
//!         }
//!     }
//! }
//!
//! let dispatcher = EventDispatcher::new();
//! dispatcher.register(PowerKind::Low, |event: &Power| println!("{event:?}"));
//! assert_eq!(dispatcher.dispatch(&Power::Low(5)), 1);
//! assert_eq!(dispatcher.dispatch(&Power::Charging), 0);
//! ```

use std::{
    fmt,
    hash::Hash,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tracing::trace;

/// An event that can be routed by kind.
pub trait Event: Send + Sync + 'static {
    /// Discriminant used to route the event.
    type Kind: Copy + Eq + Hash + fmt::Debug + Send + Sync + 'static;

    /// Returns the routing kind of this event.
    fn kind(&self) -> Self::Kind;
}

/// Identifies a registered handler.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct HandlerId(u64);

type Handler<E> = Arc<dyn Fn(&E) + Send + Sync>;
type HandlerList<E> = SmallVec<[(HandlerId, Handler<E>); 2]>;

/// Routes events to the handlers registered for their kind.
///
/// Handlers run on the dispatching thread, outside the registry lock, in
/// registration order. A handler may register or unregister handlers; the
/// change applies from the next dispatch.
pub struct EventDispatcher<E: Event> {
    next_id: AtomicU64,
    handlers: RwLock<FxHashMap<E::Kind, HandlerList<E>>>,
}

impl<E: Event> EventDispatcher<E> {
    /// Creates a dispatcher with no handlers.
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            handlers: RwLock::new(FxHashMap::default()),
        }
    }

    /// Registers `handler` for events of `kind`.
    pub fn register(
        &self,
        kind: E::Kind,
        handler: impl Fn(&E) + Send + Sync + 'static,
    ) -> HandlerId {
        let id = HandlerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers
            .write()
            .entry(kind)
            .or_default()
            .push((id, Arc::new(handler)));
        id
    }

    /// Removes a handler. Returns `false` if it was not registered.
    pub fn unregister(&self, id: HandlerId) -> bool {
        let mut handlers = self.handlers.write();
        let mut removed = false;
        handlers.retain(|_, list| {
            let before = list.len();
            list.retain(|(handler_id, _)| *handler_id != id);
            removed |= list.len() != before;
            !list.is_empty()
        });
        removed
    }

    /// Returns whether any handler listens for `kind`.
    pub fn has_listeners(&self, kind: E::Kind) -> bool {
        self.handlers.read().contains_key(&kind)
    }

    /// Returns the number of handlers across all kinds.
    pub fn listener_count(&self) -> usize {
        self.handlers.read().values().map(|list| list.len()).sum()
    }

    /// Delivers `event` to every handler of its kind.
    ///
    /// Returns the number of handlers invoked.
    pub fn dispatch(&self, event: &E) -> usize {
        let kind = event.kind();
        let targets: HandlerList<E> = match self.handlers.read().get(&kind) {
            Some(list) => list.clone(),
            None => {
                trace!(?kind, "no handlers for event");
                return 0;
            }
        };
        for (_, handler) in &targets {
            handler(event);
        }
        targets.len()
    }
}

impl<E: Event> Default for EventDispatcher<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Event> fmt::Debug for EventDispatcher<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("listeners", &self.listener_count())
            .finish()
    }
}
