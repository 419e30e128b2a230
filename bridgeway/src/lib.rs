//! bridgeway is the lifecycle plumbing between a host application and an
//! embedded native engine.
//!
//! # Stages
//!
//! The engine moves through the [`Stage`]s of a one-way startup and shutdown
//! sequence. Each stage has a rank counting the subsystems it makes available;
//! the exit stages rank lower than a running engine.
//!
//! # Deferring work
//!
//! Calls into the engine made before it is ready are queued on the
//! [`ReadinessGate`] and flushed by the launcher thread as soon as the engine
//! reaches the stage they need.
//!
//! ```
//! use bridgeway::{ReadinessGate, Stage};
//!
//! let gate = ReadinessGate::new();
//! gate.run_at_stage(Stage::ProfileReady, "apply-prefs", || {
//!     // call into the engine
//! });
//! assert_eq!(gate.pending_len(), 1);
//!
//! gate.advance(Stage::Running);
//! assert_eq!(gate.pending_len(), 0);
//! ```
//!
//! # Hosting
//!
//! Implement [`Engine`] for the native binding, register platform plugins and
//! launch:
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use bridgeway::{Engine, EntryPoint, LaunchError, Stage, StageAdvancer};
//!
//! struct Native;
//!
//! impl Engine for Native {
//!     fn load_libraries(&mut self) -> Result<(), LaunchError> {
//!         Ok(())
//!     }
//!
//!     fn run(&mut self, advancer: &StageAdvancer) -> Result<(), LaunchError> {
//!         advancer.advance(Stage::JniReady);
//!         advancer.advance(Stage::ProfileReady);
//!         advancer.advance(Stage::Running);
//!         while !advancer.wait_for_exit_request(Duration::from_millis(100)) {}
//!         Ok(())
//!     }
//! }
//!
//! let host = EntryPoint::new(Native).launch()?;
//! host.resume();
//! host.shutdown();
//! # Ok::<(), LaunchError>(())
//! ```
#![deny(missing_docs, clippy::unwrap_used)]

pub mod config;
mod entry_point;
mod entry_registry;
pub mod error;
pub mod event;
mod host;
mod launcher;
mod plugin;
pub mod readiness;
mod stage;

pub use crate::{
    config::HostConfig,
    entry_point::EntryPoint,
    entry_registry::{EntryRegistry, HostPackage},
    error::{LaunchError, RegistryError},
    event::{Event, EventDispatcher, HandlerId},
    host::Host,
    launcher::{Engine, StageAdvancer},
    plugin::{Plugin, PluginContext, PluginResult},
    readiness::{DeferredCall, ReadinessGate},
    stage::Stage,
};
