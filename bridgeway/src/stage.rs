//! Lifecycle stages of an embedded engine.
//!
//! ## Usage
//!
//! Compare stages by [`Stage::rank`] to decide which subsystems are available.

use std::fmt;

/// A point in the one-way startup and shutdown sequence of the engine.
///
/// Stages are ordered by [`rank`](Stage::rank), which counts how many
/// subsystems are available rather than when the stage happens. The exit and
/// failure stages reuse lower ranks: once the engine starts exiting, work that
/// needs a fully running engine must no longer be considered runnable.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Stage {
    /// Nothing has been started.
    Initial = 0,
    /// The launcher thread has been requested.
    Launched = 1,
    /// The library loader is available on the launcher thread.
    LoaderReady = 2,
    /// Native libraries are loaded.
    LibsReady = 3,
    /// Native bindings are attached and callable.
    JniReady = 4,
    /// The user profile is loaded.
    ProfileReady = 5,
    /// The engine is fully up.
    Running = 6,
    /// The engine is shutting down.
    Exiting = 7,
    /// The engine is shutting down to start again.
    Restarting = 8,
    /// The engine has exited.
    Exited = 9,
    /// The native libraries could not be loaded.
    CorruptedLibraries = 10,
}

impl Stage {
    /// Every stage, in declaration order.
    pub const ALL: [Stage; 11] = [
        Stage::Initial,
        Stage::Launched,
        Stage::LoaderReady,
        Stage::LibsReady,
        Stage::JniReady,
        Stage::ProfileReady,
        Stage::Running,
        Stage::Exiting,
        Stage::Restarting,
        Stage::Exited,
        Stage::CorruptedLibraries,
    ];

    /// Amount of functionality available in this stage.
    pub const fn rank(self) -> u8 {
        match self {
            Stage::Initial => 0,
            Stage::Launched => 1,
            Stage::LoaderReady => 2,
            Stage::LibsReady => 3,
            Stage::JniReady => 4,
            Stage::ProfileReady => 5,
            Stage::Running => 6,
            Stage::Exiting => 3,
            Stage::Restarting => 3,
            Stage::Exited => 0,
            Stage::CorruptedLibraries => 2,
        }
    }

    /// Returns whether `self` provides at least the functionality of `other`.
    pub const fn satisfies(self, other: Stage) -> bool {
        self.rank() >= other.rank()
    }

    /// Stable lowercase name used in logs.
    pub const fn name(self) -> &'static str {
        match self {
            Stage::Initial => "initial",
            Stage::Launched => "launched",
            Stage::LoaderReady => "loader-ready",
            Stage::LibsReady => "libs-ready",
            Stage::JniReady => "jni-ready",
            Stage::ProfileReady => "profile-ready",
            Stage::Running => "running",
            Stage::Exiting => "exiting",
            Stage::Restarting => "restarting",
            Stage::Exited => "exited",
            Stage::CorruptedLibraries => "corrupted-libraries",
        }
    }

    pub(crate) const fn to_raw(self) -> u8 {
        self as u8
    }

    pub(crate) fn from_raw(raw: u8) -> Stage {
        Stage::ALL
            .get(raw as usize)
            .copied()
            .unwrap_or(Stage::Initial)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
