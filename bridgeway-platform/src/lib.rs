//! Platform services for bridgeway hosts.
//!
//! ## Usage
//!
//! Register platform plugins like connectivity monitoring at app startup.
#![deny(missing_docs, clippy::unwrap_used)]

pub mod network;

use std::sync::Arc;

use bridgeway::{EntryRegistry, HostPackage, RegistryError};

pub use network::{NetworkConfig, NetworkPackage, NetworkPlugin};

/// Package that registers every platform plugin.
pub struct PlatformPackage {
    network: NetworkPackage,
}

impl PlatformPackage {
    /// Creates a platform package backed by `connectivity`.
    pub fn new(connectivity: Arc<dyn network::ConnectivityPlatform>) -> Self {
        Self {
            network: NetworkPackage::new(connectivity),
        }
    }

    /// Overrides the network plugin settings.
    pub fn network_config(mut self, config: NetworkConfig) -> Self {
        self.network = self.network.config(config);
        self
    }
}

impl HostPackage for PlatformPackage {
    fn register(self, registry: &mut EntryRegistry) -> Result<(), RegistryError> {
        registry.register_package(self.network)
    }
}

impl std::fmt::Debug for PlatformPackage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformPackage")
            .field("network", &self.network)
            .finish()
    }
}
