//! The set of collaborators the gateway is wired with.

use std::sync::Arc;

use crate::config::SeedConfig;
use crate::services::{
    IdentityStore, InMemoryIdentityStore, InMemoryInterfaceRegistry, InMemoryNonceStore,
    InMemoryUsageCounter, InterfaceRegistry, NonceStore, UsageCounter,
};

/// Trait objects handed to the admission pipeline and the metering layer.
#[derive(Clone)]
pub struct Collaborators {
    pub identity: Arc<dyn IdentityStore>,
    pub nonces: Arc<dyn NonceStore>,
    pub registry: Arc<dyn InterfaceRegistry>,
    pub usage: Arc<dyn UsageCounter>,
}

/// In-process collaborators built from `[seed]`.
///
/// Concrete handles are kept so the caller can sweep the nonce cache and
/// inspect remaining budgets.
#[derive(Clone, Default)]
pub struct InMemoryServices {
    pub identity: Arc<InMemoryIdentityStore>,
    pub nonces: Arc<InMemoryNonceStore>,
    pub registry: Arc<InMemoryInterfaceRegistry>,
    pub usage: Arc<InMemoryUsageCounter>,
}

impl InMemoryServices {
    pub fn from_seed(seed: &SeedConfig) -> Self {
        Self {
            identity: Arc::new(InMemoryIdentityStore::from_seeds(&seed.users)),
            nonces: Arc::new(InMemoryNonceStore::new()),
            registry: Arc::new(InMemoryInterfaceRegistry::from_seeds(&seed.interfaces)),
            usage: Arc::new(InMemoryUsageCounter::from_seeds(&seed.grants)),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            identity: self.identity.clone(),
            nonces: self.nonces.clone(),
            registry: self.registry.clone(),
            usage: self.usage.clone(),
        }
    }
}
