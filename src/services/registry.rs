//! Interface registry: maps (path, method) to a billable interface.

use async_trait::async_trait;
use axum::http::Method;
use dashmap::DashMap;

use crate::config::InterfaceSeed;
use crate::services::ServiceError;

/// A registered mock interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceDescriptor {
    pub id: u64,
    pub name: String,
    pub path: String,
    pub method: Method,
    /// Offline interfaces stay registered but are not callable.
    pub enabled: bool,
}

/// Outcome of a registry lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterfaceLookup {
    /// Path and method both match.
    Found(InterfaceDescriptor),
    /// The path is registered, but not for this method.
    MethodMismatch { allowed: Vec<Method> },
    NotFound,
}

#[async_trait]
pub trait InterfaceRegistry: Send + Sync {
    async fn resolve_interface(&self, path: &str, method: &Method) -> Result<InterfaceLookup, ServiceError>;
}

/// Registry held in process memory, keyed by exact path.
#[derive(Debug, Default)]
pub struct InMemoryInterfaceRegistry {
    by_path: DashMap<String, Vec<InterfaceDescriptor>>,
}

impl InMemoryInterfaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from config seeds. Seeds with an unparseable method are skipped.
    pub fn from_seeds(seeds: &[InterfaceSeed]) -> Self {
        let registry = Self::new();
        for seed in seeds {
            match seed.method.to_uppercase().parse::<Method>() {
                Ok(method) => registry.register(InterfaceDescriptor {
                    id: seed.id,
                    name: seed.name.clone(),
                    path: seed.path.clone(),
                    method,
                    enabled: seed.enabled,
                }),
                Err(_) => {
                    tracing::warn!(interface_id = seed.id, method = %seed.method, "Invalid interface method, skipping");
                }
            }
        }
        registry
    }

    pub fn register(&self, descriptor: InterfaceDescriptor) {
        let mut entry = self.by_path.entry(descriptor.path.clone()).or_default();
        entry.retain(|d| d.method != descriptor.method);
        entry.push(descriptor);
    }
}

#[async_trait]
impl InterfaceRegistry for InMemoryInterfaceRegistry {
    async fn resolve_interface(&self, path: &str, method: &Method) -> Result<InterfaceLookup, ServiceError> {
        let Some(entries) = self.by_path.get(path) else {
            return Ok(InterfaceLookup::NotFound);
        };
        match entries.iter().find(|d| &d.method == method) {
            Some(d) => Ok(InterfaceLookup::Found(d.clone())),
            None => Ok(InterfaceLookup::MethodMismatch {
                allowed: entries.iter().map(|d| d.method.clone()).collect(),
            }),
        }
    }
}
