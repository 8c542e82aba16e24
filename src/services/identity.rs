//! Identity store: resolves an access key to the calling account.

use async_trait::async_trait;
use dashmap::DashMap;

use crate::config::UserSeed;
use crate::services::ServiceError;

/// Account state relevant to admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountStatus {
    Active,
    Banned,
}

/// Quota snapshot carried with the account.
///
/// Not enforced before forwarding; the usage counter owns the budget.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Quota {
    pub allowed: u64,
    pub used: u64,
}

/// The account behind an access key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokeUser {
    pub id: u64,
    pub access_key: String,
    pub secret_key: String,
    pub status: AccountStatus,
    pub quota: Quota,
}

#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Look up the account owning `access_key`. `Ok(None)` means unknown key.
    async fn resolve_user(&self, access_key: &str) -> Result<Option<InvokeUser>, ServiceError>;
}

/// Identity store held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryIdentityStore {
    users: DashMap<String, InvokeUser>,
}

impl InMemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seeds(seeds: &[UserSeed]) -> Self {
        let store = Self::new();
        for seed in seeds {
            store.insert(InvokeUser {
                id: seed.id,
                access_key: seed.access_key.clone(),
                secret_key: seed.secret_key.clone(),
                status: if seed.banned {
                    AccountStatus::Banned
                } else {
                    AccountStatus::Active
                },
                quota: Quota::default(),
            });
        }
        store
    }

    pub fn insert(&self, user: InvokeUser) {
        self.users.insert(user.access_key.clone(), user);
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn resolve_user(&self, access_key: &str) -> Result<Option<InvokeUser>, ServiceError> {
        Ok(self.users.get(access_key).map(|r| r.value().clone()))
    }
}
