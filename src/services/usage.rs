//! Usage counter: records one invocation per metered response.

use async_trait::async_trait;
use dashmap::DashMap;

use crate::config::GrantSeed;
use crate::services::ServiceError;

/// One metered invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UsageEvent {
    pub interface_id: u64,
    pub user_id: u64,
}

#[async_trait]
pub trait UsageCounter: Send + Sync {
    /// Record one invocation of `interface_id` by `user_id`.
    async fn increment(&self, event: UsageEvent) -> Result<(), ServiceError>;
}

/// Remaining and consumed invocations for one (interface, user) pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Grant {
    pub left: u64,
    pub total: u64,
}

/// Usage counter held in process memory.
///
/// Each increment moves one unit from `left` to `total`. A pair with no grant
/// or no units left fails the increment.
#[derive(Debug, Default)]
pub struct InMemoryUsageCounter {
    grants: DashMap<UsageEvent, Grant>,
}

impl InMemoryUsageCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seeds(seeds: &[GrantSeed]) -> Self {
        let counter = Self::new();
        for seed in seeds {
            counter.grant(seed.interface_id, seed.user_id, seed.left);
        }
        counter
    }

    /// Add `left` invocations to a pair's budget.
    pub fn grant(&self, interface_id: u64, user_id: u64, left: u64) {
        let key = UsageEvent { interface_id, user_id };
        self.grants.entry(key).or_default().left += left;
    }

    pub fn get(&self, interface_id: u64, user_id: u64) -> Option<Grant> {
        self.grants
            .get(&UsageEvent { interface_id, user_id })
            .map(|g| *g.value())
    }
}

#[async_trait]
impl UsageCounter for InMemoryUsageCounter {
    async fn increment(&self, event: UsageEvent) -> Result<(), ServiceError> {
        let Some(mut grant) = self.grants.get_mut(&event) else {
            return Err(ServiceError::NotGranted {
                interface_id: event.interface_id,
                user_id: event.user_id,
            });
        };
        if grant.left == 0 {
            return Err(ServiceError::QuotaExhausted {
                interface_id: event.interface_id,
                user_id: event.user_id,
            });
        }
        grant.left -= 1;
        grant.total += 1;
        Ok(())
    }
}
