//! Named circuit breakers, created lazily on first use.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;

use crate::config::BreakerConfig;
use crate::resilience::circuit_breaker::{BreakerStatus, CircuitBreaker};

/// One breaker per dependency name, alive for the process lifetime.
#[derive(Debug, Default)]
pub struct BreakerRegistry {
    defaults: BreakerConfig,
    overrides: HashMap<String, BreakerConfig>,
    breakers: DashMap<String, Arc<CircuitBreaker>>,
}

impl BreakerRegistry {
    pub fn new(defaults: BreakerConfig) -> Self {
        Self {
            defaults,
            overrides: HashMap::new(),
            breakers: DashMap::new(),
        }
    }

    /// Use `config` instead of the defaults for `name`.
    pub fn with_override(mut self, name: impl Into<String>, config: BreakerConfig) -> Self {
        self.overrides.insert(name.into(), config);
        self
    }

    /// Breaker for `name`, creating it on first use.
    pub fn get_or_create(&self, name: &str) -> Arc<CircuitBreaker> {
        if let Some(existing) = self.breakers.get(name) {
            return existing.value().clone();
        }
        self.breakers
            .entry(name.to_string())
            .or_insert_with(|| {
                let config = self.overrides.get(name).cloned().unwrap_or_else(|| self.defaults.clone());
                tracing::debug!(dependency = %name, "Creating circuit breaker");
                Arc::new(CircuitBreaker::new(name, config))
            })
            .value()
            .clone()
    }

    pub fn get(&self, name: &str) -> Option<Arc<CircuitBreaker>> {
        self.breakers.get(name).map(|r| r.value().clone())
    }

    /// Status of every breaker created so far, sorted by name.
    pub fn statuses(&self) -> Vec<BreakerStatus> {
        // Clone out first so no shard lock is held while breakers lock.
        let breakers: Vec<Arc<CircuitBreaker>> =
            self.breakers.iter().map(|r| r.value().clone()).collect();
        let mut statuses: Vec<BreakerStatus> = breakers.iter().map(|b| b.status()).collect();
        statuses.sort_by(|a, b| a.name.cmp(&b.name));
        statuses
    }

    pub fn len(&self) -> usize {
        self.breakers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakers.is_empty()
    }
}
