//! Premium feature gating.
//!
//! The accounting services never look at entitlements. Creation flows in the
//! surrounding application ask the `FeatureGate` before adding items, people
//! or storage locations; the gate asks the injected `EntitlementOracle`
//! whether premium is unlocked and otherwise applies the free-tier limits.

use log::info;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Source of truth for the premium purchase (store receipts live elsewhere)
pub trait EntitlementOracle: Send + Sync {
    fn is_premium_unlocked(&self) -> bool;
}

/// Fixed entitlement, for configuration-driven setups and tests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StaticEntitlement {
    pub premium: bool,
}

impl StaticEntitlement {
    pub fn free() -> Self {
        Self { premium: false }
    }

    pub fn premium() -> Self {
        Self { premium: true }
    }
}

impl EntitlementOracle for StaticEntitlement {
    fn is_premium_unlocked(&self) -> bool {
        self.premium
    }
}

/// Things the free tier only allows a limited number of
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LimitedResource {
    Materiel,
    Personne,
    Emplacement,
}

impl fmt::Display for LimitedResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LimitedResource::Materiel => write!(f, "items"),
            LimitedResource::Personne => write!(f, "people"),
            LimitedResource::Emplacement => write!(f, "storage locations"),
        }
    }
}

/// Free-tier limits, loaded from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FreeTierLimits {
    pub max_materiels: usize,
    pub max_personnes: usize,
    pub max_emplacements: usize,
}

impl Default for FreeTierLimits {
    fn default() -> Self {
        Self {
            max_materiels: 10,
            max_personnes: 10,
            max_emplacements: 3,
        }
    }
}

impl FreeTierLimits {
    pub fn limit_for(&self, resource: LimitedResource) -> usize {
        match resource {
            LimitedResource::Materiel => self.max_materiels,
            LimitedResource::Personne => self.max_personnes,
            LimitedResource::Emplacement => self.max_emplacements,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GateError {
    #[error("The free version is limited to {limit} {resource}; unlock premium to add more")]
    LimitReached { resource: LimitedResource, limit: usize },
}

#[derive(Clone)]
pub struct FeatureGate {
    oracle: Arc<dyn EntitlementOracle>,
    limits: FreeTierLimits,
}

impl FeatureGate {
    pub fn new(oracle: Arc<dyn EntitlementOracle>, limits: FreeTierLimits) -> Self {
        Self { oracle, limits }
    }

    pub fn is_premium(&self) -> bool {
        self.oracle.is_premium_unlocked()
    }

    /// Remaining slots for a resource, `None` when unlimited
    pub fn remaining(&self, resource: LimitedResource, current_count: usize) -> Option<usize> {
        if self.is_premium() {
            return None;
        }
        Some(self.limits.limit_for(resource).saturating_sub(current_count))
    }

    /// Check whether one more resource may be created
    pub fn check(&self, resource: LimitedResource, current_count: usize) -> Result<(), GateError> {
        match self.remaining(resource, current_count) {
            Some(0) => {
                let limit = self.limits.limit_for(resource);
                info!("🔒 GATE: {} limit of {} reached on the free tier", resource, limit);
                Err(GateError::LimitReached { resource, limit })
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Debug for FeatureGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureGate")
            .field("premium", &self.is_premium())
            .field("limits", &self.limits)
            .finish()
    }
}
