//! Resource pools
//!
//! Clamped numeric stocks (health, mana). Every operation clamps instead of failing
//! and reports the delta that was actually applied.

use serde::{Deserialize, Serialize};

/// Which stock a pool represents (used to tag `RESOURCE_CHANGE` events)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceKind {
    Health,
    Mana,
}

impl ResourceKind {
    pub fn tag(&self) -> &'static str {
        match self {
            ResourceKind::Health => "HEALTH",
            ResourceKind::Mana => "MANA",
        }
    }
}

/// A clamped stock with `0 <= current <= max`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResourcePool {
    kind: ResourceKind,
    current: f32,
    max: f32,
}

impl ResourcePool {
    /// Create a full pool. Negative or non-finite maximums are treated as zero.
    pub fn new(kind: ResourceKind, max: f32) -> Self {
        let max = if max.is_finite() { max.max(0.0) } else { 0.0 };
        Self {
            kind,
            current: max,
            max,
        }
    }

    pub fn health(max: f32) -> Self {
        Self::new(ResourceKind::Health, max)
    }

    pub fn mana(max: f32) -> Self {
        Self::new(ResourceKind::Mana, max)
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    /// Current as a fraction of max (0.0 for an empty-capacity pool)
    pub fn fraction(&self) -> f32 {
        if self.max > 0.0 {
            self.current / self.max
        } else {
            0.0
        }
    }

    pub fn is_depleted(&self) -> bool {
        self.current <= 0.0
    }

    pub fn is_full(&self) -> bool {
        self.current >= self.max
    }

    /// Add up to `amount`, clamped at max. Returns the amount actually added.
    pub fn heal(&mut self, amount: f32) -> f32 {
        let amount = sanitize(amount);
        let before = self.current;
        self.current = (self.current + amount).min(self.max);
        self.current - before
    }

    /// Remove up to `amount`, clamped at zero. Returns the amount actually removed.
    pub fn damage(&mut self, amount: f32) -> f32 {
        self.drain(amount)
    }

    /// Pay a cost, clamped at zero. Callers check affordability beforehand.
    pub fn spend(&mut self, amount: f32) -> f32 {
        self.drain(amount)
    }

    /// Refill to max. Returns the amount added.
    pub fn fill(&mut self) -> f32 {
        let before = self.current;
        self.current = self.max;
        self.current - before
    }

    fn drain(&mut self, amount: f32) -> f32 {
        let amount = sanitize(amount);
        let before = self.current;
        self.current = (self.current - amount).max(0.0);
        before - self.current
    }
}

/// Negative and NaN requests apply nothing.
fn sanitize(amount: f32) -> f32 {
    if amount.is_nan() {
        0.0
    } else {
        amount.max(0.0)
    }
}
