//! Stable identifiers (agent, target) + physics layer mask.

use serde::{Deserialize, Serialize};
use std::fmt;

/// ID агента внутри Session (выдаётся спавнером, монотонно растёт)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub u32);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "agent#{}", self.0)
    }
}

/// Weak reference на цель (игрок, другой актор)
///
/// Агент НЕ владеет lifetime цели: живость проверяется через TargetRegistry
/// при каждом обращении.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TargetHandle(pub u64);

impl fmt::Display for TargetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "target#{}", self.0)
    }
}

/// Bitmask физических слоёв (obstacles, targets)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const NONE: LayerMask = LayerMask(0);
    pub const ALL: LayerMask = LayerMask(u32::MAX);

    /// true если хотя бы один бит пересекается
    pub fn intersects(self, other: LayerMask) -> bool {
        self.0 & other.0 != 0
    }
}
