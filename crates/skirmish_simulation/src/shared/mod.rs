//! Shared domain — cross-cutting типы
//!
//! Содержит то, что используют все подсистемы:
//! - Identity (AgentId, TargetHandle)
//! - Physics layers (LayerMask)
//! - Angle helpers (bearing, shortest delta, lerp)

pub mod angles;
pub mod ids;

pub use angles::*;
pub use ids::*;
