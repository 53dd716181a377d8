//! SKIRMISH Simulation Core
//!
//! Authoritative AI врагов: perception → decision (FSM) → movement → combat.
//! Bevy 0.16 — только fixed-step scheduler и math (Vec2).
//!
//! Движок (navmesh, physics, projectiles, игроки) — внешние коллабораторы,
//! см. `collaborators`. Headless реализации: `sandbox`.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// Публичные модули
pub mod agent;
pub mod ai;
pub mod collaborators;
pub mod combat;
pub mod components;
pub mod events;
pub mod logger;
pub mod movement;
pub mod perception;
pub mod sandbox;
pub mod session;
pub mod shared;

// Re-export базовых типов для удобства
pub use agent::AgentController;
pub use ai::{AIStateType, StateMachine, TransitionError};
pub use collaborators::{
    Candidate, FireError, PathRequest, Pathfinding, PhysicsQuery, ProjectileSystem, Services,
    Shooter, ShotRequest, TargetRegistry,
};
pub use components::*;
pub use events::{AgentEvent, EventBus, EventKind, SubscriptionId};
pub use logger::*;
pub use sandbox::SandboxWorld;
pub use session::{create_headless_app, Session, SessionWorld, SimulationPlugin, SimulationSet};
pub use shared::{
    angle_between_degrees, bearing_degrees, delta_degrees, direction_from_degrees,
    lerp_degrees, normalize_degrees, AgentId, LayerMask, TargetHandle,
};

/// Детерминистичный RNG (seeded ChaCha8)
///
/// Один на агента: одинаковый seed сессии → одинаковые патрульные точки
/// и ошибки прицела.
#[derive(Debug, Clone)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Независимый поток для агента: seed сессии ⊕ (id × golden ratio)
    pub fn for_agent(session_seed: u64, agent: AgentId) -> Self {
        Self::new(session_seed ^ (agent.0 as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
    }
}
