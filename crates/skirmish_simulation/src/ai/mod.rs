//! AI decision-making module
//!
//! Finite state machine агента: Patrol → Chase → Attack / Retreat.
//! - state_type: тег состояния + приоритеты
//! - context: AgentContext (всё, что state видит за один tick)
//! - machine: StateMachine (guard'ы переходов, история, spam guard)
//! - states: реализации поведений
//!
//! Планирование (когда вызывать update) — забота AgentController.

pub mod context;
pub mod machine;
pub mod state_type;
pub mod states;

#[cfg(test)]
pub(crate) mod test_rig;

// Re-export основных типов
pub use context::{AgentContext, TargetMemory};
pub use machine::{
    StateMachine, TransitionError, TransitionRecord, MIN_TRANSITION_INTERVAL,
    TRANSITION_HISTORY_CAPACITY,
};
pub use state_type::{AIStateType, UnknownStateName};
pub use states::{AgentState, AttackState, ChaseState, PatrolState, RetreatState};
