//! Поведенческие состояния (Patrol / Chase / Attack / Retreat)
//!
//! Каждое состояние — отдельный struct с lifecycle enter → update* → exit.
//! Переход state только ЗАПРАШИВАЕТ (update возвращает Some(next)),
//! применяет его StateMachine после проверки guard'ов.

use crate::ai::{AIStateType, AgentContext};
use crate::components::StateSnapshot;

pub mod attack;
pub mod chase;
pub mod patrol;
pub mod retreat;

pub use attack::AttackState;
pub use chase::ChaseState;
pub use patrol::PatrolState;
pub use retreat::RetreatState;

/// Поведенческое состояние агента
pub trait AgentState: Send + Sync {
    fn state_type(&self) -> AIStateType;

    fn priority(&self) -> u8 {
        self.state_type().priority()
    }

    fn enter(&mut self, ctx: &mut AgentContext);

    /// Один decision tick; Some(next) — запрос перехода
    fn update(&mut self, ctx: &mut AgentContext) -> Option<AIStateType>;

    fn exit(&mut self, ctx: &mut AgentContext);

    /// Guard исходящего перехода
    fn can_transition_to(&self, next: AIStateType, ctx: &AgentContext) -> bool;

    /// State-specific часть snapshot'а (флаги)
    fn contribute_snapshot(&self, _snapshot: &mut StateSnapshot) {}
}

/// Полный набор состояний для StateMachine
pub fn default_states() -> Vec<Box<dyn AgentState>> {
    vec![
        Box::new(PatrolState::default()),
        Box::new(ChaseState::default()),
        Box::new(AttackState::default()),
        Box::new(RetreatState::default()),
    ]
}
