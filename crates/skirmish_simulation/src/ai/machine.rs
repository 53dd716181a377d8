//! StateMachine — владелец состояний агента и guard'ов переходов
//!
//! Порядок проверок change_state: reentrancy → registration → (без force)
//! same-state, spam guard (MIN_TRANSITION_INTERVAL), can_transition_to.
//! Отклонённый переход не меняет ничего.

use super::states::{default_states, AgentState};
use super::{AIStateType, AgentContext};
use crate::components::StateSnapshot;
use crate::events::AgentEvent;
use std::collections::{HashMap, VecDeque};
use thiserror::Error;

/// Минимальный интервал между не-forced переходами (секунды)
pub const MIN_TRANSITION_INTERVAL: f32 = 0.1;
/// Сколько последних переходов хранит история
pub const TRANSITION_HISTORY_CAPACITY: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum TransitionError {
    #[error("transition requested while another transition is in progress")]
    Transitioning,
    #[error("transition requested {elapsed:.3}s after the previous one")]
    TooSoon { elapsed: f32 },
    #[error("already in state {0}")]
    SameState(AIStateType),
    #[error("transition {from} -> {to} is not allowed")]
    Disallowed { from: AIStateType, to: AIStateType },
    #[error("state {0} is not registered")]
    Unregistered(AIStateType),
    #[error("state machine is not initialized")]
    NotInitialized,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionRecord {
    pub from: AIStateType,
    pub to: AIStateType,
    pub timestamp: f32,
}

pub struct StateMachine {
    states: HashMap<AIStateType, Box<dyn AgentState>>,
    current: AIStateType,
    previous: Option<AIStateType>,
    initialized: bool,
    transitioning: bool,
    last_transition_at: Option<f32>,
    history: VecDeque<TransitionRecord>,
}

impl StateMachine {
    /// Машина со всеми четырьмя состояниями
    pub fn new() -> Self {
        Self::with_states(default_states())
    }

    pub fn with_states(states: Vec<Box<dyn AgentState>>) -> Self {
        let states = states
            .into_iter()
            .map(|state| (state.state_type(), state))
            .collect();

        Self {
            states,
            current: AIStateType::Patrol,
            previous: None,
            initialized: false,
            transitioning: false,
            last_transition_at: None,
            history: VecDeque::with_capacity(TRANSITION_HISTORY_CAPACITY),
        }
    }

    /// Входит в начальное Patrol (spam guard не взводится)
    pub fn initialize(&mut self, ctx: &mut AgentContext) -> Result<(), TransitionError> {
        if self.initialized {
            return Ok(());
        }
        let initial = AIStateType::Patrol;
        let state = self
            .states
            .get_mut(&initial)
            .ok_or(TransitionError::Unregistered(initial))?;

        self.current = initial;
        self.initialized = true;
        state.enter(ctx);
        ctx.publish(AgentEvent::StateEntered {
            agent: ctx.agent,
            state: initial,
        });
        crate::log(&format!("{}: AI initialized in {}", ctx.agent, initial));
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Применяет переход (с guard'ами, если не force)
    pub fn change_state(
        &mut self,
        to: AIStateType,
        force: bool,
        ctx: &mut AgentContext,
    ) -> Result<(), TransitionError> {
        if self.transitioning {
            return Err(TransitionError::Transitioning);
        }
        if !self.initialized {
            return Err(TransitionError::NotInitialized);
        }
        if !self.states.contains_key(&to) {
            crate::log_error(&format!("{}: state {} is not registered", ctx.agent, to));
            return Err(TransitionError::Unregistered(to));
        }

        let from = self.current;
        if !force {
            if from == to {
                return Err(TransitionError::SameState(to));
            }
            if let Some(last) = self.last_transition_at {
                let elapsed = ctx.now - last;
                if elapsed < MIN_TRANSITION_INTERVAL {
                    return Err(TransitionError::TooSoon { elapsed });
                }
            }
            let allowed = match self.states.get(&from) {
                Some(state) => state.can_transition_to(to, ctx),
                None => false,
            };
            if !allowed {
                return Err(TransitionError::Disallowed { from, to });
            }
        }

        self.transitioning = true;

        if let Some(state) = self.states.get_mut(&from) {
            state.exit(ctx);
        }
        ctx.publish(AgentEvent::StateExited {
            agent: ctx.agent,
            state: from,
        });

        self.previous = Some(from);
        self.current = to;

        if let Some(state) = self.states.get_mut(&to) {
            state.enter(ctx);
        }
        ctx.publish(AgentEvent::StateEntered {
            agent: ctx.agent,
            state: to,
        });
        ctx.publish(AgentEvent::StateChanged {
            agent: ctx.agent,
            from,
            to,
        });

        if self.history.len() == TRANSITION_HISTORY_CAPACITY {
            self.history.pop_front();
        }
        self.history.push_back(TransitionRecord {
            from,
            to,
            timestamp: ctx.now,
        });
        self.last_transition_at = Some(ctx.now);
        self.transitioning = false;

        crate::log(&format!(
            "{}: {} -> {}{}",
            ctx.agent,
            from,
            to,
            if force { " (forced)" } else { "" }
        ));
        Ok(())
    }

    /// Decision tick текущего состояния + запрошенный им переход
    pub fn update(&mut self, ctx: &mut AgentContext) {
        if !self.initialized {
            return;
        }
        let requested = match self.states.get_mut(&self.current) {
            Some(state) => state.update(ctx),
            None => None,
        };

        if let Some(next) = requested {
            if let Err(err) = self.change_state(next, false, ctx) {
                crate::log_with_level(
                    crate::LogLevel::Debug,
                    &format!("{}: transition to {} rejected: {}", ctx.agent, next, err),
                );
            }
        }
    }

    /// Возврат в предыдущее состояние (через обычные guard'ы)
    pub fn revert_to_previous_state(&mut self, ctx: &mut AgentContext) -> Result<(), TransitionError> {
        match self.previous {
            Some(previous) => self.change_state(previous, false, ctx),
            None => Err(TransitionError::SameState(self.current)),
        }
    }

    /// Forced Patrol (admin reset)
    pub fn force_reset(&mut self, ctx: &mut AgentContext) -> Result<(), TransitionError> {
        self.change_state(AIStateType::Patrol, true, ctx)
    }

    pub fn current_state(&self) -> AIStateType {
        self.current
    }

    pub fn previous_state(&self) -> Option<AIStateType> {
        self.previous
    }

    pub fn current_priority(&self) -> u8 {
        self.states
            .get(&self.current)
            .map_or(self.current.priority(), |state| state.priority())
    }

    pub fn is_transitioning(&self) -> bool {
        self.transitioning
    }

    pub fn last_transition_at(&self) -> Option<f32> {
        self.last_transition_at
    }

    /// Последние переходы, старые первыми
    pub fn transition_history(&self) -> impl Iterator<Item = &TransitionRecord> {
        self.history.iter()
    }

    pub fn contribute_snapshot(&self, snapshot: &mut StateSnapshot) {
        if let Some(state) = self.states.get(&self.current) {
            state.contribute_snapshot(snapshot);
        }
    }

    pub fn debug_info(&self) -> String {
        let history: Vec<String> = self
            .history
            .iter()
            .map(|record| format!("{}->{}@{:.2}", record.from, record.to, record.timestamp))
            .collect();
        format!(
            "state={} priority={} previous={} transitions=[{}]",
            self.current,
            self.current_priority(),
            self.previous.map_or("-".to_string(), |state| state.to_string()),
            history.join(", ")
        )
    }

    #[cfg(test)]
    pub(crate) fn set_transitioning_for_test(&mut self, value: bool) {
        self.transitioning = value;
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}
