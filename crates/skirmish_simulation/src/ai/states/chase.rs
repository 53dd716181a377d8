//! Chase — преследование цели
//!
//! Видим цель → обновляем last known position и идём к ней (вблизи —
//! strafe вокруг). Потеряли → идём в последнюю известную точку и ждём
//! alert_time, потом сдаёмся.

use super::AgentState;
use crate::ai::{AIStateType, AgentContext};
use crate::components::{SnapshotFlags, StateSnapshot};

/// Strafe начинается ближе чем attack_range × STRAFE_RANGE_FACTOR
const STRAFE_RANGE_FACTOR: f32 = 1.5;
/// Stopping distance в Chase = attack_range × CHASE_STOP_FACTOR
const CHASE_STOP_FACTOR: f32 = 0.8;

#[derive(Debug, Clone, Default)]
pub struct ChaseState {
    last_path_update_at: Option<f32>,
    /// Момент потери line of sight (None — цель видна)
    lost_since: Option<f32>,
}

impl ChaseState {
    pub fn lost_since(&self) -> Option<f32> {
        self.lost_since
    }

    fn is_path_update_due(&self, ctx: &AgentContext) -> bool {
        self.last_path_update_at
            .map_or(true, |last| ctx.now - last >= ctx.config.path_update_interval)
    }
}

impl AgentState for ChaseState {
    fn state_type(&self) -> AIStateType {
        AIStateType::Chase
    }

    fn enter(&mut self, ctx: &mut AgentContext) {
        ctx.movement.resume();
        ctx.movement.set_speed(ctx.config.chase_speed);
        ctx.movement
            .set_stopping_distance(ctx.config.attack_range * CHASE_STOP_FACTOR);

        if let Some(position) = ctx.target_position() {
            ctx.memory.last_known_position = Some(position);
        }
        self.last_path_update_at = None;
        self.lost_since = None;
    }

    fn update(&mut self, ctx: &mut AgentContext) -> Option<AIStateType> {
        if !ctx.is_target_valid() {
            crate::log(&format!("{}: chase target gone, back to patrol", ctx.agent));
            ctx.clear_target();
            return Some(AIStateType::Patrol);
        }

        let distance = ctx.distance_to_target();

        if ctx.target_in_sight() {
            let target_position = ctx.target_position()?;
            ctx.memory.last_known_position = Some(target_position);
            if self.lost_since.take().is_some() {
                crate::log(&format!("{}: target reacquired", ctx.agent));
            }

            if distance <= ctx.config.attack_range {
                return Some(AIStateType::Attack);
            }

            if self.is_path_update_due(ctx) {
                self.last_path_update_at = Some(ctx.now);
                if distance <= ctx.config.attack_range * STRAFE_RANGE_FACTOR {
                    ctx.strafe_around(target_position);
                } else {
                    ctx.move_to(target_position);
                }
            }
            return None;
        }

        let lost_since = match self.lost_since {
            Some(since) => since,
            None => {
                // Первый тик без цели: идём в последнюю известную точку
                self.lost_since = Some(ctx.now);
                if let Some(last_known) = ctx.memory.last_known_position {
                    ctx.move_to(last_known);
                }
                ctx.now
            }
        };

        if ctx.now - lost_since >= ctx.config.alert_time {
            crate::log(&format!(
                "{}: target lost for {:.1}s, giving up",
                ctx.agent,
                ctx.now - lost_since
            ));
            ctx.clear_target();
            return Some(AIStateType::Patrol);
        }

        None
    }

    fn exit(&mut self, ctx: &mut AgentContext) {
        ctx.movement.reset_speed();
        ctx.movement.reset_stopping_distance();
        ctx.movement.end_strafe();
        self.lost_since = None;
    }

    fn can_transition_to(&self, next: AIStateType, _ctx: &AgentContext) -> bool {
        matches!(
            next,
            AIStateType::Attack | AIStateType::Retreat | AIStateType::Patrol
        )
    }

    fn contribute_snapshot(&self, snapshot: &mut StateSnapshot) {
        snapshot.flags.insert(SnapshotFlags::CHASING);
    }
}
