//! Retreat — отходим от слишком близкой цели

use super::AgentState;
use crate::ai::{AIStateType, AgentContext};
use crate::events::AgentEvent;
use crate::shared::direction_from_degrees;
use bevy::math::Vec2;

/// Отход завершён на дистанции min_distance × SAFE_DISTANCE_FACTOR
const SAFE_DISTANCE_FACTOR: f32 = 1.5;
/// Период проверки «дошли, а цель всё ещё вплотную»
const RETREAT_RECHECK_INTERVAL: f32 = 0.5;
const FALLBACK_DIRECTIONS: usize = 8;

#[derive(Debug, Clone, Default)]
pub struct RetreatState {
    retreat_point: Option<Vec2>,
    reached: bool,
    last_check_at: f32,
}

impl RetreatState {
    pub fn retreat_point(&self) -> Option<Vec2> {
        self.retreat_point
    }

    /// Точка отхода: прямо от цели, иначе один из 8 веером вокруг неё
    fn plan_retreat(&mut self, ctx: &mut AgentContext) {
        self.reached = false;

        let Some(threat) = ctx.target_position().or(ctx.memory.last_known_position) else {
            self.retreat_point = None;
            self.reached = true;
            return;
        };

        let position = ctx.body.position;
        let away = (position - threat).normalize_or_zero();
        let away = if away == Vec2::ZERO { Vec2::X } else { away };
        let distance = ctx.config.retreat_distance;
        let ideal = position + away * distance;

        let mut chosen = ctx
            .navigation
            .sample_walkable(ideal, distance)
            .filter(|point| ctx.move_to(*point));

        if chosen.is_none() {
            let half = distance * 0.5;
            for i in 0..FALLBACK_DIRECTIONS {
                let dir = direction_from_degrees(i as f32 * 360.0 / FALLBACK_DIRECTIONS as f32);
                let probe = ideal + dir * half;
                if let Some(point) = ctx.navigation.sample_walkable(probe, half) {
                    if ctx.move_to(point) {
                        chosen = Some(point);
                        break;
                    }
                }
            }
        }

        match chosen {
            Some(point) => {
                self.retreat_point = Some(point);
                ctx.publish(AgentEvent::RetreatStarted {
                    agent: ctx.agent,
                    destination: point,
                });
            }
            None => {
                crate::log_warning(&format!(
                    "{}: no walkable retreat point, holding position",
                    ctx.agent
                ));
                self.retreat_point = None;
                self.reached = true;
            }
        }
    }
}

impl AgentState for RetreatState {
    fn state_type(&self) -> AIStateType {
        AIStateType::Retreat
    }

    fn enter(&mut self, ctx: &mut AgentContext) {
        ctx.movement.resume();
        ctx.movement.end_strafe();
        ctx.movement.set_speed(ctx.config.chase_speed);
        self.last_check_at = ctx.now;
        self.plan_retreat(ctx);
    }

    fn update(&mut self, ctx: &mut AgentContext) -> Option<AIStateType> {
        if !ctx.is_target_valid() {
            ctx.clear_target();
            return Some(AIStateType::Patrol);
        }

        let distance = ctx.distance_to_target();
        if distance >= ctx.config.min_distance_to_target * SAFE_DISTANCE_FACTOR {
            if distance <= ctx.config.attack_range && ctx.target_in_sight() {
                return Some(AIStateType::Attack);
            }
            if distance <= ctx.config.lose_target_range {
                return Some(AIStateType::Chase);
            }
            crate::log(&format!("{}: target out of range after retreat", ctx.agent));
            ctx.clear_target();
            return Some(AIStateType::Patrol);
        }

        if !self.reached && ctx.has_reached_destination() {
            self.reached = true;
        }

        if ctx.now - self.last_check_at >= RETREAT_RECHECK_INTERVAL {
            self.last_check_at = ctx.now;
            if self.reached && distance < ctx.config.min_distance_to_target {
                self.plan_retreat(ctx);
            }
        }

        None
    }

    fn exit(&mut self, ctx: &mut AgentContext) {
        ctx.movement.reset_speed();
    }

    fn can_transition_to(&self, next: AIStateType, _ctx: &AgentContext) -> bool {
        matches!(
            next,
            AIStateType::Attack | AIStateType::Chase | AIStateType::Patrol
        )
    }
}
