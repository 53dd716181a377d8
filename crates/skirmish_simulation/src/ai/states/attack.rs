//! Attack — стоим, целимся, стреляем
//!
//! Перезарядка только на пустом магазине. Цель ближе min distance →
//! Retreat, дальше attack_range → Chase, без line of sight дольше
//! attack_retry_interval → Chase.

use super::AgentState;
use crate::ai::{AIStateType, AgentContext};
use crate::components::{SnapshotFlags, StateSnapshot};
use crate::events::AgentEvent;

#[derive(Debug, Clone, Default)]
pub struct AttackState {
    last_attack_at: Option<f32>,
    last_sight_at: f32,
}

impl AttackState {
    fn is_attack_due(&self, ctx: &AgentContext) -> bool {
        self.last_attack_at
            .map_or(true, |last| ctx.now - last >= ctx.config.attack_interval)
    }

    fn engage(&mut self, ctx: &mut AgentContext, target_position: bevy::math::Vec2) {
        ctx.aim_at(target_position);

        if ctx.combat.is_reloading() {
            return;
        }

        if ctx.combat.ammo() == 0 {
            if ctx.combat.start_reload(ctx.now) {
                ctx.publish(AgentEvent::ReloadStarted { agent: ctx.agent });
            }
            return;
        }

        if !self.is_attack_due(ctx) {
            return;
        }

        let origin = ctx.body.position;
        if ctx.combat.try_shoot(ctx.now, origin) {
            self.last_attack_at = Some(ctx.now);
            ctx.publish(AgentEvent::Shoot {
                agent: ctx.agent,
                origin,
                angle: ctx.combat.look_angle(),
            });
        }
    }
}

impl AgentState for AttackState {
    fn state_type(&self) -> AIStateType {
        AIStateType::Attack
    }

    fn enter(&mut self, ctx: &mut AgentContext) {
        ctx.movement.end_strafe();
        ctx.movement.set_speed(ctx.config.attack_speed);
        ctx.movement.stop();
        self.last_sight_at = ctx.now;
        self.last_attack_at = None;

        ctx.publish(AgentEvent::AttackStarted {
            agent: ctx.agent,
            target: ctx.target(),
        });
    }

    fn update(&mut self, ctx: &mut AgentContext) -> Option<AIStateType> {
        if !ctx.is_target_valid() {
            crate::log(&format!("{}: attack target gone, back to patrol", ctx.agent));
            ctx.clear_target();
            return Some(AIStateType::Patrol);
        }

        let distance = ctx.distance_to_target();
        if distance < ctx.config.min_distance_to_target {
            return Some(AIStateType::Retreat);
        }
        if distance > ctx.config.attack_range {
            return Some(AIStateType::Chase);
        }

        if ctx.target_in_sight() {
            self.last_sight_at = ctx.now;
            let target_position = ctx.target_position()?;
            ctx.memory.last_known_position = Some(target_position);
            self.engage(ctx, target_position);
        } else if ctx.now - self.last_sight_at >= ctx.config.attack_retry_interval {
            crate::log(&format!(
                "{}: no line of sight for {:.1}s, chasing",
                ctx.agent,
                ctx.now - self.last_sight_at
            ));
            return Some(AIStateType::Chase);
        }

        None
    }

    fn exit(&mut self, ctx: &mut AgentContext) {
        ctx.movement.resume();
        ctx.movement.reset_speed();
        ctx.publish(AgentEvent::AttackEnded { agent: ctx.agent });
    }

    /// Patrol — только когда цели уже нет
    fn can_transition_to(&self, next: AIStateType, ctx: &AgentContext) -> bool {
        match next {
            AIStateType::Chase | AIStateType::Retreat => true,
            AIStateType::Patrol => ctx.target().is_none(),
            AIStateType::Attack => false,
        }
    }

    fn contribute_snapshot(&self, snapshot: &mut StateSnapshot) {
        snapshot.flags.insert(SnapshotFlags::ATTACKING);
    }
}
