//! Patrol — бродим вокруг точки спавна и ищем цель

use super::AgentState;
use crate::ai::{AIStateType, AgentContext};
use crate::collaborators::Candidate;
use crate::shared::TargetHandle;
use bevy::math::Vec2;
use rand::Rng;
use std::f32::consts::TAU;

/// Попыток найти walkable патрульную точку
const PATROL_POINT_ATTEMPTS: usize = 10;

#[derive(Debug, Clone, Default)]
pub struct PatrolState {
    patrol_point: Option<Vec2>,
    /// Some(t) — стоим на точке до момента t
    waiting_until: Option<f32>,
    /// Цель, назначенная последним сканом (переход в Chase мог быть отклонён)
    spotted: Option<TargetHandle>,
}

impl PatrolState {
    pub fn patrol_point(&self) -> Option<Vec2> {
        self.patrol_point
    }

    pub fn is_waiting(&self) -> bool {
        self.waiting_until.is_some()
    }

    /// Ближайшая видимая живая цель из registry
    fn scan_for_target(ctx: &AgentContext) -> Option<Candidate> {
        let view = ctx.view();
        let detection_range = ctx.perception.detection_range();
        let candidates = ctx
            .targets
            .all_live_targets()
            .into_iter()
            .filter_map(|handle| {
                ctx.targets
                    .position(handle)
                    .map(|position| Candidate { handle, position })
            })
            .filter(|candidate| view.eye.distance(candidate.position) <= detection_range);

        ctx.perception.closest_visible(&view, candidates, ctx.physics)
    }

    /// Случайная точка в круге patrol_radius вокруг спавна
    fn pick_patrol_point(&mut self, ctx: &mut AgentContext) {
        let center = ctx.body.spawn_position;
        let radius = ctx.config.patrol_radius;

        for _ in 0..PATROL_POINT_ATTEMPTS {
            let angle = ctx.rng.gen::<f32>() * TAU;
            // sqrt → равномерно по площади круга
            let distance = ctx.rng.gen::<f32>().sqrt() * radius;
            let candidate = center + Vec2::new(angle.cos(), angle.sin()) * distance;

            let Some(walkable) = ctx.navigation.sample_walkable(candidate, radius * 0.5) else {
                continue;
            };
            if ctx.move_to(walkable) {
                self.patrol_point = Some(walkable);
                self.waiting_until = None;
                return;
            }
        }

        crate::log_warning(&format!(
            "{}: no walkable patrol point after {} attempts, holding position",
            ctx.agent, PATROL_POINT_ATTEMPTS
        ));
        self.patrol_point = Some(ctx.body.position);
        self.waiting_until = Some(ctx.now + ctx.config.patrol_wait_time);
    }
}

impl AgentState for PatrolState {
    fn state_type(&self) -> AIStateType {
        AIStateType::Patrol
    }

    fn enter(&mut self, ctx: &mut AgentContext) {
        ctx.movement.resume();
        ctx.movement.end_strafe();
        ctx.movement.reset_speed();
        ctx.movement.reset_stopping_distance();
        self.waiting_until = None;
        self.spotted = None;
        self.pick_patrol_point(ctx);
    }

    fn update(&mut self, ctx: &mut AgentContext) -> Option<AIStateType> {
        if let Some(found) = Self::scan_for_target(ctx) {
            crate::log(&format!(
                "{}: spotted {} at distance {:.2}",
                ctx.agent,
                found.handle,
                ctx.body.position.distance(found.position)
            ));
            self.spotted = Some(found.handle);
            ctx.set_target(Some(found.handle));
            return Some(AIStateType::Chase);
        }

        // Всё ещё в Patrol, а замеченная цель пропала из вида
        if let Some(spotted) = self.spotted.take() {
            if ctx.memory.current == Some(spotted) {
                ctx.clear_target();
            }
        }

        match self.waiting_until {
            Some(until) => {
                if ctx.now >= until {
                    self.pick_patrol_point(ctx);
                }
            }
            None => {
                if ctx.has_reached_destination() {
                    self.waiting_until = Some(ctx.now + ctx.config.patrol_wait_time);
                }
            }
        }

        None
    }

    fn exit(&mut self, _ctx: &mut AgentContext) {
        self.waiting_until = None;
        self.spotted = None;
    }

    /// Из Patrol можно куда угодно
    fn can_transition_to(&self, _next: AIStateType, _ctx: &AgentContext) -> bool {
        true
    }
}
