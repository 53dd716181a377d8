//! Movement — обёртка над Pathfinding коллаборатором
//!
//! moveTo / strafe / stop / resume + arrival tracking.
//! Локомоция (physics_step) крутится каждый fixed tick, решения — на AI rate.
//!
//! Failure policy: если навигация не нашла walkable точку рядом с запрошенной
//! (в радиусе поиска), вызов — no-op, предыдущая цель остаётся активной.

use crate::collaborators::{PathRequest, Pathfinding};
use crate::components::AgentConfig;
use crate::shared::AgentId;
use bevy::math::Vec2;

/// Результат одного physics step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    pub position: Vec2,
    /// true ровно на том шаге, где агент впервые дошёл до destination
    pub arrived: bool,
}

#[derive(Debug, Clone)]
pub struct Movement {
    agent: AgentId,

    default_speed: f32,
    speed: f32,
    strafe_speed_multiplier: f32,
    default_stopping_distance: f32,
    stopping_distance: f32,
    search_radius: f32,
    path_update_interval: f32,

    strafe_distance: f32,
    strafe_change_interval: f32,
    /// -1 / +1
    strafe_side: f32,
    last_strafe_flip_at: Option<f32>,
    strafing: bool,

    destination: Option<Vec2>,
    stopped: bool,
    arrived: bool,

    // Watchdog прогресса пути
    progress_checked_at: f32,
    progress_remaining: f32,
    rejected_repaths: u32,
}

impl Movement {
    pub fn new(agent: AgentId, config: &AgentConfig) -> Self {
        Self {
            agent,
            default_speed: config.default_speed,
            speed: config.default_speed,
            strafe_speed_multiplier: config.strafe_speed_multiplier,
            default_stopping_distance: config.stopping_distance,
            stopping_distance: config.stopping_distance,
            search_radius: config.move_search_radius,
            path_update_interval: config.path_update_interval,
            strafe_distance: config.strafe_distance,
            strafe_change_interval: config.strafe_change_interval,
            strafe_side: 1.0,
            last_strafe_flip_at: None,
            strafing: false,
            destination: None,
            stopped: false,
            arrived: false,
            progress_checked_at: 0.0,
            progress_remaining: f32::MAX,
            rejected_repaths: 0,
        }
    }

    /// Запрос пути к ближайшей walkable точке около `point`
    ///
    /// false → no-op (точка недостижима, предыдущая цель сохранена).
    pub fn move_to(&mut self, from: Vec2, point: Vec2, now: f32, nav: &mut dyn Pathfinding) -> bool {
        if self.issue_path(from, point, self.search_radius, now, nav) {
            self.strafing = false;
            true
        } else {
            false
        }
    }

    /// Боковой манёвр вокруг цели: точка на перпендикуляре к направлению
    /// на цель, сторона меняется каждые `strafe_change_interval` секунд
    pub fn strafe_around_target(
        &mut self,
        from: Vec2,
        target: Vec2,
        now: f32,
        nav: &mut dyn Pathfinding,
    ) -> bool {
        match self.last_strafe_flip_at {
            None => self.last_strafe_flip_at = Some(now),
            Some(last) if now - last >= self.strafe_change_interval => {
                self.strafe_side = -self.strafe_side;
                self.last_strafe_flip_at = Some(now);
            }
            Some(_) => {}
        }

        let to_target = (target - from).normalize_or_zero();
        let to_target = if to_target == Vec2::ZERO { Vec2::X } else { to_target };
        let perpendicular = to_target.perp() * self.strafe_side;
        let point = target + perpendicular * self.strafe_distance;

        if self.issue_path(from, point, self.strafe_distance, now, nav) {
            self.strafing = true;
            true
        } else {
            false
        }
    }

    fn issue_path(
        &mut self,
        from: Vec2,
        point: Vec2,
        search_radius: f32,
        now: f32,
        nav: &mut dyn Pathfinding,
    ) -> bool {
        let Some(walkable) = nav.sample_walkable(point, search_radius) else {
            crate::log_warning(&format!(
                "{}: no walkable point near ({:.2}, {:.2}) within {:.1}, keeping previous destination",
                self.agent, point.x, point.y, search_radius
            ));
            return false;
        };

        if nav.request_path(self.agent, from, walkable) == PathRequest::Rejected {
            crate::log_warning(&format!(
                "{}: path to ({:.2}, {:.2}) rejected",
                self.agent, walkable.x, walkable.y
            ));
            return false;
        }

        self.destination = Some(walkable);
        self.arrived = false;
        self.progress_checked_at = now;
        self.progress_remaining = nav.remaining_distance(self.agent);
        true
    }

    /// remaining distance ≤ stopping distance
    pub fn has_reached_destination(&self, nav: &dyn Pathfinding) -> bool {
        self.destination.is_some()
            && nav.has_path(self.agent)
            && nav.remaining_distance(self.agent) <= self.stopping_distance
    }

    /// Останавливает следование пути (destination не сбрасывается)
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    pub fn resume(&mut self) {
        self.stopped = false;
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn end_strafe(&mut self) {
        self.strafing = false;
    }

    pub fn is_strafing(&self) -> bool {
        self.strafing
    }

    /// Текущая сторона strafe (-1 / +1)
    pub fn strafe_side(&self) -> f32 {
        self.strafe_side
    }

    pub fn destination(&self) -> Option<Vec2> {
        self.destination
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed.max(0.0);
    }

    pub fn reset_speed(&mut self) {
        self.speed = self.default_speed;
    }

    pub fn set_stopping_distance(&mut self, distance: f32) {
        self.stopping_distance = distance.max(0.0);
    }

    pub fn reset_stopping_distance(&mut self) {
        self.stopping_distance = self.default_stopping_distance;
    }

    /// Сколько перезапросов пути отклонила навигация
    pub fn rejected_repaths(&self) -> u32 {
        self.rejected_repaths
    }

    pub fn stopping_distance(&self) -> f32 {
        self.stopping_distance
    }

    /// Strafe идёт на default_speed × multiplier независимо от state speed
    pub fn effective_speed(&self) -> f32 {
        if self.strafing {
            self.default_speed * self.strafe_speed_multiplier
        } else {
            self.speed
        }
    }

    /// Physics step: двигаем агента вдоль пути
    pub fn physics_step(
        &mut self,
        from: Vec2,
        dt: f32,
        now: f32,
        nav: &mut dyn Pathfinding,
    ) -> StepOutcome {
        let Some(destination) = self.destination else {
            return StepOutcome {
                position: from,
                arrived: false,
            };
        };
        if self.stopped || self.arrived {
            return StepOutcome {
                position: from,
                arrived: false,
            };
        }

        let speed = self.effective_speed();
        let position = nav.advance(self.agent, from, speed * dt);

        // Fire-and-forget pathing: нет прогресса за интервал → перезапрос
        if speed > 0.0 && now - self.progress_checked_at >= self.path_update_interval {
            let remaining = nav.remaining_distance(self.agent);
            let stalled = remaining >= self.progress_remaining - 1e-3;
            if !nav.has_path(self.agent) || (stalled && remaining > self.stopping_distance) {
                crate::log(&format!(
                    "{}: no path progress, re-requesting path to ({:.2}, {:.2})",
                    self.agent, destination.x, destination.y
                ));
                if nav.request_path(self.agent, position, destination) == PathRequest::Rejected {
                    self.rejected_repaths += 1;
                    crate::log_warning(&format!(
                        "{}: path re-request to ({:.2}, {:.2}) rejected",
                        self.agent, destination.x, destination.y
                    ));
                }
            }
            self.progress_checked_at = now;
            self.progress_remaining = nav.remaining_distance(self.agent);
        }

        let arrived = self.has_reached_destination(nav);
        if arrived {
            self.arrived = true;
            self.strafing = false;
        }

        StepOutcome { position, arrived }
    }
}
