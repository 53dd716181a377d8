//! Perception — зрение агента (range + FOV + raycast)
//!
//! Все проверки чисто геометрические, через PhysicsQuery.
//! `has_line_of_sight` / `detect_targets_in_range` — pure queries.
//! `refresh` — throttled (perception_interval) кэш видимости текущей цели,
//! который читают Chase/Attack/Retreat.

use crate::collaborators::{Candidate, PhysicsQuery};
use crate::components::AgentConfig;
use crate::shared::{angle_between_degrees, LayerMask, TargetHandle};
use bevy::math::Vec2;

/// Ёмкость candidate buffer (лишние кандидаты молча отбрасываются)
pub const MAX_DETECTED_TARGETS: usize = 10;

/// Откуда и куда смотрит агент
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewpoint {
    pub eye: Vec2,
    /// Направление взгляда (не обязательно нормализовано)
    pub forward: Vec2,
}

/// Изменение видимости отслеживаемой цели (результат refresh)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SightChange {
    Acquired(TargetHandle),
    Lost {
        target: TargetHandle,
        last_seen: Option<Vec2>,
    },
}

#[derive(Debug, Clone)]
pub struct Perception {
    detection_range: f32,
    field_of_view: f32,
    obstacle_mask: LayerMask,
    target_mask: LayerMask,
    update_interval: f32,

    last_refresh_at: Option<f32>,
    tracked: Option<TargetHandle>,
    target_in_sight: bool,
    last_seen_position: Option<Vec2>,
}

impl Perception {
    pub fn new(config: &AgentConfig) -> Self {
        Self {
            detection_range: config.detection_range,
            field_of_view: config.field_of_view,
            obstacle_mask: config.obstacle_mask,
            target_mask: config.target_mask,
            update_interval: config.perception_interval,
            last_refresh_at: None,
            tracked: None,
            target_in_sight: false,
            last_seen_position: None,
        }
    }

    pub fn detection_range(&self) -> f32 {
        self.detection_range
    }

    /// Дистанция ≤ detection_range (граница включительно)
    pub fn is_in_range(&self, view: &Viewpoint, target: Vec2) -> bool {
        view.eye.distance(target) <= self.detection_range
    }

    /// Угол к цели относительно forward ≤ FOV/2
    pub fn is_in_field_of_view(&self, view: &Viewpoint, target: Vec2) -> bool {
        angle_between_degrees(view.forward, target - view.eye) <= self.field_of_view * 0.5
    }

    pub fn is_obstructed(&self, view: &Viewpoint, target: Vec2, physics: &dyn PhysicsQuery) -> bool {
        physics.raycast_blocked(view.eye, target, self.obstacle_mask)
    }

    /// Line of sight = range AND FOV AND нет препятствия
    pub fn has_line_of_sight(
        &self,
        view: &Viewpoint,
        target: Vec2,
        physics: &dyn PhysicsQuery,
    ) -> bool {
        // Дешёвые проверки первыми, raycast последним
        self.is_in_range(view, target)
            && self.is_in_field_of_view(view, target)
            && !self.is_obstructed(view, target, physics)
    }

    /// Все кандидаты из overlap query, прошедшие line of sight
    pub fn detect_targets_in_range(
        &self,
        view: &Viewpoint,
        physics: &dyn PhysicsQuery,
    ) -> Vec<Candidate> {
        let mut candidates = physics.overlap_candidates(
            view.eye,
            self.detection_range,
            self.target_mask,
            MAX_DETECTED_TARGETS,
        );
        candidates.truncate(MAX_DETECTED_TARGETS);
        candidates.retain(|candidate| self.has_line_of_sight(view, candidate.position, physics));
        candidates
    }

    pub fn find_closest_target(
        &self,
        view: &Viewpoint,
        physics: &dyn PhysicsQuery,
    ) -> Option<Candidate> {
        closest_to(view.eye, self.detect_targets_in_range(view, physics))
    }

    /// Ближайший видимый среди произвольного набора кандидатов
    pub fn closest_visible(
        &self,
        view: &Viewpoint,
        candidates: impl IntoIterator<Item = Candidate>,
        physics: &dyn PhysicsQuery,
    ) -> Option<Candidate> {
        closest_to(
            view.eye,
            candidates
                .into_iter()
                .filter(|candidate| self.has_line_of_sight(view, candidate.position, physics)),
        )
    }

    pub fn is_refresh_due(&self, now: f32) -> bool {
        self.last_refresh_at
            .map_or(true, |last| now - last >= self.update_interval)
    }

    /// Throttled обновление видимости отслеживаемой цели
    ///
    /// Смена цели форсирует немедленный пересчёт. Возвращает изменение
    /// видимости, если оно было.
    pub fn refresh(
        &mut self,
        now: f32,
        view: &Viewpoint,
        tracked: Option<(TargetHandle, Vec2)>,
        physics: &dyn PhysicsQuery,
    ) -> Option<SightChange> {
        let tracked_handle = tracked.map(|(handle, _)| handle);
        if tracked_handle == self.tracked && !self.is_refresh_due(now) {
            return None;
        }
        self.last_refresh_at = Some(now);

        if tracked_handle != self.tracked {
            // Новая цель: предыдущая видимость не переносится
            self.tracked = tracked_handle;
            self.target_in_sight = false;
            self.last_seen_position = None;
        }

        let (handle, position) = tracked?;

        let visible = self.has_line_of_sight(view, position, physics);
        let was_visible = self.target_in_sight;
        self.target_in_sight = visible;
        if visible {
            self.last_seen_position = Some(position);
        }

        match (was_visible, visible) {
            (false, true) => Some(SightChange::Acquired(handle)),
            (true, false) => Some(SightChange::Lost {
                target: handle,
                last_seen: self.last_seen_position,
            }),
            _ => None,
        }
    }

    /// Кэш: видна ли отслеживаемая цель на момент последнего refresh
    pub fn target_in_sight(&self) -> bool {
        self.target_in_sight
    }

    pub fn last_seen_position(&self) -> Option<Vec2> {
        self.last_seen_position
    }

    pub fn tracked(&self) -> Option<TargetHandle> {
        self.tracked
    }
}

fn closest_to(origin: Vec2, candidates: impl IntoIterator<Item = Candidate>) -> Option<Candidate> {
    candidates.into_iter().min_by(|a, b| {
        origin
            .distance_squared(a.position)
            .total_cmp(&origin.distance_squared(b.position))
    })
}

// Tests (separate files with _tests suffix)
#[cfg(test)]
mod perception_tests;
