//! OpenField — упрощённый navmesh для headless режима
//!
//! Walkable = внутри bounds и вне всех blocked кругов.
//! Путь всегда прямой (без обхода препятствий).

use crate::collaborators::{PathRequest, Pathfinding};
use crate::shared::AgentId;
use bevy::math::Vec2;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq)]
struct NavPath {
    destination: Vec2,
    position: Vec2,
}

#[derive(Debug, Clone, Default)]
pub struct OpenField {
    /// (min, max); None = бесконечная плоскость
    bounds: Option<(Vec2, Vec2)>,
    /// Непроходимые круги (center, radius)
    blocked: Vec<(Vec2, f32)>,
    paths: HashMap<AgentId, NavPath>,
}

impl OpenField {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn bounded(min: Vec2, max: Vec2) -> Self {
        Self {
            bounds: Some((min.min(max), min.max(max))),
            ..Default::default()
        }
    }

    pub fn with_blocked(mut self, center: Vec2, radius: f32) -> Self {
        self.blocked.push((center, radius));
        self
    }

    pub fn is_walkable(&self, point: Vec2) -> bool {
        let inside = self
            .bounds
            .map_or(true, |(min, max)| point.cmpge(min).all() && point.cmple(max).all());
        inside
            && self
                .blocked
                .iter()
                .all(|(center, radius)| point.distance(*center) > *radius)
    }

    /// Текущая цель пути агента (для debug / tests)
    pub fn destination(&self, agent: AgentId) -> Option<Vec2> {
        self.paths.get(&agent).map(|path| path.destination)
    }
}

impl Pathfinding for OpenField {
    fn sample_walkable(&self, point: Vec2, search_radius: f32) -> Option<Vec2> {
        let mut candidate = match self.bounds {
            Some((min, max)) => point.clamp(min, max),
            None => point,
        };

        // Выталкиваем из blocked круга на его край
        for (center, radius) in &self.blocked {
            if candidate.distance(*center) <= *radius {
                let dir = (candidate - *center).normalize_or_zero();
                let dir = if dir == Vec2::ZERO { Vec2::X } else { dir };
                candidate = *center + dir * (*radius + 0.01);
            }
        }

        (self.is_walkable(candidate) && candidate.distance(point) <= search_radius)
            .then_some(candidate)
    }

    fn request_path(&mut self, agent: AgentId, from: Vec2, to: Vec2) -> PathRequest {
        if !self.is_walkable(to) {
            return PathRequest::Rejected;
        }
        self.paths.insert(
            agent,
            NavPath {
                destination: to,
                position: from,
            },
        );
        PathRequest::Accepted
    }

    fn remaining_distance(&self, agent: AgentId) -> f32 {
        self.paths
            .get(&agent)
            .map_or(0.0, |path| path.position.distance(path.destination))
    }

    fn has_path(&self, agent: AgentId) -> bool {
        self.paths.contains_key(&agent)
    }

    fn advance(&mut self, agent: AgentId, from: Vec2, max_step: f32) -> Vec2 {
        let Some(path) = self.paths.get_mut(&agent) else {
            return from;
        };

        let to_destination = path.destination - from;
        let step = to_destination.length().min(max_step.max(0.0));
        let next = from + to_destination.normalize_or_zero() * step;
        path.position = next;
        next
    }

    fn forget(&mut self, agent: AgentId) {
        self.paths.remove(&agent);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AGENT: AgentId = AgentId(1);

    #[test]
    fn test_sample_clamps_into_bounds() {
        let field = OpenField::bounded(Vec2::splat(-10.0), Vec2::splat(10.0));

        assert_eq!(
            field.sample_walkable(Vec2::new(12.0, 0.0), 5.0),
            Some(Vec2::new(10.0, 0.0))
        );
        // Слишком далеко от bounds
        assert_eq!(field.sample_walkable(Vec2::new(30.0, 0.0), 5.0), None);
    }

    #[test]
    fn test_sample_pushes_out_of_blocked_area() {
        let field = OpenField::unbounded().with_blocked(Vec2::ZERO, 2.0);

        let sampled = field.sample_walkable(Vec2::new(1.0, 0.0), 5.0).unwrap();
        assert!(field.is_walkable(sampled));
        assert!(sampled.x > 2.0);
    }

    #[test]
    fn test_advance_moves_along_straight_path() {
        let mut field = OpenField::unbounded();
        assert_eq!(
            field.request_path(AGENT, Vec2::ZERO, Vec2::new(10.0, 0.0)),
            PathRequest::Accepted
        );
        assert!(field.has_path(AGENT));
        assert_eq!(field.remaining_distance(AGENT), 10.0);

        let next = field.advance(AGENT, Vec2::ZERO, 4.0);
        assert_eq!(next, Vec2::new(4.0, 0.0));
        assert_eq!(field.remaining_distance(AGENT), 6.0);

        // Не перелетаем destination
        let last = field.advance(AGENT, next, 100.0);
        assert_eq!(last, Vec2::new(10.0, 0.0));
        assert_eq!(field.remaining_distance(AGENT), 0.0);
    }

    #[test]
    fn test_unwalkable_destination_is_rejected() {
        let mut field = OpenField::unbounded().with_blocked(Vec2::new(5.0, 0.0), 1.0);
        assert_eq!(
            field.request_path(AGENT, Vec2::ZERO, Vec2::new(5.0, 0.0)),
            PathRequest::Rejected
        );
        assert!(!field.has_path(AGENT));
    }
}
