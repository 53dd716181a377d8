//! Arena — стены для raycast и цели для overlap/registry

use crate::collaborators::{Candidate, PhysicsQuery, TargetRegistry};
use crate::shared::{LayerMask, TargetHandle};
use bevy::math::Vec2;
use std::collections::BTreeMap;

/// Непрозрачная стена (отрезок)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wall {
    pub from: Vec2,
    pub to: Vec2,
    pub layer: LayerMask,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArenaTarget {
    pub position: Vec2,
    pub alive: bool,
    pub layer: LayerMask,
}

/// BTreeMap → детерминированный порядок overlap/registry
#[derive(Debug, Clone, Default)]
pub struct Arena {
    walls: Vec<Wall>,
    targets: BTreeMap<TargetHandle, ArenaTarget>,
}

impl Arena {
    pub const OBSTACLE_LAYER: LayerMask = LayerMask(1);
    pub const TARGET_LAYER: LayerMask = LayerMask(2);

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_wall(mut self, from: Vec2, to: Vec2) -> Self {
        self.add_wall(from, to);
        self
    }

    pub fn add_wall(&mut self, from: Vec2, to: Vec2) {
        self.walls.push(Wall {
            from,
            to,
            layer: Self::OBSTACLE_LAYER,
        });
    }

    pub fn spawn_target(&mut self, handle: TargetHandle, position: Vec2) {
        self.targets.insert(
            handle,
            ArenaTarget {
                position,
                alive: true,
                layer: Self::TARGET_LAYER,
            },
        );
    }

    pub fn move_target(&mut self, handle: TargetHandle, position: Vec2) {
        if let Some(target) = self.targets.get_mut(&handle) {
            target.position = position;
        }
    }

    /// Цель остаётся в мире, но помечена мёртвой
    pub fn kill_target(&mut self, handle: TargetHandle) {
        if let Some(target) = self.targets.get_mut(&handle) {
            target.alive = false;
        }
    }

    pub fn despawn_target(&mut self, handle: TargetHandle) {
        self.targets.remove(&handle);
    }

    pub fn target(&self, handle: TargetHandle) -> Option<&ArenaTarget> {
        self.targets.get(&handle)
    }
}

impl PhysicsQuery for Arena {
    fn raycast_blocked(&self, from: Vec2, to: Vec2, obstacle_mask: LayerMask) -> bool {
        self.walls
            .iter()
            .filter(|wall| wall.layer.intersects(obstacle_mask))
            .any(|wall| segments_intersect(from, to, wall.from, wall.to))
    }

    fn overlap_candidates(
        &self,
        origin: Vec2,
        radius: f32,
        target_mask: LayerMask,
        limit: usize,
    ) -> Vec<Candidate> {
        self.targets
            .iter()
            .filter(|(_, target)| target.alive && target.layer.intersects(target_mask))
            .filter(|(_, target)| origin.distance(target.position) <= radius)
            .take(limit)
            .map(|(handle, target)| Candidate {
                handle: *handle,
                position: target.position,
            })
            .collect()
    }
}

impl TargetRegistry for Arena {
    fn all_live_targets(&self) -> Vec<TargetHandle> {
        self.targets
            .iter()
            .filter(|(_, target)| target.alive)
            .map(|(handle, _)| *handle)
            .collect()
    }

    fn position(&self, target: TargetHandle) -> Option<Vec2> {
        self.targets.get(&target).map(|target| target.position)
    }

    fn is_alive(&self, target: TargetHandle) -> bool {
        self.targets.get(&target).is_some_and(|target| target.alive)
    }
}

/// Пересечение отрезков p1-p2 и q1-q2 (касание считается пересечением)
fn segments_intersect(p1: Vec2, p2: Vec2, q1: Vec2, q2: Vec2) -> bool {
    let r = p2 - p1;
    let s = q2 - q1;
    let denominator = r.perp_dot(s);
    let qp = q1 - p1;

    if denominator.abs() < f32::EPSILON {
        // Параллельные: пересекаются только если коллинеарны и перекрываются
        if qp.perp_dot(r).abs() >= f32::EPSILON {
            return false;
        }
        let rr = r.dot(r);
        if rr < f32::EPSILON {
            return qp.length_squared() < f32::EPSILON;
        }
        let t0 = qp.dot(r) / rr;
        let t1 = t0 + s.dot(r) / rr;
        let (lo, hi) = (t0.min(t1), t0.max(t1));
        return hi >= 0.0 && lo <= 1.0;
    }

    let t = qp.perp_dot(s) / denominator;
    let u = qp.perp_dot(r) / denominator;
    (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wall_blocks_crossing_ray() {
        let arena = Arena::new().with_wall(Vec2::new(2.0, -1.0), Vec2::new(2.0, 1.0));

        assert!(arena.raycast_blocked(Vec2::ZERO, Vec2::new(4.0, 0.0), LayerMask::ALL));
        assert!(!arena.raycast_blocked(Vec2::ZERO, Vec2::new(1.5, 0.0), LayerMask::ALL));
        assert!(!arena.raycast_blocked(Vec2::ZERO, Vec2::new(0.0, 4.0), LayerMask::ALL));
        // Слой не совпадает с маской
        assert!(!arena.raycast_blocked(Vec2::ZERO, Vec2::new(4.0, 0.0), LayerMask(4)));
    }

    #[test]
    fn test_overlap_respects_radius_limit_and_liveness() {
        let mut arena = Arena::new();
        for i in 0..5u64 {
            arena.spawn_target(TargetHandle(i), Vec2::new(i as f32, 0.0));
        }
        arena.kill_target(TargetHandle(0));

        let found = arena.overlap_candidates(Vec2::ZERO, 3.0, Arena::TARGET_LAYER, 10);
        let handles: Vec<_> = found.iter().map(|c| c.handle.0).collect();
        assert_eq!(handles, vec![1, 2, 3]);

        let limited = arena.overlap_candidates(Vec2::ZERO, 10.0, Arena::TARGET_LAYER, 2);
        assert_eq!(limited.len(), 2);
    }

    #[test]
    fn test_registry_liveness() {
        let mut arena = Arena::new();
        arena.spawn_target(TargetHandle(1), Vec2::ZERO);
        arena.spawn_target(TargetHandle(2), Vec2::ONE);

        arena.kill_target(TargetHandle(1));
        arena.despawn_target(TargetHandle(2));

        assert!(!arena.is_alive(TargetHandle(1)));
        assert!(!arena.is_alive(TargetHandle(2)));
        assert_eq!(arena.position(TargetHandle(2)), None);
        assert!(arena.all_live_targets().is_empty());
    }
}
