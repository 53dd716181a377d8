//! Tests for Perception.

#[cfg(test)]
mod tests {
    use crate::components::AgentConfig;
    use crate::perception::{Perception, SightChange, Viewpoint, MAX_DETECTED_TARGETS};
    use crate::sandbox::Arena;
    use crate::shared::TargetHandle;
    use bevy::math::Vec2;

    fn looking_right() -> Viewpoint {
        Viewpoint {
            eye: Vec2::ZERO,
            forward: Vec2::X,
        }
    }

    fn perception() -> Perception {
        Perception::new(&AgentConfig::default())
    }

    #[test]
    fn test_target_straight_ahead_is_visible() {
        let arena = Arena::new();
        assert!(perception().has_line_of_sight(&looking_right(), Vec2::new(3.0, 0.0), &arena));
    }

    #[test]
    fn test_range_boundary_is_inclusive() {
        let arena = Arena::new();
        let view = looking_right();
        let perception = perception();

        assert!(perception.has_line_of_sight(&view, Vec2::new(10.0, 0.0), &arena));
        assert!(!perception.has_line_of_sight(&view, Vec2::new(10.01, 0.0), &arena));
    }

    #[test]
    fn test_out_of_range_ignores_angle_and_obstacles() {
        // Даже без стен и прямо по курсу: дальше detection_range → не видим
        let arena = Arena::new();
        let perception = perception();
        assert!(!perception.is_in_range(&looking_right(), Vec2::new(25.0, 0.0)));
        assert!(!perception.has_line_of_sight(&looking_right(), Vec2::new(25.0, 0.0), &arena));
    }

    #[test]
    fn test_field_of_view_half_angle() {
        let arena = Arena::new();
        let view = looking_right();
        let perception = perception();

        // 40° от forward — внутри конуса 90°
        let inside = Vec2::new(40f32.to_radians().cos(), 40f32.to_radians().sin()) * 5.0;
        // 50° — снаружи
        let outside = Vec2::new(50f32.to_radians().cos(), 50f32.to_radians().sin()) * 5.0;

        assert!(perception.has_line_of_sight(&view, inside, &arena));
        assert!(!perception.has_line_of_sight(&view, outside, &arena));
        assert!(!perception.has_line_of_sight(&view, Vec2::new(-3.0, 0.0), &arena));
    }

    #[test]
    fn test_wall_blocks_line_of_sight() {
        let arena = Arena::new().with_wall(Vec2::new(1.5, -1.0), Vec2::new(1.5, 1.0));
        let perception = perception();

        assert!(perception.is_obstructed(&looking_right(), Vec2::new(3.0, 0.0), &arena));
        assert!(!perception.has_line_of_sight(&looking_right(), Vec2::new(3.0, 0.0), &arena));
    }

    #[test]
    fn test_detect_is_bounded_by_candidate_buffer() {
        let mut arena = Arena::new();
        for i in 0..15u64 {
            arena.spawn_target(TargetHandle(i), Vec2::new(1.0 + i as f32 * 0.5, 0.0));
        }

        let detected = perception().detect_targets_in_range(&looking_right(), &arena);
        assert_eq!(detected.len(), MAX_DETECTED_TARGETS);
    }

    #[test]
    fn test_find_closest_skips_hidden_targets() {
        let mut arena = Arena::new().with_wall(Vec2::new(1.0, -0.5), Vec2::new(1.0, 0.5));
        // Ближняя цель за стеной
        arena.spawn_target(TargetHandle(1), Vec2::new(2.0, 0.0));
        arena.spawn_target(TargetHandle(2), Vec2::new(6.0, 4.0));
        arena.spawn_target(TargetHandle(3), Vec2::new(8.0, -1.0));

        let closest = perception()
            .find_closest_target(&looking_right(), &arena)
            .unwrap();
        assert_eq!(closest.handle, TargetHandle(2));
    }

    #[test]
    fn test_find_closest_without_candidates() {
        let arena = Arena::new();
        assert!(perception().find_closest_target(&looking_right(), &arena).is_none());
    }

    #[test]
    fn test_refresh_is_throttled() {
        let mut arena = Arena::new();
        let target = TargetHandle(9);
        let mut perception = perception();
        let view = looking_right();

        let change = perception.refresh(0.0, &view, Some((target, Vec2::new(3.0, 0.0))), &arena);
        assert_eq!(change, Some(SightChange::Acquired(target)));
        assert!(perception.target_in_sight());

        // Цель ушла за стену, но интервал (0.1) ещё не прошёл → кэш не меняется
        arena.add_wall(Vec2::new(1.5, -1.0), Vec2::new(1.5, 1.0));
        let change = perception.refresh(0.05, &view, Some((target, Vec2::new(3.0, 0.0))), &arena);
        assert_eq!(change, None);
        assert!(perception.target_in_sight());

        let change = perception.refresh(0.125, &view, Some((target, Vec2::new(3.0, 0.0))), &arena);
        assert_eq!(
            change,
            Some(SightChange::Lost {
                target,
                last_seen: Some(Vec2::new(3.0, 0.0)),
            })
        );
        assert!(!perception.target_in_sight());
        assert_eq!(perception.last_seen_position(), Some(Vec2::new(3.0, 0.0)));
    }

    #[test]
    fn test_new_target_forces_refresh() {
        let arena = Arena::new();
        let mut perception = perception();
        let view = looking_right();

        perception.refresh(0.0, &view, None, &arena);
        // Раньше интервала, но цель сменилась
        let change = perception.refresh(
            0.01,
            &view,
            Some((TargetHandle(1), Vec2::new(2.0, 0.0))),
            &arena,
        );
        assert_eq!(change, Some(SightChange::Acquired(TargetHandle(1))));
        assert_eq!(perception.tracked(), Some(TargetHandle(1)));
    }
}
