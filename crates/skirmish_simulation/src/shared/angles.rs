//! Angle helpers (градусы, [0, 360)).
//!
//! Aim angle реплицируется в градусах, поэтому вся математика углов здесь же:
//! Combat (bearing + error), Replicator (equality rule), Mirror (interpolation).

use bevy::math::Vec2;

/// Нормализует угол в [0, 360)
pub fn normalize_degrees(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid(-0.0000001) может вернуть ровно 360.0 из-за округления
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Bearing от `from` к `to` в градусах (0° = +X, против часовой)
pub fn bearing_degrees(from: Vec2, to: Vec2) -> f32 {
    let dir = to - from;
    normalize_degrees(dir.y.atan2(dir.x).to_degrees())
}

/// Кратчайшая знаковая разница `to - from`, в (-180, 180]
pub fn delta_degrees(from: f32, to: f32) -> f32 {
    let delta = (to - from).rem_euclid(360.0);
    if delta > 180.0 {
        delta - 360.0
    } else {
        delta
    }
}

/// Lerp по кратчайшей дуге, `t` клампится в [0, 1]
pub fn lerp_degrees(from: f32, to: f32, t: f32) -> f32 {
    normalize_degrees(from + delta_degrees(from, to) * t.clamp(0.0, 1.0))
}

/// Единичный вектор направления для угла в градусах
pub fn direction_from_degrees(angle: f32) -> Vec2 {
    let radians = angle.to_radians();
    Vec2::new(radians.cos(), radians.sin())
}

/// Угол между двумя направлениями в градусах, [0, 180]
///
/// Нулевой вектор считается совпадающим с любым направлением (угол 0).
pub fn angle_between_degrees(a: Vec2, b: Vec2) -> f32 {
    let (a, b) = (a.normalize_or_zero(), b.normalize_or_zero());
    if a == Vec2::ZERO || b == Vec2::ZERO {
        return 0.0;
    }
    a.dot(b).clamp(-1.0, 1.0).acos().to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_degrees() {
        assert_eq!(normalize_degrees(-90.0), 270.0);
        assert_eq!(normalize_degrees(360.0), 0.0);
        assert_eq!(normalize_degrees(725.0), 5.0);
    }

    #[test]
    fn test_bearing_degrees() {
        assert!((bearing_degrees(Vec2::ZERO, Vec2::new(1.0, 0.0)) - 0.0).abs() < 1e-4);
        assert!((bearing_degrees(Vec2::ZERO, Vec2::new(0.0, 1.0)) - 90.0).abs() < 1e-4);
        assert!((bearing_degrees(Vec2::ZERO, Vec2::new(0.0, -1.0)) - 270.0).abs() < 1e-4);
    }

    #[test]
    fn test_delta_wraps_through_zero() {
        assert!((delta_degrees(350.0, 10.0) - 20.0).abs() < 1e-4);
        assert!((delta_degrees(10.0, 350.0) + 20.0).abs() < 1e-4);
        assert!((delta_degrees(0.0, 180.0) - 180.0).abs() < 1e-4);
    }

    #[test]
    fn test_lerp_takes_short_arc() {
        // 350 → 10 через 0, а не через 180
        let mid = lerp_degrees(350.0, 10.0, 0.5);
        assert!(mid.abs() < 1e-3 || (mid - 360.0).abs() < 1e-3);
    }

    #[test]
    fn test_angle_between() {
        let forward = Vec2::X;
        assert!((angle_between_degrees(forward, Vec2::new(1.0, 1.0)) - 45.0).abs() < 1e-3);
        assert!((angle_between_degrees(forward, Vec2::NEG_X) - 180.0).abs() < 1e-3);
        assert_eq!(angle_between_degrees(forward, Vec2::ZERO), 0.0);
    }
}
