//! Базовые компоненты агента: Health, AgentBody

use bevy::math::Vec2;
use serde::{Deserialize, Serialize};

/// Здоровье агента
///
/// Инвариант: 0 ≤ current ≤ max
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    pub current: u32,
    pub max: u32,
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100) // Default 100 HP
    }
}

impl Health {
    pub fn new(max: u32) -> Self {
        Self { current: max, max }
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0
    }

    pub fn take_damage(&mut self, amount: u32) {
        self.current = self.current.saturating_sub(amount);
    }

    pub fn heal(&mut self, amount: u32) {
        self.current = self.current.saturating_add(amount).min(self.max);
    }

    /// Прямая установка (replication / owner request), клампится в [0, max]
    pub fn set(&mut self, value: u32) {
        self.current = value.min(self.max);
    }
}

/// Тело агента в мире (authoritative position + facing)
///
/// Позицию двигает только physics step (Movement + Pathfinding),
/// facing — направление движения или прицел.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentBody {
    pub position: Vec2,
    /// Единичный вектор «вперёд» (+X при спавне)
    pub facing: Vec2,
    /// Точка спавна: центр патрулирования
    pub spawn_position: Vec2,
}

impl AgentBody {
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            facing: Vec2::X,
            spawn_position: position,
        }
    }

    /// Поворачивает facing к точке (нулевой вектор игнорируется)
    pub fn face_towards(&mut self, point: Vec2) {
        let dir = (point - self.position).normalize_or_zero();
        if dir != Vec2::ZERO {
            self.facing = dir;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_clamps() {
        let mut health = Health::new(100);
        health.take_damage(130);
        assert_eq!(health.current, 0);
        assert!(!health.is_alive());

        health.heal(250);
        assert_eq!(health.current, 100);

        health.set(500);
        assert_eq!(health.current, 100);
    }

    #[test]
    fn test_face_towards_ignores_same_point() {
        let mut body = AgentBody::new(Vec2::new(2.0, 2.0));
        body.face_towards(Vec2::new(2.0, 2.0));
        assert_eq!(body.facing, Vec2::X);

        body.face_towards(Vec2::new(2.0, 5.0));
        assert!((body.facing - Vec2::Y).length() < 1e-6);
    }
}
