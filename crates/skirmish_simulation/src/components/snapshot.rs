//! StateSnapshot — network-facing проекция агента
//!
//! Batched snapshot sync отправляет его только если он НЕ эквивалентен
//! предыдущему (delta-compression через `is_equivalent`).

use crate::ai::AIStateType;
use crate::shared::{delta_degrees, TargetHandle};
use bevy::math::Vec2;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Combat flags в snapshot (битовые значения стабильны на проводе)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct SnapshotFlags: u8 {
        const ATTACKING = 1;
        const RELOADING = 1 << 1;
        const CHASING = 1 << 2;
        const STRAFING = 1 << 3;
    }
}

/// Допуск позиции для equality rule (world units)
pub const SNAPSHOT_POSITION_EPSILON: f32 = 0.01;
/// Допуск aim angle для equality rule (градусы)
pub const SNAPSHOT_ANGLE_EPSILON: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub state: AIStateType,
    pub position: Vec2,
    /// Текущая цель движения (или position, если стоим)
    pub movement_target: Vec2,
    pub last_known_target_position: Vec2,
    pub look_angle: f32,
    pub flags: SnapshotFlags,
    /// -1 / +1 во время strafe, 0 иначе
    pub strafe_direction: f32,
    pub target_id: Option<TargetHandle>,
    pub has_valid_target: bool,
    /// Монотонно растёт (время симуляции агента, секунды)
    pub timestamp: f64,
}

impl Default for StateSnapshot {
    fn default() -> Self {
        Self {
            state: AIStateType::Patrol,
            position: Vec2::ZERO,
            movement_target: Vec2::ZERO,
            last_known_target_position: Vec2::ZERO,
            look_angle: 0.0,
            flags: SnapshotFlags::empty(),
            strafe_direction: 0.0,
            target_id: None,
            has_valid_target: false,
            timestamp: 0.0,
        }
    }
}

impl StateSnapshot {
    /// Equality rule: state tag, позиция (±0.01), aim angle (±0.1°), все флаги.
    ///
    /// true → snapshot не стоит пересылать.
    pub fn is_equivalent(&self, other: &StateSnapshot) -> bool {
        self.state == other.state
            && self.position.distance(other.position) <= SNAPSHOT_POSITION_EPSILON
            && delta_degrees(self.look_angle, other.look_angle).abs() <= SNAPSHOT_ANGLE_EPSILON
            && self.flags == other.flags
            && self.has_valid_target == other.has_valid_target
    }

    pub fn is_attacking(&self) -> bool {
        self.flags.contains(SnapshotFlags::ATTACKING)
    }

    pub fn is_reloading(&self) -> bool {
        self.flags.contains(SnapshotFlags::RELOADING)
    }

    pub fn is_chasing(&self) -> bool {
        self.flags.contains(SnapshotFlags::CHASING)
    }

    pub fn is_strafing(&self) -> bool {
        self.flags.contains(SnapshotFlags::STRAFING)
    }
}
