//! Параметры архетипа агента (immutable, shared read-only через Arc).
//!
//! Загрузка из файлов — забота хоста; здесь только схема, defaults и validate().

use crate::shared::LayerMask;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Ошибки валидации AgentConfig
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Конфиг вообще не передан спавнеру
    #[error("agent configuration is missing")]
    Missing,

    #[error("{field} must be positive (got {value})")]
    NotPositive { field: &'static str, value: f32 },

    #[error("{field} must not be negative (got {value})")]
    Negative { field: &'static str, value: f32 },

    #[error("lose_target_range ({lose}) must exceed detection_range ({detection})")]
    LoseRangeTooSmall { lose: f32, detection: f32 },

    #[error("attack_range ({attack}) must not exceed detection_range ({detection})")]
    AttackRangeTooLarge { attack: f32, detection: f32 },

    #[error("min_distance_to_target ({min}) must be below attack_range ({attack})")]
    MinDistanceTooLarge { min: f32, attack: f32 },

    #[error("retreat_distance ({retreat}) must exceed min_distance_to_target ({min})")]
    RetreatTooShort { retreat: f32, min: f32 },

    #[error("aim_precision must be in [0, 1] (got {0})")]
    AimPrecisionOutOfRange(f32),

    #[error("field_of_view must be in (0, 360] degrees (got {0})")]
    FieldOfViewOutOfRange(f32),

    #[error("ai_update_interval ({ai}) must not exceed path_update_interval ({path})")]
    AiSlowerThanPathing { ai: f32, path: f32 },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Параметры AI агента (один экземпляр на архетип)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    // === Perception ===
    /// Дальность обнаружения (включительно)
    pub detection_range: f32,
    /// Угол обзора (градусы, полный конус)
    pub field_of_view: f32,
    /// Throttle для perception refresh (секунды)
    pub perception_interval: f32,
    pub obstacle_mask: LayerMask,
    pub target_mask: LayerMask,

    // === Дистанции поведения ===
    pub attack_range: f32,
    /// Дальность преследования (> detection_range)
    pub lose_target_range: f32,
    /// Ближе этого — Retreat
    pub min_distance_to_target: f32,
    pub retreat_distance: f32,

    // === Movement ===
    pub default_speed: f32,
    pub chase_speed: f32,
    /// Скорость в Attack (0 = стоим на месте)
    pub attack_speed: f32,
    pub stopping_distance: f32,
    /// Радиус поиска walkable точки для moveTo
    pub move_search_radius: f32,
    pub path_update_interval: f32,
    pub strafe_distance: f32,
    pub strafe_change_interval: f32,
    pub strafe_speed_multiplier: f32,

    // === Patrol ===
    pub patrol_radius: f32,
    pub patrol_wait_time: f32,

    // === Combat ===
    /// 0 = идеальный прицел, 1 = ±90° ошибки
    pub aim_precision: f32,
    /// Пауза между атаками в Attack state
    pub attack_interval: f32,
    /// Минимальный период между выстрелами (weapon cooldown)
    pub fire_rate: f32,
    pub reload_time: f32,
    pub max_ammo: u32,
    pub projectile_speed: f32,
    pub projectile_damage: u32,
    pub projectile_range: f32,

    // === Timing ===
    pub ai_update_interval: f32,
    /// Сколько держим потерянную цель до возврата в Patrol
    pub alert_time: f32,
    /// Сколько Attack терпит потерю line of sight
    pub attack_retry_interval: f32,

    pub max_health: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            detection_range: 10.0,
            field_of_view: 90.0,
            perception_interval: 0.1,
            obstacle_mask: LayerMask(1),
            target_mask: LayerMask(2),

            attack_range: 5.0,
            lose_target_range: 15.0,
            min_distance_to_target: 2.0,
            retreat_distance: 4.0,

            default_speed: 3.0,
            chase_speed: 5.0,
            attack_speed: 0.0,
            stopping_distance: 1.0,
            move_search_radius: 5.0,
            path_update_interval: 0.5,
            strafe_distance: 3.0,
            strafe_change_interval: 2.0,
            strafe_speed_multiplier: 1.2,

            patrol_radius: 8.0,
            patrol_wait_time: 3.0,

            aim_precision: 0.1,
            attack_interval: 0.5,
            fire_rate: 0.5,
            reload_time: 2.0,
            max_ammo: 30,
            projectile_speed: 10.0,
            projectile_damage: 10,
            projectile_range: 20.0,

            ai_update_interval: 0.05,
            alert_time: 5.0,
            attack_retry_interval: 1.0,

            max_health: 100,
        }
    }
}

impl AgentConfig {
    /// Проверяет инварианты схемы; первый нарушенный возвращается как ошибка
    pub fn validate(&self) -> ConfigResult<()> {
        let positive = [
            ("detection_range", self.detection_range),
            ("attack_range", self.attack_range),
            ("min_distance_to_target", self.min_distance_to_target),
            ("default_speed", self.default_speed),
            ("chase_speed", self.chase_speed),
            ("perception_interval", self.perception_interval),
            ("ai_update_interval", self.ai_update_interval),
            ("path_update_interval", self.path_update_interval),
            ("reload_time", self.reload_time),
            ("fire_rate", self.fire_rate),
            ("move_search_radius", self.move_search_radius),
            ("patrol_radius", self.patrol_radius),
        ];
        for (field, value) in positive {
            // `!(v > 0)` ловит и NaN
            if !(value > 0.0) {
                return Err(ConfigError::NotPositive { field, value });
            }
        }

        let non_negative = [
            ("stopping_distance", self.stopping_distance),
            ("strafe_distance", self.strafe_distance),
            ("strafe_change_interval", self.strafe_change_interval),
            ("patrol_wait_time", self.patrol_wait_time),
            ("attack_interval", self.attack_interval),
            ("alert_time", self.alert_time),
            ("attack_retry_interval", self.attack_retry_interval),
        ];
        for (field, value) in non_negative {
            if !(value >= 0.0) {
                return Err(ConfigError::Negative { field, value });
            }
        }

        if self.lose_target_range <= self.detection_range {
            return Err(ConfigError::LoseRangeTooSmall {
                lose: self.lose_target_range,
                detection: self.detection_range,
            });
        }
        if self.attack_range > self.detection_range {
            return Err(ConfigError::AttackRangeTooLarge {
                attack: self.attack_range,
                detection: self.detection_range,
            });
        }
        if self.min_distance_to_target >= self.attack_range {
            return Err(ConfigError::MinDistanceTooLarge {
                min: self.min_distance_to_target,
                attack: self.attack_range,
            });
        }
        if self.retreat_distance <= self.min_distance_to_target {
            return Err(ConfigError::RetreatTooShort {
                retreat: self.retreat_distance,
                min: self.min_distance_to_target,
            });
        }
        if !(0.0..=1.0).contains(&self.aim_precision) {
            return Err(ConfigError::AimPrecisionOutOfRange(self.aim_precision));
        }
        if !(self.field_of_view > 0.0 && self.field_of_view <= 360.0) {
            return Err(ConfigError::FieldOfViewOutOfRange(self.field_of_view));
        }
        if self.ai_update_interval > self.path_update_interval {
            return Err(ConfigError::AiSlowerThanPathing {
                ai: self.ai_update_interval,
                path: self.path_update_interval,
            });
        }

        Ok(())
    }
}

/// Параметры scheduler'а сессии
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Seed для DeterministicRng (и per-agent RNG)
    pub seed: u64,
    /// Частота FixedUpdate (physics/movement step)
    pub tick_hz: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            tick_hz: 60.0,
        }
    }
}
