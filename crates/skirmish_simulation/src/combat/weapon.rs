//! Combat state агента: ammo, reload, aim, fire-rate.
//!
//! Таймеры — не корутины: reload считается по timestamp'ам, которые
//! двигает tick(now). Инвариант: 0 ≤ ammo ≤ max_ammo после любой мутации.

use crate::components::AgentConfig;
use crate::shared::{bearing_degrees, normalize_degrees};
use bevy::math::Vec2;
use rand::Rng;

/// Нижняя граница периода стрельбы (секунды)
pub const MIN_FIRE_RATE: f32 = 0.1;

/// Параметры projectile (передаются в projectile subsystem как есть)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectileSpec {
    pub speed: f32,
    pub damage: u32,
    pub range: f32,
}

/// Intent: выстрел принят, projectile ещё не создан
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShootIntent {
    pub origin: Vec2,
    /// Градусы, [0, 360)
    pub angle: f32,
}

#[derive(Debug, Clone)]
pub struct Combat {
    max_ammo: u32,
    ammo: u32,

    /// Минимальный период между выстрелами
    fire_rate: f32,
    last_shot_at: f32,

    reload_time: f32,
    reloading: bool,
    reload_started_at: f32,
    reload_progress: f32,

    aim_precision: f32,
    look_angle: f32,

    projectile: ProjectileSpec,
    intents: Vec<ShootIntent>,
}

impl Combat {
    /// `created_at` — время спавна: первый выстрел не раньше created_at + fire_rate
    pub fn new(config: &AgentConfig, created_at: f32) -> Self {
        Self {
            max_ammo: config.max_ammo,
            ammo: config.max_ammo,
            fire_rate: config.fire_rate.max(MIN_FIRE_RATE),
            last_shot_at: created_at,
            reload_time: config.reload_time,
            reloading: false,
            reload_started_at: 0.0,
            reload_progress: 0.0,
            aim_precision: config.aim_precision.clamp(0.0, 1.0),
            look_angle: 0.0,
            projectile: ProjectileSpec {
                speed: config.projectile_speed,
                damage: config.projectile_damage,
                range: config.projectile_range,
            },
            intents: Vec::new(),
        }
    }

    // === Aim ===

    /// Bearing на точку + случайная ошибка в ±aim_precision·90°
    ///
    /// Результат нормализован в [0, 360) и сохраняется для репликации.
    pub fn aim_at(&mut self, from: Vec2, point: Vec2, rng: &mut impl Rng) -> f32 {
        let bearing = bearing_degrees(from, point);
        let spread = self.aim_precision * 90.0;
        let error = if spread > 0.0 {
            rng.gen_range(-spread..=spread)
        } else {
            0.0
        };

        self.look_angle = normalize_degrees(bearing + error);
        self.look_angle
    }

    pub fn look_angle(&self) -> f32 {
        self.look_angle
    }

    pub fn set_look_angle(&mut self, angle: f32) {
        self.look_angle = normalize_degrees(angle);
    }

    // === Fire ===

    pub fn is_fire_ready(&self, now: f32) -> bool {
        now - self.last_shot_at >= self.fire_rate
    }

    /// Не перезаряжаемся, есть патроны, fire-rate период прошёл
    pub fn can_shoot(&self, now: f32) -> bool {
        !self.reloading && self.ammo > 0 && self.is_fire_ready(now)
    }

    /// Успех → -1 патрон, timestamp выстрела, ShootIntent в очередь
    pub fn try_shoot(&mut self, now: f32, origin: Vec2) -> bool {
        if !self.can_shoot(now) {
            return false;
        }

        self.ammo -= 1;
        self.last_shot_at = now;
        self.intents.push(ShootIntent {
            origin,
            angle: self.look_angle,
        });
        true
    }

    /// Забирает накопленные intents (для FireDispatcher)
    pub fn take_intents(&mut self) -> Vec<ShootIntent> {
        std::mem::take(&mut self.intents)
    }

    pub fn projectile(&self) -> ProjectileSpec {
        self.projectile
    }

    pub fn set_fire_rate(&mut self, period: f32) {
        self.fire_rate = period.max(MIN_FIRE_RATE);
    }

    pub fn fire_rate(&self) -> f32 {
        self.fire_rate
    }

    // === Reload ===

    /// Idempotent: повторный вызов во время перезарядки ничего не меняет
    ///
    /// true если перезарядка началась именно сейчас.
    pub fn start_reload(&mut self, now: f32) -> bool {
        if self.reloading {
            return false;
        }
        self.reloading = true;
        self.reload_started_at = now;
        self.reload_progress = 0.0;
        true
    }

    /// Двигает reload timer; true на тике завершения перезарядки
    pub fn tick(&mut self, now: f32) -> bool {
        if !self.reloading {
            return false;
        }

        let elapsed = now - self.reload_started_at;
        let progress = if self.reload_time > 0.0 {
            (elapsed / self.reload_time).clamp(0.0, 1.0)
        } else {
            1.0
        };
        // Монотонно, даже если now прыгнул назад
        self.reload_progress = self.reload_progress.max(progress);

        if self.reload_progress >= 1.0 {
            self.complete_reload();
            return true;
        }
        false
    }

    /// Мгновенно завершает перезарядку (admin / replication)
    pub fn force_complete_reload(&mut self) {
        if self.reloading {
            self.complete_reload();
        }
    }

    fn complete_reload(&mut self) {
        self.reloading = false;
        self.reload_progress = 1.0;
        self.ammo = self.max_ammo;
    }

    pub fn is_reloading(&self) -> bool {
        self.reloading
    }

    /// elapsed / duration в [0, 1]; 0 если не перезаряжаемся
    pub fn reload_progress(&self) -> f32 {
        if self.reloading {
            self.reload_progress
        } else {
            0.0
        }
    }

    // === Ammo ===

    pub fn ammo(&self) -> u32 {
        self.ammo
    }

    pub fn max_ammo(&self) -> u32 {
        self.max_ammo
    }

    pub fn set_ammo(&mut self, ammo: u32) {
        self.ammo = ammo.min(self.max_ammo);
    }

    pub fn add_ammo(&mut self, amount: u32) {
        self.ammo = self.ammo.saturating_add(amount).min(self.max_ammo);
    }
}
