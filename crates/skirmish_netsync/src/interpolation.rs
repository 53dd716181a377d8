//! Aim angle interpolation на стороне наблюдателя
//!
//! Aim angle приходит реже, чем идёт tick. Между приходами наблюдатель
//! плавно доворачивает угол (lerp по кратчайшей дуге), а не прыгает.
//! Snap сразу: первое значение, значение после тишины, скачок > 90°.

use skirmish_simulation::{delta_degrees, lerp_degrees, normalize_degrees};

/// Скорость lerp (доля за секунду, `dt * 20` клампится в 1)
pub const AIM_LERP_SPEED: f32 = 20.0;
/// Ближе этого — ставим точное значение и прекращаем lerp (градусы)
pub const AIM_SNAP_EPSILON: f32 = 0.5;
/// Тишина дольше этого → следующее значение применяется сразу (секунды)
pub const AIM_SILENCE_SNAP: f32 = 1.0;
/// Разрыв больше этого → snap (градусы)
pub const AIM_DISCONTINUITY: f32 = 90.0;

#[derive(Debug, Clone, Default)]
pub struct AngleInterpolator {
    current: f32,
    target: f32,
    interpolating: bool,
    has_value: bool,
    silence: f32,
}

impl AngleInterpolator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Новое значение с сервера
    pub fn receive(&mut self, angle: f32) {
        let angle = normalize_degrees(angle);
        let snap = !self.has_value
            || self.silence >= AIM_SILENCE_SNAP
            || delta_degrees(self.current, angle).abs() > AIM_DISCONTINUITY;

        self.target = angle;
        self.silence = 0.0;
        self.has_value = true;

        if snap {
            self.current = angle;
            self.interpolating = false;
        } else {
            self.interpolating = true;
        }
    }

    /// Прямая установка без lerp (owner prediction)
    pub fn set_immediate(&mut self, angle: f32) {
        let angle = normalize_degrees(angle);
        self.current = angle;
        self.target = angle;
        self.interpolating = false;
        self.has_value = true;
        self.silence = 0.0;
    }

    /// Локальный кадр; возвращает текущий угол
    pub fn update(&mut self, dt: f32) -> f32 {
        self.silence += dt;

        if self.interpolating {
            if delta_degrees(self.current, self.target).abs() > AIM_SNAP_EPSILON {
                self.current = lerp_degrees(self.current, self.target, dt * AIM_LERP_SPEED);
            } else {
                self.current = self.target;
                self.interpolating = false;
            }
        }
        self.current
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn is_interpolating(&self) -> bool {
        self.interpolating
    }
}
