//! Combat module (ranged, authoritative)
//!
//! Combat ответственность:
//! - Ammo / reload timer / fire-rate gating
//! - Aim: bearing + bounded random error (aim_precision)
//! - ShootIntent: решение «стреляем», но не сам projectile
//!
//! Projectile subsystem (внешний) получает ShotRequest через FireDispatcher,
//! который ждёт его готовности с bounded retry.

pub mod dispatch;
pub mod weapon;


// Re-export основных типов
pub use dispatch::{AbandonedShot, DispatchStatus, FireDispatcher, FIRE_MAX_WAIT, FIRE_RETRY_INTERVAL};
pub use weapon::{Combat, ProjectileSpec, ShootIntent, MIN_FIRE_RATE};
