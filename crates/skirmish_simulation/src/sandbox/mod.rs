//! Sandbox — in-memory коллабораторы для headless режима
//!
//! Замена движка (navmesh, colliders, bullet manager), когда симуляция
//! крутится без него: headless demo, determinism и scenario тесты.
//! - OpenField: прямолинейная навигация в прямоугольнике с «дырами»
//! - Arena: стены-отрезки (raycast) + цели (overlap, TargetRegistry)
//! - ProjectileLog: записывает выстрелы, умеет «прогреваться» (NotReady)

pub mod arena;
pub mod navigation;
pub mod projectiles;

pub use arena::{Arena, ArenaTarget, Wall};
pub use navigation::OpenField;
pub use projectiles::ProjectileLog;

use crate::collaborators::Services;
use crate::session::SessionWorld;

/// Полный headless мир: навигация + арена + projectile log
#[derive(Debug, Clone, Default)]
pub struct SandboxWorld {
    pub navigation: OpenField,
    pub arena: Arena,
    pub projectiles: ProjectileLog,
}

impl SandboxWorld {
    pub fn new(navigation: OpenField, arena: Arena) -> Self {
        Self {
            navigation,
            arena,
            projectiles: ProjectileLog::ready(),
        }
    }
}

impl SessionWorld for SandboxWorld {
    fn services(&mut self) -> Services<'_> {
        Services {
            navigation: &mut self.navigation,
            physics: &self.arena,
            projectiles: &mut self.projectiles,
            targets: &self.arena,
        }
    }
}
