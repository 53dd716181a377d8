//! Мир сессии с игроками
//!
//! `NetWorld` — `SessionWorld`, в котором целями AI являются аватары игроков
//! (`PlayerRoster`). `ArenaWorld` — headless реализация поверх sandbox.

use crate::player::PlayerRoster;
use skirmish_simulation::sandbox::{Arena, OpenField, ProjectileLog};
use skirmish_simulation::{ProjectileSystem, Services, SessionWorld};

pub trait NetWorld: SessionWorld {
    fn roster(&self) -> &PlayerRoster;

    /// Roster + projectile subsystem одновременно (выстрелы игроков)
    fn players_mut(&mut self) -> (&mut PlayerRoster, &mut dyn ProjectileSystem);
}

/// Sandbox навигация/стены + игроки как цели
#[derive(Debug, Clone, Default)]
pub struct ArenaWorld {
    pub navigation: OpenField,
    /// Только стены: цели — `roster`
    pub arena: Arena,
    pub projectiles: ProjectileLog,
    pub roster: PlayerRoster,
}

impl ArenaWorld {
    pub fn new(navigation: OpenField, arena: Arena, roster: PlayerRoster) -> Self {
        Self {
            navigation,
            arena,
            projectiles: ProjectileLog::ready(),
            roster,
        }
    }
}

impl SessionWorld for ArenaWorld {
    fn services(&mut self) -> Services<'_> {
        Services {
            navigation: &mut self.navigation,
            physics: &self.arena,
            projectiles: &mut self.projectiles,
            targets: &self.roster,
        }
    }
}

impl NetWorld for ArenaWorld {
    fn roster(&self) -> &PlayerRoster {
        &self.roster
    }

    fn players_mut(&mut self) -> (&mut PlayerRoster, &mut dyn ProjectileSystem) {
        (&mut self.roster, &mut self.projectiles)
    }
}
