//! Внешние коллабораторы симуляции (interfaces only)
//!
//! Pathfinding, physics queries, projectile subsystem и target registry живут
//! снаружи core (движок, сервер). Агент получает их явно через `Services`
//! на каждый tick, никаких глобальных синглтонов.
//!
//! Reference-реализации для headless/tests: `crate::sandbox`.

use crate::shared::{AgentId, LayerMask, TargetHandle};
use bevy::math::Vec2;
use thiserror::Error;

/// Результат запроса пути
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathRequest {
    Accepted,
    Rejected,
}

/// Black-box «find path to point» сервис + locomotion вдоль пути
pub trait Pathfinding: Send + Sync {
    /// Ближайшая walkable точка в радиусе `search_radius` от `point`
    fn sample_walkable(&self, point: Vec2, search_radius: f32) -> Option<Vec2>;

    fn request_path(&mut self, agent: AgentId, from: Vec2, to: Vec2) -> PathRequest;

    /// Оставшаяся длина пути (0 если пути нет)
    fn remaining_distance(&self, agent: AgentId) -> f32;

    fn has_path(&self, agent: AgentId) -> bool;

    /// Physics step: продвигает агента вдоль пути не дальше `max_step`,
    /// возвращает новую позицию
    fn advance(&mut self, agent: AgentId, from: Vec2, max_step: f32) -> Vec2;

    /// Despawn: забыть путь агента
    fn forget(&mut self, _agent: AgentId) {}
}

/// Кандидат из overlap query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub handle: TargetHandle,
    pub position: Vec2,
}

/// Геометрические запросы к physics
pub trait PhysicsQuery: Send + Sync {
    /// true если непрозрачное препятствие пересекает отрезок from → to
    fn raycast_blocked(&self, from: Vec2, to: Vec2, obstacle_mask: LayerMask) -> bool;

    /// Тела на слоях `target_mask` в радиусе; не больше `limit` штук
    fn overlap_candidates(
        &self,
        origin: Vec2,
        radius: f32,
        target_mask: LayerMask,
        limit: usize,
    ) -> Vec<Candidate>;
}

/// Кто стреляет (AI агент или аватар игрока)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shooter {
    Agent(AgentId),
    Avatar(TargetHandle),
}

/// Запрос на спавн projectile
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShotRequest {
    pub owner: Shooter,
    pub origin: Vec2,
    /// Градусы, [0, 360)
    pub angle: f32,
    pub speed: f32,
    pub damage: u32,
    pub range: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FireError {
    /// Подсистема ещё не инициализирована: retry позже
    #[error("projectile subsystem is not ready")]
    NotReady,
    /// Окончательный отказ: выстрел отбрасывается
    #[error("projectile rejected: {0}")]
    Rejected(String),
}

pub trait ProjectileSystem: Send + Sync {
    fn fire(&mut self, shot: &ShotRequest) -> Result<(), FireError>;
}

/// Реестр целей сессии (игроки и т.п.)
pub trait TargetRegistry: Send + Sync {
    fn all_live_targets(&self) -> Vec<TargetHandle>;

    /// None если цель despawned
    fn position(&self, target: TargetHandle) -> Option<Vec2>;

    fn is_alive(&self, target: TargetHandle) -> bool;
}

/// Набор коллабораторов на один tick (explicit dependency injection)
pub struct Services<'a> {
    pub navigation: &'a mut dyn Pathfinding,
    pub physics: &'a dyn PhysicsQuery,
    pub projectiles: &'a mut dyn ProjectileSystem,
    pub targets: &'a dyn TargetRegistry,
}
