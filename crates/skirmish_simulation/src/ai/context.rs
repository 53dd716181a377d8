//! AgentContext — всё, что state видит во время enter/update/exit
//!
//! Собирается контроллером на каждый decision tick из полей агента и
//! коллабораторов сессии. States не хранят ссылок между тиками.

use crate::collaborators::{PhysicsQuery, Pathfinding, TargetRegistry};
use crate::combat::Combat;
use crate::components::{AgentBody, AgentConfig};
use crate::events::{AgentEvent, EventBus};
use crate::movement::Movement;
use crate::perception::{Perception, Viewpoint};
use crate::shared::{AgentId, TargetHandle};
use bevy::math::Vec2;
use rand_chacha::ChaCha8Rng;

/// Память о цели (переживает смену состояний)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TargetMemory {
    pub current: Option<TargetHandle>,
    pub last_known_position: Option<Vec2>,
}

pub struct AgentContext<'a> {
    pub agent: AgentId,
    /// Время симуляции агента (секунды)
    pub now: f32,
    pub config: &'a AgentConfig,

    pub body: &'a mut AgentBody,
    pub memory: &'a mut TargetMemory,
    pub perception: &'a mut Perception,
    pub movement: &'a mut Movement,
    pub combat: &'a mut Combat,
    pub rng: &'a mut ChaCha8Rng,

    pub navigation: &'a mut dyn Pathfinding,
    pub physics: &'a dyn PhysicsQuery,
    pub targets: &'a dyn TargetRegistry,
    pub events: &'a mut EventBus,
}

impl AgentContext<'_> {
    pub fn publish(&mut self, event: AgentEvent) {
        self.events.publish(event);
    }

    pub fn target(&self) -> Option<TargetHandle> {
        self.memory.current
    }

    /// Позиция текущей цели из registry (None если цели нет или despawned)
    pub fn target_position(&self) -> Option<Vec2> {
        self.memory
            .current
            .and_then(|target| self.targets.position(target))
    }

    /// Цель есть, жива и у неё есть позиция
    pub fn is_target_valid(&self) -> bool {
        self.memory.current.is_some_and(|target| {
            self.targets.is_alive(target) && self.targets.position(target).is_some()
        })
    }

    /// f32::MAX без валидной позиции цели
    pub fn distance_to_target(&self) -> f32 {
        self.target_position()
            .map_or(f32::MAX, |position| self.body.position.distance(position))
    }

    /// Вовлечённый в бой агент смотрит на цель, иначе по facing
    pub fn view(&self) -> Viewpoint {
        let eye = self.body.position;
        let forward = self
            .is_target_valid()
            .then(|| self.target_position())
            .flatten()
            .map(|position| position - eye)
            .filter(|dir| *dir != Vec2::ZERO)
            .unwrap_or(self.body.facing);

        Viewpoint { eye, forward }
    }

    /// Perception cache: видна ли ИМЕННО текущая цель
    pub fn target_in_sight(&self) -> bool {
        self.memory.current.is_some()
            && self.perception.tracked() == self.memory.current
            && self.perception.target_in_sight()
    }

    /// Смена цели: TargetLost для старой, TargetFound для новой
    ///
    /// Повторная установка той же цели событий не публикует.
    pub fn set_target(&mut self, target: Option<TargetHandle>) {
        let previous = self.memory.current;
        if previous == target {
            return;
        }

        if let Some(old) = previous {
            self.publish(AgentEvent::TargetLost {
                agent: self.agent,
                target: old,
            });
        }

        self.memory.current = target;

        if let Some(new) = target {
            if let Some(position) = self.targets.position(new) {
                self.memory.last_known_position = Some(position);
            }
            self.publish(AgentEvent::TargetFound {
                agent: self.agent,
                target: new,
            });
        }
    }

    pub fn clear_target(&mut self) {
        self.set_target(None);
    }

    /// moveTo + MovementStarted; false если навигация отказала
    pub fn move_to(&mut self, point: Vec2) -> bool {
        let started = self
            .movement
            .move_to(self.body.position, point, self.now, self.navigation);
        if started {
            if let Some(destination) = self.movement.destination() {
                self.publish(AgentEvent::MovementStarted {
                    agent: self.agent,
                    destination,
                });
            }
        }
        started
    }

    /// Strafe вокруг точки + StrafeStarted (с текущей стороной)
    pub fn strafe_around(&mut self, point: Vec2) -> bool {
        let started = self.movement.strafe_around_target(
            self.body.position,
            point,
            self.now,
            self.navigation,
        );
        if started {
            self.publish(AgentEvent::StrafeStarted {
                agent: self.agent,
                direction: self.movement.strafe_side(),
            });
        }
        started
    }

    pub fn has_reached_destination(&self) -> bool {
        self.movement.has_reached_destination(&*self.navigation)
    }

    /// Прицеливание (с ошибкой aim_precision) + разворот тела к цели
    pub fn aim_at(&mut self, point: Vec2) -> f32 {
        self.body.face_towards(point);
        self.combat.aim_at(self.body.position, point, &mut *self.rng)
    }
}
