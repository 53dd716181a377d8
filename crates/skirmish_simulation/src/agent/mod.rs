//! AgentController — один AI агент целиком
//!
//! Порядок внутри tick(dt):
//! 1. decision tick (раз в ai_update_interval): perception refresh → FSM update
//! 2. physics step движения (каждый tick)
//! 3. reload timer
//! 4. доставка выстрелов в projectile subsystem (FireDispatcher)
//!
//! Агент без валидного AgentConfig inert: ошибка в лог, tick ничего не делает.

use crate::ai::{AIStateType, AgentContext, StateMachine, TargetMemory, TransitionError};
use crate::collaborators::{Services, Shooter, ShotRequest};
use crate::combat::{Combat, FireDispatcher, ShootIntent};
use crate::components::{
    AgentBody, AgentConfig, ConfigError, Health, SnapshotFlags, StateSnapshot,
};
use crate::events::{AgentEvent, EventBus};
use crate::movement::Movement;
use crate::perception::{Perception, SightChange};
use crate::shared::{AgentId, TargetHandle};
use crate::DeterministicRng;
use bevy::math::Vec2;
use std::sync::Arc;

// Tests (separate files with _tests suffix)
#[cfg(test)]
mod agent_tests;

pub struct AgentController {
    id: AgentId,
    /// None → агент inert
    config: Option<Arc<AgentConfig>>,

    body: AgentBody,
    health: Health,
    memory: TargetMemory,
    perception: Perception,
    movement: Movement,
    combat: Combat,
    dispatcher: FireDispatcher,
    /// Выстрелы, принятые в последнем tick (для репликации)
    fired: Vec<ShootIntent>,
    rng: DeterministicRng,
    machine: Option<StateMachine>,

    /// Локальное время симуляции агента (секунды)
    now: f32,
    last_ai_update_at: Option<f32>,
    target_valid: bool,
    dead: bool,
}

impl AgentController {
    /// `seed` — seed сессии; RNG агента выводится из него и id
    pub fn new(id: AgentId, position: Vec2, config: Option<Arc<AgentConfig>>, seed: u64) -> Self {
        let config = match config {
            None => {
                crate::log_error(&format!("{}: {}, agent is inert", id, ConfigError::Missing));
                None
            }
            Some(config) => match config.validate() {
                Ok(()) => Some(config),
                Err(err) => {
                    crate::log_error(&format!("{}: invalid AgentConfig ({}), agent is inert", id, err));
                    None
                }
            },
        };

        // Inert агент всё равно держит компоненты (для snapshot / debug)
        let fallback = AgentConfig::default();
        let effective = config.as_deref().unwrap_or(&fallback);

        Self {
            id,
            body: AgentBody::new(position),
            health: Health::new(effective.max_health),
            memory: TargetMemory::default(),
            perception: Perception::new(effective),
            movement: Movement::new(id, effective),
            combat: Combat::new(effective, 0.0),
            dispatcher: FireDispatcher::new(),
            fired: Vec::new(),
            rng: DeterministicRng::for_agent(seed, id),
            machine: config.is_some().then(StateMachine::new),
            config,
            now: 0.0,
            last_ai_update_at: None,
            target_valid: false,
            dead: false,
        }
    }

    /// Один fixed step агента
    pub fn tick(&mut self, dt: f32, services: &mut Services, events: &mut EventBus) {
        self.fired.clear();
        if self.dead {
            return;
        }
        let Some(config) = self.config.clone() else {
            return;
        };

        self.now += dt;

        let ai_due = self
            .last_ai_update_at
            .map_or(true, |last| self.now - last >= config.ai_update_interval);
        if ai_due {
            self.last_ai_update_at = Some(self.now);
            self.decision_tick(&config, services, events);
        }

        self.movement_step(dt, services, events);

        if self.combat.tick(self.now) {
            events.publish(AgentEvent::ReloadCompleted { agent: self.id });
        }

        self.deliver_shots(dt, services, events);
    }

    fn decision_tick(&mut self, config: &AgentConfig, services: &mut Services, events: &mut EventBus) {
        let (machine, mut ctx) = self.split_context(config, services, events);
        let Some(machine) = machine.as_mut() else {
            return;
        };

        if !machine.is_initialized() {
            if let Err(err) = machine.initialize(&mut ctx) {
                crate::log_error(&format!("{}: AI initialization failed: {}", ctx.agent, err));
                return;
            }
        }

        refresh_perception(&mut ctx);
        machine.update(&mut ctx);

        let target_valid = ctx.is_target_valid();
        self.target_valid = target_valid;
    }

    fn movement_step(&mut self, dt: f32, services: &mut Services, events: &mut EventBus) {
        let step = self
            .movement
            .physics_step(self.body.position, dt, self.now, &mut *services.navigation);

        if step.position != self.body.position {
            self.body.face_towards(step.position);
            self.body.position = step.position;
        }
        if step.arrived {
            events.publish(AgentEvent::DestinationReached {
                agent: self.id,
                position: self.body.position,
            });
        }
    }

    fn deliver_shots(&mut self, dt: f32, services: &mut Services, events: &mut EventBus) {
        for abandoned in self.dispatcher.tick(dt, &mut *services.projectiles) {
            events.publish(AgentEvent::ShotAbandoned {
                agent: self.id,
                waited: abandoned.waited,
            });
        }

        let projectile = self.combat.projectile();
        for intent in self.combat.take_intents() {
            self.fired.push(intent);
            let request = ShotRequest {
                owner: Shooter::Agent(self.id),
                origin: intent.origin,
                angle: intent.angle,
                speed: projectile.speed,
                damage: projectile.damage,
                range: projectile.range,
            };
            self.dispatcher.dispatch(request, &mut *services.projectiles);
        }
    }

    /// Разбивает self на StateMachine и AgentContext (непересекающиеся borrows)
    fn split_context<'a>(
        &'a mut self,
        config: &'a AgentConfig,
        services: &'a mut Services<'_>,
        events: &'a mut EventBus,
    ) -> (&'a mut Option<StateMachine>, AgentContext<'a>) {
        let Self {
            id,
            body,
            memory,
            perception,
            movement,
            combat,
            rng,
            machine,
            now,
            ..
        } = self;

        let ctx = AgentContext {
            agent: *id,
            now: *now,
            config,
            body,
            memory,
            perception,
            movement,
            combat,
            rng: &mut rng.rng,
            navigation: &mut *services.navigation,
            physics: services.physics,
            targets: services.targets,
            events,
        };
        (machine, ctx)
    }

    // === Внешние команды ===

    /// Назначить цель снаружи (например, агро от урона)
    pub fn set_target(&mut self, target: Option<TargetHandle>, services: &mut Services, events: &mut EventBus) {
        let Some(config) = self.config.clone() else {
            return;
        };
        let (_, mut ctx) = self.split_context(&config, services, events);
        ctx.set_target(target);
    }

    /// Forced переход (admin / debug), мимо guard'ов
    pub fn force_state(
        &mut self,
        state: AIStateType,
        services: &mut Services,
        events: &mut EventBus,
    ) -> Result<(), TransitionError> {
        let Some(config) = self.config.clone() else {
            return Err(TransitionError::NotInitialized);
        };
        let (machine, mut ctx) = self.split_context(&config, services, events);
        let machine = machine.as_mut().ok_or(TransitionError::NotInitialized)?;
        if !machine.is_initialized() {
            machine.initialize(&mut ctx)?;
        }
        machine.change_state(state, true, &mut ctx)
    }

    /// Урон; true если агент умер именно от этого удара
    pub fn apply_damage(&mut self, amount: u32, events: &mut EventBus) -> bool {
        if self.dead {
            return false;
        }
        self.health.take_damage(amount);
        events.publish(AgentEvent::HealthChanged {
            agent: self.id,
            current: self.health.current,
            max: self.health.max,
        });

        if self.health.is_alive() {
            return false;
        }
        self.dead = true;
        self.movement.stop();
        crate::log(&format!("💀 {} died", self.id));
        events.publish(AgentEvent::Death { agent: self.id });
        true
    }

    pub fn heal(&mut self, amount: u32, events: &mut EventBus) {
        if self.dead {
            return;
        }
        self.health.heal(amount);
        events.publish(AgentEvent::HealthChanged {
            agent: self.id,
            current: self.health.current,
            max: self.health.max,
        });
    }

    /// Despawn: навигация забывает путь агента
    pub fn despawn(&mut self, services: &mut Services) {
        services.navigation.forget(self.id);
        self.dead = true;
    }

    // === Snapshot / getters ===

    pub fn snapshot(&self) -> StateSnapshot {
        let position = self.body.position;
        let mut flags = SnapshotFlags::empty();
        if self.combat.is_reloading() {
            flags.insert(SnapshotFlags::RELOADING);
        }
        let strafing = self.movement.is_strafing();
        if strafing {
            flags.insert(SnapshotFlags::STRAFING);
        }

        let mut snapshot = StateSnapshot {
            state: self.state(),
            position,
            movement_target: self.movement.destination().unwrap_or(position),
            last_known_target_position: self.memory.last_known_position.unwrap_or(position),
            look_angle: self.combat.look_angle(),
            flags,
            strafe_direction: if strafing { self.movement.strafe_side() } else { 0.0 },
            target_id: self.memory.current,
            has_valid_target: self.target_valid && self.memory.current.is_some(),
            timestamp: self.now as f64,
        };
        if let Some(machine) = &self.machine {
            machine.contribute_snapshot(&mut snapshot);
        }
        snapshot
    }

    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn state(&self) -> AIStateType {
        self.machine
            .as_ref()
            .map_or(AIStateType::Patrol, |machine| machine.current_state())
    }

    pub fn machine(&self) -> Option<&StateMachine> {
        self.machine.as_ref()
    }

    pub fn config(&self) -> Option<&AgentConfig> {
        self.config.as_deref()
    }

    pub fn is_inert(&self) -> bool {
        self.config.is_none()
    }

    pub fn is_alive(&self) -> bool {
        !self.dead
    }

    pub fn now(&self) -> f32 {
        self.now
    }

    pub fn position(&self) -> Vec2 {
        self.body.position
    }

    pub fn body(&self) -> &AgentBody {
        &self.body
    }

    pub fn health(&self) -> &Health {
        &self.health
    }

    pub fn target(&self) -> Option<TargetHandle> {
        self.memory.current
    }

    pub fn target_memory(&self) -> &TargetMemory {
        &self.memory
    }

    pub fn perception(&self) -> &Perception {
        &self.perception
    }

    pub fn movement(&self) -> &Movement {
        &self.movement
    }

    pub fn combat(&self) -> &Combat {
        &self.combat
    }

    pub fn combat_mut(&mut self) -> &mut Combat {
        &mut self.combat
    }

    /// Выстрелы последнего tick (origin + angle)
    pub fn shots_this_tick(&self) -> &[ShootIntent] {
        &self.fired
    }

    pub fn pending_shots(&self) -> usize {
        self.dispatcher.pending_count()
    }
}

/// Perception refresh отслеживаемой цели + события видимости
fn refresh_perception(ctx: &mut AgentContext) {
    let view = ctx.view();
    let tracked = ctx
        .memory
        .current
        .and_then(|target| ctx.targets.position(target).map(|position| (target, position)));

    let change = ctx.perception.refresh(ctx.now, &view, tracked, ctx.physics);
    match change {
        Some(SightChange::Acquired(target)) => ctx.publish(AgentEvent::TargetInSight {
            agent: ctx.agent,
            target,
        }),
        Some(SightChange::Lost { target, last_seen }) => ctx.publish(AgentEvent::TargetOutOfSight {
            agent: ctx.agent,
            target,
            last_seen,
        }),
        None => {}
    }
}
