//! Тестовый стенд: поля агента + sandbox мир, из которых собирается AgentContext

use crate::ai::{AgentContext, TargetMemory};
use crate::collaborators::TargetRegistry;
use crate::combat::Combat;
use crate::components::{AgentBody, AgentConfig};
use crate::events::{EventBus, EventKind};
use crate::movement::Movement;
use crate::perception::Perception;
use crate::sandbox::SandboxWorld;
use crate::shared::AgentId;
use bevy::math::Vec2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

pub(crate) const AGENT: AgentId = AgentId(7);

pub(crate) struct Rig {
    pub config: AgentConfig,
    pub body: AgentBody,
    pub memory: TargetMemory,
    pub perception: Perception,
    pub movement: Movement,
    pub combat: Combat,
    pub rng: ChaCha8Rng,
    pub world: SandboxWorld,
    pub events: EventBus,
}

impl Rig {
    pub fn new(position: Vec2) -> Self {
        Self::with_config(AgentConfig::default(), position)
    }

    pub fn with_config(config: AgentConfig, position: Vec2) -> Self {
        Self {
            body: AgentBody::new(position),
            memory: TargetMemory::default(),
            perception: Perception::new(&config),
            movement: Movement::new(AGENT, &config),
            combat: Combat::new(&config, 0.0),
            rng: ChaCha8Rng::seed_from_u64(1234),
            world: SandboxWorld::default(),
            events: EventBus::new(),
            config,
        }
    }

    pub fn ctx(&mut self, now: f32) -> AgentContext<'_> {
        AgentContext {
            agent: AGENT,
            now,
            config: &self.config,
            body: &mut self.body,
            memory: &mut self.memory,
            perception: &mut self.perception,
            movement: &mut self.movement,
            combat: &mut self.combat,
            rng: &mut self.rng,
            navigation: &mut self.world.navigation,
            physics: &self.world.arena,
            targets: &self.world.arena,
            events: &mut self.events,
        }
    }

    /// То же, что делает контроллер перед decision tick
    pub fn refresh_perception(&mut self, now: f32) {
        let view = self.ctx(now).view();
        let tracked = self.memory.current.and_then(|handle| {
            self.world
                .arena
                .position(handle)
                .map(|position| (handle, position))
        });
        self.perception
            .refresh(now, &view, tracked, &self.world.arena);
    }

    pub fn drain_kinds(&mut self) -> Vec<EventKind> {
        self.events
            .drain_recent()
            .iter()
            .map(|event| event.kind())
            .collect()
    }
}
