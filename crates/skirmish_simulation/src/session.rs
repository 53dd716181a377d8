//! Session — набор агентов + коллабораторы мира + event bus
//!
//! Scheduler: Bevy FixedUpdate (детерминированный fixed step). Bevy здесь
//! только планировщик: агенты — обычные structs внутри ресурса `Session`,
//! никаких ECS entity на агента.

use crate::agent::AgentController;
use crate::collaborators::Services;
use crate::components::{AgentConfig, SessionConfig, StateSnapshot};
use crate::events::EventBus;
use crate::shared::{AgentId, TargetHandle};
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

/// Мир сессии: отдаёт коллабораторов на один tick
pub trait SessionWorld: Send + Sync + 'static {
    fn services(&mut self) -> Services<'_>;
}

/// Порядок внутри FixedUpdate: сначала агенты, потом репликация
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimulationSet {
    Tick,
    Replicate,
}

#[derive(Resource)]
pub struct Session<W: SessionWorld> {
    seed: u64,
    tick_hz: f64,
    /// BTreeMap → агенты тикают в порядке id (детерминизм)
    agents: BTreeMap<AgentId, AgentController>,
    events: EventBus,
    world: W,
    next_agent_id: u32,
    elapsed: f64,
    tick_count: u64,
}

impl<W: SessionWorld> Session<W> {
    pub fn new(config: &SessionConfig, world: W) -> Self {
        Self {
            seed: config.seed,
            tick_hz: config.tick_hz,
            agents: BTreeMap::new(),
            events: EventBus::new(),
            world,
            next_agent_id: 1,
            elapsed: 0.0,
            tick_count: 0,
        }
    }

    /// Новый агент; None / невалидный config → inert агент (с error log)
    pub fn spawn_agent(&mut self, position: Vec2, config: Option<Arc<AgentConfig>>) -> AgentId {
        let id = AgentId(self.next_agent_id);
        self.next_agent_id += 1;
        self.agents
            .insert(id, AgentController::new(id, position, config, self.seed));
        crate::log(&format!(
            "{} spawned at ({:.2}, {:.2})",
            id, position.x, position.y
        ));
        id
    }

    pub fn despawn_agent(&mut self, id: AgentId) -> bool {
        match self.agents.remove(&id) {
            Some(mut agent) => {
                agent.despawn(&mut self.world.services());
                crate::log(&format!("{} despawned", id));
                true
            }
            None => false,
        }
    }

    /// Один fixed step всех агентов
    pub fn tick(&mut self, dt: f32) {
        let mut services = self.world.services();
        for agent in self.agents.values_mut() {
            agent.tick(dt, &mut services, &mut self.events);
        }
        self.elapsed += dt as f64;
        self.tick_count += 1;
    }

    /// None если агента нет; Some(true) если удар был смертельным
    pub fn apply_damage(&mut self, id: AgentId, amount: u32) -> Option<bool> {
        let agent = self.agents.get_mut(&id)?;
        Some(agent.apply_damage(amount, &mut self.events))
    }

    pub fn set_target(&mut self, id: AgentId, target: Option<TargetHandle>) -> bool {
        let Some(agent) = self.agents.get_mut(&id) else {
            return false;
        };
        agent.set_target(target, &mut self.world.services(), &mut self.events);
        true
    }

    pub fn snapshots(&self) -> Vec<(AgentId, StateSnapshot)> {
        self.agents
            .iter()
            .map(|(id, agent)| (*id, agent.snapshot()))
            .collect()
    }

    pub fn agent(&self, id: AgentId) -> Option<&AgentController> {
        self.agents.get(&id)
    }

    pub fn agent_mut(&mut self, id: AgentId) -> Option<&mut AgentController> {
        self.agents.get_mut(&id)
    }

    pub fn agents(&self) -> impl Iterator<Item = &AgentController> {
        self.agents.values()
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn tick_hz(&self) -> f64 {
        self.tick_hz
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }
}

/// Регистрирует tick сессии в FixedUpdate
pub struct SimulationPlugin<W: SessionWorld> {
    tick_hz: f64,
    _world: PhantomData<fn() -> W>,
}

impl<W: SessionWorld> SimulationPlugin<W> {
    pub fn new(tick_hz: f64) -> Self {
        Self {
            tick_hz,
            _world: PhantomData,
        }
    }
}

impl<W: SessionWorld> Default for SimulationPlugin<W> {
    fn default() -> Self {
        Self::new(SessionConfig::default().tick_hz)
    }
}

impl<W: SessionWorld> Plugin for SimulationPlugin<W> {
    fn build(&self, app: &mut App) {
        app
            // Fixed timestep для simulation tick
            .insert_resource(Time::<Fixed>::from_hz(self.tick_hz))
            .configure_sets(
                FixedUpdate,
                (SimulationSet::Tick, SimulationSet::Replicate).chain(),
            )
            .add_systems(FixedUpdate, tick_session::<W>.in_set(SimulationSet::Tick));
    }
}

fn tick_session<W: SessionWorld>(time: Res<Time>, mut session: ResMut<Session<W>>) {
    session.tick(time.delta_secs());
}

/// Minimal Bevy App для headless симуляции
///
/// Время двигается вручную ровно на один fixed step за `app.update()`,
/// поэтому прогон не зависит от wall clock. Первый update только
/// инициализирует часы.
pub fn create_headless_app<W: SessionWorld>(session: Session<W>) -> App {
    crate::init_logger();

    let tick_hz = session.tick_hz();
    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .add_plugins(SimulationPlugin::<W>::new(tick_hz))
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f64(
            1.0 / tick_hz,
        )))
        .insert_resource(session);

    app
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::SandboxWorld;

    #[test]
    fn test_agent_ids_are_monotonic_and_despawn_removes() {
        let mut session = Session::new(&SessionConfig::default(), SandboxWorld::default());
        let config = Arc::new(AgentConfig::default());

        let first = session.spawn_agent(Vec2::ZERO, Some(Arc::clone(&config)));
        let second = session.spawn_agent(Vec2::new(5.0, 0.0), Some(config));
        assert_eq!((first, second), (AgentId(1), AgentId(2)));

        assert!(session.despawn_agent(first));
        assert!(!session.despawn_agent(first));
        assert_eq!(session.agent_count(), 1);
        assert!(session.agent(first).is_none());
        assert!(!session.set_target(first, None));
    }

    #[test]
    fn test_tick_advances_clock_and_agents() {
        let mut session = Session::new(&SessionConfig::default(), SandboxWorld::default());
        let agent = session.spawn_agent(Vec2::ZERO, Some(Arc::new(AgentConfig::default())));

        session.tick(0.125);
        session.tick(0.125);

        assert_eq!(session.tick_count(), 2);
        assert_eq!(session.elapsed(), 0.25);
        assert_eq!(session.agent(agent).map(|a| a.now()), Some(0.25));
        assert_eq!(session.snapshots().len(), 1);
    }
}
