//! Replicator — authoritative сторона репликации
//!
//! Два вида синхронизации:
//! - field sync: health, dead, ammo, reloading, aim angle, state tag
//!   (только изменившиеся поля; aim angle — на пониженной частоте)
//! - snapshot sync: `StateSnapshot` раз в `snapshot_interval`, если он
//!   НЕ эквивалентен последнему отправленному
//!
//! Плюс события выстрелов (`ServerMessage::Shot`) для эффектов у наблюдателей.
//!
//! Publish идёт строго после tick симуляции (SimulationSet::Replicate),
//! наблюдатели никогда не видят агента «наполовину обновлённым».

use crate::player::PlayerReplicator;
use crate::protocol::{
    decode, encode, ClientMessage, FieldChange, FieldId, FieldValue, NetEntity, NetResult,
    OwnerRequest, ServerMessage,
};
use crate::sync_var::SyncVar;
use crate::world::NetWorld;
use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};
use skirmish_simulation::{normalize_degrees, AgentController, AgentId, Session, StateSnapshot};
use std::collections::{BTreeMap, VecDeque};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplicationConfig {
    /// Период snapshot sync (секунды)
    pub snapshot_interval: f32,
    /// Период отправки aim angle (секунды); между ними наблюдатель интерполирует
    pub aim_interval: f32,
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self {
            snapshot_interval: 0.1,
            aim_interval: 0.1,
        }
    }
}

/// Field + snapshot sync одного AI агента
#[derive(Debug, Clone)]
pub struct AgentReplicator {
    agent: AgentId,
    health: SyncVar<u32>,
    dead: SyncVar<bool>,
    ammo: SyncVar<u32>,
    reloading: SyncVar<bool>,
    aim_angle: SyncVar<f32>,
    state_tag: SyncVar<u8>,
    since_aim: f32,
    since_snapshot: f32,
    last_sent: Option<StateSnapshot>,
    skipped_snapshots: u64,
}

impl AgentReplicator {
    pub fn new(agent: &AgentController, config: &ReplicationConfig) -> Self {
        Self {
            agent: agent.id(),
            health: SyncVar::new(agent.health().current),
            dead: SyncVar::new(!agent.is_alive()),
            ammo: SyncVar::new(agent.combat().ammo()),
            reloading: SyncVar::new(agent.combat().is_reloading()),
            aim_angle: SyncVar::new(agent.combat().look_angle()),
            state_tag: SyncVar::new(agent.state().tag()),
            // Первый publish сразу шлёт snapshot и aim
            since_aim: config.aim_interval,
            since_snapshot: config.snapshot_interval,
            last_sent: None,
            skipped_snapshots: 0,
        }
    }

    pub fn publish(
        &mut self,
        agent: &AgentController,
        dt: f32,
        config: &ReplicationConfig,
        out: &mut Vec<ServerMessage>,
    ) {
        let entity = NetEntity::Agent(self.agent);
        let timestamp = agent.now() as f64;
        let mut push = |field: FieldId, value: FieldValue| {
            out.push(ServerMessage::Field(FieldChange {
                entity,
                field,
                value,
                timestamp,
            }));
        };

        self.health.set(agent.health().current);
        self.dead.set(!agent.is_alive());
        self.ammo.set(agent.combat().ammo());
        self.reloading.set(agent.combat().is_reloading());
        self.state_tag.set(agent.state().tag());

        self.since_aim += dt;
        if self.since_aim >= config.aim_interval {
            self.since_aim = 0.0;
            self.aim_angle.set(agent.combat().look_angle());
        }

        if let Some(value) = self.health.take_change() {
            push(FieldId::Health, FieldValue::Count(value));
        }
        if let Some(value) = self.dead.take_change() {
            push(FieldId::Dead, FieldValue::Bool(value));
        }
        if let Some(value) = self.ammo.take_change() {
            push(FieldId::Ammo, FieldValue::Count(value));
        }
        if let Some(value) = self.reloading.take_change() {
            push(FieldId::Reloading, FieldValue::Bool(value));
        }
        if let Some(value) = self.aim_angle.take_change() {
            push(FieldId::AimAngle, FieldValue::Angle(value));
        }
        if let Some(value) = self.state_tag.take_change() {
            push(FieldId::StateTag, FieldValue::Tag(value));
        }

        for shot in agent.shots_this_tick() {
            out.push(ServerMessage::Shot {
                entity,
                origin: shot.origin,
                angle: shot.angle,
                timestamp,
            });
        }

        self.since_snapshot += dt;
        if self.since_snapshot < config.snapshot_interval {
            return;
        }
        self.since_snapshot = 0.0;

        let snapshot = agent.snapshot();
        if let Some(last) = &self.last_sent {
            if last.is_equivalent(&snapshot) {
                self.skipped_snapshots += 1;
                return;
            }
        }
        self.last_sent = Some(snapshot);
        out.push(ServerMessage::Snapshot {
            agent: self.agent,
            snapshot,
        });
    }

    /// Сколько snapshot'ов не отправлено из-за equality rule
    pub fn skipped_snapshots(&self) -> u64 {
        self.skipped_snapshots
    }
}

/// Репликация всей сессии: входящие owner requests + исходящие сообщения
#[derive(Resource, Debug, Default)]
pub struct Replicator {
    config: ReplicationConfig,
    agents: BTreeMap<AgentId, AgentReplicator>,
    players: PlayerReplicator,
    inbox: VecDeque<ClientMessage>,
    outbox: Vec<ServerMessage>,
    rejected_requests: u64,
}

impl Replicator {
    pub fn new(config: ReplicationConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &ReplicationConfig {
        &self.config
    }

    /// Owner request в очередь (применяется на следующем Replicate шаге)
    pub fn submit(&mut self, message: ClientMessage) {
        self.inbox.push_back(message);
    }

    pub fn submit_bytes(&mut self, bytes: &[u8]) -> NetResult<()> {
        let message: ClientMessage = decode(bytes)?;
        self.submit(message);
        Ok(())
    }

    /// Валидирует и применяет накопленные owner requests
    pub fn process_requests<W: NetWorld>(&mut self, session: &mut Session<W>) {
        let now = session.elapsed();
        let (roster, projectiles) = session.world_mut().players_mut();

        while let Some(message) = self.inbox.pop_front() {
            match roster.handle_request(&message, now, projectiles) {
                Ok(()) => {
                    if let OwnerRequest::Fire { angle, origin } = message.request {
                        self.outbox.push(ServerMessage::Shot {
                            entity: NetEntity::Player(message.player),
                            origin,
                            angle: normalize_degrees(angle),
                            timestamp: now,
                        });
                    }
                }
                Err(error) => {
                    skirmish_simulation::log_warning(&format!(
                        "player:{} {:?} rejected: {}",
                        message.player, message.request, error
                    ));
                    self.rejected_requests += 1;
                    self.outbox.push(ServerMessage::Rejected {
                        player: message.player,
                        reason: error.to_string(),
                    });
                }
            }
        }
    }

    /// Field changes + snapshots после tick
    pub fn publish<W: NetWorld>(&mut self, session: &Session<W>, dt: f32) {
        for agent in session.agents() {
            let replicator = self
                .agents
                .entry(agent.id())
                .or_insert_with(|| AgentReplicator::new(agent, &self.config));
            replicator.publish(agent, dt, &self.config, &mut self.outbox);
        }

        let gone: Vec<AgentId> = self
            .agents
            .keys()
            .filter(|id| session.agent(**id).is_none())
            .copied()
            .collect();
        for id in gone {
            self.agents.remove(&id);
            self.outbox.push(ServerMessage::Despawned(NetEntity::Agent(id)));
        }

        self.players
            .publish(session.world().roster(), session.elapsed(), &mut self.outbox);
    }

    pub fn drain_outbox(&mut self) -> Vec<ServerMessage> {
        std::mem::take(&mut self.outbox)
    }

    /// Забирает outbox, закодированный по одному пакету на сообщение
    pub fn drain_encoded(&mut self) -> NetResult<Vec<Vec<u8>>> {
        self.drain_outbox().iter().map(encode).collect()
    }

    pub fn pending_requests(&self) -> usize {
        self.inbox.len()
    }

    pub fn rejected_requests(&self) -> u64 {
        self.rejected_requests
    }

    pub fn agent(&self, id: AgentId) -> Option<&AgentReplicator> {
        self.agents.get(&id)
    }
}
