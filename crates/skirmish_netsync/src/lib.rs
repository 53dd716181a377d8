//! SKIRMISH NetSync — server-authoritative репликация
//!
//! Сервер (Session + Replicator) — единственный источник правды.
//! Наблюдатели (`Observer`) держат read-only зеркала и обновляют их
//! только из `ServerMessage`. Владелец аватара шлёт `OwnerRequest`,
//! сервер валидирует и применяет его как любое другое действие.
//!
//! Порядок в FixedUpdate:
//! 1. SimulationSet::Tick — агенты
//! 2. SimulationSet::Replicate — owner requests → аватары → publish

pub mod interpolation;
pub mod mirror;
pub mod player;
pub mod protocol;
pub mod replicator;
pub mod sync_var;
pub mod world;

pub use interpolation::AngleInterpolator;
pub use mirror::{EntityMirror, FieldReducer, Observer, ShotEffect, ShotReducer};
pub use player::{AvatarConfig, PlayerAvatar, PlayerReplicator, PlayerRoster};
pub use protocol::{
    decode, encode, ClientMessage, FieldChange, FieldId, FieldValue, NetEntity, NetError,
    NetResult, OwnerRequest, ServerMessage,
};
pub use replicator::{AgentReplicator, ReplicationConfig, Replicator};
pub use sync_var::SyncVar;
pub use world::{ArenaWorld, NetWorld};

use bevy::prelude::*;
use skirmish_simulation::{create_headless_app, Session, SimulationSet};
use std::marker::PhantomData;

/// Репликация сессии `Session<W>` после каждого fixed tick
pub struct NetSyncPlugin<W: NetWorld> {
    config: ReplicationConfig,
    _world: PhantomData<fn() -> W>,
}

impl<W: NetWorld> NetSyncPlugin<W> {
    pub fn new(config: ReplicationConfig) -> Self {
        Self {
            config,
            _world: PhantomData,
        }
    }
}

impl<W: NetWorld> Default for NetSyncPlugin<W> {
    fn default() -> Self {
        Self::new(ReplicationConfig::default())
    }
}

impl<W: NetWorld> Plugin for NetSyncPlugin<W> {
    fn build(&self, app: &mut App) {
        app.insert_resource(Replicator::new(self.config.clone()))
            .add_systems(
                FixedUpdate,
                (
                    apply_owner_requests::<W>,
                    tick_players::<W>,
                    publish_replication::<W>,
                )
                    .chain()
                    .in_set(SimulationSet::Replicate),
            );
    }
}

fn apply_owner_requests<W: NetWorld>(
    mut replicator: ResMut<Replicator>,
    mut session: ResMut<Session<W>>,
) {
    replicator.process_requests(&mut *session);
}

fn tick_players<W: NetWorld>(time: Res<Time>, mut session: ResMut<Session<W>>) {
    let dt = time.delta_secs();
    let (roster, projectiles) = session.world_mut().players_mut();
    roster.tick(dt, projectiles);
}

fn publish_replication<W: NetWorld>(
    time: Res<Time>,
    mut replicator: ResMut<Replicator>,
    session: Res<Session<W>>,
) {
    replicator.publish(&*session, time.delta_secs());
}

/// Headless серверный App: симуляция + репликация
pub fn create_server_app<W: NetWorld>(session: Session<W>, config: ReplicationConfig) -> App {
    let mut app = create_headless_app(session);
    app.add_plugins(NetSyncPlugin::<W>::new(config));
    app
}
