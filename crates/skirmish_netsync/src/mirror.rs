//! Observer — read-only зеркала реплицируемых сущностей
//!
//! Наблюдатель никогда не пишет authoritative поля: он только применяет
//! `ServerMessage` через зарегистрированные reducers. Aim angle
//! интерполируется покадрово (`update(dt)`).
//!
//! Field changes и snapshots старее последних применённых отбрасываются
//! (out of order delivery).
//!
//! Владелец своего аватара применяет aim локально (prediction) и
//! игнорирует эхо `AimAngle` от сервера.

use crate::interpolation::AngleInterpolator;
use crate::protocol::{
    decode, ClientMessage, FieldChange, FieldId, FieldValue, NetEntity, NetResult,
    OwnerRequest, ServerMessage,
};
use bevy::math::Vec2;
use skirmish_simulation::{AIStateType, StateSnapshot, TargetHandle};
use std::collections::BTreeMap;

/// Callback на изменение поля (UI, анимации и т.п.)
pub type FieldReducer = Box<dyn FnMut(NetEntity, &FieldValue) + Send + Sync>;

/// Callback на выстрел (muzzle flash, звук)
pub type ShotReducer = Box<dyn FnMut(NetEntity, &ShotEffect) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShotEffect {
    pub origin: Vec2,
    pub angle: f32,
    pub timestamp: f64,
}

/// Зеркало одной сущности
#[derive(Debug, Clone, Default)]
pub struct EntityMirror {
    fields: BTreeMap<FieldId, FieldValue>,
    /// Timestamp последнего применённого изменения каждого поля
    stamps: BTreeMap<FieldId, f64>,
    aim: AngleInterpolator,
    snapshot: Option<StateSnapshot>,
    last_shot: Option<ShotEffect>,
    shots_seen: u32,
}

impl EntityMirror {
    pub fn field(&self, field: FieldId) -> Option<FieldValue> {
        self.fields.get(&field).copied()
    }

    pub fn health(&self) -> Option<u32> {
        self.field(FieldId::Health)?.as_count()
    }

    pub fn ammo(&self) -> Option<u32> {
        self.field(FieldId::Ammo)?.as_count()
    }

    pub fn is_reloading(&self) -> bool {
        self.field(FieldId::Reloading)
            .and_then(|value| value.as_bool())
            .unwrap_or(false)
    }

    pub fn is_dead(&self) -> bool {
        self.field(FieldId::Dead)
            .and_then(|value| value.as_bool())
            .unwrap_or(false)
    }

    pub fn state(&self) -> Option<AIStateType> {
        self.field(FieldId::StateTag)?.as_state()
    }

    /// Интерполированный aim angle
    pub fn aim_angle(&self) -> f32 {
        self.aim.current()
    }

    pub fn aim(&self) -> &AngleInterpolator {
        &self.aim
    }

    pub fn snapshot(&self) -> Option<&StateSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn last_shot(&self) -> Option<&ShotEffect> {
        self.last_shot.as_ref()
    }

    pub fn shots_seen(&self) -> u32 {
        self.shots_seen
    }
}

#[derive(Default)]
pub struct Observer {
    mirrors: BTreeMap<NetEntity, EntityMirror>,
    reducers: Vec<(FieldId, FieldReducer)>,
    shot_reducers: Vec<ShotReducer>,
    /// Аватар, которым управляет этот клиент
    owned: Option<TargetHandle>,
    stale_snapshots: u64,
    stale_fields: u64,
}

impl Observer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Наблюдатель-владелец аватара `player`
    pub fn owning(player: TargetHandle) -> Self {
        Self {
            owned: Some(player),
            ..Default::default()
        }
    }

    pub fn owned(&self) -> Option<TargetHandle> {
        self.owned
    }

    /// Reducer вызывается после применения каждого изменения поля
    pub fn on_field(
        &mut self,
        field: FieldId,
        reducer: impl FnMut(NetEntity, &FieldValue) + Send + Sync + 'static,
    ) {
        self.reducers.push((field, Box::new(reducer)));
    }

    pub fn on_shot(&mut self, reducer: impl FnMut(NetEntity, &ShotEffect) + Send + Sync + 'static) {
        self.shot_reducers.push(Box::new(reducer));
    }

    pub fn apply(&mut self, message: &ServerMessage) {
        match message {
            ServerMessage::Field(change) => self.apply_field(change),
            ServerMessage::Snapshot { agent, snapshot } => {
                let mirror = self.mirrors.entry(NetEntity::Agent(*agent)).or_default();
                // Out of order delivery: старее последнего применённого — дроп
                if let Some(previous) = &mirror.snapshot {
                    if snapshot.timestamp < previous.timestamp {
                        self.stale_snapshots += 1;
                        return;
                    }
                }
                mirror.snapshot = Some(*snapshot);
            }
            ServerMessage::Shot {
                entity,
                origin,
                angle,
                timestamp,
            } => {
                let effect = ShotEffect {
                    origin: *origin,
                    angle: *angle,
                    timestamp: *timestamp,
                };
                let mirror = self.mirrors.entry(*entity).or_default();
                mirror.shots_seen += 1;
                if mirror.last_shot.map_or(true, |last| last.timestamp <= effect.timestamp) {
                    mirror.last_shot = Some(effect);
                }
                for reducer in self.shot_reducers.iter_mut() {
                    reducer(*entity, &effect);
                }
            }
            ServerMessage::Despawned(entity) => {
                self.mirrors.remove(entity);
            }
            ServerMessage::Rejected { player, reason } => {
                if self.owned == Some(*player) {
                    skirmish_simulation::log_warning(&format!(
                        "player:{} request rejected: {}",
                        player, reason
                    ));
                }
            }
        }
    }

    /// Декодирует и применяет пакет
    pub fn apply_bytes(&mut self, bytes: &[u8]) -> NetResult<()> {
        let message: ServerMessage = decode(bytes)?;
        self.apply(&message);
        Ok(())
    }

    fn apply_field(&mut self, change: &FieldChange) {
        let owned_aim = change.field == FieldId::AimAngle
            && self.owned.is_some_and(|player| change.entity == NetEntity::Player(player));
        if owned_aim {
            // Свой прицел уже применён локально
            return;
        }

        let mirror = self.mirrors.entry(change.entity).or_default();
        if mirror
            .stamps
            .get(&change.field)
            .is_some_and(|last| change.timestamp < *last)
        {
            self.stale_fields += 1;
            return;
        }
        mirror.stamps.insert(change.field, change.timestamp);
        mirror.fields.insert(change.field, change.value);
        if change.field == FieldId::AimAngle {
            if let Some(angle) = change.value.as_angle() {
                mirror.aim.receive(angle);
            }
        }

        for (field, reducer) in self.reducers.iter_mut() {
            if *field == change.field {
                reducer(change.entity, &change.value);
            }
        }
    }

    /// Owner prediction: прицел применяется сразу, серверу уходит request
    pub fn predict_aim(&mut self, angle: f32) -> Option<ClientMessage> {
        let player = self.owned?;
        let mirror = self.mirrors.entry(NetEntity::Player(player)).or_default();
        mirror.aim.set_immediate(angle);
        let value = FieldValue::Angle(mirror.aim.current());
        mirror.fields.insert(FieldId::AimAngle, value);

        Some(ClientMessage {
            player,
            request: OwnerRequest::SetField {
                field: FieldId::AimAngle,
                value,
            },
        })
    }

    /// Локальный кадр: интерполяция прицелов
    pub fn update(&mut self, dt: f32) {
        for mirror in self.mirrors.values_mut() {
            mirror.aim.update(dt);
        }
    }

    pub fn mirror(&self, entity: NetEntity) -> Option<&EntityMirror> {
        self.mirrors.get(&entity)
    }

    pub fn mirrors(&self) -> impl Iterator<Item = (&NetEntity, &EntityMirror)> {
        self.mirrors.iter()
    }

    /// Сколько snapshot'ов отброшено как устаревшие
    pub fn stale_snapshots(&self) -> u64 {
        self.stale_snapshots
    }

    /// Сколько field changes отброшено как устаревшие
    pub fn stale_fields(&self) -> u64 {
        self.stale_fields
    }
}
