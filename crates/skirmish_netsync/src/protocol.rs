//! Wire protocol: field changes, snapshots, owner requests
//!
//! Сервер шлёт `ServerMessage`, клиент-владелец шлёт `ClientMessage`.
//! Codec — serde_json (`encode` / `decode`).

use bevy::math::Vec2;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use skirmish_simulation::{AIStateType, AgentId, StateSnapshot, TargetHandle};
use std::fmt;
use thiserror::Error;

pub type NetResult<T> = Result<T, NetError>;

#[derive(Debug, Error)]
pub enum NetError {
    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("unknown entity {0}")]
    UnknownEntity(NetEntity),

    #[error("request rejected: {reason}")]
    RequestRejected { reason: String },
}

impl NetError {
    pub fn rejected(reason: impl Into<String>) -> Self {
        NetError::RequestRejected {
            reason: reason.into(),
        }
    }
}

/// Реплицируемая сущность: AI агент или аватар игрока
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NetEntity {
    Agent(AgentId),
    Player(TargetHandle),
}

impl fmt::Display for NetEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetEntity::Agent(id) => write!(f, "{}", id),
            NetEntity::Player(handle) => write!(f, "player:{}", handle),
        }
    }
}

/// Примитивные поля с field sync
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FieldId {
    Health,
    Dead,
    Ammo,
    Reloading,
    AimAngle,
    /// Тег поведенческого состояния (`AIStateType::tag`)
    StateTag,
    // Только аватары игроков
    Position,
    MoveDirection,
    Moving,
    Attacking,
    ReviveCount,
}

impl FieldId {
    /// Поля, которые владелец может писать через `RequestSetField`
    pub fn is_owner_writable(self) -> bool {
        matches!(self, FieldId::AimAngle | FieldId::Attacking)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Bool(bool),
    Count(u32),
    Angle(f32),
    Vector(Vec2),
    Tag(u8),
}

impl FieldValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_count(&self) -> Option<u32> {
        match self {
            FieldValue::Count(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_angle(&self) -> Option<f32> {
        match self {
            FieldValue::Angle(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<Vec2> {
        match self {
            FieldValue::Vector(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_state(&self) -> Option<AIStateType> {
        match self {
            FieldValue::Tag(tag) => AIStateType::from_tag(*tag),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub entity: NetEntity,
    pub field: FieldId,
    pub value: FieldValue,
    pub timestamp: f64,
}

/// Server → observers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ServerMessage {
    Field(FieldChange),
    Snapshot {
        agent: AgentId,
        snapshot: StateSnapshot,
    },
    Despawned(NetEntity),
    /// Выстрел принят сервером (эффекты у наблюдателей)
    Shot {
        entity: NetEntity,
        origin: Vec2,
        angle: f32,
        timestamp: f64,
    },
    /// Ответ владельцу на невалидный request
    Rejected {
        player: TargetHandle,
        reason: String,
    },
}

/// Запросы владельца аватара (валидируются на сервере)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OwnerRequest {
    Fire { angle: f32, origin: Vec2 },
    Reload,
    SetField { field: FieldId, value: FieldValue },
    Move { direction: Vec2, moving: bool },
    Revive,
}

/// Client → server
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClientMessage {
    pub player: TargetHandle,
    pub request: OwnerRequest,
}

pub fn encode<T: Serialize>(message: &T) -> NetResult<Vec<u8>> {
    Ok(serde_json::to_vec(message)?)
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> NetResult<T> {
    Ok(serde_json::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use skirmish_simulation::SnapshotFlags;

    #[test]
    fn test_snapshot_message_survives_codec() {
        let message = ServerMessage::Snapshot {
            agent: AgentId(3),
            snapshot: StateSnapshot {
                state: AIStateType::Attack,
                position: Vec2::new(1.5, -2.25),
                look_angle: 123.5,
                flags: SnapshotFlags::ATTACKING | SnapshotFlags::RELOADING,
                target_id: Some(TargetHandle(9)),
                has_valid_target: true,
                timestamp: 4.5,
                ..Default::default()
            },
        };

        let bytes = encode(&message).expect("encode");
        let decoded: ServerMessage = decode(&bytes).expect("decode");
        assert_eq!(decoded, message);
    }

    #[test]
    fn test_garbage_is_codec_error() {
        let result: NetResult<ClientMessage> = decode(b"{not json");
        assert!(matches!(result, Err(NetError::Codec(_))));
    }

    #[test]
    fn test_owner_writable_fields() {
        assert!(FieldId::AimAngle.is_owner_writable());
        assert!(FieldId::Attacking.is_owner_writable());
        assert!(!FieldId::Health.is_owner_writable());
        assert!(!FieldId::Ammo.is_owner_writable());
    }

    #[test]
    fn test_state_tag_value() {
        assert_eq!(
            FieldValue::Tag(AIStateType::Retreat.tag()).as_state(),
            Some(AIStateType::Retreat)
        );
        assert_eq!(FieldValue::Tag(42).as_state(), None);
        assert_eq!(FieldValue::Count(1).as_state(), None);
    }
}
