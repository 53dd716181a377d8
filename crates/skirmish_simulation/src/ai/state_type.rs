//! Тег поведенческого состояния (реплицируется, стабилен на проводе)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Поведенческие состояния агента
///
/// Приоритет: Attack (5) > Retreat (4) > Chase (3) > Patrol (1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AIStateType {
    /// Начальное состояние: патруль вокруг точки спавна
    Patrol,
    Chase,
    Attack,
    Retreat,
}

impl AIStateType {
    pub const ALL: [AIStateType; 4] = [
        AIStateType::Patrol,
        AIStateType::Chase,
        AIStateType::Attack,
        AIStateType::Retreat,
    ];

    pub fn priority(self) -> u8 {
        match self {
            AIStateType::Patrol => 1,
            AIStateType::Chase => 3,
            AIStateType::Retreat => 4,
            AIStateType::Attack => 5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AIStateType::Patrol => "patrol",
            AIStateType::Chase => "chase",
            AIStateType::Attack => "attack",
            AIStateType::Retreat => "retreat",
        }
    }

    /// Wire tag (field sync `StateTag`)
    pub fn tag(self) -> u8 {
        match self {
            AIStateType::Patrol => 0,
            AIStateType::Chase => 1,
            AIStateType::Attack => 2,
            AIStateType::Retreat => 3,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(AIStateType::Patrol),
            1 => Some(AIStateType::Chase),
            2 => Some(AIStateType::Attack),
            3 => Some(AIStateType::Retreat),
            _ => None,
        }
    }

    /// Состояния, где агент вовлечён в бой с целью
    pub fn is_combat_state(self) -> bool {
        matches!(self, AIStateType::Chase | AIStateType::Attack)
    }

    /// Состояния, где агент активно перемещается
    pub fn is_movement_state(self) -> bool {
        matches!(
            self,
            AIStateType::Patrol | AIStateType::Chase | AIStateType::Retreat
        )
    }
}

impl fmt::Display for AIStateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown AI state name: {0}")]
pub struct UnknownStateName(pub String);

impl FromStr for AIStateType {
    type Err = UnknownStateName;

    /// Регистр не важен; "return" — старое имя Retreat
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.trim().to_ascii_lowercase().as_str() {
            "patrol" => Ok(AIStateType::Patrol),
            "chase" => Ok(AIStateType::Chase),
            "attack" => Ok(AIStateType::Attack),
            "retreat" | "return" => Ok(AIStateType::Retreat),
            _ => Err(UnknownStateName(name.to_string())),
        }
    }
}
