//! Data-компоненты агента
//!
//! Организация по доменам:
//! - actor: здоровье и тело агента в мире (Health, AgentBody)
//! - config: параметры архетипа (AgentConfig, SessionConfig, ConfigError)
//! - snapshot: network-facing проекция агента (StateSnapshot, SnapshotFlags)

pub mod actor;
pub mod config;
pub mod snapshot;

// Re-exports для удобного импорта
pub use actor::*;
pub use config::*;
pub use snapshot::*;
