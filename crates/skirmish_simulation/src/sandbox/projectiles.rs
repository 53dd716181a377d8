//! ProjectileLog — headless projectile subsystem (записывает выстрелы)

use crate::collaborators::{FireError, ProjectileSystem, ShotRequest};

#[derive(Debug, Clone)]
pub struct ProjectileLog {
    /// Принятые выстрелы в порядке поступления
    pub fired: Vec<ShotRequest>,
    /// Сколько ещё вызовов ответить NotReady (None = никогда не готов)
    warmup_remaining: Option<u32>,
    /// Всего вызовов fire (включая NotReady)
    pub attempts: u32,
}

impl Default for ProjectileLog {
    fn default() -> Self {
        Self::ready()
    }
}

impl ProjectileLog {
    pub fn ready() -> Self {
        Self::warming_up(0)
    }

    /// Первые `polls` вызовов вернут NotReady
    pub fn warming_up(polls: u32) -> Self {
        Self {
            fired: Vec::new(),
            warmup_remaining: Some(polls),
            attempts: 0,
        }
    }

    /// Никогда не становится ready
    pub fn offline() -> Self {
        Self {
            fired: Vec::new(),
            warmup_remaining: None,
            attempts: 0,
        }
    }
}

impl ProjectileSystem for ProjectileLog {
    fn fire(&mut self, shot: &ShotRequest) -> Result<(), FireError> {
        self.attempts += 1;
        match self.warmup_remaining.as_mut() {
            None => Err(FireError::NotReady),
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                Err(FireError::NotReady)
            }
            Some(_) => {
                self.fired.push(*shot);
                Ok(())
            }
        }
    }
}
