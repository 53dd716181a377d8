//! SyncVar — authoritative значение + dirty флаг
//!
//! Сервер пишет через `set`; при publish забирает изменение через
//! `take_change`. Новый SyncVar сразу dirty: первое значение уходит
//! наблюдателям без отдельного «initial state» сообщения.

#[derive(Debug, Clone, PartialEq)]
pub struct SyncVar<T> {
    value: T,
    dirty: bool,
}

impl<T: Copy + PartialEq> SyncVar<T> {
    pub fn new(value: T) -> Self {
        Self { value, dirty: true }
    }

    /// true если значение изменилось
    pub fn set(&mut self, value: T) -> bool {
        if self.value == value {
            return false;
        }
        self.value = value;
        self.dirty = true;
        true
    }

    pub fn get(&self) -> T {
        self.value
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Some(value) один раз после каждого изменения
    pub fn take_change(&mut self) -> Option<T> {
        if !self.dirty {
            return None;
        }
        self.dirty = false;
        Some(self.value)
    }
}
