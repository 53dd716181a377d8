//! Event Bus — in-process pub/sub между подсистемами агента и presentation (UI, VFX)
//!
//! Каналы типизированы по EventKind. Подписка живёт пока её явно не сняли
//! через `unsubscribe` (никакой связи с lifetime объектов).
//! Handler'ы вызываются синхронно, в порядке подписки.

use crate::ai::AIStateType;
use crate::shared::{AgentId, TargetHandle};
use bevy::math::Vec2;
use std::collections::{HashMap, VecDeque};

/// Сколько последних событий хранит bus для headless инспекции
pub const RECENT_EVENTS_CAPACITY: usize = 256;

/// События агента (domain events)
#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    StateChanged {
        agent: AgentId,
        from: AIStateType,
        to: AIStateType,
    },
    StateEntered {
        agent: AgentId,
        state: AIStateType,
    },
    StateExited {
        agent: AgentId,
        state: AIStateType,
    },
    TargetFound {
        agent: AgentId,
        target: TargetHandle,
    },
    TargetLost {
        agent: AgentId,
        target: TargetHandle,
    },
    AttackStarted {
        agent: AgentId,
        target: Option<TargetHandle>,
    },
    AttackEnded {
        agent: AgentId,
    },
    /// Выстрел принят Combat (projectile ещё может ждать готовности подсистемы)
    Shoot {
        agent: AgentId,
        origin: Vec2,
        angle: f32,
    },
    /// Projectile subsystem так и не стал ready за max wait
    ShotAbandoned {
        agent: AgentId,
        waited: f32,
    },
    ReloadStarted {
        agent: AgentId,
    },
    ReloadCompleted {
        agent: AgentId,
    },
    MovementStarted {
        agent: AgentId,
        destination: Vec2,
    },
    DestinationReached {
        agent: AgentId,
        position: Vec2,
    },
    StrafeStarted {
        agent: AgentId,
        direction: f32,
    },
    RetreatStarted {
        agent: AgentId,
        destination: Vec2,
    },
    TargetInSight {
        agent: AgentId,
        target: TargetHandle,
    },
    TargetOutOfSight {
        agent: AgentId,
        target: TargetHandle,
        last_seen: Option<Vec2>,
    },
    HealthChanged {
        agent: AgentId,
        current: u32,
        max: u32,
    },
    Death {
        agent: AgentId,
    },
}

/// Канал (тип события) для подписки
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    StateChanged,
    StateEntered,
    StateExited,
    TargetFound,
    TargetLost,
    AttackStarted,
    AttackEnded,
    Shoot,
    ShotAbandoned,
    ReloadStarted,
    ReloadCompleted,
    MovementStarted,
    DestinationReached,
    StrafeStarted,
    RetreatStarted,
    TargetInSight,
    TargetOutOfSight,
    HealthChanged,
    Death,
}

impl AgentEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            AgentEvent::StateChanged { .. } => EventKind::StateChanged,
            AgentEvent::StateEntered { .. } => EventKind::StateEntered,
            AgentEvent::StateExited { .. } => EventKind::StateExited,
            AgentEvent::TargetFound { .. } => EventKind::TargetFound,
            AgentEvent::TargetLost { .. } => EventKind::TargetLost,
            AgentEvent::AttackStarted { .. } => EventKind::AttackStarted,
            AgentEvent::AttackEnded { .. } => EventKind::AttackEnded,
            AgentEvent::Shoot { .. } => EventKind::Shoot,
            AgentEvent::ShotAbandoned { .. } => EventKind::ShotAbandoned,
            AgentEvent::ReloadStarted { .. } => EventKind::ReloadStarted,
            AgentEvent::ReloadCompleted { .. } => EventKind::ReloadCompleted,
            AgentEvent::MovementStarted { .. } => EventKind::MovementStarted,
            AgentEvent::DestinationReached { .. } => EventKind::DestinationReached,
            AgentEvent::StrafeStarted { .. } => EventKind::StrafeStarted,
            AgentEvent::RetreatStarted { .. } => EventKind::RetreatStarted,
            AgentEvent::TargetInSight { .. } => EventKind::TargetInSight,
            AgentEvent::TargetOutOfSight { .. } => EventKind::TargetOutOfSight,
            AgentEvent::HealthChanged { .. } => EventKind::HealthChanged,
            AgentEvent::Death { .. } => EventKind::Death,
        }
    }

    pub fn agent(&self) -> AgentId {
        match self {
            AgentEvent::StateChanged { agent, .. }
            | AgentEvent::StateEntered { agent, .. }
            | AgentEvent::StateExited { agent, .. }
            | AgentEvent::TargetFound { agent, .. }
            | AgentEvent::TargetLost { agent, .. }
            | AgentEvent::AttackStarted { agent, .. }
            | AgentEvent::AttackEnded { agent }
            | AgentEvent::Shoot { agent, .. }
            | AgentEvent::ShotAbandoned { agent, .. }
            | AgentEvent::ReloadStarted { agent }
            | AgentEvent::ReloadCompleted { agent }
            | AgentEvent::MovementStarted { agent, .. }
            | AgentEvent::DestinationReached { agent, .. }
            | AgentEvent::StrafeStarted { agent, .. }
            | AgentEvent::RetreatStarted { agent, .. }
            | AgentEvent::TargetInSight { agent, .. }
            | AgentEvent::TargetOutOfSight { agent, .. }
            | AgentEvent::HealthChanged { agent, .. }
            | AgentEvent::Death { agent } => *agent,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Handler = Box<dyn FnMut(&AgentEvent) + Send + Sync>;

/// Typed pub/sub bus (один на Session)
pub struct EventBus {
    channels: HashMap<EventKind, Vec<(SubscriptionId, Handler)>>,
    /// Подписчики на все каналы (логгеры, debug overlay)
    wildcard: Vec<(SubscriptionId, Handler)>,
    next_id: u64,
    recent: VecDeque<AgentEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            channels: HashMap::new(),
            wildcard: Vec::new(),
            next_id: 0,
            recent: VecDeque::with_capacity(RECENT_EVENTS_CAPACITY),
        }
    }

    fn allocate_id(&mut self) -> SubscriptionId {
        self.next_id += 1;
        SubscriptionId(self.next_id)
    }

    pub fn subscribe(
        &mut self,
        kind: EventKind,
        handler: impl FnMut(&AgentEvent) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = self.allocate_id();
        self.channels
            .entry(kind)
            .or_default()
            .push((id, Box::new(handler)));
        id
    }

    pub fn subscribe_all(
        &mut self,
        handler: impl FnMut(&AgentEvent) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = self.allocate_id();
        self.wildcard.push((id, Box::new(handler)));
        id
    }

    /// Снимает подписку; false если такой уже нет
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.wildcard.len();
        self.wildcard.retain(|(sub, _)| *sub != id);
        if self.wildcard.len() != before {
            return true;
        }

        for handlers in self.channels.values_mut() {
            let before = handlers.len();
            handlers.retain(|(sub, _)| *sub != id);
            if handlers.len() != before {
                return true;
            }
        }
        false
    }

    /// Снимает все подписки (session teardown)
    pub fn clear(&mut self) {
        self.channels.clear();
        self.wildcard.clear();
    }

    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.channels.get(&kind).map_or(0, Vec::len) + self.wildcard.len()
    }

    pub fn publish(&mut self, event: AgentEvent) {
        if let Some(handlers) = self.channels.get_mut(&event.kind()) {
            for (_, handler) in handlers.iter_mut() {
                handler(&event);
            }
        }
        for (_, handler) in self.wildcard.iter_mut() {
            handler(&event);
        }

        if self.recent.len() == RECENT_EVENTS_CAPACITY {
            self.recent.pop_front();
        }
        self.recent.push_back(event);
    }

    /// Забирает накопленные события (oldest first)
    pub fn drain_recent(&mut self) -> Vec<AgentEvent> {
        self.recent.drain(..).collect()
    }

    pub fn recent(&self) -> impl Iterator<Item = &AgentEvent> {
        self.recent.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    const AGENT: AgentId = AgentId(7);

    #[test]
    fn test_publish_reaches_only_matching_channel() {
        let mut bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = seen.clone();
        bus.subscribe(EventKind::ReloadStarted, move |event| {
            sink.lock().unwrap().push(event.clone());
        });

        bus.publish(AgentEvent::ReloadStarted { agent: AGENT });
        bus.publish(AgentEvent::ReloadCompleted { agent: AGENT });

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].kind(), EventKind::ReloadStarted);
        assert_eq!(seen[0].agent(), AGENT);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let mut bus = EventBus::new();
        let count = Arc::new(Mutex::new(0));

        let counter = count.clone();
        let id = bus.subscribe(EventKind::Death, move |_| {
            *counter.lock().unwrap() += 1;
        });

        bus.publish(AgentEvent::Death { agent: AGENT });
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.publish(AgentEvent::Death { agent: AGENT });

        assert_eq!(*count.lock().unwrap(), 1);
        assert_eq!(bus.subscriber_count(EventKind::Death), 0);
    }

    #[test]
    fn test_wildcard_and_recent_log() {
        let mut bus = EventBus::new();
        let count = Arc::new(Mutex::new(0));

        let counter = count.clone();
        bus.subscribe_all(move |_| *counter.lock().unwrap() += 1);

        bus.publish(AgentEvent::AttackEnded { agent: AGENT });
        bus.publish(AgentEvent::ReloadCompleted { agent: AGENT });

        assert_eq!(*count.lock().unwrap(), 2);
        let drained = bus.drain_recent();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].kind(), EventKind::AttackEnded);
        assert!(bus.drain_recent().is_empty());
    }

    #[test]
    fn test_recent_log_is_bounded() {
        let mut bus = EventBus::new();
        for _ in 0..(RECENT_EVENTS_CAPACITY + 10) {
            bus.publish(AgentEvent::ReloadStarted { agent: AGENT });
        }
        assert_eq!(bus.recent().count(), RECENT_EVENTS_CAPACITY);
    }
}
