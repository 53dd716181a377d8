//! FireDispatcher — доставка выстрелов в projectile subsystem
//!
//! Subsystem может быть ещё не готов (NotReady): выстрел остаётся в очереди,
//! опрос раз в FIRE_RETRY_INTERVAL, через FIRE_MAX_WAIT выстрел бросаем
//! с error log. Никаких блокировок: всё двигается из tick(dt).

use crate::collaborators::{FireError, ProjectileSystem, ShotRequest};
use std::collections::VecDeque;

/// Интервал опроса неготовой подсистемы (секунды)
pub const FIRE_RETRY_INTERVAL: f32 = 0.1;
/// Максимальное ожидание готовности (секунды)
pub const FIRE_MAX_WAIT: f32 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchStatus {
    Fired,
    /// Ждёт готовности подсистемы
    Queued,
    Rejected,
}

/// Выстрел, не дождавшийся подсистемы
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AbandonedShot {
    pub request: ShotRequest,
    pub waited: f32,
}

#[derive(Debug, Clone, Copy)]
struct PendingShot {
    request: ShotRequest,
    waited: f32,
    since_poll: f32,
}

#[derive(Debug, Clone, Default)]
pub struct FireDispatcher {
    pending: VecDeque<PendingShot>,
}

impl FireDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Пробует выстрелить сразу; при NotReady — в очередь (порядок сохраняется)
    pub fn dispatch(
        &mut self,
        request: ShotRequest,
        projectiles: &mut dyn ProjectileSystem,
    ) -> DispatchStatus {
        if !self.pending.is_empty() {
            self.enqueue(request);
            return DispatchStatus::Queued;
        }

        match projectiles.fire(&request) {
            Ok(()) => DispatchStatus::Fired,
            Err(FireError::NotReady) => {
                self.enqueue(request);
                DispatchStatus::Queued
            }
            Err(FireError::Rejected(reason)) => {
                crate::log_warning(&format!("{:?}: shot rejected ({})", request.owner, reason));
                DispatchStatus::Rejected
            }
        }
    }

    fn enqueue(&mut self, request: ShotRequest) {
        self.pending.push_back(PendingShot {
            request,
            waited: 0.0,
            since_poll: 0.0,
        });
    }

    /// Продвигает таймеры ожидания; возвращает брошенные по таймауту выстрелы
    pub fn tick(&mut self, dt: f32, projectiles: &mut dyn ProjectileSystem) -> Vec<AbandonedShot> {
        for shot in self.pending.iter_mut() {
            shot.waited += dt;
            shot.since_poll += dt;
        }

        // Старейшие в начале очереди
        let mut abandoned = Vec::new();
        while let Some(front) = self.pending.front() {
            if front.waited < FIRE_MAX_WAIT {
                break;
            }
            let shot = *front;
            self.pending.pop_front();
            crate::log_error(&format!(
                "{:?}: projectile subsystem not ready after {:.1}s, shot abandoned",
                shot.request.owner, shot.waited
            ));
            abandoned.push(AbandonedShot {
                request: shot.request,
                waited: shot.waited,
            });
        }

        let poll_due = self
            .pending
            .front()
            .is_some_and(|front| front.since_poll >= FIRE_RETRY_INTERVAL);
        if poll_due {
            self.poll(projectiles);
        }

        abandoned
    }

    fn poll(&mut self, projectiles: &mut dyn ProjectileSystem) {
        while let Some(front) = self.pending.front() {
            match projectiles.fire(&front.request) {
                Ok(()) => {
                    self.pending.pop_front();
                }
                Err(FireError::NotReady) => {
                    for shot in self.pending.iter_mut() {
                        shot.since_poll = 0.0;
                    }
                    return;
                }
                Err(FireError::Rejected(reason)) => {
                    crate::log_warning(&format!(
                        "{:?}: queued shot rejected ({})",
                        front.request.owner, reason
                    ));
                    self.pending.pop_front();
                }
            }
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::Shooter;
    use crate::sandbox::ProjectileLog;
    use crate::shared::AgentId;
    use bevy::math::Vec2;

    fn shot(angle: f32) -> ShotRequest {
        ShotRequest {
            owner: Shooter::Agent(AgentId(1)),
            origin: Vec2::ZERO,
            angle,
            speed: 10.0,
            damage: 10,
            range: 20.0,
        }
    }

    #[test]
    fn test_ready_subsystem_fires_immediately() {
        let mut projectiles = ProjectileLog::ready();
        let mut dispatcher = FireDispatcher::new();

        assert_eq!(dispatcher.dispatch(shot(0.0), &mut projectiles), DispatchStatus::Fired);
        assert_eq!(projectiles.fired.len(), 1);
        assert_eq!(dispatcher.pending_count(), 0);
    }

    #[test]
    fn test_not_ready_is_polled_until_fired() {
        // 3 отказа: dispatch + два опроса, третий опрос проходит
        let mut projectiles = ProjectileLog::warming_up(3);
        let mut dispatcher = FireDispatcher::new();

        assert_eq!(dispatcher.dispatch(shot(10.0), &mut projectiles), DispatchStatus::Queued);

        // 0.0625 < интервала опроса: попыток нет
        dispatcher.tick(0.0625, &mut projectiles);
        assert_eq!(projectiles.attempts, 1);

        for _ in 0..5 {
            assert!(dispatcher.tick(0.0625, &mut projectiles).is_empty());
        }

        assert_eq!(projectiles.fired.len(), 1);
        assert_eq!(projectiles.fired[0].angle, 10.0);
        assert_eq!(projectiles.attempts, 4);
        assert_eq!(dispatcher.pending_count(), 0);
    }

    #[test]
    fn test_queue_preserves_order() {
        let mut projectiles = ProjectileLog::warming_up(1);
        let mut dispatcher = FireDispatcher::new();

        dispatcher.dispatch(shot(1.0), &mut projectiles);
        // Очередь не пуста → второй выстрел встаёт за первым без попытки
        assert_eq!(dispatcher.dispatch(shot(2.0), &mut projectiles), DispatchStatus::Queued);

        dispatcher.tick(0.125, &mut projectiles);
        let angles: Vec<_> = projectiles.fired.iter().map(|s| s.angle).collect();
        assert_eq!(angles, vec![1.0, 2.0]);
    }

    #[test]
    fn test_offline_subsystem_abandons_after_max_wait() {
        let mut projectiles = ProjectileLog::offline();
        let mut dispatcher = FireDispatcher::new();
        dispatcher.dispatch(shot(0.0), &mut projectiles);

        // 39 × 0.125 = 4.875 < 5.0
        for _ in 0..39 {
            assert!(dispatcher.tick(0.125, &mut projectiles).is_empty());
        }
        let abandoned = dispatcher.tick(0.125, &mut projectiles);

        assert_eq!(abandoned.len(), 1);
        assert!(abandoned[0].waited >= FIRE_MAX_WAIT);
        assert_eq!(dispatcher.pending_count(), 0);
        assert!(projectiles.fired.is_empty());
    }
}
