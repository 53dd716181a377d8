//! Tests for AgentController (scheduling, inert config, damage, shots)

#[cfg(test)]
mod tests {
    use crate::agent::AgentController;
    use crate::ai::AIStateType;
    use crate::components::{AgentConfig, SnapshotFlags};
    use crate::events::{AgentEvent, EventBus, EventKind};
    use crate::sandbox::{ProjectileLog, SandboxWorld};
    use crate::session::SessionWorld;
    use crate::shared::{AgentId, TargetHandle};
    use bevy::math::Vec2;
    use std::sync::Arc;

    const DT: f32 = 0.125;
    const TARGET: TargetHandle = TargetHandle(1);

    fn config() -> Arc<AgentConfig> {
        Arc::new(AgentConfig {
            ai_update_interval: 0.125,
            ..Default::default()
        })
    }

    fn run(agent: &mut AgentController, world: &mut SandboxWorld, events: &mut EventBus, ticks: usize) {
        for _ in 0..ticks {
            agent.tick(DT, &mut world.services(), events);
        }
    }

    fn kinds(events: &mut EventBus) -> Vec<EventKind> {
        events.drain_recent().iter().map(|event| event.kind()).collect()
    }

    #[test]
    fn test_missing_config_makes_agent_inert() {
        let mut agent = AgentController::new(AgentId(1), Vec2::ZERO, None, 42);
        let mut world = SandboxWorld::default();
        let mut events = EventBus::new();

        run(&mut agent, &mut world, &mut events, 10);

        assert!(agent.is_inert());
        assert!(agent.machine().is_none());
        assert_eq!(agent.now(), 0.0);
        assert_eq!(agent.state(), AIStateType::Patrol);
        assert!(events.recent().next().is_none());
    }

    #[test]
    fn test_invalid_config_makes_agent_inert() {
        let broken = Arc::new(AgentConfig {
            attack_range: 50.0,
            ..Default::default()
        });
        let agent = AgentController::new(AgentId(1), Vec2::ZERO, Some(broken), 42);

        assert!(agent.is_inert());
        assert!(agent.config().is_none());
    }

    #[test]
    fn test_first_tick_initializes_patrol() {
        let mut agent = AgentController::new(AgentId(1), Vec2::ZERO, Some(config()), 42);
        let mut world = SandboxWorld::default();
        let mut events = EventBus::new();

        run(&mut agent, &mut world, &mut events, 1);

        let machine = agent.machine().expect("machine");
        assert!(machine.is_initialized());
        assert_eq!(agent.state(), AIStateType::Patrol);
        let kinds = kinds(&mut events);
        assert!(kinds.contains(&EventKind::StateEntered));
        assert!(kinds.contains(&EventKind::MovementStarted));
        // Патрульная точка: агент уже сдвинулся
        assert_ne!(agent.position(), Vec2::ZERO);
    }

    #[test]
    fn test_visible_target_leads_to_attack_and_shots() {
        let mut agent = AgentController::new(AgentId(1), Vec2::ZERO, Some(config()), 42);
        let mut world = SandboxWorld::default();
        world.arena.spawn_target(TARGET, Vec2::new(6.0, 0.0));
        let mut events = EventBus::new();

        run(&mut agent, &mut world, &mut events, 40);

        assert_eq!(agent.target(), Some(TARGET));
        let history: Vec<_> = agent
            .machine()
            .expect("machine")
            .transition_history()
            .map(|record| record.to)
            .collect();
        assert_eq!(history.first(), Some(&AIStateType::Chase));
        assert!(history.contains(&AIStateType::Attack));
        assert!(!world.projectiles.fired.is_empty());

        let kinds = kinds(&mut events);
        assert!(kinds.contains(&EventKind::TargetFound));
        assert!(kinds.contains(&EventKind::TargetInSight));
        assert!(kinds.contains(&EventKind::Shoot));
    }

    #[test]
    fn test_shots_this_tick_match_delivered_projectiles() {
        let mut agent = AgentController::new(AgentId(1), Vec2::ZERO, Some(config()), 42);
        let mut world = SandboxWorld::default();
        world.arena.spawn_target(TARGET, Vec2::new(6.0, 0.0));
        let mut events = EventBus::new();

        let mut recorded = 0;
        for _ in 0..40 {
            agent.tick(DT, &mut world.services(), &mut events);
            recorded += agent.shots_this_tick().len();
        }

        assert!(recorded > 0);
        assert_eq!(recorded, world.projectiles.fired.len());
    }

    #[test]
    fn test_snapshot_reflects_agent_state() {
        let mut agent = AgentController::new(AgentId(1), Vec2::ZERO, Some(config()), 42);
        let mut world = SandboxWorld::default();
        world.arena.spawn_target(TARGET, Vec2::new(9.0, 0.0));
        let mut events = EventBus::new();

        // Tick 1: Patrol замечает цель → Chase
        run(&mut agent, &mut world, &mut events, 1);
        assert_eq!(agent.state(), AIStateType::Chase);

        let snapshot = agent.snapshot();
        assert_eq!(snapshot.state, AIStateType::Chase);
        assert!(snapshot.flags.contains(SnapshotFlags::CHASING));
        assert_eq!(snapshot.target_id, Some(TARGET));
        assert!(snapshot.has_valid_target);
        assert_eq!(snapshot.position, agent.position());
        assert_eq!(snapshot.timestamp, DT as f64);
    }

    #[test]
    fn test_damage_until_death_stops_ticking() {
        let mut agent = AgentController::new(AgentId(1), Vec2::ZERO, Some(config()), 42);
        let mut world = SandboxWorld::default();
        let mut events = EventBus::new();

        assert!(!agent.apply_damage(60, &mut events));
        assert!(agent.apply_damage(60, &mut events));
        assert!(!agent.apply_damage(10, &mut events));

        let recent: Vec<_> = events.drain_recent();
        assert_eq!(
            recent[0],
            AgentEvent::HealthChanged {
                agent: AgentId(1),
                current: 40,
                max: 100
            }
        );
        assert_eq!(recent.last(), Some(&AgentEvent::Death { agent: AgentId(1) }));

        run(&mut agent, &mut world, &mut events, 5);
        assert!(!agent.is_alive());
        assert_eq!(agent.now(), 0.0);
        assert!(events.recent().next().is_none());
    }

    #[test]
    fn test_heal_is_capped_and_ignored_after_death() {
        let mut agent = AgentController::new(AgentId(1), Vec2::ZERO, Some(config()), 42);
        let mut events = EventBus::new();

        agent.apply_damage(30, &mut events);
        agent.heal(50, &mut events);
        assert_eq!(agent.health().current, 100);

        agent.apply_damage(100, &mut events);
        agent.heal(50, &mut events);
        assert_eq!(agent.health().current, 0);
        assert!(!agent.is_alive());
    }

    #[test]
    fn test_force_state_bypasses_guards() {
        let mut agent = AgentController::new(AgentId(1), Vec2::ZERO, Some(config()), 42);
        let mut world = SandboxWorld::default();
        let mut events = EventBus::new();

        agent
            .force_state(AIStateType::Retreat, &mut world.services(), &mut events)
            .expect("forced transition");
        assert_eq!(agent.state(), AIStateType::Retreat);
    }

    #[test]
    fn test_shots_wait_for_projectile_subsystem() {
        let mut agent = AgentController::new(AgentId(1), Vec2::ZERO, Some(config()), 42);
        let mut world = SandboxWorld::default();
        world.projectiles = ProjectileLog::offline();
        world.arena.spawn_target(TARGET, Vec2::new(4.0, 0.0));
        let mut events = EventBus::new();

        run(&mut agent, &mut world, &mut events, 16);
        assert!(agent.pending_shots() > 0);
        assert!(world.projectiles.fired.is_empty());

        // FIRE_MAX_WAIT = 5s: самый первый выстрел брошен
        run(&mut agent, &mut world, &mut events, 48);
        assert!(kinds(&mut events).contains(&EventKind::ShotAbandoned));
    }
}
