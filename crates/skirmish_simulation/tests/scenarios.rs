//! Сценарии поведения агента через публичный API Session
//!
//! dt = ai_update_interval = 0.125: каждый tick — decision tick, время точное.

use bevy::math::Vec2;
use skirmish_simulation::sandbox::{Arena, OpenField};
use skirmish_simulation::{
    AIStateType, AgentConfig, AgentEvent, AgentId, EventKind, SandboxWorld, Session,
    SessionConfig, TargetHandle,
};
use std::sync::{Arc, Mutex};

const DT: f32 = 0.125;
const TARGET: TargetHandle = TargetHandle(1);

fn agent_config() -> Arc<AgentConfig> {
    Arc::new(AgentConfig {
        ai_update_interval: DT,
        ..Default::default()
    })
}

/// Сессия с одним агентом в (0,0) и целью в `target_at`
fn session_with_target(target_at: Vec2) -> (Session<SandboxWorld>, AgentId) {
    let mut arena = Arena::new();
    arena.spawn_target(TARGET, target_at);
    let world = SandboxWorld::new(OpenField::unbounded(), arena);

    let mut session = Session::new(&SessionConfig::default(), world);
    let agent = session.spawn_agent(Vec2::ZERO, Some(agent_config()));
    (session, agent)
}

fn state(session: &Session<SandboxWorld>, agent: AgentId) -> AIStateType {
    session.agent(agent).expect("agent exists").state()
}

/// Тикает пока условие не выполнится; false если не дождались
fn run_until(
    session: &mut Session<SandboxWorld>,
    max_ticks: usize,
    mut done: impl FnMut(&Session<SandboxWorld>) -> bool,
) -> bool {
    for _ in 0..max_ticks {
        session.tick(DT);
        if done(session) {
            return true;
        }
    }
    false
}

fn event_kinds(session: &mut Session<SandboxWorld>) -> Vec<EventKind> {
    session
        .events_mut()
        .drain_recent()
        .iter()
        .map(|event| event.kind())
        .collect()
}

#[test]
fn test_spotted_target_is_chased_then_attacked() {
    let (mut session, agent) = session_with_target(Vec2::new(6.0, 0.0));

    session.tick(DT);
    assert_eq!(state(&session, agent), AIStateType::Chase);
    assert_eq!(session.agent(agent).and_then(|a| a.target()), Some(TARGET));

    assert!(run_until(&mut session, 40, |s| state(s, agent) == AIStateType::Attack));
    assert!(run_until(&mut session, 40, |s| !s.world().projectiles.fired.is_empty()));

    let shot = session.world().projectiles.fired[0];
    assert_eq!(shot.damage, 10);
    let kinds = event_kinds(&mut session);
    assert!(kinds.contains(&EventKind::AttackStarted));
    assert!(kinds.contains(&EventKind::Shoot));
}

#[test]
fn test_state_changes_reach_subscribers() {
    let (mut session, _agent) = session_with_target(Vec2::new(6.0, 0.0));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    session
        .events_mut()
        .subscribe(EventKind::StateChanged, move |event| {
            if let AgentEvent::StateChanged { from, to, .. } = event {
                sink.lock().expect("sink").push((*from, *to));
            }
        });

    session.tick(DT);

    let seen = seen.lock().expect("seen");
    assert_eq!(seen.as_slice(), &[(AIStateType::Patrol, AIStateType::Chase)]);
}

#[test]
fn test_target_destroyed_during_chase_returns_to_patrol() {
    let (mut session, agent) = session_with_target(Vec2::new(9.0, 0.0));
    session.tick(DT);
    assert_eq!(state(&session, agent), AIStateType::Chase);
    event_kinds(&mut session);

    session.world_mut().arena.kill_target(TARGET);
    session.tick(DT);

    assert_eq!(state(&session, agent), AIStateType::Patrol);
    assert_eq!(session.agent(agent).and_then(|a| a.target()), None);
    assert!(event_kinds(&mut session).contains(&EventKind::TargetLost));
}

#[test]
fn test_target_too_close_during_attack_triggers_retreat() {
    let (mut session, agent) = session_with_target(Vec2::new(4.0, 0.0));
    assert!(run_until(&mut session, 40, |s| state(s, agent) == AIStateType::Attack));

    let position = session.agent(agent).expect("agent").position();
    session
        .world_mut()
        .arena
        .move_target(TARGET, position + Vec2::new(1.0, 0.0));
    session.tick(DT);

    assert_eq!(state(&session, agent), AIStateType::Retreat);
    assert!(event_kinds(&mut session).contains(&EventKind::RetreatStarted));

    // Отход: дистанция растёт
    run_until(&mut session, 4, |_| false);
    let after = session.agent(agent).expect("agent").position();
    assert!(after.distance(position + Vec2::new(1.0, 0.0)) > 1.0);
}

#[test]
fn test_lost_target_is_dropped_after_alert_time() {
    let (mut session, agent) = session_with_target(Vec2::new(8.0, 0.0));
    session.tick(DT);
    assert_eq!(state(&session, agent), AIStateType::Chase);

    // Цель ушла далеко за detection range
    session
        .world_mut()
        .arena
        .move_target(TARGET, Vec2::new(8.0, 30.0));

    // alert_time = 5s: ещё держим цель
    run_until(&mut session, 32, |_| false);
    assert_eq!(state(&session, agent), AIStateType::Chase);

    assert!(run_until(&mut session, 16, |s| state(s, agent) == AIStateType::Patrol));
    assert_eq!(session.agent(agent).and_then(|a| a.target()), None);
}

#[test]
fn test_agent_without_config_stays_inert() {
    let mut session = Session::new(&SessionConfig::default(), SandboxWorld::default());
    let agent = session.spawn_agent(Vec2::new(3.0, 3.0), None);

    run_until(&mut session, 20, |_| false);

    let controller = session.agent(agent).expect("agent");
    assert!(controller.is_inert());
    assert_eq!(controller.position(), Vec2::new(3.0, 3.0));
    assert_eq!(controller.snapshot().state, AIStateType::Patrol);
}

#[test]
fn test_damage_kills_and_freezes_agent() {
    let (mut session, agent) = session_with_target(Vec2::new(6.0, 0.0));
    session.tick(DT);

    assert_eq!(session.apply_damage(agent, 100), Some(true));
    let frozen = session.agent(agent).expect("agent").position();
    run_until(&mut session, 10, |_| false);

    assert_eq!(session.agent(agent).expect("agent").position(), frozen);
    assert_eq!(session.apply_damage(AgentId(99), 10), None);
    assert!(event_kinds(&mut session).contains(&EventKind::Death));
}

#[test]
fn test_walls_hide_targets_from_patrol() {
    let mut arena = Arena::new().with_wall(Vec2::new(3.0, -20.0), Vec2::new(3.0, 20.0));
    arena.spawn_target(TARGET, Vec2::new(6.0, 0.0));
    // Патруль не выходит за стену
    let navigation = OpenField::bounded(Vec2::new(-10.0, -10.0), Vec2::new(2.0, 10.0));
    let mut session = Session::new(
        &SessionConfig::default(),
        SandboxWorld::new(navigation, arena),
    );
    let agent = session.spawn_agent(Vec2::ZERO, Some(agent_config()));

    run_until(&mut session, 40, |_| false);

    assert_eq!(state(&session, agent), AIStateType::Patrol);
    assert_eq!(session.agent(agent).and_then(|a| a.target()), None);
}
