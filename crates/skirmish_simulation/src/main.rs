//! Headless симуляция SKIRMISH
//!
//! Один агент на арене со стеной и одной целью, 1000 fixed тиков.

use skirmish_simulation::sandbox::{Arena, OpenField};
use skirmish_simulation::{
    create_headless_app, AgentConfig, SandboxWorld, Session, SessionConfig, TargetHandle,
};
use bevy::math::Vec2;
use std::sync::Arc;

fn main() {
    let config = SessionConfig::default();
    println!("Starting SKIRMISH headless simulation (seed: {})", config.seed);

    let navigation = OpenField::bounded(Vec2::splat(-20.0), Vec2::splat(20.0));
    let mut arena = Arena::new().with_wall(Vec2::new(4.0, -3.0), Vec2::new(4.0, 3.0));
    arena.spawn_target(TargetHandle(1), Vec2::new(9.0, 1.0));

    let mut session = Session::new(&config, SandboxWorld::new(navigation, arena));
    session.spawn_agent(Vec2::ZERO, Some(Arc::new(AgentConfig::default())));

    let mut app = create_headless_app(session);

    for tick in 0..1000 {
        app.update();

        if tick % 100 == 0 {
            let session = app.world().resource::<Session<SandboxWorld>>();
            for (id, snapshot) in session.snapshots() {
                println!(
                    "Tick {}: {} {} at ({:.2}, {:.2}), shots fired: {}",
                    tick,
                    id,
                    snapshot.state,
                    snapshot.position.x,
                    snapshot.position.y,
                    session.world().projectiles.fired.len()
                );
            }
        }
    }

    println!("Simulation complete!");
}
