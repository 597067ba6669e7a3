//! Test helpers.
//!
//! Bevy provides `World::run_system_once` (via the `RunSystemOnce` trait) for quickly
//! executing a system in tests without building a full schedule.
//!
//! Systems that use `Commands` enqueue structural changes; applying them is normally handled by
//! `ApplyDeferred` / schedule boundaries. We call `world.flush()` after running so queued commands
//! are applied before assertions.

use std::time::Duration;

use bevy::ecs::system::{IntoSystem, RunSystemOnce};
use bevy::prelude::*;

use crate::plugins::bus::{EventBus, HandlerResult, PlayEvent};
use crate::plugins::store::Doomed;

/// Run a system once on the given world, then flush deferred commands.
/// Returns the system output.
pub fn run_system_once<T, Out, Marker>(world: &mut World, system: T) -> Out
where
    T: IntoSystem<(), Out, Marker>,
{
    let out = world.run_system_once(system).expect("system run failed");
    world.flush();
    out
}

/// Run a bus handler once with `event` as its input, then flush deferred commands.
pub fn run_handler<T, Marker>(world: &mut World, handler: T, event: PlayEvent) -> HandlerResult
where
    T: IntoSystem<In<PlayEvent>, HandlerResult, Marker>,
{
    let out = world
        .run_system_once_with(handler, event)
        .expect("handler run failed");
    world.flush();
    out
}

/// A world with the resources nearly every gameplay system touches.
pub fn gameplay_world() -> World {
    let mut world = World::new();
    world.init_resource::<EventBus>();
    world.init_resource::<Doomed>();
    world.insert_resource(Time::<()>::default());
    world
}

/// Replace the world's `Time` with one that advanced by `secs`.
pub fn advance_time(world: &mut World, secs: f32) {
    let mut time = Time::<()>::default();
    time.advance_by(Duration::from_secs_f32(secs));
    world.insert_resource(time);
}

/// Drain every event published so far.
pub fn take_events(world: &mut World) -> Vec<PlayEvent> {
    world.resource_mut::<EventBus>().drain().collect()
}
