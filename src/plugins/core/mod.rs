//! Core plugin: shared resources, frame ordering, subsystem switches.
//!
//! Every gameplay frame runs the same fixed sequence:
//!
//! ```text
//! Prepare -> Merge -> (ApplyDeferred) -> Input -> Movement -> Physics -> Collision -> Dispatch
//! ```
//!
//! `Merge` drains the async staging queue before anything else looks at the world, so entities
//! staged before this point are visible to this frame's movement and collision queries.
//! `Merge`, `Movement`, `Physics` and `Collision` only run while playing.

use bevy::platform::collections::HashSet;
use bevy::prelude::*;

use crate::common::config::GameConfig;
use crate::common::state::GameState;

#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameSet {
    Prepare,
    Merge,
    Input,
    Movement,
    Physics,
    Collision,
    Dispatch,
}

/// Gameplay subsystems that can be switched off independently of the game state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subsystem {
    Staging,
    Player,
    Enemies,
    Projectiles,
    Pickups,
    Physics,
    Collision,
}

/// Everything is enabled unless listed in `disabled`.
#[derive(Resource, Debug, Clone, Default)]
pub struct Subsystems {
    disabled: HashSet<Subsystem>,
}

impl Subsystems {
    pub fn is_enabled(&self, subsystem: Subsystem) -> bool {
        !self.disabled.contains(&subsystem)
    }

    pub fn set(&mut self, subsystem: Subsystem, enabled: bool) {
        if enabled {
            self.disabled.remove(&subsystem);
        } else {
            self.disabled.insert(subsystem);
        }
    }
}

/// Run condition for systems owned by `subsystem`.
pub fn subsystem_enabled(subsystem: Subsystem) -> impl Fn(Res<Subsystems>) -> bool + Clone {
    move |switches: Res<Subsystems>| switches.is_enabled(subsystem)
}

pub fn plugin(app: &mut App) {
    app.init_resource::<GameConfig>();
    let [r, g, b] = app.world().resource::<GameConfig>().game.clear_color;

    app.insert_resource(ClearColor(Color::srgb(r, g, b)))
        .init_resource::<Subsystems>()
        .configure_sets(
            Update,
            (
                FrameSet::Prepare,
                FrameSet::Merge,
                FrameSet::Input,
                FrameSet::Movement,
                FrameSet::Physics,
                FrameSet::Collision,
                FrameSet::Dispatch,
            )
                .chain(),
        )
        .add_systems(
            Update,
            bevy::ecs::schedule::ApplyDeferred
                .after(FrameSet::Merge)
                .before(FrameSet::Input),
        );

    for set in [
        FrameSet::Merge,
        FrameSet::Movement,
        FrameSet::Physics,
        FrameSet::Collision,
    ] {
        app.configure_sets(Update, set.run_if(in_state(GameState::Playing)));
    }
}
