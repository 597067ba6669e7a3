//! Entity store: components, prefabs, deferred destruction, and the async staging queue.
//!
//! The Bevy `World` is the store itself. This plugin adds what the game needs on top:
//! named templates (`Prefabs`), a frame-scoped destroy ledger (`Doomed`), and the channel
//! background timers use to create entities without touching the world (`StagingQueue`).

pub mod components;
pub mod destroy;
pub mod loader;
pub mod prefab;
pub mod staging;

use bevy::prelude::*;

use crate::plugins::core::{FrameSet, Subsystem, subsystem_enabled};

pub use destroy::{Destroyer, Doomed};
pub use prefab::{Blueprint, PrefabRegistry, Prefabs};
pub use staging::{StagingQueue, StagingSender};

pub fn plugin(app: &mut App) {
    app.init_resource::<Doomed>()
        .init_resource::<StagingQueue>()
        .init_resource::<Prefabs>()
        .add_systems(Update, destroy::clear_doomed.in_set(FrameSet::Prepare))
        .add_systems(
            Update,
            staging::merge_staged_entities
                .in_set(FrameSet::Merge)
                .run_if(subsystem_enabled(Subsystem::Staging)),
        );
}
