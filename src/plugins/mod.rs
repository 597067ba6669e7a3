//! Feature plugins.
//!
//! Bus handlers run in registration order, so the order below is also the order in which
//! subsystems react to a play event: waves, then the player's stats, then the HUD, then flow.

use bevy::prelude::*;

pub mod bus;
pub mod core;
pub mod enemies;
pub mod flow;
pub mod physics;
pub mod pickups;
pub mod player;
pub mod projectiles;
pub mod store;
pub mod ui;
pub mod waves;
pub mod world;

// Render-only
pub mod camera;
pub mod lighting;

/// Register gameplay plugins that work in headless tests.
pub fn register_gameplay(app: &mut App) {
    core::plugin(app);
    bus::plugin(app);
    store::plugin(app);
    waves::plugin(app);
    physics::plugin(app);
    player::plugin(app);
    enemies::plugin(app);
    projectiles::plugin(app);
    pickups::plugin(app);
    world::plugin(app);
    ui::plugin(app);
    flow::plugin(app);
}

/// Register render-only plugins (requires DefaultPlugins / render infra).
pub fn register_render(app: &mut App) {
    lighting::plugin(app);
    camera::plugin(app);
    ui::hud::plugin(app);
}

/// Register all plugins (full app).
pub fn register_all(app: &mut App) {
    register_gameplay(app);
    register_render(app);
}
