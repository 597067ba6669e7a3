//! Game composition root.
//!
//! Provides two public configuration functions:
//! - `configure_full`: includes DefaultPlugins (window/render) + game plugins.
//! - `configure_headless`: minimal configuration for integration tests.
//!
//! Both expect `GameConfig` and `Prefabs` to be inserted already. `run` loads them from disk
//! and fails before any window opens; headless apps fall back to the built-in defaults.

use bevy::prelude::*;
use bevy::window::WindowResolution;

use crate::common::config::{DEFAULT_CONFIG_PATH, GameConfig};
use crate::common::error::InitError;
use crate::common::state::GameState;
use crate::plugins;
use crate::plugins::store::Prefabs;

// Only compile these imports on Windows.
#[cfg(target_os = "windows")]
use bevy::render::{
    RenderPlugin,
    settings::{Backends, PowerPreference, WgpuSettings},
};

pub fn run() -> Result<AppExit, InitError> {
    let config = GameConfig::load(DEFAULT_CONFIG_PATH)?;
    let prefabs = Prefabs::from_config(&config)?;

    Ok(App::new()
        .insert_resource(config)
        .insert_resource(prefabs)
        .add_plugins(configure_full)
        .run())
}

/// Full configuration for `cargo run`.
pub fn configure_full(app: &mut App) {
    let window = app
        .world()
        .get_resource::<GameConfig>()
        .map(|config| config.window.clone())
        .unwrap_or_default();

    let default_plugins = DefaultPlugins.set(WindowPlugin {
        primary_window: Some(Window {
            title: window.title,
            resolution: WindowResolution::new(window.width, window.height),
            ..default()
        }),
        ..default()
    });

    // Vulkan is unreliable on some Windows drivers; force DX12 on the high-performance GPU.
    #[cfg(target_os = "windows")]
    let default_plugins = default_plugins.set(RenderPlugin {
        render_creation: WgpuSettings {
            backends: Some(Backends::DX12),
            power_preference: PowerPreference::HighPerformance,
            ..default()
        }
        .into(),
        ..default()
    });

    app.add_plugins(default_plugins);

    configure_game(app);
    plugins::register_render(app);
}

/// Headless configuration for integration tests.
///
/// Notes:
/// - Do NOT add DefaultPlugins.
/// - Do NOT add render-only plugins (Firefly/camera/HUD).
pub fn configure_headless(app: &mut App) {
    configure_game(app);
}

/// Configuration shared by both full and headless apps.
fn configure_game(app: &mut App) {
    app.init_resource::<GameConfig>();
    if !app.world().contains_resource::<Prefabs>() {
        let prefabs = Prefabs::from_config(app.world().resource::<GameConfig>())
            .unwrap_or_else(|err| {
                error!("{err}, starting with no prefabs");
                Prefabs::default()
            });
        app.insert_resource(prefabs);
    }

    app.init_state::<GameState>();
    plugins::register_gameplay(app);
}
