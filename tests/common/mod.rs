//! Integration test harness.
//!
//! Keep integration tests headless:
//! - `MinimalPlugins` provides core ECS runtime.
//! - we then call `galleons::game::configure_headless` to install gameplay plugins.
//!
//! There is no `ButtonInput` resource, so nothing samples devices: tests drive menus through
//! `MenuInput` and the ship through `PlayerInput`. Frames advance by a fixed 16 ms.

#![allow(dead_code)]

use std::time::Duration;

use bevy::prelude::*;
use bevy::state::app::StatesPlugin;
use bevy::time::TimeUpdateStrategy;
use galleons::common::config::GameConfig;
use galleons::common::state::GameState;
use galleons::plugins::flow::MenuInput;

pub const FRAME: Duration = Duration::from_millis(16);

/// Defaults, minus everything that would appear on its own while a test runs.
pub fn quiet_config() -> GameConfig {
    let mut config = GameConfig::default();
    config.waves.spawn_wave_delay_ms = 60_000;
    config.game.player_respawn_delay_ms = 60_000;
    config.waves.min_civis_per_wave = 0;
    config.waves.max_civis_per_wave = 0;
    for wave in &mut config.waves.per_wave {
        wave.smart_bombs = 0;
    }
    config
}

pub fn app_headless() -> App {
    app_with_config(quiet_config())
}

pub fn app_with_config(config: GameConfig) -> App {
    let mut app = App::new();
    app.add_plugins((MinimalPlugins, StatesPlugin))
        .insert_resource(TimeUpdateStrategy::ManualDuration(FRAME))
        .insert_resource(config);

    galleons::game::configure_headless(&mut app);
    app
}

pub fn state(app: &App) -> GameState {
    *app.world().resource::<State<GameState>>().get()
}

/// Press confirm for one frame.
pub fn confirm(app: &mut App) {
    press(
        app,
        MenuInput {
            confirm: true,
            ..default()
        },
    );
}

pub fn press(app: &mut App, input: MenuInput) {
    app.world_mut().insert_resource(input);
    app.update();
}

/// From boot, through the splash screens, title and menu, into a running session.
pub fn boot_into_play(app: &mut App) {
    app.update();
    for _ in 0..8 {
        if state(app) == GameState::Playing {
            break;
        }
        confirm(app);
    }
    assert_eq!(state(app), GameState::Playing);
    // Merge the staged player.
    app.update();
}
