//! Renderer-facing state.
//!
//! The simulation never draws. It keeps two plain resources current and the render-only
//! `hud` plugin turns them into text and a fade overlay:
//! - `HudStats`: lives, score, bombs and wave, maintained from bus events
//! - `ScreenFade`: reset by `StateChanged`, then ramps back to fully visible

pub mod hud;

use bevy::prelude::*;

use crate::common::config::GameConfig;
use crate::plugins::bus::{HandlerResult, PlayEvent, PlayEventKind, PlayEventsExt};

/// Fade-in speed, in alpha per second.
const FADE_RATE: f32 = 2.0;

#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq)]
pub struct HudStats {
    pub lives: u32,
    pub score: u32,
    pub bombs: u32,
    pub wave: u32,
}

impl HudStats {
    pub fn fresh(config: &GameConfig) -> Self {
        Self {
            lives: config.starting_lives(),
            score: 0,
            bombs: 0,
            wave: 1,
        }
    }
}

impl FromWorld for HudStats {
    fn from_world(world: &mut World) -> Self {
        Self::fresh(&world.get_resource_or_init::<GameConfig>())
    }
}

/// 0 is fully faded out, 1 fully visible.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct ScreenFade {
    pub alpha: f32,
}

impl Default for ScreenFade {
    fn default() -> Self {
        Self { alpha: 1.0 }
    }
}

pub fn plugin(app: &mut App) {
    app.init_resource::<HudStats>()
        .init_resource::<ScreenFade>()
        .add_systems(Update, advance_fade);
    app.subscribe_play_events(on_ui_event);
}

pub fn advance_fade(time: Res<Time>, mut fade: ResMut<ScreenFade>) {
    if fade.alpha < 1.0 {
        fade.alpha = (fade.alpha + FADE_RATE * time.delta_secs()).min(1.0);
    }
}

pub fn on_ui_event(
    In(event): In<PlayEvent>,
    mut hud: ResMut<HudStats>,
    mut fade: ResMut<ScreenFade>,
) -> HandlerResult {
    match event.kind {
        PlayEventKind::PlayerDestroyed | PlayEventKind::PlayerRespawned => hud.lives = event.value,
        PlayEventKind::UpdateScore => hud.score = event.value,
        PlayEventKind::SmartBombActivated | PlayEventKind::SmartBombGrabbed => {
            hud.bombs = event.value
        }
        PlayEventKind::WaveCleared => hud.wave = event.value,
        // Seed is a percentage.
        PlayEventKind::StateChanged => fade.alpha = event.value.min(100) as f32 / 100.0,
        _ => {}
    }
    Ok(())
}
