//! Camera plugin (render-only).
//!
//! The camera tracks the player horizontally, looking `lead_distance` ahead of the ship.
//! When the ship turns around the lead swings to the other side over `switch_dir_ms`
//! instead of snapping.
//!
//! ```text
//! Startup:    spawn MainCamera (Firefly lit)
//! PostUpdate: ease the lead toward the facing, then smooth toward player.x + lead
//! ```
//!
//! The player and camera queries carry `Without<...>` filters so Bevy can prove they never
//! alias the same `Transform` (B0001).

use bevy::prelude::*;
use bevy_firefly::prelude::*;

use crate::common::config::GameConfig;
use crate::plugins::store::components::{FlipInfo, Player};

const CAMERA_DEPTH: f32 = 999.0;

#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct MainCamera {
    pub responsiveness: f32,
    /// Current horizontal offset ahead of the player.
    pub lead: f32,
}

pub fn plugin(app: &mut App) {
    app.add_systems(Startup, spawn_camera).add_systems(
        PostUpdate,
        follow_player.before(TransformSystems::Propagate),
    );
}

fn spawn_camera(mut commands: Commands, config: Res<GameConfig>) {
    commands.spawn((
        Name::new("MainCamera"),
        Camera2d,
        MainCamera {
            responsiveness: config.camera.smoothing,
            lead: config.camera.lead_distance,
        },
        FireflyConfig::default(),
        Transform::from_xyz(0.0, 0.0, CAMERA_DEPTH),
    ));
}

/// Move `lead` toward the side the ship faces. A full swing takes `switch_secs`.
pub fn ease_lead(lead: f32, facing_right: bool, distance: f32, switch_secs: f32, dt: f32) -> f32 {
    let target = if facing_right { distance } else { -distance };
    if switch_secs <= 0.0 {
        return target;
    }
    let step = 2.0 * distance / switch_secs * dt;
    let gap = target - lead;
    if gap.abs() <= step {
        target
    } else {
        lead + gap.signum() * step
    }
}

pub fn follow_player(
    time: Res<Time>,
    config: Res<GameConfig>,
    q_player: Query<(&Transform, &FlipInfo), (With<Player>, Without<MainCamera>)>,
    mut q_cam: Query<(&mut Transform, &mut MainCamera), Without<Player>>,
) {
    let Ok((player, flip)) = q_player.single() else {
        return;
    };
    let Ok((mut transform, mut camera)) = q_cam.single_mut() else {
        return;
    };

    let dt = time.delta_secs();
    let settings = &config.camera;
    camera.lead = ease_lead(
        camera.lead,
        flip.facing_right,
        settings.lead_distance,
        settings.switch_dir_ms as f32 / 1000.0,
        dt,
    );

    let target = player.translation.x + camera.lead;
    let alpha = 1.0 - (-camera.responsiveness * dt).exp();
    transform.translation.x += (target - transform.translation.x) * alpha;
}

#[cfg(test)]
mod tests;
