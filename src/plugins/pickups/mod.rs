//! Civilians.
//!
//! A free civilian falls to the ground, then wanders left and right, turning around on a
//! random interval. A captured one hangs below its lander. Captors are referenced by
//! `Entity` and checked every frame: once the lander is gone the civilian is let go and
//! falls again. Smart bomb pickups have no behaviour of their own.

use bevy::prelude::*;
use rand::Rng;

use crate::common::config::GameConfig;
use crate::plugins::core::{FrameSet, Subsystem, subsystem_enabled};
use crate::plugins::store::components::*;

pub fn plugin(app: &mut App) {
    app.add_systems(
        Update,
        move_civilians
            .in_set(FrameSet::Movement)
            .run_if(subsystem_enabled(Subsystem::Pickups)),
    );
}

/// Tick the wander timer and turn around when it runs out.
pub fn wander(movement: &mut CiviMovementStats, delta: std::time::Duration, rng: &mut impl Rng) {
    movement.timer.tick(delta);
    if movement.timer.is_finished() {
        movement.walking_right = !movement.walking_right;
        movement.timer.set_duration(movement.dir_change.roll(rng));
        movement.timer.reset();
    }
}

pub fn move_civilians(
    time: Res<Time>,
    config: Res<GameConfig>,
    q_captors: Query<&Transform, Without<Civilian>>,
    mut q_civilians: Query<
        (
            &mut Transform,
            &Speed,
            &Offset,
            &mut CaptureInfo,
            &mut CiviMovementStats,
            &mut FlipInfo,
        ),
        With<Civilian>,
    >,
) {
    let dt = time.delta_secs();
    let bottom = config.game.world_bottom_boundary;
    let mut rng = rand::rng();

    for (mut transform, speed, hang, mut capture, mut movement, mut flip) in &mut q_civilians {
        if capture.captured {
            match capture.captor.map(|captor| q_captors.get(captor)) {
                Some(Ok(captor)) => {
                    transform.translation = captor.translation - Vec3::Y * hang.0;
                    continue;
                }
                _ => {
                    debug!("captor gone, releasing civilian");
                    capture.release();
                }
            }
        }

        transform.translation.y -= speed.0 * dt;
        if transform.translation.y > bottom {
            continue;
        }

        wander(&mut movement, time.delta(), &mut rng);
        let dir = if movement.walking_right { 1.0 } else { -1.0 };
        transform.translation.x += dir * speed.0 * dt;
        flip.steer(dir, dt, &mut transform);
    }
}
