//! Projectile flight.
//!
//! Lazers, peas and cannonballs fly straight along their local +X, so whoever fires them
//! only has to point the transform. Traps drift upward in world space on top of the velocity
//! their bomber gave them. Culling and hits belong to the physics plugin.

use bevy::prelude::*;

use crate::plugins::core::{FrameSet, Subsystem, subsystem_enabled};
use crate::plugins::store::components::*;

pub fn plugin(app: &mut App) {
    app.add_systems(
        Update,
        (fly_straight, drift_traps)
            .in_set(FrameSet::Movement)
            .run_if(subsystem_enabled(Subsystem::Projectiles)),
    );
}

pub fn fly_straight(
    time: Res<Time>,
    mut q: Query<
        (&mut Transform, &Speed),
        (With<Projectile>, Or<(With<Lazer>, With<Pea>, With<Cannonball>)>),
    >,
) {
    let dt = time.delta_secs();
    for (mut transform, speed) in &mut q {
        let forward = transform.local_x();
        transform.translation += forward * speed.0 * dt;
    }
}

pub fn drift_traps(time: Res<Time>, mut q: Query<(&mut Transform, &Speed), With<Trap>>) {
    let dt = time.delta_secs();
    for (mut transform, speed) in &mut q {
        transform.translation.y += speed.0 * dt;
    }
}

#[cfg(test)]
mod tests;
