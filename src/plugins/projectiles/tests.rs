use std::f32::consts::PI;

use bevy::prelude::*;

use super::*;
use crate::common::test_utils::{advance_time, gameplay_world, run_system_once};

fn shot(world: &mut World, transform: Transform, speed: f32, kind: impl Bundle) -> Entity {
    world
        .spawn((Projectile, transform, Speed(speed), kind))
        .id()
}

#[test]
fn shots_fly_along_their_nose() {
    let mut world = gameplay_world();
    let right = shot(&mut world, Transform::default(), 100.0, Lazer);
    let left = shot(
        &mut world,
        Transform::from_rotation(Quat::from_rotation_y(PI)),
        100.0,
        Pea,
    );
    let up = shot(
        &mut world,
        Transform::from_rotation(Quat::from_rotation_z(PI / 2.0)),
        100.0,
        Cannonball,
    );

    advance_time(&mut world, 0.5);
    run_system_once(&mut world, fly_straight);

    let at = |world: &World, e: Entity| world.get::<Transform>(e).unwrap().translation;
    assert!((at(&world, right) - Vec3::new(50.0, 0.0, 0.0)).length() < 1e-3);
    assert!((at(&world, left) - Vec3::new(-50.0, 0.0, 0.0)).length() < 1e-3);
    assert!((at(&world, up) - Vec3::new(0.0, 50.0, 0.0)).length() < 1e-3);
}

#[test]
fn traps_drift_up_whatever_their_rotation() {
    let mut world = gameplay_world();
    let trap = shot(
        &mut world,
        Transform::from_rotation(Quat::from_rotation_z(PI)),
        10.0,
        Trap,
    );

    advance_time(&mut world, 0.5);
    run_system_once(&mut world, fly_straight);
    run_system_once(&mut world, drift_traps);

    let at = world.get::<Transform>(trap).unwrap().translation;
    assert!((at - Vec3::new(0.0, 5.0, 0.0)).length() < 1e-4);
}
