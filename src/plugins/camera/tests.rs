use std::time::Duration;

use bevy::prelude::*;

use super::*;
use crate::common::test_utils::{advance_time, run_system_once};

#[test]
fn lead_swings_across_over_the_switch_time() {
    // 100 each side, 1 s for the full 200 swing.
    let mut lead = 100.0;
    let mut seen = Vec::new();
    for _ in 0..5 {
        lead = ease_lead(lead, false, 100.0, 1.0, 0.25);
        seen.push(lead);
    }
    assert_eq!(seen, vec![50.0, 0.0, -50.0, -100.0, -100.0]);
}

#[test]
fn zero_switch_time_snaps() {
    assert_eq!(ease_lead(180.0, false, 180.0, 0.0, 0.016), -180.0);
}

#[test]
fn camera_closes_in_on_the_lead_point() {
    let mut world = World::new();
    world.insert_resource(GameConfig::default());
    advance_time(&mut world, 0.1);
    world.spawn((
        Player,
        FlipInfo::new(Duration::from_millis(250)),
        Transform::from_xyz(500.0, 0.0, 1.0),
    ));
    let camera = world
        .spawn((
            MainCamera {
                responsiveness: 5.0,
                lead: 180.0,
            },
            Transform::from_xyz(0.0, 0.0, CAMERA_DEPTH),
        ))
        .id();

    run_system_once(&mut world, follow_player);

    let x = world.get::<Transform>(camera).unwrap().translation.x;
    let expected = 680.0 * (1.0 - (-0.5f32).exp());
    assert!((x - expected).abs() < 1e-2, "camera at {x}, expected {expected}");
    assert_eq!(world.get::<Transform>(camera).unwrap().translation.y, 0.0);
}

#[test]
fn camera_waits_without_a_player() {
    let mut world = World::new();
    world.insert_resource(GameConfig::default());
    advance_time(&mut world, 0.1);
    let camera = world
        .spawn((
            MainCamera {
                responsiveness: 5.0,
                lead: 180.0,
            },
            Transform::from_xyz(42.0, 0.0, CAMERA_DEPTH),
        ))
        .id();

    run_system_once(&mut world, follow_player);

    assert_eq!(world.get::<Transform>(camera).unwrap().translation.x, 42.0);
}
