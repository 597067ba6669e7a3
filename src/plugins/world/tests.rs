use bevy::prelude::*;

use super::*;
use crate::common::test_utils::run_system_once;

fn edges(world: &mut World) -> Vec<(Boundary, Vec3)> {
    let mut found: Vec<_> = world
        .query::<(&Boundary, &Transform)>()
        .iter(world)
        .map(|(b, t)| (*b, t.translation))
        .collect();
    found.sort_by(|a, b| b.1.y.total_cmp(&a.1.y));
    found
}

#[test]
fn edges_sit_just_outside_the_playfield() {
    let mut world = World::new();
    world.insert_resource(GameConfig::default());
    run_system_once(&mut world, spawn_boundaries);

    let found = edges(&mut world);
    assert_eq!(found.len(), 2);
    assert_eq!(found[0], (Boundary::Top, Vec3::new(0.0, 303.0, EDGE_DEPTH)));
    assert_eq!(found[1], (Boundary::Bottom, Vec3::new(0.0, -303.0, EDGE_DEPTH)));
}

#[test]
fn edges_slide_with_the_player() {
    let mut world = World::new();
    world.insert_resource(GameConfig::default());
    run_system_once(&mut world, spawn_boundaries);
    world.spawn((Player, Transform::from_xyz(950.0, 40.0, 1.0)));

    run_system_once(&mut world, slide_boundaries);

    assert!(edges(&mut world).iter().all(|(_, at)| at.x == 950.0));
}
