use std::time::Duration;

use bevy::prelude::*;

use super::*;
use crate::common::test_utils::{gameplay_world, run_handler, run_system_once, take_events};

fn player_world(input: PlayerInput) -> World {
    let mut world = gameplay_world();
    let config = GameConfig::default();
    world.insert_resource(Prefabs::from_config(&config).unwrap());
    world.insert_resource(config);
    world.insert_resource(input);
    world
}

fn move_info() -> PlayerMoveInfo {
    PlayerMoveInfo {
        h_accel: 100.0,
        h_decel: 2.0,
        h_max_speed: 50.0,
        h_flip_accel: 300.0,
        v_accel: 80.0,
        v_decel: 4.0,
        v_max_speed: 20.0,
        v_flip_accel: 160.0,
    }
}

fn spawn_player(world: &mut World, at: Vec3, velocity: Vec3) -> Entity {
    world
        .spawn((
            Player,
            ControllerId(0),
            Transform::from_translation(at),
            Velocity(velocity),
            Acceleration::default(),
            move_info(),
            FlipInfo::new(Duration::from_millis(250)),
            ChargeInfo::default(),
        ))
        .id()
}

fn spawn_stats(world: &mut World, bombs: u32) -> Entity {
    world
        .spawn((
            PersistentStats,
            Lives(3),
            Score(1000),
            NukeDispenser {
                bombs,
                range: 300.0,
                max_capacity: 3,
            },
        ))
        .id()
}

// -----------------------------------------------------------------------------
// Movement
// -----------------------------------------------------------------------------

#[test]
fn acceleration_depends_on_direction_and_input() {
    // Pushing along the current motion.
    assert_eq!(axis_acceleration(1.0, 10.0, 100.0, 300.0, 2.0), 100.0);
    // Reversing, or starting from rest.
    assert_eq!(axis_acceleration(-1.0, 10.0, 100.0, 300.0, 2.0), -300.0);
    assert_eq!(axis_acceleration(1.0, 0.0, 100.0, 300.0, 2.0), 300.0);
    // Coasting.
    assert_eq!(axis_acceleration(0.0, 10.0, 100.0, 300.0, 2.0), -20.0);
}

#[test]
fn steering_clamps_velocity_per_axis() {
    let mut world = player_world(PlayerInput {
        axis: Vec2::new(1.0, 0.0),
        ..default()
    });
    let player = spawn_player(&mut world, Vec3::ZERO, Vec3::new(80.0, -30.0, 0.0));

    run_system_once(&mut world, steer_player);

    assert_eq!(
        world.get::<Velocity>(player).unwrap().0,
        Vec3::new(50.0, -20.0, 0.0)
    );
    let acceleration = world.get::<Acceleration>(player).unwrap().0;
    assert_eq!(acceleration.x, 100.0);
    assert_eq!(acceleration.y, 120.0);
}

#[test]
fn steering_left_turns_the_ship_around() {
    let mut world = player_world(PlayerInput {
        axis: Vec2::new(-1.0, 0.0),
        ..default()
    });
    let player = spawn_player(&mut world, Vec3::ZERO, Vec3::ZERO);

    run_system_once(&mut world, steer_player);

    let flip = world.get::<FlipInfo>(player).unwrap();
    assert!(!flip.facing_right);
}

#[test]
fn flip_completes_a_half_turn_and_stops() {
    let mut flip = FlipInfo::new(Duration::from_millis(100));
    let mut transform = Transform::default();

    flip.steer(-1.0, 0.06, &mut transform);
    assert!(flip.flipped_deg > 100.0 && flip.flipped_deg < 180.0);
    flip.steer(0.0, 0.06, &mut transform);
    assert_eq!(flip.flipped_deg, 180.0);
    flip.steer(0.0, 0.06, &mut transform);
    assert_eq!(flip.flipped_deg, 180.0);

    let forward = transform.rotation * Vec3::X;
    assert!((forward - Vec3::NEG_X).length() < 1e-4);
}

#[test]
fn shots_leave_the_nose_of_the_ship() {
    let at = Vec3::new(100.0, 20.0, 1.0);

    let right = orient_projectile(Transform::default(), at, true, 30.0);
    assert!((right.translation - Vec3::new(130.0, 20.0, 1.0)).length() < 1e-4);

    let left = orient_projectile(Transform::default(), at, false, 30.0);
    assert!((left.translation - Vec3::new(70.0, 20.0, 1.0)).length() < 1e-4);
    assert!((left.rotation * Vec3::X - Vec3::NEG_X).length() < 1e-4);
}

// -----------------------------------------------------------------------------
// Lazer
// -----------------------------------------------------------------------------

#[test]
fn lazer_fires_on_release() {
    let mut world = player_world(PlayerInput {
        fire: true,
        ..default()
    });
    let player = spawn_player(&mut world, Vec3::ZERO, Vec3::ZERO);

    run_system_once(&mut world, fire_lazer);
    assert!(world.entity(player).contains::<Charging>());
    assert_eq!(world.query::<&Lazer>().iter(&world).count(), 0);

    world.insert_resource(PlayerInput::default());
    run_system_once(&mut world, fire_lazer);

    assert!(!world.entity(player).contains::<Charging>());
    let sender = world
        .query_filtered::<&Sender, With<Lazer>>()
        .single(&world)
        .unwrap();
    assert_eq!(*sender, Sender(Faction::Player));
    assert_eq!(
        take_events(&mut world),
        vec![PlayEvent::haptics(HapticKind::FireLazer, 0)]
    );
}

// -----------------------------------------------------------------------------
// Smart bomb
// -----------------------------------------------------------------------------

#[test]
fn smart_bomb_needs_a_bomb_to_arm() {
    let mut world = player_world(PlayerInput {
        bomb: true,
        ..default()
    });
    spawn_stats(&mut world, 0);
    let player = spawn_player(&mut world, Vec3::ZERO, Vec3::ZERO);

    run_system_once(&mut world, detonate_smart_bomb);

    assert!(!world.entity(player).contains::<ChargingSmartBomb>());
}

#[test]
fn smart_bomb_clears_everything_in_range() {
    let mut world = player_world(PlayerInput {
        bomb: true,
        ..default()
    });
    spawn_stats(&mut world, 2);
    let player = spawn_player(&mut world, Vec3::ZERO, Vec3::ZERO);
    let near = world
        .spawn((Enemy, Score(150), Transform::from_xyz(100.0, 0.0, 0.0)))
        .id();
    let far = world
        .spawn((Enemy, Score(150), Transform::from_xyz(400.0, 0.0, 0.0)))
        .id();
    let shot = world
        .spawn((Projectile, Transform::from_xyz(0.0, 50.0, 0.0)))
        .id();

    run_system_once(&mut world, detonate_smart_bomb);
    assert!(world.entity(player).contains::<ChargingSmartBomb>());

    world.insert_resource(PlayerInput::default());
    run_system_once(&mut world, detonate_smart_bomb);

    assert!(!world.entity(player).contains::<ChargingSmartBomb>());
    assert!(world.get_entity(near).is_err());
    assert!(world.get_entity(shot).is_err());
    assert!(world.get_entity(far).is_ok());
    assert_eq!(
        take_events(&mut world),
        vec![
            PlayEvent::enemy_destroyed(150, true),
            PlayEvent::new(PlayEventKind::SmartBombActivated, 1),
            PlayEvent::haptics(HapticKind::Detonate, 0),
        ]
    );
}

// -----------------------------------------------------------------------------
// Bus handler
// -----------------------------------------------------------------------------

#[test]
fn approved_kills_and_civilians_add_to_the_score() {
    let mut world = player_world(PlayerInput::default());
    let stats = spawn_stats(&mut world, 0);

    run_handler(&mut world, on_player_event, PlayEvent::enemy_destroyed(150, true)).unwrap();
    run_handler(&mut world, on_player_event, PlayEvent::enemy_destroyed(0, false)).unwrap();
    run_handler(&mut world, on_player_event, PlayEvent::civilian_destroyed(500)).unwrap();

    assert_eq!(world.get::<Score>(stats), Some(&Score(1650)));
    assert_eq!(
        take_events(&mut world),
        vec![
            PlayEvent::new(PlayEventKind::UpdateScore, 1150),
            PlayEvent::new(PlayEventKind::UpdateScore, 1650),
        ]
    );
}

#[test]
fn bomb_count_follows_activations() {
    let mut world = player_world(PlayerInput::default());
    let stats = spawn_stats(&mut world, 3);

    run_handler(
        &mut world,
        on_player_event,
        PlayEvent::new(PlayEventKind::SmartBombActivated, 2),
    )
    .unwrap();

    assert_eq!(world.get::<NukeDispenser>(stats).unwrap().bombs, 2);
}

#[test]
fn player_death_requests_a_rumble() {
    let mut world = player_world(PlayerInput::default());

    run_handler(&mut world, on_player_event, PlayEvent::player_destroyed(1)).unwrap();

    assert_eq!(
        take_events(&mut world),
        vec![PlayEvent::haptics(HapticKind::PlayerDeath, 0)]
    );
}

#[test]
fn rumble_is_panned_between_motors() {
    let mut world = World::new();
    let gamepad = world.spawn_empty().id();
    let rumble = Rumble {
        pan: 0.25,
        duration: Duration::from_millis(200),
        strength: 0.8,
    };

    let GamepadRumbleRequest::Add {
        duration,
        intensity,
        ..
    } = rumble_request(gamepad, &rumble)
    else {
        panic!("expected an add request");
    };
    assert_eq!(duration, Duration::from_millis(200));
    assert!((intensity.strong_motor - 0.6).abs() < 1e-6);
    assert!((intensity.weak_motor - 0.2).abs() < 1e-6);
}

#[test]
fn fresh_session_stats_come_from_config() {
    let mut world = player_world(PlayerInput::default());

    run_system_once(&mut world, spawn_persistent_stats);

    let (lives, score, nukes) = world
        .query_filtered::<(&Lives, &Score, &NukeDispenser), With<PersistentStats>>()
        .single(&world)
        .unwrap();
    assert_eq!(*lives, Lives(3));
    assert_eq!(*score, Score(0));
    assert_eq!(nukes.bombs, 0);
    assert_eq!(nukes.max_capacity, 3);
}
