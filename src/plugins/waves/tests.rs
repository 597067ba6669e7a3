use std::time::Duration;

use bevy::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

use super::*;
use super::spawner::{baiter_spawn_point, keep_clear_of_player};
use crate::common::config::{GameConfig, WaveTuning};
use crate::common::test_utils::{gameplay_world, run_handler, run_system_once, take_events};
use crate::plugins::store::components::{
    Alive, BaiterMovementStats, CaptureInfo, Lander, Pickup, Player,
};
use crate::plugins::store::staging::merge_staged_entities;

fn rng() -> StdRng {
    StdRng::seed_from_u64(7)
}

fn single_wave(max_enemies: u32, level: u32) -> GameConfig {
    let mut config = GameConfig::default();
    config.waves.per_wave = vec![WaveTuning {
        min_enemy_level: level,
        max_enemy_level: level,
        smart_bombs: 1,
        max_enemies,
        max_enemy_multiplier_per_batch: 1.0,
    }];
    config.waves.min_civis_per_wave = 4;
    config.waves.max_civis_per_wave = 4;
    // Long enough that no timer fires while a test runs.
    config.waves.spawn_wave_delay_ms = 60_000;
    config.game.player_respawn_delay_ms = 60_000;
    config
}

fn director_world(config: GameConfig) -> World {
    let mut world = gameplay_world();
    let prefabs = Prefabs::from_config(&config).unwrap();
    world.insert_resource(prefabs);
    world.insert_resource(config);
    world.init_resource::<StagingQueue>();
    world.init_resource::<Beacon>();
    world.init_resource::<WaveDirector>();
    world
}

fn spawner(world: &World) -> Spawner {
    world.resource::<WaveDirector>().spawner().clone()
}

// -----------------------------------------------------------------------------
// Counters
// -----------------------------------------------------------------------------

#[test]
fn alive_count_never_goes_below_zero() {
    let counters = WaveCounters::default();
    assert_eq!(counters.enemy_gone(), None);
    assert_eq!(counters.alive(), 0);

    counters.record_spawn();
    assert_eq!(counters.enemy_gone(), Some(0));
    assert_eq!(counters.enemy_gone(), None);
    assert_eq!(counters.alive(), 0);
    assert_eq!(counters.spawned_this_wave(), 1);
}

#[test]
fn beacon_remembers_the_last_sighting() {
    let beacon = PlayerBeacon::default();
    assert_eq!(beacon.position(), None);
    assert_eq!(beacon.last_known(), Vec3::ZERO);

    beacon.update(Some(Vec3::new(40.0, -10.0, 1.0)));
    beacon.update(None);

    assert_eq!(beacon.position(), None);
    assert_eq!(beacon.last_known(), Vec3::new(40.0, -10.0, 1.0));
}

// -----------------------------------------------------------------------------
// Spawner
// -----------------------------------------------------------------------------

#[test]
fn wave_pickups_are_staged_immediately() {
    let world = director_world(single_wave(5, 1));
    let staged = spawner(&world).spawn_wave_pickups(1, &mut rng());

    assert_eq!(staged, 5);
    assert_eq!(world.resource::<StagingQueue>().len(), 5);
}

#[test]
fn batch_can_overshoot_the_wave_cap() {
    let mut config = single_wave(2, 1);
    let lander = config.enemies.get_mut("EnemyPrefab_1").unwrap();
    lander.batch_size_min = 3;
    lander.batch_size_max = 3;
    let mut world = director_world(config);

    let staged = spawner(&world).spawn_batch(1, &mut rng());
    assert_eq!(staged, 3);

    let mut director = world.resource_mut::<WaveDirector>();
    assert_eq!(director.counters().spawned_this_wave(), 3);
    assert_eq!(director.counters().alive(), 3);

    assert_eq!(director.enemy_destroyed(), None);
    assert_eq!(director.enemy_destroyed(), None);
    assert_eq!(director.enemy_destroyed(), Some(2));
    assert_eq!(director.wave(), 2);
}

#[test]
fn wave_is_not_cleared_before_the_cap_is_reached() {
    let mut world = director_world(single_wave(4, 1));
    let mut director = world.resource_mut::<WaveDirector>();
    director.counters().record_spawn();

    assert_eq!(director.enemy_destroyed(), None);
    assert_eq!(director.wave(), 1);
}

#[test]
fn baiters_need_a_living_player() {
    let world = director_world(single_wave(4, 3));
    let spawner = spawner(&world);

    assert_eq!(spawner.spawn_batch(1, &mut rng()), 0);

    spawner.beacon.update(Some(Vec3::new(100.0, 0.0, 1.0)));
    assert_eq!(spawner.spawn_batch(1, &mut rng()), 1);
}

#[test]
fn missing_enemy_prefab_skips_the_batch() {
    let world = director_world(single_wave(4, 9));
    assert_eq!(spawner(&world).spawn_batch(1, &mut rng()), 0);
    assert_eq!(world.resource::<StagingQueue>().len(), 0);
}

#[test]
fn spawns_near_the_player_are_pushed_aside() {
    let player = Some(Vec3::ZERO);
    assert_eq!(
        keep_clear_of_player(Vec3::new(10.0, 0.0, 0.0), player, 200.0),
        Vec3::new(210.0, 0.0, 0.0)
    );
    assert_eq!(
        keep_clear_of_player(Vec3::new(-10.0, 5.0, 0.0), player, 200.0),
        Vec3::new(-210.0, 5.0, 0.0)
    );
    assert_eq!(
        keep_clear_of_player(Vec3::new(500.0, 0.0, 0.0), player, 200.0),
        Vec3::new(500.0, 0.0, 0.0)
    );
    assert_eq!(
        keep_clear_of_player(Vec3::new(10.0, 0.0, 0.0), None, 200.0),
        Vec3::new(10.0, 0.0, 0.0)
    );
}

#[test]
fn baiter_appears_within_its_spawn_band() {
    let movement = BaiterMovementStats {
        spawn_dist_min: 100.0,
        spawn_dist_max: 150.0,
        follow_distance: 50.0,
    };
    let player = Vec3::new(30.0, -20.0, 1.0);
    let mut rng = rng();

    for _ in 0..32 {
        let point = baiter_spawn_point(player, &movement, &mut rng);
        let gap = (point - player).abs();
        assert!((200.0..=300.0).contains(&gap.x), "{gap:?}");
        assert!((100.0..=150.0).contains(&gap.y), "{gap:?}");
        assert_eq!(point.z, player.z);
    }
}

#[test]
fn respawned_player_appears_where_it_was_last_seen() {
    let mut world = director_world(single_wave(4, 1));
    let spawner = spawner(&world);
    spawner.beacon.update(Some(Vec3::new(-75.0, 40.0, 9.0)));

    assert!(spawner.spawn_player());
    run_system_once(&mut world, merge_staged_entities);

    let transform = world
        .query_filtered::<&Transform, With<Player>>()
        .single(&world)
        .unwrap();
    assert_eq!(transform.translation.truncate(), Vec2::new(-75.0, 40.0));
}

// -----------------------------------------------------------------------------
// Wave handler
// -----------------------------------------------------------------------------

#[test]
fn last_life_lost_ends_the_game_without_a_new_wave() {
    let mut world = director_world(single_wave(4, 1));
    world.spawn((Enemy, Alive));
    world.spawn((Projectile, Alive));

    run_handler(&mut world, on_wave_event, PlayEvent::player_destroyed(0)).unwrap();

    let events = take_events(&mut world);
    assert!(events.iter().any(|e| e.kind == PlayEventKind::GameOver));
    assert_eq!(world.query::<&Alive>().iter(&world).count(), 0);

    let director = world.resource::<WaveDirector>();
    assert!(!director.batches_running());
    assert!(!director.respawn_pending());
    assert_eq!(world.resource::<StagingQueue>().len(), 0);
}

#[test]
fn losing_a_life_purges_and_restarts_the_wave() {
    let mut world = director_world(single_wave(4, 1));
    {
        let director = world.resource::<WaveDirector>();
        director.counters().record_spawn();
        director.counters().record_spawn();
    }
    world.spawn((Enemy, Alive));
    world.spawn((Enemy, Alive));
    world.spawn((Pickup, Civilian, Score(500), CaptureInfo::default(), Alive));

    run_handler(&mut world, on_wave_event, PlayEvent::player_destroyed(2)).unwrap();

    assert!(take_events(&mut world).is_empty());
    assert_eq!(world.query::<&Alive>().iter(&world).count(), 0);

    let director = world.resource::<WaveDirector>();
    assert_eq!(director.counters().alive(), 0);
    assert_eq!(director.counters().spawned_this_wave(), 0);
    assert!(director.batches_running());
    assert!(director.respawn_pending());
    // Fresh pickups for the restarted wave.
    assert_eq!(world.resource::<StagingQueue>().len(), 5);
}

#[test]
fn last_enemy_down_clears_the_wave() {
    let mut world = director_world(single_wave(1, 1));
    world.resource::<WaveDirector>().counters().record_spawn();

    run_handler(&mut world, on_wave_event, PlayEvent::enemy_destroyed(150, true)).unwrap();

    let events = take_events(&mut world);
    assert_eq!(events, vec![PlayEvent::wave_cleared(2)]);
}

#[test]
fn enemy_destroyed_with_nothing_alive_is_ignored() {
    let mut world = director_world(single_wave(0, 1));

    run_handler(&mut world, on_wave_event, PlayEvent::enemy_destroyed(0, false)).unwrap();

    assert!(take_events(&mut world).is_empty());
    assert_eq!(world.resource::<WaveDirector>().wave(), 1);
}

#[test]
fn enemy_that_rams_the_player_does_not_clear_the_wave() {
    let mut world = director_world(single_wave(3, 1));
    world.subscribe_play_events(on_wave_event);
    {
        let counters = world.resource::<WaveDirector>().counters();
        for _ in 0..3 {
            counters.record_spawn();
        }
        counters.enemy_gone();
        counters.enemy_gone();
    }

    // Collision order for a ram: the player first, then the enemy it hit.
    {
        let mut bus = world.resource_mut::<EventBus>();
        bus.publish(PlayEvent::player_destroyed(2));
        bus.publish(PlayEvent::enemy_destroyed(150, true));
    }
    crate::plugins::bus::dispatch_play_events(&mut world);

    assert!(take_events(&mut world).is_empty());
    let director = world.resource::<WaveDirector>();
    assert_eq!(director.wave(), 1);
    assert_eq!(director.counters().alive(), 0);
    assert_eq!(director.counters().spawned_this_wave(), 2);
    assert!(director.batches_running());
    // One set of pickups: four civilians and a smart bomb.
    assert_eq!(world.resource::<StagingQueue>().len(), 5);
}

#[test]
fn kills_count_normally_again_on_the_next_frame() {
    let mut world = director_world(single_wave(1, 1));
    world.resource_mut::<WaveDirector>().mark_player_down();
    run_system_once(&mut world, clear_player_down);
    assert!(!world.resource::<WaveDirector>().is_player_down());

    world.resource::<WaveDirector>().counters().record_spawn();
    run_handler(&mut world, on_wave_event, PlayEvent::enemy_destroyed(150, true)).unwrap();

    assert_eq!(take_events(&mut world), vec![PlayEvent::wave_cleared(2)]);
}

#[test]
fn cleared_wave_cashes_in_civilians_and_starts_the_next() {
    let mut world = director_world(single_wave(4, 1));
    world.resource::<WaveDirector>().counters().record_spawn();
    world.spawn((Pickup, Civilian, Score(500), CaptureInfo::default(), Alive));
    world.spawn((Pickup, SmartBomb, Alive));
    world.spawn((Projectile, Alive));
    let lander = world.spawn((Enemy, Lander, Alive)).id();

    run_handler(&mut world, on_wave_event, PlayEvent::wave_cleared(2)).unwrap();

    let events = take_events(&mut world);
    assert_eq!(events, vec![PlayEvent::civilian_destroyed(500)]);
    assert_eq!(world.query::<&Alive>().iter(&world).count(), 1);
    assert!(world.get_entity(lander).is_ok());

    let director = world.resource::<WaveDirector>();
    assert_eq!(director.wave(), 2);
    assert_eq!(director.counters().spawned_this_wave(), 0);
    assert!(director.batches_running());
}

#[test]
fn ending_a_session_stops_timers_and_resets_progress() {
    let mut world = director_world(single_wave(4, 1));
    let mut director = world.resource_mut::<WaveDirector>();
    director.begin_session();
    assert!(director.batches_running());
    director.counters().record_spawn();

    director.end_session();

    assert!(!director.batches_running());
    assert_eq!(director.wave(), 1);
    assert_eq!(director.counters().alive(), 0);
}

#[test]
fn respawn_is_no_longer_pending_once_the_player_is_staged() {
    let mut config = single_wave(4, 1);
    config.game.player_respawn_delay_ms = 1;
    let mut world = director_world(config);
    world.resource_mut::<WaveDirector>().schedule_respawn();

    let until = std::time::Instant::now() + Duration::from_secs(2);
    while world.resource::<WaveDirector>().respawn_pending()
        && std::time::Instant::now() < until
    {
        std::thread::sleep(Duration::from_millis(2));
    }
    assert!(!world.resource::<WaveDirector>().respawn_pending());
    assert_eq!(world.resource::<StagingQueue>().len(), 1);
}

#[test]
fn batch_timer_stops_itself_at_the_cap() {
    let mut config = single_wave(1, 1);
    config.waves.spawn_wave_delay_ms = 0;
    config.waves.spawn_batch_rate_ms = 1;
    let world = director_world(config);
    let timer = spawner(&world).start_batches(1).unwrap();

    let until = std::time::Instant::now() + Duration::from_secs(2);
    while !timer.is_stopped() && std::time::Instant::now() < until {
        std::thread::sleep(Duration::from_millis(2));
    }
    assert!(timer.is_stopped());
    assert!(world.resource::<WaveDirector>().counters().spawned_this_wave() >= 1);
}
