mod common;

use bevy::prelude::*;
use galleons::common::state::GameState;
use galleons::plugins::bus::{EventBus, PlayEvent};
use galleons::plugins::core::{Subsystem, Subsystems};
use galleons::plugins::flow::{HighScores, MenuInput};
use galleons::plugins::player::PlayerInput;
use galleons::plugins::store::components::{
    Enemy, Lives, NukeDispenser, PersistentStats, Player, Score, SmartBomb,
};
use galleons::plugins::store::prefab::{ENEMY_PREFAB, PickupKind, prefab_name};
use galleons::plugins::store::{Prefabs, StagingQueue};
use galleons::plugins::waves::WaveDirector;

fn player_x(app: &mut App) -> f32 {
    app.world_mut()
        .query_filtered::<&Transform, With<Player>>()
        .single(app.world())
        .unwrap()
        .translation
        .x
}

fn count<T: Component>(app: &mut App) -> usize {
    app.world_mut()
        .query_filtered::<Entity, With<T>>()
        .iter(app.world())
        .count()
}

fn stats(app: &mut App) -> (u32, u32, u32) {
    let (lives, score, nukes) = app
        .world_mut()
        .query_filtered::<(&Lives, &Score, &NukeDispenser), With<PersistentStats>>()
        .single(app.world())
        .unwrap();
    (lives.0, score.0, nukes.bombs)
}

fn stage_smart_bomb(app: &mut App, at: Vec3) {
    let world = app.world();
    let blueprint = world
        .resource::<Prefabs>()
        .instantiate(&PickupKind::SmartBomb.prefab())
        .unwrap();
    assert!(world.resource::<StagingQueue>().sender().stage(blueprint.at(at)));
}

#[test]
fn staged_entities_appear_on_the_next_frame() {
    let mut app = common::app_headless();
    common::boot_into_play(&mut app);
    assert_eq!(count::<SmartBomb>(&mut app), 0);

    stage_smart_bomb(&mut app, Vec3::new(600.0, 100.0, 1.0));
    app.update();

    assert_eq!(count::<SmartBomb>(&mut app), 1);
}

#[test]
fn disabled_staging_holds_entities_back() {
    let mut app = common::app_headless();
    common::boot_into_play(&mut app);
    app.world_mut()
        .resource_mut::<Subsystems>()
        .set(Subsystem::Staging, false);

    stage_smart_bomb(&mut app, Vec3::new(600.0, 100.0, 1.0));
    app.update();
    assert_eq!(count::<SmartBomb>(&mut app), 0);
    assert_eq!(app.world().resource::<StagingQueue>().len(), 1);

    app.world_mut()
        .resource_mut::<Subsystems>()
        .set(Subsystem::Staging, true);
    app.update();
    assert_eq!(count::<SmartBomb>(&mut app), 1);
}

#[test]
fn pause_freezes_the_ship() {
    let mut app = common::app_headless();
    common::boot_into_play(&mut app);

    app.world_mut().insert_resource(PlayerInput {
        axis: Vec2::X,
        ..default()
    });
    for _ in 0..5 {
        app.update();
    }
    let moving = player_x(&mut app);
    assert!(moving > 0.0);

    common::press(
        &mut app,
        MenuInput {
            pause: true,
            ..default()
        },
    );
    for _ in 0..5 {
        app.update();
    }
    assert_eq!(common::state(&app), GameState::Paused);
    let paused = player_x(&mut app);
    for _ in 0..5 {
        app.update();
    }
    assert_eq!(player_x(&mut app), paused);

    common::confirm(&mut app);
    app.update();
    assert_eq!(common::state(&app), GameState::Playing);
    app.update();
    assert!(player_x(&mut app) > paused);
}

#[test]
fn ramming_the_last_enemy_of_a_wave_restarts_that_wave() {
    let mut config = common::quiet_config();
    config.waves.min_civis_per_wave = 2;
    config.waves.max_civis_per_wave = 2;
    let cap = config.waves.tuning(1).max_enemies;
    let mut app = common::app_with_config(config);
    common::boot_into_play(&mut app);

    // Everything but the last enemy of the wave is already down.
    {
        let counters = app.world().resource::<WaveDirector>().counters();
        for _ in 0..cap {
            counters.record_spawn();
        }
        for _ in 1..cap {
            counters.enemy_gone();
        }
    }
    let at = app
        .world_mut()
        .query_filtered::<&Transform, With<Player>>()
        .single(app.world())
        .unwrap()
        .translation;
    {
        let world = app.world();
        let enemy = world
            .resource::<Prefabs>()
            .instantiate(&prefab_name(ENEMY_PREFAB, 1))
            .unwrap();
        assert!(world.resource::<StagingQueue>().sender().stage(enemy.at(at)));
    }
    app.update();

    assert_eq!(count::<Player>(&mut app), 0);
    assert_eq!(count::<Enemy>(&mut app), 0);
    assert_eq!(stats(&mut app).0, 2);

    let director = app.world().resource::<WaveDirector>();
    assert_eq!(director.wave(), 1);
    assert_eq!(director.counters().alive(), 0);
    assert_eq!(director.counters().spawned_this_wave(), cap - 1);
    assert!(director.respawn_pending());
    // Only the restarted wave's civilians are waiting to merge.
    assert_eq!(app.world().resource::<StagingQueue>().len(), 2);
}

#[test]
fn losing_the_last_life_ends_the_game_and_retry_starts_fresh() {
    let mut app = common::app_headless();
    common::boot_into_play(&mut app);

    {
        let world = app.world_mut();
        let mut q = world.query_filtered::<(&mut Lives, &mut Score), With<PersistentStats>>();
        let (mut lives, mut score) = q.single_mut(world).unwrap();
        lives.0 = 0;
        score.0 = 900;

        let player = world
            .query_filtered::<Entity, With<Player>>()
            .single(world)
            .unwrap();
        world.despawn(player);
    }
    app.world_mut()
        .resource_mut::<EventBus>()
        .publish(PlayEvent::player_destroyed(0));
    app.update();
    app.update();

    assert_eq!(common::state(&app), GameState::GameOver);
    assert_eq!(count::<Player>(&mut app), 0);

    common::confirm(&mut app);
    app.update();
    assert_eq!(common::state(&app), GameState::Playing);

    assert_eq!(app.world().resource::<HighScores>().table.best(), 900);
    assert_eq!(stats(&mut app), (3, 0, 0));
    assert_eq!(app.world().resource::<WaveDirector>().wave(), 1);
    assert_eq!(count::<Player>(&mut app), 1);
}

#[test]
fn escaping_a_paused_game_returns_to_the_menu() {
    let mut app = common::app_headless();
    common::boot_into_play(&mut app);

    common::press(
        &mut app,
        MenuInput {
            pause: true,
            ..default()
        },
    );
    app.update();
    common::press(
        &mut app,
        MenuInput {
            back: true,
            ..default()
        },
    );
    app.update();

    assert_eq!(common::state(&app), GameState::MainMenu);
    assert_eq!(count::<Player>(&mut app), 0);
    assert!(!app.world().resource::<WaveDirector>().batches_running());
}
