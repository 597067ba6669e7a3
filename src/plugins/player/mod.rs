//! Player plugin.
//!
//! Pipeline:
//! - Startup: spawn the `PersistentStats` singleton (score, lives, bombs)
//! - FrameSet::Input: sample keyboard and gamepad into the `PlayerInput` resource (windowed
//!   apps only, headless tests write `PlayerInput` directly)
//! - FrameSet::Movement: steer, fire the lazer on release, detonate smart bombs on release
//! - Bus: credit score, track bombs, turn haptic events into gamepad rumble
//!
//! API note (Bevy >= 0.18):
//! - Prefer the `Single` SystemParam (and `Option<Single<...>>`) for single-entity access.
//!   `Single` fails validation if 0 or >1 entities match, and `Option<Single>` lets you
//!   explicitly handle the "missing" case without panics.

use std::f32::consts::PI;

use bevy::ecs::message::Messages;
use bevy::input::gamepad::{GamepadRumbleIntensity, GamepadRumbleRequest};
use bevy::prelude::*;

use crate::common::config::GameConfig;
use crate::common::state::GameState;
use crate::plugins::bus::{
    Directive, EventBus, HandlerResult, HapticKind, PlayEvent, PlayEventKind, PlayEventsExt,
};
use crate::plugins::core::{FrameSet, Subsystem, subsystem_enabled};
use crate::plugins::store::components::*;
use crate::plugins::store::prefab::{Archetype, PLAYER_PREFAB, ProjectileKind, prefab_name};
use crate::plugins::store::{Destroyer, Prefabs};

/// Stick deflection below this is treated as centred.
const STICK_DEAD_ZONE: f32 = 0.2;

#[derive(Resource, Default, Debug, Clone, Copy, PartialEq)]
pub struct PlayerInput {
    pub axis: Vec2,
    pub fire: bool,
    pub bomb: bool,
}

pub fn plugin(app: &mut App) {
    app.init_resource::<PlayerInput>()
        .add_systems(Startup, spawn_persistent_stats)
        .add_systems(
            Update,
            gather_player_input
                .in_set(FrameSet::Input)
                .run_if(in_state(GameState::Playing))
                .run_if(resource_exists::<ButtonInput<KeyCode>>)
                .run_if(subsystem_enabled(Subsystem::Player)),
        )
        .add_systems(
            Update,
            (steer_player, fire_lazer, detonate_smart_bomb)
                .chain()
                .in_set(FrameSet::Movement)
                .run_if(subsystem_enabled(Subsystem::Player)),
        );
    app.subscribe_play_events(on_player_event);
}

/// Persistent stats as a fresh session starts them.
pub fn fresh_stats(config: &GameConfig) -> (Lives, Score, NukeDispenser) {
    (
        Lives(config.starting_lives()),
        Score(0),
        NukeDispenser {
            bombs: 0,
            range: config.nuke_dispenser.range,
            max_capacity: config.nuke_dispenser.max_capacity,
        },
    )
}

pub fn spawn_persistent_stats(mut commands: Commands, config: Res<GameConfig>) {
    commands.spawn((Name::new("PersistentStats"), PersistentStats, fresh_stats(&config)));
}

pub fn gather_player_input(
    keys: Res<ButtonInput<KeyCode>>,
    gamepads: Query<&Gamepad>,
    mut input: ResMut<PlayerInput>,
) {
    let mut axis = Vec2::ZERO;
    let mut fire = false;
    let mut bomb = false;

    if keys.any_pressed([KeyCode::ArrowUp, KeyCode::KeyW]) {
        axis.y += 1.0;
    }
    if keys.any_pressed([KeyCode::ArrowDown, KeyCode::KeyS]) {
        axis.y -= 1.0;
    }
    if keys.any_pressed([KeyCode::ArrowLeft, KeyCode::KeyA]) {
        axis.x -= 1.0;
    }
    if keys.any_pressed([KeyCode::ArrowRight, KeyCode::KeyD]) {
        axis.x += 1.0;
    }
    fire |= keys.pressed(KeyCode::Space);
    bomb |= keys.pressed(KeyCode::KeyB);

    // Controller 0 only.
    if let Some(gamepad) = gamepads.iter().next() {
        let stick = gamepad.left_stick();
        if stick.length() > STICK_DEAD_ZONE {
            axis += stick;
        }
        fire |= gamepad.pressed(GamepadButton::RightTrigger2);
        bomb |= gamepad.pressed(GamepadButton::LeftTrigger2);
    }

    *input = PlayerInput {
        axis: axis.clamp(Vec2::NEG_ONE, Vec2::ONE),
        fire,
        bomb,
    };
}

/// -1, 0 or 1.
fn sign(x: f32) -> f32 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Acceleration along one axis: `accel` when pushing the way we already move, `flip_accel`
/// when reversing, and drag proportional to velocity with no input.
pub fn axis_acceleration(input: f32, velocity: f32, accel: f32, flip_accel: f32, decel: f32) -> f32 {
    if input == 0.0 {
        -velocity * decel
    } else if sign(input) == sign(velocity) {
        input * accel
    } else {
        input * flip_accel
    }
}

pub fn steer_player(
    time: Res<Time>,
    input: Res<PlayerInput>,
    mut q_player: Query<
        (
            &mut Transform,
            &mut Acceleration,
            &mut Velocity,
            &PlayerMoveInfo,
            &mut FlipInfo,
        ),
        With<Player>,
    >,
) {
    let dt = time.delta_secs();
    for (mut transform, mut acceleration, mut velocity, info, mut flip) in &mut q_player {
        let v = velocity.0;
        acceleration.0.x =
            axis_acceleration(input.axis.x, v.x, info.h_accel, info.h_flip_accel, info.h_decel);
        acceleration.0.y =
            axis_acceleration(input.axis.y, v.y, info.v_accel, info.v_flip_accel, info.v_decel);

        velocity.0.x = v.x.clamp(-info.h_max_speed, info.h_max_speed);
        velocity.0.y = v.y.clamp(-info.v_max_speed, info.v_max_speed);

        flip.steer(input.axis.x, dt, &mut transform);
    }
}

/// Where a player shot starts: at the ship, turned to its facing, pushed out by `offset`.
pub fn orient_projectile(base: Transform, at: Vec3, facing_right: bool, offset: f32) -> Transform {
    let mut transform = base;
    transform.translation = at;
    if !facing_right {
        transform.rotate_y(PI);
    }
    let forward = transform.rotation * Vec3::X;
    transform.translation += forward * offset;
    transform
}

pub fn fire_lazer(
    time: Res<Time>,
    input: Res<PlayerInput>,
    prefabs: Res<Prefabs>,
    mut q_player: Query<
        (
            Entity,
            &Transform,
            &FlipInfo,
            &ControllerId,
            &mut ChargeInfo,
            Has<Charging>,
        ),
        With<Player>,
    >,
    mut commands: Commands,
    mut bus: ResMut<EventBus>,
) {
    for (entity, transform, flip, controller, mut charge, charging) in &mut q_player {
        if input.fire {
            if charging {
                charge.held.tick(time.delta());
            } else {
                charge.held.reset();
                commands.entity(entity).insert(Charging);
            }
            continue;
        }
        if !charging {
            continue;
        }

        commands.entity(entity).remove::<Charging>();
        if charge.is_full() {
            debug!("lazer released at full charge");
        }

        let Some(blueprint) = prefabs.instantiate(&ProjectileKind::Lazer.prefab()) else {
            continue;
        };
        let offset = blueprint.prefab.projectile().map_or(0.0, |p| p.offset);
        let shot = orient_projectile(
            blueprint.transform,
            transform.translation,
            flip.facing_right,
            offset,
        );
        blueprint
            .with_transform(shot)
            .fired_by(Faction::Player)
            .spawn(&mut commands);
        bus.publish(PlayEvent::haptics(HapticKind::FireLazer, controller.0));
    }
}

pub fn detonate_smart_bomb(
    input: Res<PlayerInput>,
    q_player: Query<(Entity, &Transform, &ControllerId, Has<ChargingSmartBomb>), With<Player>>,
    q_stats: Query<&NukeDispenser, With<PersistentStats>>,
    q_enemies: Query<(Entity, &Transform, &Score), With<Enemy>>,
    q_projectiles: Query<(Entity, &Transform), With<Projectile>>,
    mut destroyer: Destroyer,
    mut bus: ResMut<EventBus>,
) {
    let Ok(nukes) = q_stats.single() else {
        return;
    };

    for (player, transform, controller, armed) in &q_player {
        if input.bomb {
            if !armed && nukes.bombs > 0 {
                destroyer.commands().entity(player).insert(ChargingSmartBomb);
            }
            continue;
        }
        if !armed {
            continue;
        }

        destroyer.commands().entity(player).remove::<ChargingSmartBomb>();
        let center = transform.translation.truncate();
        let in_range = |t: &Transform| t.translation.truncate().distance(center) < nukes.range;

        for (enemy, t, score) in &q_enemies {
            if in_range(t) && destroyer.destroy(enemy) {
                bus.publish(PlayEvent::enemy_destroyed(score.0, true));
            }
        }
        for (projectile, t) in &q_projectiles {
            if in_range(t) {
                destroyer.destroy(projectile);
            }
        }

        info!("smart bomb detonated");
        bus.publish(PlayEvent::new(
            PlayEventKind::SmartBombActivated,
            nukes.bombs.saturating_sub(1),
        ));
        bus.publish(PlayEvent::haptics(HapticKind::Detonate, controller.0));
    }
}

/// Rumble split across the two motors. `pan` 0 is all strong motor, 1 all weak motor.
pub fn rumble_request(gamepad: Entity, rumble: &Rumble) -> GamepadRumbleRequest {
    GamepadRumbleRequest::Add {
        gamepad,
        duration: rumble.duration,
        intensity: GamepadRumbleIntensity {
            strong_motor: rumble.strength * (1.0 - rumble.pan),
            weak_motor: rumble.strength * rumble.pan,
        },
    }
}

pub fn on_player_event(
    In(event): In<PlayEvent>,
    mut q_stats: Query<(&mut Score, &mut NukeDispenser), With<PersistentStats>>,
    prefabs: Res<Prefabs>,
    gamepads: Query<Entity, With<Gamepad>>,
    rumble: Option<ResMut<Messages<GamepadRumbleRequest>>>,
    mut bus: ResMut<EventBus>,
) -> HandlerResult {
    match event.kind {
        PlayEventKind::EnemyDestroyed | PlayEventKind::CivilianDestroyed => {
            let award = event.kind == PlayEventKind::CivilianDestroyed || event.score_approved();
            if !award {
                return Ok(());
            }
            let Ok((mut score, _)) = q_stats.single_mut() else {
                return Ok(());
            };
            score.0 = score.0.saturating_add(event.value);
            bus.publish(PlayEvent::new(PlayEventKind::UpdateScore, score.0));
        }
        PlayEventKind::SmartBombActivated => {
            if let Ok((_, mut nukes)) = q_stats.single_mut() {
                nukes.bombs = event.value;
            }
        }
        PlayEventKind::PlayerDestroyed => {
            bus.publish(PlayEvent::haptics(HapticKind::PlayerDeath, 0));
        }
        PlayEventKind::HapticsActivated => {
            let Some(mut rumble) = rumble else {
                return Ok(());
            };
            let Some(kind) = HapticKind::from_value(event.value) else {
                return Err(format!("unknown haptic type {}", event.value).into());
            };
            let controller = match event.directive {
                Some(Directive::Controller(index)) => index,
                _ => 0,
            };
            let Some(gamepad) = gamepads.iter().nth(controller as usize) else {
                return Ok(());
            };
            let Some(Archetype::Player(player)) = prefabs
                .lookup(&prefab_name(PLAYER_PREFAB, 1))
                .map(|p| &p.archetype)
            else {
                return Ok(());
            };
            let table = &player.haptics;
            let pattern = match kind {
                HapticKind::FireLazer => &table.fire_lazer,
                HapticKind::PlayerDeath => &table.player_death,
                HapticKind::Detonate => &table.detonate,
            };
            rumble.write(rumble_request(gamepad, pattern));
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests;
