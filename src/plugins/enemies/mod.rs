//! Enemy behaviour: bombers, baiters and landers.
//!
//! ```text
//! FrameSet::Movement
//!   steer_bombers -> drop_traps -> steer_baiters -> fire_cannons -> steer_landers -> fire_peas
//! ```
//!
//! Enemies never read each other. Everything they know about the player comes from the live
//! player entity, or, for landers, from the beacon's last sighting while the player is dead.
//! Weapons share one shape: a `Timer` cooldown ticked every frame, and a blueprint from the
//! projectile prefab fired by `Faction::Enemy`.

use std::time::Duration;

use bevy::prelude::*;
use rand::Rng;

use crate::common::config::GameConfig;
use crate::plugins::core::{FrameSet, Subsystem, subsystem_enabled};
use crate::plugins::store::Prefabs;
use crate::plugins::store::components::*;
use crate::plugins::store::prefab::ProjectileKind;
use crate::plugins::waves::Beacon;

pub fn plugin(app: &mut App) {
    app.add_systems(
        Update,
        (
            steer_bombers,
            drop_traps,
            steer_baiters,
            fire_cannons,
            steer_landers,
            fire_peas,
        )
            .chain()
            .in_set(FrameSet::Movement)
            .run_if(subsystem_enabled(Subsystem::Enemies)),
    );
}

/// Live player position and velocity.
type PlayerFix<'a> = (&'a Transform, Option<&'a Velocity>);

// -----------------------------------------------------------------------------
// Shared weapon helpers
// -----------------------------------------------------------------------------

/// Tick `cooldown` and report whether a shot is allowed now. Firing restarts it.
fn ready_to_fire(cooldown: &mut Timer, delta: Duration) -> bool {
    cooldown.tick(delta);
    cooldown.is_finished()
}

/// Transform for a shot from `from` toward `target`: turned about Z to face the target and
/// pushed `offset` along the aim.
pub fn aimed_shot(base: Transform, from: Vec3, target: Vec3, offset: f32) -> Transform {
    let delta = (target - from).truncate();
    let mut transform = base;
    transform.translation = from;
    transform.rotate_z(delta.y.atan2(delta.x));
    transform.translation += (delta.normalize_or_zero() * offset).extend(0.0);
    transform
}

// -----------------------------------------------------------------------------
// Bomber
// -----------------------------------------------------------------------------

/// Bounce off the top and bottom of the playfield and face the way we drift.
pub fn steer_bombers(
    time: Res<Time>,
    config: Res<GameConfig>,
    mut q_bombers: Query<(&mut Transform, &mut Velocity, &mut FlipInfo), With<Bomber>>,
) {
    let dt = time.delta_secs();
    let bounds = config.world_bounds();
    for (mut transform, mut velocity, mut flip) in &mut q_bombers {
        let y = transform.translation.y;
        if y <= bounds.bottom {
            velocity.0.y = velocity.0.y.abs();
        } else if y >= bounds.top {
            velocity.0.y = -velocity.0.y.abs();
        }
        flip.steer(velocity.0.x, dt, &mut transform);
    }
}

/// Leave a trap behind, drifting against the bomber's heading.
pub fn drop_traps(
    time: Res<Time>,
    prefabs: Res<Prefabs>,
    mut q_bombers: Query<(&Transform, &Velocity, &mut BomberTrap), With<Bomber>>,
    mut commands: Commands,
) {
    for (transform, velocity, mut trap) in &mut q_bombers {
        if !ready_to_fire(&mut trap.cooldown, time.delta()) {
            continue;
        }
        trap.cooldown.reset();

        let Some(blueprint) = prefabs.instantiate(&ProjectileKind::Trap.prefab()) else {
            continue;
        };
        let behind = -velocity.0.normalize_or_zero() * trap.launch_offset;
        blueprint
            .at(transform.translation + behind)
            .with_velocity(-velocity.0)
            .fired_by(Faction::Enemy)
            .spawn(&mut commands);
    }
}

// -----------------------------------------------------------------------------
// Baiter
// -----------------------------------------------------------------------------

/// Advance the dash cycle. Returns the horizontal dash speed when the dash owns this frame,
/// `None` when the baiter is free to home in on the player.
pub fn tick_boost(boost: &mut SpeedBoost, delta: Duration, rng: &mut impl Rng) -> Option<f32> {
    boost.timer.tick(delta);

    if boost.boosting {
        let dash = if boost.moving_right {
            boost.speed
        } else {
            -boost.speed
        };
        if boost.timer.is_finished() {
            boost.boosting = false;
            boost.timer.set_duration(boost.interval.roll(rng));
            boost.timer.reset();
        }
        return Some(dash);
    }

    if boost.timer.is_finished() {
        boost.boosting = true;
        boost.moving_right = rng.random_bool(0.5);
        boost.timer.set_duration(boost.duration.roll(rng));
        boost.timer.reset();
        return Some(0.0);
    }

    None
}

/// Close in on `target` by `step` when farther than `follow` away.
pub fn home_axis(position: f32, target: f32, step: f32, follow: f32) -> f32 {
    let gap = target - position;
    if gap.abs() > follow {
        position + step * gap.signum()
    } else {
        position
    }
}

/// Dash or home in. Baiters hold still while there is no player to bait.
pub fn steer_baiters(
    time: Res<Time>,
    q_player: Query<&Transform, (With<Player>, Without<Baiter>)>,
    mut q_baiters: Query<
        (
            &mut Transform,
            &Speed,
            &BaiterMovementStats,
            &mut SpeedBoost,
            &mut FlipInfo,
        ),
        With<Baiter>,
    >,
) {
    let Some(player) = q_player.iter().next().map(|t| t.translation) else {
        return;
    };
    let dt = time.delta_secs();
    let mut rng = rand::rng();

    for (mut transform, speed, movement, mut boost, mut flip) in &mut q_baiters {
        let facing = match tick_boost(&mut boost, time.delta(), &mut rng) {
            Some(dash) => {
                transform.translation.x += dash * dt;
                player.x - transform.translation.x
            }
            None => {
                let step = speed.0 * dt;
                let before = transform.translation.x;
                let position = &mut transform.translation;
                position.x = home_axis(position.x, player.x, step, movement.follow_distance);
                position.y = home_axis(position.y, player.y, step, movement.follow_distance);
                if position.x != before {
                    player.x - position.x
                } else {
                    0.0
                }
            }
        };
        flip.steer(facing, dt, &mut transform);
    }
}

/// Lead the player with a cannonball.
pub fn fire_cannons(
    time: Res<Time>,
    prefabs: Res<Prefabs>,
    q_player: Query<PlayerFix, (With<Player>, Without<Baiter>)>,
    mut q_baiters: Query<(&Transform, &mut Cannon), With<Baiter>>,
    mut commands: Commands,
) {
    let Some((player, velocity)) = q_player.iter().next() else {
        return;
    };
    let player_velocity = velocity.map_or(Vec3::ZERO, |v| v.0);

    for (transform, mut cannon) in &mut q_baiters {
        if !ready_to_fire(&mut cannon.cooldown, time.delta()) {
            continue;
        }
        cannon.cooldown.reset();

        let Some(blueprint) = prefabs.instantiate(&ProjectileKind::Cannonball.prefab()) else {
            continue;
        };
        let target = player.translation + player_velocity * cannon.aim_lead;
        let shot = aimed_shot(
            blueprint.transform,
            transform.translation,
            target,
            cannon.launch_offset,
        );
        blueprint
            .with_transform(shot)
            .fired_by(Faction::Enemy)
            .spawn(&mut commands);
    }
}

// -----------------------------------------------------------------------------
// Lander
// -----------------------------------------------------------------------------

/// Closest civilian nobody has taken yet.
pub fn nearest_free_civilian<'a>(
    from: Vec3,
    civilians: impl IntoIterator<Item = (&'a Transform, &'a CaptureInfo)>,
) -> Option<Vec3> {
    civilians
        .into_iter()
        .filter(|(_, capture)| !capture.captured)
        .map(|(transform, _)| transform.translation)
        .min_by(|a, b| {
            let da = a.truncate().distance_squared(from.truncate());
            let db = b.truncate().distance_squared(from.truncate());
            da.total_cmp(&db)
        })
}

/// Hunt civilians, carry a capture upward, and harass the player when there is nothing left.
pub fn steer_landers(
    time: Res<Time>,
    beacon: Res<Beacon>,
    q_player: Query<&Transform, (With<Player>, Without<Lander>)>,
    q_civilians: Query<(&Transform, &CaptureInfo), (With<Civilian>, Without<Lander>)>,
    mut q_landers: Query<(&mut Transform, &Speed, Has<Capturing>), With<Lander>>,
) {
    let dt = time.delta_secs();
    let player = q_player
        .iter()
        .next()
        .map_or_else(|| beacon.0.last_known(), |t| t.translation);

    for (mut transform, speed, capturing) in &mut q_landers {
        let step = speed.0 * dt;
        if capturing {
            transform.translation.y += step;
            continue;
        }

        match nearest_free_civilian(transform.translation, &q_civilians) {
            Some(civilian) => {
                let toward = (civilian - transform.translation).truncate().normalize_or_zero();
                transform.translation += (toward * step).extend(0.0);
            }
            None => {
                let dir = if player.x < transform.translation.x {
                    -1.0
                } else {
                    1.0
                };
                transform.translation.x += dir * step;
            }
        }
    }
}

/// Shoot peas straight at a player within range.
pub fn fire_peas(
    time: Res<Time>,
    prefabs: Res<Prefabs>,
    q_player: Query<&Transform, (With<Player>, Without<Lander>)>,
    mut q_landers: Query<(&Transform, &mut PeaShooter), With<Lander>>,
    mut commands: Commands,
) {
    let player = q_player.iter().next().map(|t| t.translation);

    for (transform, mut pea) in &mut q_landers {
        let cooled = ready_to_fire(&mut pea.cooldown, time.delta());
        let Some(player) = player else {
            continue;
        };
        let in_range = transform.translation.truncate().distance(player.truncate()) < pea.range;
        if !cooled || !in_range {
            continue;
        }
        pea.cooldown.reset();

        let Some(blueprint) = prefabs.instantiate(&ProjectileKind::Pea.prefab()) else {
            continue;
        };
        let shot = aimed_shot(blueprint.transform, transform.translation, player, pea.offset);
        blueprint
            .with_transform(shot)
            .fired_by(Faction::Enemy)
            .spawn(&mut commands);
    }
}
