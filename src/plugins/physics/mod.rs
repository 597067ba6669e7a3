//! Kinematics, world limits and the collision pass.
//!
//! ```text
//! FrameSet::Physics    accelerate -> integrate -> cull -> world bounds -> box sync -> beacon
//! FrameSet::Collision  resolve_collisions
//! ```

pub mod collision;
pub mod obb;

use bevy::prelude::*;

use crate::common::config::GameConfig;
use crate::plugins::bus::{EventBus, PlayEvent};
use crate::plugins::core::{FrameSet, Subsystem, subsystem_enabled};
use crate::plugins::store::Destroyer;
use crate::plugins::store::components::*;
use crate::plugins::waves::Beacon;

use obb::BoundBox;

/// How far past the top boundary an enemy may fly before it is culled.
const ENEMY_TOP_MARGIN: f32 = 10.0;
/// How far past the top boundary a pickup may rise before it is culled.
const PICKUP_TOP_MARGIN: f32 = 5.0;

pub fn plugin(app: &mut App) {
    app.init_resource::<Beacon>()
        .add_systems(
            Update,
            (
                accelerate,
                integrate,
                cull_out_of_bounds,
                enforce_world_bounds,
                sync_bound_boxes,
                track_player,
            )
                .chain()
                .in_set(FrameSet::Physics)
                .run_if(subsystem_enabled(Subsystem::Physics)),
        )
        .add_systems(
            Update,
            collision::resolve_collisions
                .in_set(FrameSet::Collision)
                .run_if(subsystem_enabled(Subsystem::Collision)),
        );
}

pub fn accelerate(time: Res<Time>, mut q: Query<(&Acceleration, &mut Velocity)>) {
    let dt = time.delta_secs();
    for (acceleration, mut velocity) in &mut q {
        velocity.0 += acceleration.0 * dt;
    }
}

pub fn integrate(time: Res<Time>, mut q: Query<(&Velocity, &mut Transform)>) {
    let dt = time.delta_secs();
    for (velocity, mut transform) in &mut q {
        transform.translation += velocity.0 * dt;
    }
}

/// Player position for this frame, or where it was last seen.
fn player_position(player: Option<&Transform>, beacon: &Beacon) -> Vec3 {
    player.map_or_else(|| beacon.0.last_known(), |t| t.translation)
}

/// Nothing is culled while the player is down; it resumes once the respawn merges.
pub fn cull_out_of_bounds(
    config: Res<GameConfig>,
    q_player: Query<&Transform, With<Player>>,
    q_projectiles: Query<(Entity, &Transform), With<Projectile>>,
    q_enemies: Query<(Entity, &Transform), With<Enemy>>,
    q_pickups: Query<(Entity, &Transform), With<Pickup>>,
    mut destroyer: Destroyer,
    mut bus: ResMut<EventBus>,
) {
    let Some(player) = q_player.iter().next().map(|t| t.translation) else {
        return;
    };
    let top = config.game.world_top_boundary;
    let cull_dist = config.game.projectile_cull_dist;

    for (entity, transform) in &q_projectiles {
        if transform.translation.truncate().distance(player.truncate()) > cull_dist {
            destroyer.destroy(entity);
        }
    }

    for (entity, transform) in &q_enemies {
        if transform.translation.y > top + ENEMY_TOP_MARGIN && destroyer.destroy(entity) {
            bus.publish(PlayEvent::enemy_destroyed(0, false));
        }
    }

    for (entity, transform) in &q_pickups {
        if transform.translation.y > top + PICKUP_TOP_MARGIN {
            destroyer.destroy(entity);
        }
    }
}

/// Keep `x` within `width` of `center`, re-entering from the opposite side.
pub fn wrap_around(x: f32, center: f32, width: f32) -> f32 {
    if x < center - width {
        center + width
    } else if x > center + width {
        center - width
    } else {
        x
    }
}

pub fn enforce_world_bounds(
    config: Res<GameConfig>,
    beacon: Res<Beacon>,
    mut q_player: Query<&mut Transform, With<Player>>,
    mut q_wrapped: Query<&mut Transform, (Or<(With<Enemy>, With<Pickup>)>, Without<Player>)>,
) {
    let bounds = config.world_bounds();

    for mut transform in &mut q_player {
        transform.translation.y = transform.translation.y.clamp(bounds.bottom, bounds.top);
    }

    let player = player_position(q_player.iter().next(), &beacon);
    for mut transform in &mut q_wrapped {
        let translation = &mut transform.translation;
        translation.y = translation.y.max(bounds.bottom);
        translation.x = wrap_around(translation.x, player.x, bounds.width);
    }
}

pub fn sync_bound_boxes(mut q: Query<(&Transform, &mut BoundBox), With<Collidable>>) {
    for (transform, mut bounds) in &mut q {
        bounds.sync(transform);
    }
}

pub fn track_player(beacon: Res<Beacon>, q_player: Query<&Transform, With<Player>>) {
    beacon.0.update(q_player.iter().next().map(|t| t.translation));
}
