//! Lighting plugin (Firefly) (render-only).
//!
//! One warm light rides with the player. Projectiles whose prefab carries a `Glow` get their
//! own point light when they spawn; it goes away with the entity.

use bevy::prelude::*;
use bevy_firefly::prelude::*;

use crate::plugins::store::components::{Glow, Player};

const PLAYER_LIGHT_RANGE: f32 = 450.0;

#[derive(Component)]
pub struct PlayerLight;

pub fn plugin(app: &mut App) {
    if !app.is_plugin_added::<FireflyPlugin>() {
        app.add_plugins(FireflyPlugin);
    }

    app.add_systems(Startup, spawn_player_light)
        .add_systems(Update, (follow_player_light, light_glowing_entities));
}

fn spawn_player_light(mut commands: Commands) {
    commands.spawn((
        Name::new("PlayerLight"),
        PlayerLight,
        PointLight2d {
            color: Color::srgb(1.0, 0.9, 0.75),
            radius: PLAYER_LIGHT_RANGE,
            ..default()
        },
        Transform::from_xyz(0.0, 0.0, 10.0),
        Visibility::Hidden,
    ));
}

/// The light is hidden while there is no player to carry it.
fn follow_player_light(
    q_player: Query<&Transform, (With<Player>, Without<PlayerLight>)>,
    mut q_light: Query<(&mut Transform, &mut Visibility), (With<PlayerLight>, Without<Player>)>,
) {
    let Ok((mut tf_light, mut visibility)) = q_light.single_mut() else {
        return;
    };
    let Ok(tf_player) = q_player.single() else {
        visibility.set_if_neq(Visibility::Hidden);
        return;
    };

    visibility.set_if_neq(Visibility::Inherited);
    tf_light.translation.x = tf_player.translation.x;
    tf_light.translation.y = tf_player.translation.y;
}

fn light_glowing_entities(mut commands: Commands, q_glow: Query<(Entity, &Glow), Added<Glow>>) {
    for (entity, glow) in &q_glow {
        commands.entity(entity).try_insert(PointLight2d {
            color: glow.color,
            radius: glow.radius,
            ..default()
        });
    }
}
