//! World plugin: the playfield's top and bottom edges.
//!
//! The field wraps horizontally around the player, so the edges are strips one wrap window
//! wide that slide along with the player instead of fixed walls.

use bevy::prelude::*;

use crate::common::config::GameConfig;
use crate::plugins::core::FrameSet;
use crate::plugins::store::components::Player;

const EDGE_THICKNESS: f32 = 6.0;
const EDGE_DEPTH: f32 = -1.0;

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    Top,
    Bottom,
}

pub fn plugin(app: &mut App) {
    app.add_systems(Startup, spawn_boundaries)
        .add_systems(Update, slide_boundaries.after(FrameSet::Physics));
}

fn spawn_boundaries(mut commands: Commands, config: Res<GameConfig>) {
    let bounds = config.world_bounds();
    let size = Vec2::new(bounds.width * 2.0, EDGE_THICKNESS);
    let color = Color::srgb(0.25, 0.27, 0.33);

    for (boundary, y) in [
        (Boundary::Top, bounds.top + EDGE_THICKNESS * 0.5),
        (Boundary::Bottom, bounds.bottom - EDGE_THICKNESS * 0.5),
    ] {
        commands.spawn((
            Name::new(format!("{boundary:?}Boundary")),
            boundary,
            Sprite::from_color(color, size),
            Transform::from_xyz(0.0, y, EDGE_DEPTH),
        ));
    }
}

fn slide_boundaries(
    q_player: Query<&Transform, (With<Player>, Without<Boundary>)>,
    mut q_edges: Query<&mut Transform, With<Boundary>>,
) {
    let Ok(player) = q_player.single() else {
        return;
    };
    for mut edge in &mut q_edges {
        edge.translation.x = player.translation.x;
    }
}

#[cfg(test)]
mod tests;
