//! Render-only HUD: stats line, screen label, fade overlay.

use bevy::prelude::*;

use super::{HudStats, ScreenFade};
use crate::common::state::GameState;
use crate::plugins::flow::SplashSequence;

#[derive(Component)]
struct StatsText;

#[derive(Component)]
struct ScreenLabel;

#[derive(Component)]
struct FadeOverlay;

pub fn plugin(app: &mut App) {
    app.add_systems(Startup, spawn_hud).add_systems(
        Update,
        (
            update_stats_text.run_if(resource_changed::<HudStats>),
            update_screen_label,
            update_fade_overlay.run_if(resource_changed::<ScreenFade>),
        ),
    );
}

fn spawn_hud(mut commands: Commands) {
    commands.spawn((
        Name::new("HudStats"),
        StatsText,
        Text::new(""),
        TextFont {
            font_size: 20.0,
            ..default()
        },
        TextColor(Color::WHITE),
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(12.0),
            left: Val::Px(12.0),
            ..default()
        },
    ));

    commands.spawn((
        Name::new("ScreenLabel"),
        ScreenLabel,
        Text::new(""),
        TextFont {
            font_size: 40.0,
            ..default()
        },
        TextColor(Color::WHITE),
        Node {
            position_type: PositionType::Absolute,
            top: Val::Percent(40.0),
            width: Val::Percent(100.0),
            justify_content: JustifyContent::Center,
            ..default()
        },
        TextLayout::new_with_justify(Justify::Center),
    ));

    commands.spawn((
        Name::new("FadeOverlay"),
        FadeOverlay,
        Node {
            position_type: PositionType::Absolute,
            width: Val::Percent(100.0),
            height: Val::Percent(100.0),
            ..default()
        },
        BackgroundColor(Color::BLACK),
        GlobalZIndex(i32::MAX),
    ));
}

fn update_stats_text(hud: Res<HudStats>, mut q_text: Query<&mut Text, With<StatsText>>) {
    for mut text in &mut q_text {
        text.0 = format!(
            "SCORE {:>8}   LIVES {}   BOMBS {}   WAVE {}",
            hud.score, hud.lives, hud.bombs, hud.wave
        );
    }
}

fn screen_label(state: GameState, splash: &SplashSequence) -> String {
    match state {
        GameState::Splash => splash.current().unwrap_or_default().to_string(),
        GameState::Title => "GALLEONS OF THE GALAXY".into(),
        GameState::MainMenu => "PRESS ENTER TO PLAY\nC FOR CREDITS".into(),
        GameState::Playing => String::new(),
        GameState::Paused => "PAUSED".into(),
        GameState::GameOver => "GAME OVER\nENTER TO RETRY, ESC FOR MENU".into(),
        GameState::Credits => "CREDITS\nESC TO RETURN".into(),
    }
}

fn update_screen_label(
    state: Res<State<GameState>>,
    splash: Res<SplashSequence>,
    mut q_label: Query<&mut Text, With<ScreenLabel>>,
) {
    if !state.is_changed() && !splash.is_changed() {
        return;
    }
    let label = screen_label(*state.get(), &splash);
    for mut text in &mut q_label {
        if text.0 != label {
            text.0.clone_from(&label);
        }
    }
}

fn update_fade_overlay(
    fade: Res<ScreenFade>,
    mut q_overlay: Query<&mut BackgroundColor, With<FadeOverlay>>,
) {
    for mut background in &mut q_overlay {
        background.0 = Color::BLACK.with_alpha(1.0 - fade.alpha);
    }
}
