//! Game flow: screens, sessions, high scores.
//!
//! ```text
//! Splash[0..n] ─confirm/timeout─▶ Title ─confirm/timeout─▶ MainMenu ─confirm─▶ Playing
//!                                                          │  ▲                 │  ▲
//!                                                        C │  │ Esc       pause │  │ confirm/pause
//!                                                          ▼  │                 ▼  │
//!                                                         Credits               Paused ─Esc─▶ MainMenu
//!
//! GameOver event ─▶ GameOver ─confirm─▶ stop + start ─▶ Playing
//!                            └─Esc────▶ stop ─▶ MainMenu
//! ```
//!
//! Starting and stopping a session touch most of the world, so they run as queued commands
//! with exclusive access. Every screen change except a pause toggle publishes `StateChanged`
//! so the renderer can fade in.

pub mod highscores;

use std::time::Duration;

use bevy::prelude::*;

use crate::common::config::GameConfig;
use crate::common::state::GameState;
use crate::plugins::bus::{EventBus, HandlerResult, PlayEvent, PlayEventKind, PlayEventsExt};
use crate::plugins::core::FrameSet;
use crate::plugins::player::{PlayerInput, fresh_stats};
use crate::plugins::store::components::{Alive, Lives, NukeDispenser, PersistentStats, Score};
use crate::plugins::store::{Doomed, StagingQueue};
use crate::plugins::ui::HudStats;
use crate::plugins::waves::{Beacon, WaveDirector};

pub use highscores::{HighScoreTable, HighScores};

/// Menu buttons pressed this frame. Consumed by `advance_flow`.
#[derive(Resource, Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuInput {
    pub confirm: bool,
    pub back: bool,
    pub pause: bool,
    pub credits: bool,
}

/// The splash screens in order, then the title, each held for the same time.
#[derive(Resource, Debug, Clone)]
pub struct SplashSequence {
    screens: Vec<String>,
    index: usize,
    timer: Timer,
}

impl SplashSequence {
    pub fn new(screens: Vec<String>, hold: Duration) -> Self {
        Self {
            screens,
            index: 0,
            timer: Timer::new(hold, TimerMode::Once),
        }
    }

    /// The splash screen showing, `None` once they have all been shown.
    pub fn current(&self) -> Option<&str> {
        self.screens.get(self.index).map(String::as_str)
    }

    /// Returns `true` when the current screen has been up long enough.
    pub fn tick(&mut self, delta: Duration) -> bool {
        self.timer.tick(delta).is_finished()
    }

    /// Show the next screen. Returns `false` when there is none left.
    pub fn advance(&mut self) -> bool {
        self.index = (self.index + 1).min(self.screens.len());
        self.timer.reset();
        self.current().is_some()
    }
}

impl FromWorld for SplashSequence {
    fn from_world(world: &mut World) -> Self {
        let config = world.get_resource_or_init::<GameConfig>();
        Self::new(
            config.game.splash_screens.clone(),
            Duration::from_millis(config.game.splash_screen_ms),
        )
    }
}

pub fn plugin(app: &mut App) {
    app.init_resource::<MenuInput>()
        .init_resource::<SplashSequence>()
        .init_resource::<HighScores>()
        .add_systems(
            Update,
            (
                gather_menu_input.run_if(resource_exists::<ButtonInput<KeyCode>>),
                advance_flow,
            )
                .chain()
                .in_set(FrameSet::Input),
        );
    app.subscribe_play_events(on_flow_event);
}

pub fn gather_menu_input(
    keys: Res<ButtonInput<KeyCode>>,
    gamepads: Query<&Gamepad>,
    mut input: ResMut<MenuInput>,
) {
    let mut pressed = MenuInput {
        confirm: keys.just_pressed(KeyCode::Enter),
        back: keys.just_pressed(KeyCode::Escape),
        pause: keys.just_pressed(KeyCode::KeyP),
        credits: keys.just_pressed(KeyCode::KeyC),
    };

    if let Some(gamepad) = gamepads.iter().next() {
        pressed.confirm |= gamepad.just_pressed(GamepadButton::South);
        pressed.back |= gamepad.just_pressed(GamepadButton::East);
        pressed.pause |= gamepad.just_pressed(GamepadButton::Start);
        pressed.credits |= gamepad.just_pressed(GamepadButton::Select);
    }

    *input = pressed;
}

/// Screen a confirm or timeout on `state` leads to, with the session work it needs.
pub fn advance_flow(
    time: Res<Time>,
    state: Res<State<GameState>>,
    mut next: ResMut<NextState<GameState>>,
    mut input: ResMut<MenuInput>,
    mut splash: ResMut<SplashSequence>,
    director: Res<WaveDirector>,
    mut bus: ResMut<EventBus>,
    mut commands: Commands,
) {
    let pressed = std::mem::take(&mut *input);
    let current = *state.get();

    let target = match current {
        GameState::Splash => {
            if splash.current().is_none() {
                Some(GameState::Title)
            } else if pressed.confirm || splash.tick(time.delta()) {
                if splash.advance() {
                    debug!("splash screen {:?}", splash.current());
                    bus.publish(PlayEvent::new(PlayEventKind::StateChanged, 0));
                    None
                } else {
                    Some(GameState::Title)
                }
            } else {
                None
            }
        }
        GameState::Title => {
            (pressed.confirm || splash.tick(time.delta())).then_some(GameState::MainMenu)
        }
        GameState::MainMenu => {
            if pressed.confirm {
                commands.queue(start_gameplay);
                Some(GameState::Playing)
            } else if pressed.credits {
                Some(GameState::Credits)
            } else {
                None
            }
        }
        GameState::Playing => pressed.pause.then(|| {
            director.pause();
            GameState::Paused
        }),
        GameState::Paused => {
            if pressed.confirm || pressed.pause {
                director.resume();
                Some(GameState::Playing)
            } else if pressed.back {
                commands.queue(stop_gameplay);
                Some(GameState::MainMenu)
            } else {
                None
            }
        }
        GameState::GameOver => {
            if pressed.confirm {
                commands.queue(stop_gameplay);
                commands.queue(start_gameplay);
                Some(GameState::Playing)
            } else if pressed.back {
                commands.queue(stop_gameplay);
                Some(GameState::MainMenu)
            } else {
                None
            }
        }
        GameState::Credits => pressed.back.then_some(GameState::MainMenu),
    };

    let Some(target) = target else {
        return;
    };
    info!("{current:?} -> {target:?}");
    let pause_toggle = matches!(
        (current, target),
        (GameState::Playing, GameState::Paused) | (GameState::Paused, GameState::Playing)
    );
    if !pause_toggle {
        // Queued behind any session change, which clears the bus.
        commands.queue(announce_screen_change);
    }
    next.set(target);
}

fn announce_screen_change(world: &mut World) {
    if let Some(mut bus) = world.get_resource_mut::<EventBus>() {
        bus.publish(PlayEvent::new(PlayEventKind::StateChanged, 0));
    }
}

/// Begin a session: fresh HUD, wave 1, a player staged at the origin.
pub fn start_gameplay(world: &mut World) {
    if let Some(config) = world.get_resource::<GameConfig>() {
        let hud = HudStats::fresh(config);
        world.insert_resource(hud);
    }
    if let Some(mut director) = world.get_resource_mut::<WaveDirector>() {
        director.begin_session();
    }
    info!("session started");
}

/// End a session: stop the timers, drop everything staged or alive, record the score and
/// reset the persistent stats.
pub fn stop_gameplay(world: &mut World) {
    if let Some(mut director) = world.get_resource_mut::<WaveDirector>() {
        director.end_session();
    }
    if let Some(staging) = world.get_resource::<StagingQueue>() {
        staging.begin_epoch();
    }
    if let Some(beacon) = world.get_resource::<Beacon>() {
        beacon.0.reset();
    }

    let config = world.get_resource_or_init::<GameConfig>().clone();
    let mut final_score = 0;
    let mut q_stats = world
        .query_filtered::<(&mut Lives, &mut Score, &mut NukeDispenser), With<PersistentStats>>();
    for (mut lives, mut score, mut nukes) in q_stats.iter_mut(world) {
        final_score = final_score.max(score.0);
        let (fresh_lives, fresh_score, fresh_nukes) = fresh_stats(&config);
        *lives = fresh_lives;
        *score = fresh_score;
        *nukes = fresh_nukes;
    }
    if let Some(mut scores) = world.get_resource_mut::<HighScores>() {
        scores.submit(final_score);
    }

    let alive: Vec<Entity> = world
        .query_filtered::<Entity, With<Alive>>()
        .iter(world)
        .collect();
    let despawned = alive.len();
    for entity in alive {
        world.despawn(entity);
    }

    if let Some(mut doomed) = world.get_resource_mut::<Doomed>() {
        doomed.clear();
    }
    if let Some(mut bus) = world.get_resource_mut::<EventBus>() {
        bus.clear();
    }
    if let Some(mut input) = world.get_resource_mut::<PlayerInput>() {
        *input = PlayerInput::default();
    }
    world.insert_resource(HudStats::fresh(&config));
    info!("session ended with score {final_score}, despawned {despawned} entities");
}

pub fn on_flow_event(
    In(event): In<PlayEvent>,
    director: Res<WaveDirector>,
    mut next: ResMut<NextState<GameState>>,
    mut bus: ResMut<EventBus>,
) -> HandlerResult {
    if event.kind == PlayEventKind::GameOver {
        director.pause();
        next.set(GameState::GameOver);
        bus.publish(PlayEvent::new(PlayEventKind::StateChanged, 0));
    }
    Ok(())
}
