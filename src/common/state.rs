//! Global state machine.
//!
//! Screens run in this order: splash screens, title, main menu, then play. Play can move to
//! pause or game over. Credits are reachable from the main menu.

use bevy::prelude::*;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, States, Default)]
pub enum GameState {
    #[default]
    Splash,
    Title,
    MainMenu,
    Playing,
    Paused,
    GameOver,
    Credits,
}
