//! Play event bus.
//!
//! Gameplay subsystems talk through small tagged payloads instead of reaching into each
//! other's data: collision says "enemy died", the wave director and the score keeper each
//! decide what that means.
//!
//! ```text
//!   any system ──publish──▶ EventBus.pending ──▶ dispatch_play_events (FrameSet::Dispatch)
//!                                                   │ for each event, for each handler
//!                                                   ▼ (registration order)
//!                                     world.run_system_with(handler, event)
//!                                                   │ handlers may publish again
//!                                                   ▼
//!                                      next round, up to MAX_DISPATCH_ROUNDS
//! ```
//!
//! Handlers are one-shot systems registered in the `World`. They take `In<PlayEvent>` and return
//! `HandlerResult`. A failing handler is logged and the remaining handlers still see the event.
//! Handlers must not assume the event that triggered them is still on the call stack: nested
//! publishes are delivered in a later round of the same dispatch, not inline.

use std::collections::VecDeque;

use bevy::ecs::error::BevyError;
use bevy::ecs::system::SystemId;
use bevy::prelude::*;

use crate::plugins::core::FrameSet;

/// Rounds of nested publishes delivered per frame before the rest is deferred.
pub const MAX_DISPATCH_ROUNDS: usize = 8;

pub type HandlerResult = Result<(), BevyError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayEventKind {
    /// value: lives remaining after the decrement.
    PlayerDestroyed,
    /// value: score awarded (0 for an out-of-bounds cull).
    EnemyDestroyed,
    /// value: score awarded.
    CivilianDestroyed,
    /// value: the new wave number.
    WaveCleared,
    /// value: lives remaining.
    PlayerRespawned,
    /// value: the new total score.
    UpdateScore,
    /// value: remaining bomb count.
    SmartBombActivated,
    /// value: remaining bomb count.
    SmartBombGrabbed,
    /// value: `HapticKind` as u32. directive: controller index.
    HapticsActivated,
    GameOver,
    /// value: fade-in alpha seed.
    StateChanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// The score carried by an `EnemyDestroyed` should be credited to the player.
    UpdateScoreOk,
    Controller(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum HapticKind {
    FireLazer = 1,
    PlayerDeath = 2,
    Detonate = 3,
}

impl HapticKind {
    pub fn from_value(value: u32) -> Option<Self> {
        match value {
            1 => Some(Self::FireLazer),
            2 => Some(Self::PlayerDeath),
            3 => Some(Self::Detonate),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayEvent {
    pub kind: PlayEventKind,
    pub value: u32,
    pub directive: Option<Directive>,
}

impl PlayEvent {
    pub fn new(kind: PlayEventKind, value: u32) -> Self {
        Self {
            kind,
            value,
            directive: None,
        }
    }

    pub fn with_directive(mut self, directive: Directive) -> Self {
        self.directive = Some(directive);
        self
    }

    pub fn player_destroyed(lives_left: u32) -> Self {
        Self::new(PlayEventKind::PlayerDestroyed, lives_left)
    }

    /// An enemy kill. `award` marks the score for crediting.
    pub fn enemy_destroyed(score: u32, award: bool) -> Self {
        let event = Self::new(PlayEventKind::EnemyDestroyed, score);
        if award {
            event.with_directive(Directive::UpdateScoreOk)
        } else {
            event
        }
    }

    pub fn civilian_destroyed(score: u32) -> Self {
        Self::new(PlayEventKind::CivilianDestroyed, score)
    }

    pub fn wave_cleared(wave: u32) -> Self {
        Self::new(PlayEventKind::WaveCleared, wave)
    }

    pub fn haptics(kind: HapticKind, controller: u32) -> Self {
        Self::new(PlayEventKind::HapticsActivated, kind as u32)
            .with_directive(Directive::Controller(controller))
    }

    pub fn score_approved(&self) -> bool {
        self.directive == Some(Directive::UpdateScoreOk)
    }
}

/// Handle for one registered handler. Pass it back to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription(SystemId<In<PlayEvent>, HandlerResult>);

#[derive(Resource, Default)]
pub struct EventBus {
    pending: VecDeque<PlayEvent>,
    handlers: Vec<SystemId<In<PlayEvent>, HandlerResult>>,
}

impl EventBus {
    pub fn publish(&mut self, event: PlayEvent) {
        self.pending.push_back(event);
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Take every queued event without delivering it.
    pub fn drain(&mut self) -> impl Iterator<Item = PlayEvent> + '_ {
        self.pending.drain(..)
    }

    /// Drop queued events. Used when a session ends.
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

/// Registration of bus handlers, on `App` during setup and on `World` at runtime.
pub trait PlayEventsExt {
    fn subscribe_play_events<M>(
        &mut self,
        handler: impl IntoSystem<In<PlayEvent>, HandlerResult, M> + 'static,
    ) -> Subscription;

    /// Returns `false` if the subscription was already gone.
    fn unsubscribe_play_events(&mut self, subscription: Subscription) -> bool;
}

impl PlayEventsExt for World {
    fn subscribe_play_events<M>(
        &mut self,
        handler: impl IntoSystem<In<PlayEvent>, HandlerResult, M> + 'static,
    ) -> Subscription {
        let id = self.register_system(handler);
        self.get_resource_or_init::<EventBus>().handlers.push(id);
        Subscription(id)
    }

    fn unsubscribe_play_events(&mut self, subscription: Subscription) -> bool {
        let removed = {
            let mut bus = self.get_resource_or_init::<EventBus>();
            let before = bus.handlers.len();
            bus.handlers.retain(|id| *id != subscription.0);
            bus.handlers.len() != before
        };
        if removed {
            let _ = self.unregister_system(subscription.0);
        }
        removed
    }
}

impl PlayEventsExt for App {
    fn subscribe_play_events<M>(
        &mut self,
        handler: impl IntoSystem<In<PlayEvent>, HandlerResult, M> + 'static,
    ) -> Subscription {
        self.world_mut().subscribe_play_events(handler)
    }

    fn unsubscribe_play_events(&mut self, subscription: Subscription) -> bool {
        self.world_mut().unsubscribe_play_events(subscription)
    }
}

pub fn plugin(app: &mut App) {
    app.init_resource::<EventBus>()
        .add_systems(Update, dispatch_play_events.in_set(FrameSet::Dispatch));
}

/// Deliver queued events to every handler, in registration order.
pub fn dispatch_play_events(world: &mut World) {
    for _ in 0..MAX_DISPATCH_ROUNDS {
        let (batch, handlers) = {
            let mut bus = world.resource_mut::<EventBus>();
            if bus.pending.is_empty() {
                return;
            }
            (std::mem::take(&mut bus.pending), bus.handlers.clone())
        };

        for event in batch {
            for &handler in &handlers {
                match world.run_system_with(handler, event) {
                    Ok(Ok(())) => {}
                    Ok(Err(err)) => warn!("handler failed on {:?}: {err}", event.kind),
                    Err(err) => warn!("handler could not run on {:?}: {err}", event.kind),
                }
            }
        }
    }

    let left = world.resource::<EventBus>().pending();
    if left > 0 {
        warn!("play events still pending after {MAX_DISPATCH_ROUNDS} rounds, deferring {left}");
    }
}
