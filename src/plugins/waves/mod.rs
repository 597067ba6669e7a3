//! Wave director.
//!
//! Owns wave progression and the two background timers that feed the staging queue: the
//! recurring enemy batch spawner and the one-shot player respawn.
//!
//! ```text
//! start_wave ─▶ stage pickups now
//!            └▶ batch timer ─tick─▶ Spawner::spawn_batch ─▶ StagingQueue
//!                             └─ spawned_this_wave >= cap ─▶ stop itself
//!
//! PlayerDestroyed ─▶ purge, then respawn timer + start_wave, or GameOver
//! EnemyDestroyed  ─▶ alive -= 1 (never below 0) ─▶ WaveCleared when the wave is done
//!                 └─ player down this frame ─▶ unspawn instead, the restarted wave owes it
//! WaveCleared     ─▶ cash in civilians, purge pickups/projectiles, start_wave
//! ```
//!
//! An enemy that rams the player is despawned before its `EnemyDestroyed` is delivered, so the
//! purge cannot see it. Kills counted after a player death in the same frame are treated as
//! purged with the player.
//!
//! The batch cap is soft: a batch already rolled finishes even if it overshoots.

pub mod spawner;
pub mod timer;

use std::sync::Arc;
use std::time::Duration;

use bevy::prelude::*;

use crate::common::config::GameConfig;
use crate::plugins::bus::{EventBus, HandlerResult, PlayEvent, PlayEventKind, PlayEventsExt};
use crate::plugins::core::FrameSet;
use crate::plugins::store::components::{Civilian, Enemy, Projectile, Score, SmartBomb};
use crate::plugins::store::{Destroyer, Prefabs, StagingQueue};

pub use spawner::{Beacon, PlayerBeacon, Spawner, WaveCounters};
use timer::TimerHandle;

#[derive(Resource, Debug)]
pub struct WaveDirector {
    wave: u32,
    spawner: Spawner,
    respawn_delay: Duration,
    batch_timer: Option<TimerHandle>,
    respawn_timer: Option<TimerHandle>,
    player_down: bool,
}

impl FromWorld for WaveDirector {
    fn from_world(world: &mut World) -> Self {
        let config = world.get_resource_or_init::<GameConfig>().clone();
        let prefabs = world.get_resource_or_init::<Prefabs>().snapshot();
        let staging = world.get_resource_or_init::<StagingQueue>().sender();
        let beacon = Arc::clone(&world.get_resource_or_init::<Beacon>().0);

        Self::new(
            Spawner {
                prefabs,
                staging,
                beacon,
                counters: Arc::default(),
                bounds: config.world_bounds(),
                waves: config.waves.clone(),
            },
            Duration::from_millis(config.game.player_respawn_delay_ms),
        )
    }
}

impl WaveDirector {
    pub fn new(spawner: Spawner, respawn_delay: Duration) -> Self {
        Self {
            wave: 1,
            spawner,
            respawn_delay,
            batch_timer: None,
            respawn_timer: None,
            player_down: false,
        }
    }

    pub fn wave(&self) -> u32 {
        self.wave
    }

    pub fn counters(&self) -> &WaveCounters {
        &self.spawner.counters
    }

    pub fn spawner(&self) -> &Spawner {
        &self.spawner
    }

    pub fn batches_running(&self) -> bool {
        self.batch_timer
            .as_ref()
            .is_some_and(|timer| !timer.is_stopped())
    }

    pub fn respawn_pending(&self) -> bool {
        self.respawn_timer
            .as_ref()
            .is_some_and(|timer| !timer.is_stopped())
    }

    /// Stage this wave's pickups and start its batch timer, replacing any running one.
    pub fn start_wave(&mut self) {
        info!("starting wave {}", self.wave);
        self.spawner
            .spawn_wave_pickups(self.wave, &mut rand::rng());
        self.batch_timer = self.spawner.start_batches(self.wave);
    }

    pub fn schedule_respawn(&mut self) {
        let spawner = self.spawner.clone();
        self.respawn_timer = match TimerHandle::once("player-respawn", self.respawn_delay, move || {
            spawner.spawn_player();
        }) {
            Ok(timer) => Some(timer),
            Err(err) => {
                warn!("could not start respawn timer, respawning now: {err}");
                self.spawner.spawn_player();
                None
            }
        };
    }

    /// Fresh session: wave 1, zeroed counters, a player, and the first wave.
    pub fn begin_session(&mut self) {
        self.end_session();
        self.spawner.spawn_player();
        self.start_wave();
    }

    pub fn end_session(&mut self) {
        self.batch_timer = None;
        self.respawn_timer = None;
        self.player_down = false;
        self.spawner.counters.reset();
        self.wave = 1;
    }

    pub fn pause(&self) {
        for timer in self.timers() {
            timer.pause();
        }
    }

    pub fn resume(&self) {
        for timer in self.timers() {
            timer.resume();
        }
    }

    fn timers(&self) -> impl Iterator<Item = &TimerHandle> {
        self.batch_timer.iter().chain(self.respawn_timer.iter())
    }

    /// The player died this frame. Enemies still counted before the frame ends go with it.
    pub fn mark_player_down(&mut self) {
        self.player_down = true;
    }

    pub fn is_player_down(&self) -> bool {
        self.player_down
    }

    /// Count one enemy gone. Returns the new wave number if that cleared the wave.
    pub fn enemy_destroyed(&mut self) -> Option<u32> {
        let counters = &self.spawner.counters;
        let alive = counters.enemy_gone()?;
        if self.player_down {
            counters.unspawn();
            return None;
        }
        let cap = self.spawner.waves.tuning(self.wave).max_enemies;
        if alive == 0 && counters.spawned_this_wave() >= cap {
            self.wave += 1;
            Some(self.wave)
        } else {
            None
        }
    }
}

pub fn plugin(app: &mut App) {
    app.init_resource::<Beacon>()
        .init_resource::<WaveDirector>()
        .add_systems(Update, clear_player_down.in_set(FrameSet::Prepare));
    app.subscribe_play_events(on_wave_event);
}

pub fn clear_player_down(mut director: ResMut<WaveDirector>) {
    if director.player_down {
        director.player_down = false;
    }
}

pub fn on_wave_event(
    In(event): In<PlayEvent>,
    mut director: ResMut<WaveDirector>,
    mut bus: ResMut<EventBus>,
    mut destroyer: Destroyer,
    q_enemies: Query<Entity, With<Enemy>>,
    q_projectiles: Query<Entity, With<Projectile>>,
    q_bombs: Query<Entity, With<SmartBomb>>,
    q_civilians: Query<(Entity, &Score), With<Civilian>>,
) -> HandlerResult {
    match event.kind {
        PlayEventKind::PlayerDestroyed => {
            director.mark_player_down();
            for entity in &q_projectiles {
                destroyer.destroy(entity);
            }
            for entity in &q_enemies {
                if destroyer.destroy(entity) {
                    director.counters().enemy_gone();
                    director.counters().unspawn();
                }
            }
            for entity in q_bombs.iter().chain(q_civilians.iter().map(|(e, _)| e)) {
                destroyer.destroy(entity);
            }

            if event.value > 0 {
                director.schedule_respawn();
                director.start_wave();
            } else {
                info!("no lives left, game over");
                bus.publish(PlayEvent::new(PlayEventKind::GameOver, 0));
            }
        }
        PlayEventKind::EnemyDestroyed => {
            if let Some(wave) = director.enemy_destroyed() {
                info!("wave cleared, next wave {wave}");
                bus.publish(PlayEvent::wave_cleared(wave));
            }
        }
        PlayEventKind::WaveCleared => {
            director.counters().reset_wave();
            for (entity, score) in &q_civilians {
                if destroyer.destroy(entity) {
                    bus.publish(PlayEvent::civilian_destroyed(score.0));
                }
            }
            for entity in q_bombs.iter().chain(q_projectiles.iter()) {
                destroyer.destroy(entity);
            }
            director.wave = event.value.max(1);
            director.start_wave();
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests;
