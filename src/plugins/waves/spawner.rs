//! Wave population: where things appear and with what state.
//!
//! Everything here runs on timer threads as well as on the main thread, so it only touches
//! `Send` data: a prefab snapshot, the staging sender, the player beacon and the shared
//! counters. The RNG is passed in so tests can seed it.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use bevy::prelude::*;
use rand::Rng;

use super::timer::{TimerControl, TimerHandle};
use crate::common::config::{WavesSection, WorldBounds};
use crate::plugins::store::components::BaiterMovementStats;
use crate::plugins::store::prefab::{
    Blueprint, ENEMY_PREFAB, EnemyBehavior, EnemyKind, PLAYER_PREFAB, PickupKind, PrefabRegistry,
    prefab_name,
};
use crate::plugins::store::staging::StagingSender;

/// Spread of the bomber's random heading before normalisation.
const BOMBER_HEADING_X: f32 = 15.0;
const BOMBER_HEADING_Y: f32 = 10.0;

/// Per-wave enemy counters, shared with the batch timer.
#[derive(Debug, Default)]
pub struct WaveCounters {
    spawned_this_wave: AtomicU32,
    alive: AtomicU32,
}

impl WaveCounters {
    pub fn spawned_this_wave(&self) -> u32 {
        self.spawned_this_wave.load(Ordering::Acquire)
    }

    pub fn alive(&self) -> u32 {
        self.alive.load(Ordering::Acquire)
    }

    pub fn record_spawn(&self) {
        self.spawned_this_wave.fetch_add(1, Ordering::AcqRel);
        self.alive.fetch_add(1, Ordering::AcqRel);
    }

    /// Decrement unless already zero. Returns the new value, `None` if nothing was counted.
    pub fn enemy_gone(&self) -> Option<u32> {
        checked_decrement(&self.alive)
    }

    /// Take back one spawn from this wave's tally, unless already zero.
    pub fn unspawn(&self) -> Option<u32> {
        checked_decrement(&self.spawned_this_wave)
    }

    pub fn reset_wave(&self) {
        self.spawned_this_wave.store(0, Ordering::Release);
    }

    pub fn reset(&self) {
        self.spawned_this_wave.store(0, Ordering::Release);
        self.alive.store(0, Ordering::Release);
    }
}

fn checked_decrement(counter: &AtomicU32) -> Option<u32> {
    counter
        .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
        .ok()
        .map(|previous| previous - 1)
}

#[derive(Debug, Clone, Copy, Default)]
struct BeaconState {
    current: Option<Vec3>,
    last_known: Vec3,
}

/// Latest player position, readable from timer threads.
#[derive(Debug, Default)]
pub struct PlayerBeacon {
    state: Mutex<BeaconState>,
}

impl PlayerBeacon {
    pub fn update(&self, position: Option<Vec3>) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.current = position;
        if let Some(position) = position {
            state.last_known = position;
        }
    }

    /// Forget every sighting. The next session starts at the origin.
    pub fn reset(&self) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = BeaconState::default();
    }

    /// Position of the living player, if any.
    pub fn position(&self) -> Option<Vec3> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .current
    }

    /// Where the player was last seen, origin before the first sighting.
    pub fn last_known(&self) -> Vec3 {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last_known
    }
}

/// Main-thread access to the shared beacon.
#[derive(Resource, Debug, Clone, Default)]
pub struct Beacon(pub Arc<PlayerBeacon>);

/// Everything a timer thread needs to populate a wave.
#[derive(Debug, Clone)]
pub struct Spawner {
    pub prefabs: Arc<PrefabRegistry>,
    pub staging: StagingSender,
    pub beacon: Arc<PlayerBeacon>,
    pub counters: Arc<WaveCounters>,
    pub bounds: WorldBounds,
    pub waves: WavesSection,
}

impl Spawner {
    /// Stage the wave's smart bombs and civilians. Returns how many were staged.
    pub fn spawn_wave_pickups(&self, wave: u32, rng: &mut impl Rng) -> u32 {
        let tuning = self.waves.tuning(wave);
        let civilians = roll_u32(
            rng,
            self.waves.min_civis_per_wave,
            self.waves.max_civis_per_wave,
        );
        let mut staged = 0;

        let smart_bomb = PickupKind::SmartBomb.prefab();
        for _ in 0..tuning.smart_bombs {
            let Some(blueprint) = self.prefabs.instantiate(&smart_bomb) else {
                break;
            };
            let position = self.random_point(rng, blueprint.transform.translation.z);
            if self.staging.stage(blueprint.at(position)) {
                staged += 1;
            }
        }

        let civilian = PickupKind::Civilian.prefab();
        for _ in 0..civilians {
            let Some(blueprint) = self.prefabs.instantiate(&civilian) else {
                break;
            };
            let x = rng.random_range(-self.bounds.width..=self.bounds.width);
            let position = Vec3::new(x, self.bounds.bottom, blueprint.transform.translation.z);
            if self.staging.stage(blueprint.at(position)) {
                staged += 1;
            }
        }

        debug!("wave {wave}: staged {staged} pickups");
        staged
    }

    /// One tick of the batch timer. Returns how many enemies were staged.
    pub fn spawn_batch(&self, wave: u32, rng: &mut impl Rng) -> u32 {
        let tuning = self.waves.tuning(wave);
        let level = roll_u32(rng, tuning.min_enemy_level, tuning.max_enemy_level);
        let name = prefab_name(ENEMY_PREFAB, level);

        let Some(template) = self.prefabs.lookup(&name).and_then(|p| p.enemy()) else {
            debug!("wave {wave}: no enemy prefab {name}, skipping batch");
            return 0;
        };
        let upper = (template.batch_max as f32 * tuning.max_enemy_multiplier_per_batch).floor();
        let batch = roll_u32(rng, template.batch_min, upper.max(0.0) as u32);

        let mut staged = 0;
        for _ in 0..batch {
            let Some(blueprint) = self.prefabs.instantiate(&name) else {
                break;
            };
            let Some(blueprint) = self.place_enemy(blueprint, rng) else {
                continue;
            };
            if !self.staging.stage(blueprint) {
                break;
            }
            self.counters.record_spawn();
            staged += 1;
        }
        staged
    }

    fn place_enemy(&self, blueprint: Blueprint, rng: &mut impl Rng) -> Option<Blueprint> {
        let template = blueprint.prefab.enemy()?.clone();
        let z = blueprint.transform.translation.z;
        let player = self.beacon.position();

        match (template.kind(), &template.behavior) {
            (EnemyKind::Baiter, EnemyBehavior::Baiter { movement, .. }) => {
                let position = baiter_spawn_point(player?, movement, rng).with_z(z);
                Some(blueprint.at(position))
            }
            (EnemyKind::Bomber, _) => {
                let position = keep_clear_of_player(
                    self.random_point(rng, z),
                    player,
                    template.player_space,
                );
                let heading = Vec2::new(
                    rng.random_range(-BOMBER_HEADING_X..=BOMBER_HEADING_X),
                    rng.random_range(-BOMBER_HEADING_Y..=BOMBER_HEADING_Y),
                )
                .normalize_or(Vec2::X);
                Some(
                    blueprint
                        .at(position)
                        .with_velocity((heading * template.speed).extend(0.0)),
                )
            }
            _ => {
                let position = keep_clear_of_player(
                    self.random_point(rng, z),
                    player,
                    template.player_space,
                );
                Some(blueprint.at(position))
            }
        }
    }

    /// Stage the player at its last known position.
    pub fn spawn_player(&self) -> bool {
        let name = prefab_name(PLAYER_PREFAB, 1);
        let Some(blueprint) = self.prefabs.instantiate(&name) else {
            warn!("cannot spawn player, {name} is not registered");
            return false;
        };
        let z = blueprint.transform.translation.z;
        let at = self.beacon.last_known().with_z(z);
        self.staging.stage(blueprint.at(at))
    }

    /// Start the recurring batch timer for `wave`. It stops itself once the wave's cap is met.
    pub fn start_batches(&self, wave: u32) -> Option<TimerHandle> {
        let spawner = self.clone();
        let cap = self.waves.tuning(wave).max_enemies;
        let mut rng: rand::rngs::StdRng = rand::SeedableRng::from_rng(&mut rand::rng());

        let started = TimerHandle::recurring(
            format!("wave-{wave}-batches"),
            Duration::from_millis(self.waves.spawn_wave_delay_ms),
            Duration::from_millis(self.waves.spawn_batch_rate_ms),
            move |control: &TimerControl| {
                spawner.spawn_batch(wave, &mut rng);
                if spawner.counters.spawned_this_wave() >= cap {
                    control.stop();
                }
            },
        );

        match started {
            Ok(handle) => Some(handle),
            Err(err) => {
                warn!("could not start batch timer for wave {wave}: {err}");
                None
            }
        }
    }

    fn random_point(&self, rng: &mut impl Rng, z: f32) -> Vec3 {
        Vec3::new(
            rng.random_range(-self.bounds.width..=self.bounds.width),
            rng.random_range(self.bounds.bottom..=self.bounds.top),
            z,
        )
    }
}

/// Uniform in `[a, b]`, whichever order they come in.
pub fn roll_u32(rng: &mut impl Rng, a: u32, b: u32) -> u32 {
    rng.random_range(a.min(b)..=a.max(b))
}

/// Push `position` sideways by `space` when it lands within `space` of the player.
pub fn keep_clear_of_player(position: Vec3, player: Option<Vec3>, space: f32) -> Vec3 {
    let Some(player) = player else {
        return position;
    };
    if space <= 0.0 || position.truncate().distance(player.truncate()) > space {
        return position;
    }
    let away = if position.x < player.x { -1.0 } else { 1.0 };
    position + Vec3::X * away * space
}

/// A point `d` to `2d` away around the player, `d` drawn from the baiter's spawn band.
pub fn baiter_spawn_point(
    player: Vec3,
    movement: &BaiterMovementStats,
    rng: &mut impl Rng,
) -> Vec3 {
    let dist = rng.random_range(movement.spawn_dist_min..=movement.spawn_dist_max);
    let x_sign = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
    let y_sign = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
    Vec3::new(
        player.x + x_sign * dist * 2.0,
        player.y + y_sign * dist,
        player.z,
    )
}
