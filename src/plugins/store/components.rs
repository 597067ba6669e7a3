//! Component vocabulary shared by every gameplay plugin.
//!
//! Plain data and a few helpers that keep it consistent. Behaviour lives in the plugin that
//! owns the archetype.

use std::time::Duration;

use bevy::prelude::*;
use bevy::time::Stopwatch;
use rand::Rng;

use crate::plugins::physics::obb::BoundBox;

// -----------------------------------------------------------------------------
// Physics
// -----------------------------------------------------------------------------

#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct Velocity(pub Vec3);

#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct Acceleration(pub Vec3);

/// Entity takes part in the pairwise collision pass. Always paired with a `BoundBox`.
#[derive(Component, Debug, Clone, Copy, Default)]
#[require(BoundBox)]
pub struct Collidable;

/// Active gameplay participant. Everything carrying it is removed when a session ends.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Alive;

#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct Speed(pub f32);

/// Archetype-specific distance (lazer muzzle, civilian hang height).
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct Offset(pub f32);

// -----------------------------------------------------------------------------
// Archetype markers
// -----------------------------------------------------------------------------

#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Player;

#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Enemy;

#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Bomber;

#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Baiter;

#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Lander;

#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Projectile;

#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Lazer;

#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Cannonball;

#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Pea;

#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Trap;

#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Pickup;

#[derive(Component, Debug, Clone, Copy, Default)]
pub struct SmartBomb;

#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Civilian;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Faction {
    Player,
    Enemy,
}

/// Who fired a projectile.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sender(pub Faction);

#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControllerId(pub u32);

// -----------------------------------------------------------------------------
// Persistent player statistics
// -----------------------------------------------------------------------------

/// Singleton that carries score, lives and bombs across player deaths.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct PersistentStats;

#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Score(pub u32);

#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Lives(pub u32);

#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct NukeDispenser {
    pub bombs: u32,
    pub range: f32,
    pub max_capacity: u32,
}

impl NukeDispenser {
    pub fn has_room(&self) -> bool {
        self.bombs < self.max_capacity
    }
}

// -----------------------------------------------------------------------------
// Tags
// -----------------------------------------------------------------------------

/// Fire button is held.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Charging;

/// Smart bomb button is held with at least one bomb available.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct ChargingSmartBomb;

/// Lander is carrying a civilian.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Capturing;

// -----------------------------------------------------------------------------
// Behaviour state
// -----------------------------------------------------------------------------

#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct PlayerMoveInfo {
    pub h_accel: f32,
    pub h_decel: f32,
    pub h_max_speed: f32,
    pub h_flip_accel: f32,
    pub v_accel: f32,
    pub v_decel: f32,
    pub v_max_speed: f32,
    pub v_flip_accel: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rumble {
    pub pan: f32,
    pub duration: Duration,
    pub strength: f32,
}

#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct PlayerHaptics {
    pub fire_lazer: Rumble,
    pub player_death: Rumble,
    pub detonate: Rumble,
}

/// How long the fire button has been held.
#[derive(Component, Debug, Clone, Default, PartialEq)]
pub struct ChargeInfo {
    pub held: Stopwatch,
    pub full_charge: Duration,
}

impl ChargeInfo {
    pub fn is_full(&self) -> bool {
        self.held.elapsed() >= self.full_charge
    }
}

/// Facing direction and the animated half-turn between facings.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct FlipInfo {
    pub facing_right: bool,
    pub flip_time: Duration,
    /// How far the body has turned away from facing right, 0 to 180 degrees.
    pub flipped_deg: f32,
}

impl FlipInfo {
    pub fn new(flip_time: Duration) -> Self {
        Self {
            facing_right: true,
            flip_time,
            flipped_deg: 0.0,
        }
    }

    /// Face the way `dir` points (zero keeps the current facing) and advance the turn.
    pub fn steer(&mut self, dir: f32, dt: f32, transform: &mut Transform) {
        if dir != 0.0 {
            self.facing_right = dir > 0.0;
        }

        let target = if self.facing_right { 0.0 } else { 180.0 };
        let gap = target - self.flipped_deg;
        if gap == 0.0 {
            return;
        }

        let step = if self.flip_time.is_zero() {
            gap.abs()
        } else {
            180.0 * dt / self.flip_time.as_secs_f32()
        };
        let turn = if step >= gap.abs() {
            self.flipped_deg = target;
            gap
        } else {
            self.flipped_deg += gap.signum() * step;
            gap.signum() * step
        };
        transform.rotate_local_y(turn.to_radians());
    }
}

#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct PlayerSpace(pub f32);

#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct BaiterMovementStats {
    pub spawn_dist_min: f32,
    pub spawn_dist_max: f32,
    pub follow_distance: f32,
}

/// Inclusive millisecond range that timers roll their next duration from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MillisRange {
    pub min: u64,
    pub max: u64,
}

impl MillisRange {
    pub fn new(a: u64, b: u64) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn roll(&self, rng: &mut impl Rng) -> Duration {
        Duration::from_millis(rng.random_range(self.min..=self.max))
    }
}

/// Baiter dash: `timer` counts the current dash, or the pause before the next one.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct SpeedBoost {
    pub boosting: bool,
    pub moving_right: bool,
    pub speed: f32,
    pub interval: MillisRange,
    pub duration: MillisRange,
    pub timer: Timer,
}

#[derive(Component, Debug, Clone, PartialEq)]
pub struct CiviMovementStats {
    pub walking_right: bool,
    pub dir_change: MillisRange,
    pub timer: Timer,
}

/// Capture state of a civilian. `captor` may outlive its entity and must be checked.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureInfo {
    pub captured: bool,
    pub captor: Option<Entity>,
}

impl CaptureInfo {
    pub fn release(&mut self) {
        self.captured = false;
        self.captor = None;
    }
}

#[derive(Component, Debug, Clone, PartialEq)]
pub struct Cannon {
    pub launch_offset: f32,
    pub aim_lead: f32,
    pub cooldown: Timer,
}

#[derive(Component, Debug, Clone, PartialEq)]
pub struct PeaShooter {
    pub offset: f32,
    pub range: f32,
    pub cooldown: Timer,
}

#[derive(Component, Debug, Clone, PartialEq)]
pub struct BomberTrap {
    pub launch_offset: f32,
    pub cooldown: Timer,
}

/// Light carried by a projectile. Rendered by the lighting plugin.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Glow {
    pub color: Color,
    pub radius: f32,
}

/// A weapon cooldown that starts counting at spawn.
pub fn cooldown(rate: Duration) -> Timer {
    Timer::new(rate, TimerMode::Once)
}
