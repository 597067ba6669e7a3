//! Game configuration.
//!
//! Loaded once at startup from JSON and inserted as a resource. Every section carries
//! `#[serde(default)]`, so a config file only has to name the keys it overrides.
//!
//! Prefab sections are keyed by prefab name (`EnemyPrefab_2`, ...). The numeric suffix selects
//! the archetype, see `store::prefab`.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::Path;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::common::error::ConfigError;

pub const DEFAULT_CONFIG_PATH: &str = "assets/config/galleons.json";

#[derive(Resource, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct GameConfig {
    pub window: WindowSection,
    pub game: GameSection,
    pub waves: WavesSection,
    pub camera: CameraSection,
    pub nuke_dispenser: NukeDispenserSection,
    pub cannon: CannonSection,
    pub pea_shooter: PeaShooterSection,
    pub trap_ejector: TrapEjectorSection,
    pub players: BTreeMap<String, PlayerSection>,
    pub enemies: BTreeMap<String, EnemySection>,
    pub projectiles: BTreeMap<String, ProjectileSection>,
    pub pickups: BTreeMap<String, PickupSection>,
    pub high_scores: HighScoreSection,
}

impl GameConfig {
    /// Read and validate a config file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                warn!("config {} not found, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let game = &self.game;
        if game.world_top_boundary <= game.world_bottom_boundary {
            return Err(ConfigError::Invalid(format!(
                "world_top_boundary ({}) must be above world_bottom_boundary ({})",
                game.world_top_boundary, game.world_bottom_boundary
            )));
        }
        if game.world_width <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "world_width must be positive, got {}",
                game.world_width
            )));
        }
        if self.waves.spawn_batch_rate_ms == 0 {
            return Err(ConfigError::Invalid("spawn_batch_rate_ms must be non-zero".into()));
        }
        Ok(())
    }

    pub fn world_bounds(&self) -> WorldBounds {
        WorldBounds {
            top: self.game.world_top_boundary,
            bottom: self.game.world_bottom_boundary,
            width: self.game.world_width,
        }
    }

    /// Lives a fresh session starts with.
    pub fn starting_lives(&self) -> u32 {
        self.players
            .values()
            .next()
            .map(|player| player.lives)
            .unwrap_or(PlayerSection::default().lives)
    }
}

/// Playfield limits shared by physics and spawning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldBounds {
    pub top: f32,
    pub bottom: f32,
    /// Half-width of the wrap window around the player.
    pub width: f32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct WindowSection {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowSection {
    fn default() -> Self {
        Self {
            title: "Galleons of the Galaxy".into(),
            width: 1280,
            height: 720,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct GameSection {
    pub world_top_boundary: f32,
    pub world_bottom_boundary: f32,
    pub world_width: f32,
    pub projectile_cull_dist: f32,
    pub player_respawn_delay_ms: u64,
    pub splash_screens: Vec<String>,
    pub splash_screen_ms: u64,
    pub clear_color: [f32; 3],
}

impl Default for GameSection {
    fn default() -> Self {
        Self {
            world_top_boundary: 300.0,
            world_bottom_boundary: -300.0,
            world_width: 2400.0,
            projectile_cull_dist: 1400.0,
            player_respawn_delay_ms: 1000,
            splash_screens: vec!["Logo".into(), "Engine".into()],
            splash_screen_ms: 4000,
            clear_color: [0.02, 0.02, 0.05],
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct WavesSection {
    pub spawn_wave_delay_ms: u64,
    pub spawn_batch_rate_ms: u64,
    pub min_civis_per_wave: u32,
    pub max_civis_per_wave: u32,
    pub per_wave: Vec<WaveTuning>,
}

impl WavesSection {
    /// Tuning for `wave`. Waves past the last authored entry repeat it.
    pub fn tuning(&self, wave: u32) -> WaveTuning {
        let authored = self.per_wave.len();
        if authored == 0 {
            return WaveTuning::default();
        }
        let index = (wave.max(1) as usize).min(authored) - 1;
        self.per_wave[index].clone()
    }
}

impl Default for WavesSection {
    fn default() -> Self {
        Self {
            spawn_wave_delay_ms: 2000,
            spawn_batch_rate_ms: 4000,
            min_civis_per_wave: 3,
            max_civis_per_wave: 6,
            per_wave: vec![
                WaveTuning {
                    min_enemy_level: 1,
                    max_enemy_level: 1,
                    smart_bombs: 1,
                    max_enemies: 6,
                    max_enemy_multiplier_per_batch: 1.0,
                },
                WaveTuning {
                    min_enemy_level: 1,
                    max_enemy_level: 2,
                    smart_bombs: 1,
                    max_enemies: 10,
                    max_enemy_multiplier_per_batch: 1.5,
                },
                WaveTuning {
                    min_enemy_level: 1,
                    max_enemy_level: 3,
                    smart_bombs: 2,
                    max_enemies: 16,
                    max_enemy_multiplier_per_batch: 2.0,
                },
            ],
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct WaveTuning {
    pub min_enemy_level: u32,
    pub max_enemy_level: u32,
    pub smart_bombs: u32,
    pub max_enemies: u32,
    pub max_enemy_multiplier_per_batch: f32,
}

impl Default for WaveTuning {
    fn default() -> Self {
        Self {
            min_enemy_level: 1,
            max_enemy_level: 1,
            smart_bombs: 0,
            max_enemies: 5,
            max_enemy_multiplier_per_batch: 1.0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct CameraSection {
    pub smoothing: f32,
    pub lead_distance: f32,
    pub switch_dir_ms: u64,
}

impl Default for CameraSection {
    fn default() -> Self {
        Self {
            smoothing: 5.0,
            lead_distance: 180.0,
            switch_dir_ms: 600,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct NukeDispenserSection {
    pub range: f32,
    pub max_capacity: u32,
}

impl Default for NukeDispenserSection {
    fn default() -> Self {
        Self {
            range: 700.0,
            max_capacity: 3,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct CannonSection {
    pub launch_offset: f32,
    pub aim_lead_scaler: f32,
    pub fire_rate_ms: u64,
}

impl Default for CannonSection {
    fn default() -> Self {
        Self {
            launch_offset: 24.0,
            aim_lead_scaler: 0.4,
            fire_rate_ms: 2200,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PeaShooterSection {
    pub offset: f32,
    pub range: f32,
    pub fire_rate_ms: u64,
}

impl Default for PeaShooterSection {
    fn default() -> Self {
        Self {
            offset: 18.0,
            range: 520.0,
            fire_rate_ms: 1600,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct TrapEjectorSection {
    pub launch_offset: f32,
    pub fire_rate_ms: u64,
}

impl Default for TrapEjectorSection {
    fn default() -> Self {
        Self {
            launch_offset: 12.0,
            fire_rate_ms: 2600,
        }
    }
}

/// Visual and placement defaults shared by every prefab section.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct LookSection {
    pub size: [f32; 2],
    pub color: [f32; 3],
    pub rotation_deg: [f32; 3],
    pub depth: f32,
}

impl Default for LookSection {
    fn default() -> Self {
        Self {
            size: [24.0, 24.0],
            color: [1.0, 1.0, 1.0],
            rotation_deg: [0.0, 0.0, 0.0],
            depth: 1.0,
        }
    }
}

impl LookSection {
    fn sized(w: f32, h: f32, color: [f32; 3]) -> Self {
        Self {
            size: [w, h],
            color,
            ..default()
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct RumbleSection {
    /// 0.0 drives only the strong motor, 1.0 only the weak one.
    pub pan: f32,
    pub duration_ms: u64,
    pub strength: f32,
}

impl Default for RumbleSection {
    fn default() -> Self {
        Self {
            pan: 0.5,
            duration_ms: 120,
            strength: 0.5,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct HapticsSection {
    pub fire_lazer: RumbleSection,
    pub player_death: RumbleSection,
    pub detonate: RumbleSection,
}

impl Default for HapticsSection {
    fn default() -> Self {
        Self {
            fire_lazer: RumbleSection {
                pan: 0.8,
                duration_ms: 60,
                strength: 0.3,
            },
            player_death: RumbleSection {
                pan: 0.2,
                duration_ms: 600,
                strength: 1.0,
            },
            detonate: RumbleSection {
                pan: 0.5,
                duration_ms: 400,
                strength: 0.8,
            },
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PlayerSection {
    #[serde(flatten)]
    pub look: LookSection,
    pub lives: u32,
    pub h_accel: f32,
    pub h_decel: f32,
    pub h_max_speed: f32,
    pub h_flip_accel: f32,
    pub v_accel: f32,
    pub v_decel: f32,
    pub v_max_speed: f32,
    pub v_flip_accel: f32,
    pub flip_time_ms: u64,
    pub full_charge_ms: u64,
    pub haptics: HapticsSection,
}

impl Default for PlayerSection {
    fn default() -> Self {
        Self {
            look: LookSection::sized(44.0, 18.0, [0.35, 0.8, 1.0]),
            lives: 3,
            h_accel: 900.0,
            h_decel: 2.5,
            h_max_speed: 600.0,
            h_flip_accel: 1800.0,
            v_accel: 900.0,
            v_decel: 6.0,
            v_max_speed: 350.0,
            v_flip_accel: 1800.0,
            flip_time_ms: 250,
            full_charge_ms: 800,
            haptics: HapticsSection::default(),
        }
    }
}

/// Enemy prefab section. Baiter-only keys are ignored for other archetypes.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct EnemySection {
    #[serde(flatten)]
    pub look: LookSection,
    pub score: u32,
    pub speed: f32,
    pub batch_size_min: u32,
    pub batch_size_max: u32,
    pub player_space: f32,
    pub flip_time_ms: u64,
    pub spawn_dist_min: f32,
    pub spawn_dist_max: f32,
    pub follow_distance: f32,
    pub boost_speed: f32,
    pub boost_interval_min_ms: u64,
    pub boost_interval_max_ms: u64,
    pub boost_duration_min_ms: u64,
    pub boost_duration_max_ms: u64,
}

impl Default for EnemySection {
    fn default() -> Self {
        Self {
            look: LookSection::sized(28.0, 22.0, [0.4, 1.0, 0.4]),
            score: 150,
            speed: 60.0,
            batch_size_min: 1,
            batch_size_max: 3,
            player_space: 200.0,
            flip_time_ms: 300,
            spawn_dist_min: 200.0,
            spawn_dist_max: 320.0,
            follow_distance: 100.0,
            boost_speed: 600.0,
            boost_interval_min_ms: 1500,
            boost_interval_max_ms: 4000,
            boost_duration_min_ms: 200,
            boost_duration_max_ms: 500,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct GlowSection {
    pub color: [f32; 3],
    pub radius: f32,
}

impl Default for GlowSection {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            radius: 80.0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ProjectileSection {
    #[serde(flatten)]
    pub look: LookSection,
    pub speed: f32,
    pub offset: f32,
    pub glow: Option<GlowSection>,
}

impl Default for ProjectileSection {
    fn default() -> Self {
        Self {
            look: LookSection::sized(8.0, 8.0, [1.0, 0.6, 0.2]),
            speed: 300.0,
            offset: 0.0,
            glow: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PickupSection {
    #[serde(flatten)]
    pub look: LookSection,
    pub score: u32,
    pub speed: f32,
    pub dir_change_min_ms: u64,
    pub dir_change_max_ms: u64,
    pub hang_offset: f32,
    pub flip_time_ms: u64,
}

impl Default for PickupSection {
    fn default() -> Self {
        Self {
            look: LookSection::sized(16.0, 16.0, [1.0, 0.9, 0.3]),
            score: 0,
            speed: 40.0,
            dir_change_min_ms: 1000,
            dir_change_max_ms: 3000,
            hang_offset: 24.0,
            flip_time_ms: 300,
        }
    }
}

/// An empty `path` keeps the table in memory only.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct HighScoreSection {
    pub high_score_count: usize,
    pub path: String,
}

impl Default for HighScoreSection {
    fn default() -> Self {
        Self {
            high_score_count: 10,
            path: String::new(),
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        let mut players = BTreeMap::new();
        players.insert("PlayerPrefab_1".to_string(), PlayerSection::default());

        let mut enemies = BTreeMap::new();
        enemies.insert(
            "EnemyPrefab_1".to_string(),
            EnemySection {
                look: LookSection::sized(28.0, 24.0, [0.4, 1.0, 0.4]),
                score: 150,
                speed: 60.0,
                batch_size_min: 2,
                batch_size_max: 3,
                player_space: 200.0,
                ..default()
            },
        );
        enemies.insert(
            "EnemyPrefab_2".to_string(),
            EnemySection {
                look: LookSection::sized(30.0, 20.0, [1.0, 0.4, 0.8]),
                score: 250,
                speed: 80.0,
                batch_size_min: 1,
                batch_size_max: 2,
                player_space: 250.0,
                ..default()
            },
        );
        enemies.insert(
            "EnemyPrefab_3".to_string(),
            EnemySection {
                look: LookSection::sized(34.0, 14.0, [1.0, 0.3, 0.3]),
                score: 200,
                speed: 150.0,
                batch_size_min: 1,
                batch_size_max: 1,
                player_space: 0.0,
                ..default()
            },
        );

        let mut projectiles = BTreeMap::new();
        projectiles.insert(
            "ProjectilePrefab_1".to_string(),
            ProjectileSection {
                look: LookSection::sized(10.0, 10.0, [1.0, 0.5, 0.1]),
                speed: 350.0,
                glow: Some(GlowSection {
                    color: [1.0, 0.5, 0.1],
                    radius: 90.0,
                }),
                ..default()
            },
        );
        projectiles.insert(
            "ProjectilePrefab_2".to_string(),
            ProjectileSection {
                look: LookSection::sized(60.0, 4.0, [0.6, 1.0, 1.0]),
                speed: 1400.0,
                offset: 30.0,
                glow: Some(GlowSection {
                    color: [0.6, 1.0, 1.0],
                    radius: 120.0,
                }),
            },
        );
        projectiles.insert(
            "ProjectilePrefab_3".to_string(),
            ProjectileSection {
                look: LookSection::sized(6.0, 6.0, [0.9, 1.0, 0.4]),
                speed: 300.0,
                ..default()
            },
        );
        projectiles.insert(
            "ProjectilePrefab_4".to_string(),
            ProjectileSection {
                look: LookSection::sized(12.0, 12.0, [1.0, 0.2, 0.6]),
                speed: 10.0,
                ..default()
            },
        );

        let mut pickups = BTreeMap::new();
        pickups.insert(
            "PickupPrefab_1".to_string(),
            PickupSection {
                look: LookSection::sized(18.0, 18.0, [1.0, 0.9, 0.3]),
                ..default()
            },
        );
        pickups.insert(
            "PickupPrefab_2".to_string(),
            PickupSection {
                look: LookSection::sized(10.0, 20.0, [0.9, 0.9, 1.0]),
                score: 500,
                ..default()
            },
        );

        Self {
            window: WindowSection::default(),
            game: GameSection::default(),
            waves: WavesSection::default(),
            camera: CameraSection::default(),
            nuke_dispenser: NukeDispenserSection::default(),
            cannon: CannonSection::default(),
            pea_shooter: PeaShooterSection::default(),
            trap_ejector: TrapEjectorSection::default(),
            players,
            enemies,
            projectiles,
            pickups,
            high_scores: HighScoreSection::default(),
        }
    }
}
