//! Build the prefab registry from config sections.

use std::sync::Arc;
use std::time::Duration;

use bevy::prelude::*;

use super::components::*;
use super::prefab::*;
use crate::common::config::{
    EnemySection, GameConfig, LookSection, PickupSection, PlayerSection, ProjectileSection,
    RumbleSection,
};
use crate::common::error::InitError;

/// Boxes are deep enough that draw depth never separates two sprites.
const BOX_HALF_DEPTH: f32 = 50.0;

impl Prefabs {
    /// Register every prefab section. Unknown or missing optional archetypes are logged and
    /// skipped; only the player prefab is required.
    pub fn from_config(config: &GameConfig) -> Result<Self, InitError> {
        let mut registry = PrefabRegistry::default();

        for (name, section) in &config.players {
            if index_of(name, PLAYER_PREFAB).is_none() {
                warn!("unknown player prefab section {name}, skipping");
                continue;
            }
            registry.register(name.as_str(), player_prefab(section));
        }

        for (name, section) in &config.enemies {
            let Some(kind) = index_of(name, ENEMY_PREFAB).and_then(EnemyKind::from_index) else {
                warn!("unknown enemy prefab section {name}, skipping");
                continue;
            };
            registry.register(name.as_str(), enemy_prefab(kind, section, config));
        }

        for (name, section) in &config.projectiles {
            let Some(kind) =
                index_of(name, PROJECTILE_PREFAB).and_then(ProjectileKind::from_index)
            else {
                warn!("unknown projectile prefab section {name}, skipping");
                continue;
            };
            registry.register(name.as_str(), projectile_prefab(kind, section));
        }

        for (name, section) in &config.pickups {
            let Some(kind) = index_of(name, PICKUP_PREFAB).and_then(PickupKind::from_index) else {
                warn!("unknown pickup prefab section {name}, skipping");
                continue;
            };
            registry.register(name.as_str(), pickup_prefab(kind, section));
        }

        let player = prefab_name(PLAYER_PREFAB, 1);
        if !registry.contains(&player) {
            return Err(InitError::MissingPrefab(player));
        }

        let optional = [
            EnemyKind::Lander.prefab(),
            EnemyKind::Bomber.prefab(),
            EnemyKind::Baiter.prefab(),
            ProjectileKind::Cannonball.prefab(),
            ProjectileKind::Lazer.prefab(),
            ProjectileKind::Pea.prefab(),
            ProjectileKind::Trap.prefab(),
            PickupKind::SmartBomb.prefab(),
            PickupKind::Civilian.prefab(),
        ];
        for name in optional.iter().filter(|name| !registry.contains(name)) {
            warn!("prefab {name} is not configured, its spawns will be skipped");
        }

        info!("registered {} prefabs", registry.len());
        Ok(Self(Arc::new(registry)))
    }
}

fn index_of(name: &str, expected: &str) -> Option<u32> {
    parse_prefab_name(name)
        .filter(|(prefix, _)| *prefix == expected)
        .map(|(_, index)| index)
}

fn base(look: &LookSection) -> (Transform, Vec3, Look) {
    let [rx, ry, rz] = look.rotation_deg;
    let transform = Transform::from_xyz(0.0, 0.0, look.depth).with_rotation(Quat::from_euler(
        EulerRot::XYZ,
        rx.to_radians(),
        ry.to_radians(),
        rz.to_radians(),
    ));
    let [w, h] = look.size;
    let [r, g, b] = look.color;
    (
        transform,
        Vec3::new(w * 0.5, h * 0.5, BOX_HALF_DEPTH),
        Look {
            color: Color::srgb(r, g, b),
            size: Vec2::new(w, h),
        },
    )
}

fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

fn rumble(section: &RumbleSection) -> Rumble {
    Rumble {
        pan: section.pan.clamp(0.0, 1.0),
        duration: ms(section.duration_ms),
        strength: section.strength.clamp(0.0, 1.0),
    }
}

fn player_prefab(section: &PlayerSection) -> Prefab {
    let (transform, half_extents, look) = base(&section.look);
    Prefab {
        transform,
        half_extents,
        look,
        archetype: Archetype::Player(PlayerTemplate {
            move_info: PlayerMoveInfo {
                h_accel: section.h_accel,
                h_decel: section.h_decel,
                h_max_speed: section.h_max_speed,
                h_flip_accel: section.h_flip_accel,
                v_accel: section.v_accel,
                v_decel: section.v_decel,
                v_max_speed: section.v_max_speed,
                v_flip_accel: section.v_flip_accel,
            },
            flip: FlipInfo::new(ms(section.flip_time_ms)),
            haptics: PlayerHaptics {
                fire_lazer: rumble(&section.haptics.fire_lazer),
                player_death: rumble(&section.haptics.player_death),
                detonate: rumble(&section.haptics.detonate),
            },
            charge: ChargeInfo {
                full_charge: ms(section.full_charge_ms),
                ..default()
            },
        }),
    }
}

fn enemy_prefab(kind: EnemyKind, section: &EnemySection, config: &GameConfig) -> Prefab {
    let (transform, half_extents, look) = base(&section.look);
    let behavior = match kind {
        EnemyKind::Lander => EnemyBehavior::Lander {
            pea: PeaShooter {
                offset: config.pea_shooter.offset,
                range: config.pea_shooter.range,
                cooldown: cooldown(ms(config.pea_shooter.fire_rate_ms)),
            },
        },
        EnemyKind::Bomber => EnemyBehavior::Bomber {
            trap: BomberTrap {
                launch_offset: config.trap_ejector.launch_offset,
                cooldown: cooldown(ms(config.trap_ejector.fire_rate_ms)),
            },
        },
        EnemyKind::Baiter => {
            let interval =
                MillisRange::new(section.boost_interval_min_ms, section.boost_interval_max_ms);
            EnemyBehavior::Baiter {
                movement: BaiterMovementStats {
                    spawn_dist_min: section.spawn_dist_min.min(section.spawn_dist_max),
                    spawn_dist_max: section.spawn_dist_max.max(section.spawn_dist_min),
                    follow_distance: section.follow_distance,
                },
                boost: SpeedBoost {
                    boosting: false,
                    moving_right: true,
                    speed: section.boost_speed,
                    interval,
                    duration: MillisRange::new(
                        section.boost_duration_min_ms,
                        section.boost_duration_max_ms,
                    ),
                    timer: Timer::new(ms(interval.min), TimerMode::Once),
                },
                cannon: Cannon {
                    launch_offset: config.cannon.launch_offset,
                    aim_lead: config.cannon.aim_lead_scaler,
                    cooldown: cooldown(ms(config.cannon.fire_rate_ms)),
                },
            }
        }
    };

    Prefab {
        transform,
        half_extents,
        look,
        archetype: Archetype::Enemy(EnemyTemplate {
            score: section.score,
            speed: section.speed,
            batch_min: section.batch_size_min.min(section.batch_size_max),
            batch_max: section.batch_size_max.max(section.batch_size_min),
            player_space: section.player_space,
            flip: FlipInfo::new(ms(section.flip_time_ms)),
            behavior,
        }),
    }
}

fn projectile_prefab(kind: ProjectileKind, section: &ProjectileSection) -> Prefab {
    let (transform, half_extents, look) = base(&section.look);
    let glow = section.glow.as_ref().map(|glow| {
        let [r, g, b] = glow.color;
        Glow {
            color: Color::srgb(r, g, b),
            radius: glow.radius,
        }
    });
    Prefab {
        transform,
        half_extents,
        look,
        archetype: Archetype::Projectile(ProjectileTemplate {
            kind,
            speed: section.speed,
            offset: section.offset,
            glow,
        }),
    }
}

fn pickup_prefab(kind: PickupKind, section: &PickupSection) -> Prefab {
    let (transform, half_extents, look) = base(&section.look);
    let template = match kind {
        PickupKind::SmartBomb => PickupTemplate::SmartBomb,
        PickupKind::Civilian => {
            let dir_change = MillisRange::new(section.dir_change_min_ms, section.dir_change_max_ms);
            PickupTemplate::Civilian {
                score: section.score,
                speed: section.speed,
                hang_offset: section.hang_offset,
                movement: CiviMovementStats {
                    walking_right: true,
                    dir_change,
                    timer: Timer::new(ms(dir_change.min), TimerMode::Once),
                },
                flip: FlipInfo::new(ms(section.flip_time_ms)),
            }
        }
    };
    Prefab {
        transform,
        half_extents,
        look,
        archetype: Archetype::Pickup(template),
    }
}
