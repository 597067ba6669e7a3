//! Prefab templates and the blueprints instantiated from them.
//!
//! A `Prefab` is never spawned. `PrefabRegistry::instantiate` copies it into a `Blueprint`,
//! callers fill in the per-instance overrides (transform, velocity, sender), and
//! `Blueprint::spawn` turns it into components. Blueprints are plain `Send` data, so timer
//! threads build them and hand them to the main thread through the staging queue.

use std::sync::Arc;

use bevy::platform::collections::HashMap;
use bevy::prelude::*;

use super::components::*;
use crate::plugins::physics::obb::BoundBox;

/// Prefab name prefixes. The numeric suffix is the archetype index.
pub const PLAYER_PREFAB: &str = "PlayerPrefab";
pub const ENEMY_PREFAB: &str = "EnemyPrefab";
pub const PROJECTILE_PREFAB: &str = "ProjectilePrefab";
pub const PICKUP_PREFAB: &str = "PickupPrefab";

pub fn prefab_name(prefix: &str, index: u32) -> String {
    format!("{prefix}_{index}")
}

/// Split `EnemyPrefab_2` into `("EnemyPrefab", 2)`.
pub fn parse_prefab_name(name: &str) -> Option<(&str, u32)> {
    let (prefix, index) = name.rsplit_once('_')?;
    Some((prefix, index.parse().ok()?))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnemyKind {
    Lander = 1,
    Bomber = 2,
    Baiter = 3,
}

impl EnemyKind {
    pub fn from_index(index: u32) -> Option<Self> {
        match index {
            1 => Some(Self::Lander),
            2 => Some(Self::Bomber),
            3 => Some(Self::Baiter),
            _ => None,
        }
    }

    pub fn prefab(self) -> String {
        prefab_name(ENEMY_PREFAB, self as u32)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjectileKind {
    Cannonball = 1,
    Lazer = 2,
    Pea = 3,
    Trap = 4,
}

impl ProjectileKind {
    pub fn from_index(index: u32) -> Option<Self> {
        match index {
            1 => Some(Self::Cannonball),
            2 => Some(Self::Lazer),
            3 => Some(Self::Pea),
            4 => Some(Self::Trap),
            _ => None,
        }
    }

    pub fn prefab(self) -> String {
        prefab_name(PROJECTILE_PREFAB, self as u32)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PickupKind {
    SmartBomb = 1,
    Civilian = 2,
}

impl PickupKind {
    pub fn from_index(index: u32) -> Option<Self> {
        match index {
            1 => Some(Self::SmartBomb),
            2 => Some(Self::Civilian),
            _ => None,
        }
    }

    pub fn prefab(self) -> String {
        prefab_name(PICKUP_PREFAB, self as u32)
    }
}

/// Sprite appearance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Look {
    pub color: Color,
    pub size: Vec2,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerTemplate {
    pub move_info: PlayerMoveInfo,
    pub flip: FlipInfo,
    pub haptics: PlayerHaptics,
    pub charge: ChargeInfo,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EnemyBehavior {
    Lander { pea: PeaShooter },
    Bomber { trap: BomberTrap },
    Baiter {
        movement: BaiterMovementStats,
        boost: SpeedBoost,
        cannon: Cannon,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnemyTemplate {
    pub score: u32,
    pub speed: f32,
    pub batch_min: u32,
    pub batch_max: u32,
    pub player_space: f32,
    pub flip: FlipInfo,
    pub behavior: EnemyBehavior,
}

impl EnemyTemplate {
    pub fn kind(&self) -> EnemyKind {
        match self.behavior {
            EnemyBehavior::Lander { .. } => EnemyKind::Lander,
            EnemyBehavior::Bomber { .. } => EnemyKind::Bomber,
            EnemyBehavior::Baiter { .. } => EnemyKind::Baiter,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectileTemplate {
    pub kind: ProjectileKind,
    pub speed: f32,
    pub offset: f32,
    pub glow: Option<Glow>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PickupTemplate {
    SmartBomb,
    Civilian {
        score: u32,
        speed: f32,
        hang_offset: f32,
        movement: CiviMovementStats,
        flip: FlipInfo,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Archetype {
    Player(PlayerTemplate),
    Enemy(EnemyTemplate),
    Projectile(ProjectileTemplate),
    Pickup(PickupTemplate),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Prefab {
    pub transform: Transform,
    pub half_extents: Vec3,
    pub look: Look,
    pub archetype: Archetype,
}

impl Prefab {
    pub fn enemy(&self) -> Option<&EnemyTemplate> {
        match &self.archetype {
            Archetype::Enemy(enemy) => Some(enemy),
            _ => None,
        }
    }

    pub fn projectile(&self) -> Option<&ProjectileTemplate> {
        match &self.archetype {
            Archetype::Projectile(projectile) => Some(projectile),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PrefabRegistry {
    prefabs: HashMap<String, Prefab>,
}

impl PrefabRegistry {
    /// Returns the template previously registered under `name`, if any.
    pub fn register(&mut self, name: impl Into<String>, prefab: Prefab) -> Option<Prefab> {
        self.prefabs.insert(name.into(), prefab)
    }

    pub fn lookup(&self, name: &str) -> Option<&Prefab> {
        self.prefabs.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.prefabs.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.prefabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefabs.is_empty()
    }

    /// Copy the named template into a fresh blueprint. A miss is reported as `None`.
    pub fn instantiate(&self, name: &str) -> Option<Blueprint> {
        match self.lookup(name) {
            Some(prefab) => Some(Blueprint::from_prefab(name, prefab)),
            None => {
                debug!("prefab {name} is not registered, skipping spawn");
                None
            }
        }
    }
}

/// Shared, copy-on-write handle to the registry. Timer threads hold clones of the `Arc`.
#[derive(Resource, Debug, Clone, Default)]
pub struct Prefabs(pub Arc<PrefabRegistry>);

impl Prefabs {
    pub fn register(&mut self, name: impl Into<String>, prefab: Prefab) -> Option<Prefab> {
        Arc::make_mut(&mut self.0).register(name, prefab)
    }

    pub fn snapshot(&self) -> Arc<PrefabRegistry> {
        Arc::clone(&self.0)
    }
}

impl std::ops::Deref for Prefabs {
    type Target = PrefabRegistry;

    fn deref(&self) -> &PrefabRegistry {
        &self.0
    }
}

/// One entity to be, copied from a prefab with its per-instance overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct Blueprint {
    pub name: String,
    pub transform: Transform,
    pub velocity: Option<Vec3>,
    pub sender: Option<Faction>,
    pub prefab: Prefab,
}

impl Blueprint {
    fn from_prefab(name: &str, prefab: &Prefab) -> Self {
        Self {
            name: name.to_string(),
            transform: prefab.transform,
            velocity: None,
            sender: None,
            prefab: prefab.clone(),
        }
    }

    pub fn at(mut self, translation: Vec3) -> Self {
        self.transform.translation = translation;
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = Some(velocity);
        self
    }

    pub fn fired_by(mut self, faction: Faction) -> Self {
        self.sender = Some(faction);
        self
    }

    pub fn is_player(&self) -> bool {
        matches!(self.prefab.archetype, Archetype::Player(_))
    }

    pub fn is_enemy(&self) -> bool {
        matches!(self.prefab.archetype, Archetype::Enemy(_))
    }

    /// Insert the blueprint into the world. Every spawned entity is `Alive` and `Collidable`.
    pub fn spawn(self, commands: &mut Commands) -> Entity {
        let Blueprint {
            name,
            transform,
            velocity,
            sender,
            prefab,
        } = self;

        let mut entity = commands.spawn((
            Name::new(name),
            Alive,
            Collidable,
            BoundBox::at(&transform, prefab.half_extents),
            transform,
            Sprite {
                color: prefab.look.color,
                custom_size: Some(prefab.look.size),
                ..default()
            },
        ));

        if let Some(velocity) = velocity {
            entity.insert(Velocity(velocity));
        }

        match prefab.archetype {
            Archetype::Player(player) => {
                entity.insert((
                    Player,
                    ControllerId(0),
                    Velocity(velocity.unwrap_or_default()),
                    Acceleration::default(),
                    player.move_info,
                    player.flip,
                    player.haptics,
                    player.charge,
                ));
            }
            Archetype::Enemy(enemy) => {
                entity.insert((
                    Enemy,
                    Score(enemy.score),
                    Speed(enemy.speed),
                    PlayerSpace(enemy.player_space),
                    enemy.flip,
                ));
                match enemy.behavior {
                    EnemyBehavior::Lander { pea } => {
                        entity.insert((Lander, pea));
                    }
                    EnemyBehavior::Bomber { trap } => {
                        entity.insert((
                            Bomber,
                            trap,
                            Velocity(velocity.unwrap_or_default()),
                            Acceleration::default(),
                        ));
                    }
                    EnemyBehavior::Baiter {
                        movement,
                        boost,
                        cannon,
                    } => {
                        entity.insert((Baiter, movement, boost, cannon));
                    }
                }
            }
            Archetype::Projectile(projectile) => {
                entity.insert((
                    Projectile,
                    Speed(projectile.speed),
                    Sender(sender.unwrap_or(Faction::Enemy)),
                ));
                if let Some(glow) = projectile.glow {
                    entity.insert(glow);
                }
                match projectile.kind {
                    ProjectileKind::Cannonball => entity.insert(Cannonball),
                    ProjectileKind::Lazer => entity.insert((Lazer, Offset(projectile.offset))),
                    ProjectileKind::Pea => entity.insert(Pea),
                    ProjectileKind::Trap => entity.insert(Trap),
                };
            }
            Archetype::Pickup(PickupTemplate::SmartBomb) => {
                entity.insert((Pickup, SmartBomb));
            }
            Archetype::Pickup(PickupTemplate::Civilian {
                score,
                speed,
                hang_offset,
                movement,
                flip,
            }) => {
                entity.insert((
                    Pickup,
                    Civilian,
                    Score(score),
                    Speed(speed),
                    Offset(hang_offset),
                    CaptureInfo::default(),
                    movement,
                    flip,
                ));
            }
        }

        entity.id()
    }
}
