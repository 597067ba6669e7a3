//! Pairwise collision pass.
//!
//! Every collidable entity goes into a flat working list, every unordered pair is tested once,
//! and the first matching rule decides what happens to the pair:
//!
//! ```text
//! 1. projectile <-> enemy     unless the enemy fired it: both die, EnemyDestroyed(score, ok)
//! 2. projectile <-> player    unless the player fired it: both die, PlayerDestroyed(lives)
//! 3. player     <-> enemy     both die, both events
//! 4. player     <-> pickup    bombs below capacity, not a civilian: bombs + 1, SmartBombGrabbed
//! 5. lander     <-> civilian  civilian not yet captured: lander Capturing, civilian captured
//! ```
//!
//! Entities destroyed earlier in the pass are skipped for the rest of it.

use bevy::prelude::*;

use super::obb::BoundBox;
use crate::plugins::bus::{EventBus, PlayEvent, PlayEventKind};
use crate::plugins::store::Destroyer;
use crate::plugins::store::components::*;

/// What the collision rules need to know about one collider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContactTags {
    pub player: bool,
    pub enemy: bool,
    pub lander: bool,
    /// Who fired it, if this is a projectile.
    pub projectile: Option<Faction>,
    pub pickup: bool,
    pub civilian: bool,
    pub captured: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collider {
    pub entity: Entity,
    pub bounds: BoundBox,
    pub tags: ContactTags,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contact {
    EnemyShot { projectile: Entity, enemy: Entity },
    PlayerShot { projectile: Entity, player: Entity },
    Rammed { player: Entity, enemy: Entity },
    BombGrabbed { player: Entity, pickup: Entity },
    Abduction { lander: Entity, civilian: Entity },
}

fn ordered<'a>(
    a: &'a Collider,
    b: &'a Collider,
    first: impl Fn(&ContactTags) -> bool,
    second: impl Fn(&ContactTags) -> bool,
) -> Option<(&'a Collider, &'a Collider)> {
    if first(&a.tags) && second(&b.tags) {
        Some((a, b))
    } else if first(&b.tags) && second(&a.tags) {
        Some((b, a))
    } else {
        None
    }
}

/// Decide what an overlapping pair does. `None` leaves the pair alone.
///
/// A rule whose archetypes match but whose guard fails still ends the search. The pickup rule
/// is the exception: with a full dispenser it does not apply at all.
pub fn classify_contact(a: &Collider, b: &Collider, bomb_room: bool) -> Option<Contact> {
    if let Some((shot, enemy)) = ordered(a, b, |t| t.projectile.is_some(), |t| t.enemy) {
        return (shot.tags.projectile != Some(Faction::Enemy)).then_some(Contact::EnemyShot {
            projectile: shot.entity,
            enemy: enemy.entity,
        });
    }

    if let Some((shot, player)) = ordered(a, b, |t| t.projectile.is_some(), |t| t.player) {
        return (shot.tags.projectile != Some(Faction::Player)).then_some(Contact::PlayerShot {
            projectile: shot.entity,
            player: player.entity,
        });
    }

    if let Some((player, enemy)) = ordered(a, b, |t| t.player, |t| t.enemy) {
        return Some(Contact::Rammed {
            player: player.entity,
            enemy: enemy.entity,
        });
    }

    if bomb_room {
        if let Some((player, pickup)) = ordered(a, b, |t| t.player, |t| t.pickup) {
            return (!pickup.tags.civilian).then_some(Contact::BombGrabbed {
                player: player.entity,
                pickup: pickup.entity,
            });
        }
    }

    if let Some((lander, civilian)) = ordered(a, b, |t| t.lander, |t| t.civilian) {
        return (!civilian.tags.captured).then_some(Contact::Abduction {
            lander: lander.entity,
            civilian: civilian.entity,
        });
    }

    None
}

type ColliderData = (
    Entity,
    &'static BoundBox,
    Has<Player>,
    Has<Enemy>,
    Has<Lander>,
    Option<&'static Sender>,
    Has<Projectile>,
    Has<Pickup>,
    Has<Civilian>,
);

pub fn resolve_collisions(
    q_colliders: Query<ColliderData, With<Collidable>>,
    mut q_stats: Query<(&mut Lives, &mut NukeDispenser), With<PersistentStats>>,
    q_scores: Query<&Score>,
    mut q_captures: Query<&mut CaptureInfo>,
    mut destroyer: Destroyer,
    mut bus: ResMut<EventBus>,
    mut colliders: Local<Vec<Collider>>,
) {
    for (entity, bounds, player, enemy, lander, sender, projectile, pickup, civilian) in &q_colliders
    {
        if destroyer.is_doomed(entity) {
            continue;
        }
        colliders.push(Collider {
            entity,
            bounds: *bounds,
            tags: ContactTags {
                player,
                enemy,
                lander,
                projectile: projectile.then(|| sender.map_or(Faction::Enemy, |s| s.0)),
                pickup,
                civilian,
                captured: q_captures.get(entity).is_ok_and(|c| c.captured),
            },
        });
    }

    let mut stats = q_stats.single_mut().ok();

    for i in 0..colliders.len() {
        for j in (i + 1)..colliders.len() {
            let (a, b) = (colliders[i], colliders[j]);
            if destroyer.is_doomed(a.entity) || destroyer.is_doomed(b.entity) {
                continue;
            }
            let bomb_room = stats.as_ref().is_some_and(|(_, nukes)| nukes.has_room());
            let Some(contact) = classify_contact(&a, &b, bomb_room) else {
                continue;
            };
            if !a.bounds.intersects(&b.bounds) {
                continue;
            }

            match contact {
                Contact::EnemyShot { projectile, enemy } => {
                    destroyer.destroy(projectile);
                    enemy_destroyed(enemy, &q_scores, &mut destroyer, &mut bus);
                }
                Contact::PlayerShot { projectile, player } => {
                    destroyer.destroy(projectile);
                    let lives = stats.as_mut().map(|(lives, _)| &mut **lives);
                    player_destroyed(player, lives, &mut destroyer, &mut bus);
                }
                Contact::Rammed { player, enemy } => {
                    let lives = stats.as_mut().map(|(lives, _)| &mut **lives);
                    player_destroyed(player, lives, &mut destroyer, &mut bus);
                    enemy_destroyed(enemy, &q_scores, &mut destroyer, &mut bus);
                }
                Contact::BombGrabbed { pickup, .. } => {
                    let Some((_, nukes)) = stats.as_mut() else {
                        continue;
                    };
                    if destroyer.destroy(pickup) {
                        nukes.bombs += 1;
                        bus.publish(PlayEvent::new(
                            PlayEventKind::SmartBombGrabbed,
                            nukes.bombs,
                        ));
                    }
                }
                Contact::Abduction { lander, civilian } => {
                    let Ok(mut capture) = q_captures.get_mut(civilian) else {
                        continue;
                    };
                    capture.captured = true;
                    capture.captor = Some(lander);
                    destroyer.commands().entity(lander).try_insert(Capturing);
                    for collider in colliders.iter_mut().filter(|c| c.entity == civilian) {
                        collider.tags.captured = true;
                    }
                    debug!("{lander} captured {civilian}");
                }
            }
        }
    }

    colliders.clear();
}

fn enemy_destroyed(
    enemy: Entity,
    q_scores: &Query<&Score>,
    destroyer: &mut Destroyer,
    bus: &mut EventBus,
) {
    if destroyer.destroy(enemy) {
        let score = q_scores.get(enemy).map_or(0, |s| s.0);
        bus.publish(PlayEvent::enemy_destroyed(score, true));
    }
}

fn player_destroyed(
    player: Entity,
    lives: Option<&mut Lives>,
    destroyer: &mut Destroyer,
    bus: &mut EventBus,
) {
    if !destroyer.destroy(player) {
        return;
    }
    let left = match lives {
        Some(lives) => {
            lives.0 = lives.0.saturating_sub(1);
            lives.0
        }
        None => 0,
    };
    info!("player destroyed, {left} lives left");
    bus.publish(PlayEvent::player_destroyed(left));
}
