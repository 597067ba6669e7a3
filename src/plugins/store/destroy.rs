//! Deferred destruction.
//!
//! `Destroyer::destroy` queues a despawn that lands at the next sync point, so it is safe
//! inside any query loop. The `Doomed` ledger remembers what was destroyed this frame. Later
//! passes in the same frame use it to skip entities that are already on their way out.

use bevy::ecs::system::SystemParam;
use bevy::platform::collections::HashSet;
use bevy::prelude::*;

/// Entities destroyed since the start of the frame.
#[derive(Resource, Debug, Default)]
pub struct Doomed(HashSet<Entity>);

impl Doomed {
    pub fn contains(&self, entity: Entity) -> bool {
        self.0.contains(&entity)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

#[derive(SystemParam)]
pub struct Destroyer<'w, 's> {
    commands: Commands<'w, 's>,
    doomed: ResMut<'w, Doomed>,
}

impl<'w, 's> Destroyer<'w, 's> {
    /// Queue `entity` for despawn. Returns `false` if it is already doomed or not alive.
    pub fn destroy(&mut self, entity: Entity) -> bool {
        if self.doomed.contains(entity) {
            return false;
        }
        let Ok(mut entity_commands) = self.commands.get_entity(entity) else {
            return false;
        };
        entity_commands.try_despawn();
        self.doomed.0.insert(entity);
        true
    }

    pub fn is_doomed(&self, entity: Entity) -> bool {
        self.doomed.contains(entity)
    }

    pub fn commands(&mut self) -> &mut Commands<'w, 's> {
        &mut self.commands
    }
}

pub fn clear_doomed(mut doomed: ResMut<Doomed>) {
    doomed.clear();
}
