//! Async staging queue.
//!
//! Background timers never touch the world. They build `Blueprint`s and send them here. The
//! main thread drains the channel once per frame, first thing in `FrameSet::Merge`.
//!
//! Every send is stamped with the session epoch. Ending a session bumps the epoch, and
//! anything stamped earlier is dropped at merge time instead of leaking into the next session.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use bevy::prelude::*;
use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};

use super::components::{Lives, PersistentStats};
use super::prefab::Blueprint;
use crate::plugins::bus::{EventBus, PlayEvent, PlayEventKind};

pub const STAGING_CAPACITY: usize = 1024;

#[derive(Debug)]
struct Staged {
    epoch: u32,
    blueprint: Blueprint,
}

/// Producer side, cloned into every timer callback.
#[derive(Clone, Debug)]
pub struct StagingSender {
    tx: Sender<Staged>,
    epoch: Arc<AtomicU32>,
}

impl StagingSender {
    /// Queue a blueprint for the next merge. Never blocks: the main thread stages too, and it
    /// is the only consumer. Returns `false` and skips the spawn when the queue is full or gone.
    pub fn stage(&self, blueprint: Blueprint) -> bool {
        let epoch = self.epoch.load(Ordering::Acquire);
        match self.tx.try_send(Staged { epoch, blueprint }) {
            Ok(()) => true,
            Err(TrySendError::Full(staged)) => {
                warn!("staging queue full, skipping {}", staged.blueprint.name);
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

#[derive(Resource, Debug)]
pub struct StagingQueue {
    tx: Sender<Staged>,
    rx: Receiver<Staged>,
    epoch: Arc<AtomicU32>,
}

impl Default for StagingQueue {
    fn default() -> Self {
        let (tx, rx) = bounded(STAGING_CAPACITY);
        Self {
            tx,
            rx,
            epoch: Arc::new(AtomicU32::new(0)),
        }
    }
}

impl StagingQueue {
    pub fn sender(&self) -> StagingSender {
        StagingSender {
            tx: self.tx.clone(),
            epoch: Arc::clone(&self.epoch),
        }
    }

    pub fn epoch(&self) -> u32 {
        self.epoch.load(Ordering::Acquire)
    }

    /// Invalidate everything staged so far, including sends still in flight.
    pub fn begin_epoch(&self) -> u32 {
        let previous = self.epoch.fetch_add(1, Ordering::AcqRel);
        let dropped = self.rx.try_iter().count();
        if dropped > 0 {
            debug!("discarded {dropped} staged blueprints");
        }
        previous.wrapping_add(1)
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

/// Spawn everything staged before this point.
pub fn merge_staged_entities(
    staging: Res<StagingQueue>,
    mut commands: Commands,
    mut bus: ResMut<EventBus>,
    stats: Option<Single<&Lives, With<PersistentStats>>>,
) {
    let epoch = staging.epoch();
    let queued = staging.rx.len();
    let lives = stats.map(|lives| lives.into_inner().0).unwrap_or_default();

    for staged in staging.rx.try_iter().take(queued) {
        if staged.epoch != epoch {
            debug!("dropping stale blueprint {}", staged.blueprint.name);
            continue;
        }
        let respawn = staged.blueprint.is_player();
        staged.blueprint.spawn(&mut commands);
        if respawn {
            bus.publish(PlayEvent::new(PlayEventKind::PlayerRespawned, lives));
        }
    }
}
