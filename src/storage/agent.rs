use serde::{Deserialize, Serialize};

use super::persistence::SnapshotStore;
use crate::error::ResourceError;
use crate::memo::MemoCache;
use crate::peer::{Agent, Effect, Input};
use crate::protocol::{Event, Role, Snapshot, ValueMap, ValuePair};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageCommand {
    /// Go offline: stop answering and tell compute.
    Disconnect,
    Reconnect,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageStatus {
    pub confirmed: bool,
    pub paused: bool,
    pub cached: usize,
    pub highest: Option<u64>,
    pub message_count: u64,
}

pub struct StorageAgent<S: SnapshotStore> {
    confirmed: bool,
    paused: bool,
    cache: MemoCache,
    message_count: u64,
    store: S,
}

impl<S: SnapshotStore> StorageAgent<S> {
    pub fn new(store: S) -> Self {
        Self {
            confirmed: false,
            paused: false,
            cache: MemoCache::new(),
            message_count: 0,
            store,
        }
    }

    pub fn cache(&self) -> &MemoCache {
        &self.cache
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn message_count(&self) -> u64 {
        self.message_count
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            values: self.cache.entries(),
            target_n: self.cache.highest(),
            original_target_n: None,
            message_count: self.message_count,
        }
    }

    /// Reloads the cache from the store, falling back to the base values.
    pub fn restore_snapshot(&mut self) {
        match self.store.load() {
            Ok(snapshot) => {
                let (cache, summary) = MemoCache::from_entries(snapshot.values);
                if summary.rejected > 0 {
                    tracing::warn!("Skipped {} inconsistent persisted values", summary.rejected);
                }
                self.cache = cache;
                self.message_count = snapshot.message_count;
                tracing::info!("Restored {} values from snapshot", self.cache.len());
            }
            Err(ResourceError::Missing(path)) => {
                tracing::info!("No snapshot at {}; starting from base values", path.display());
                self.cache = MemoCache::new();
            }
            Err(e) => {
                tracing::warn!("Failed to restore snapshot, starting from base values: {}", e);
                self.cache = MemoCache::new();
            }
        }
    }

    pub fn persist_snapshot(&mut self) {
        let snapshot = self.snapshot();
        if let Err(e) = self.store.save(&snapshot) {
            tracing::error!("Failed to persist snapshot: {}", e);
        }
    }

    fn on_value_request(&mut self, pair: ValuePair, effects: &mut Vec<Effect>) {
        match (self.cache.get(pair.n1), self.cache.get(pair.n2)) {
            (Some(v1), Some(v2)) => {
                let mut values = ValueMap::new();
                values.insert(pair.n1, v1);
                values.insert(pair.n2, v2);
                self.message_count += 1;
                tracing::debug!("Found F({}) and F({})", pair.n1, pair.n2);
                effects.push(Effect::Send(Event::ValuesFound(values)));
            }
            _ => {
                tracing::debug!("F({}) or F({}) not stored", pair.n1, pair.n2);
                effects.push(Effect::Send(Event::ValuesNotFound(pair)));
            }
        }
    }

    fn on_store_values(&mut self, values: ValueMap) {
        if values.is_empty() {
            tracing::warn!("Received an empty computed-result");
            return;
        }

        let summary = self.cache.merge_all(values);
        if summary.accepted() == 0 {
            return;
        }

        self.message_count += 1;
        if summary.inserted > 0 {
            tracing::info!(
                "Stored {} new values (highest F({}))",
                summary.inserted,
                self.cache.highest().unwrap_or_default()
            );
        }
        self.persist_snapshot();
    }

    fn pause(&mut self, effects: &mut Vec<Effect>) {
        if self.paused {
            tracing::debug!("Storage already disconnected");
            return;
        }
        tracing::info!("Disconnecting storage");
        self.paused = true;
        effects.push(Effect::Send(Event::StorageDisconnect));
    }

    fn resume(&mut self, effects: &mut Vec<Effect>) {
        if !self.paused {
            tracing::debug!("Storage is already connected");
            return;
        }
        tracing::info!("Reconnecting storage with {} values", self.cache.len());
        self.paused = false;
        effects.push(Effect::Send(Event::StorageReconnect(Some(self.snapshot()))));
    }
}

impl<S: SnapshotStore + 'static> Agent for StorageAgent<S> {
    type Command = StorageCommand;
    type Status = StorageStatus;

    fn role(&self) -> Role {
        Role::Storage
    }

    fn dispatch(&mut self, input: Input<StorageCommand>) -> Vec<Effect> {
        let mut effects = Vec::new();

        match input {
            Input::Event(Event::RoleConfirmed(Role::Storage)) => {
                tracing::info!("Confirmed as storage");
                self.confirmed = true;
                self.paused = false;
                self.restore_snapshot();
                effects.push(Effect::Send(Event::StorageReconnect(Some(self.snapshot()))));
            }
            Input::Event(Event::ForceDisconnect(reason)) => {
                tracing::warn!("Forced off the storage role: {}", reason);
                self.confirmed = false;
                self.paused = false;
                effects.push(Effect::Close);
            }
            input if !self.confirmed => {
                tracing::debug!("Ignoring {:?} before role confirmation", input);
            }
            Input::Event(event) => match event {
                Event::RequestValues(_) | Event::ComputedResult(_) if self.paused => {
                    tracing::debug!("Paused; ignoring '{}'", event.name());
                }
                Event::RequestValues(pair) => self.on_value_request(pair, &mut effects),
                Event::ComputedResult(values) => self.on_store_values(values),
                Event::ReconnectRequested => self.resume(&mut effects),
                other => tracing::debug!("Storage ignores '{}'", other.name()),
            },
            Input::Command(StorageCommand::Disconnect) => self.pause(&mut effects),
            Input::Command(StorageCommand::Reconnect) => self.resume(&mut effects),
            Input::Resume | Input::CountdownTick(_) => {}
        }

        effects
    }

    fn status(&self) -> StorageStatus {
        StorageStatus {
            confirmed: self.confirmed,
            paused: self.paused,
            cached: self.cache.len(),
            highest: self.cache.highest(),
            message_count: self.message_count,
        }
    }
}
