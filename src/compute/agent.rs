use super::types::{ComputeCommand, ComputeStatus, Countdown, Phase};
use crate::config::COUNTDOWN_TICKS;
use crate::memo::{MemoCache, PendingQueue, RequestTracker};
use crate::peer::{Agent, Effect, Input};
use crate::protocol::{Event, MAX_INDEX, Role, Snapshot, ValueMap, ValuePair};

pub struct ComputeAgent {
    confirmed: bool,
    phase: Phase,
    target: Option<u64>,
    original_target: Option<u64>,
    last_resolved: Option<u64>,
    message_count: u64,

    cache: MemoCache,
    pending: PendingQueue,
    requests: RequestTracker,

    storage_reachable: bool,
    /// `computed-result` messages sent but not yet reported delivered.
    in_flight: u32,
    countdown: Option<Countdown>,
    countdown_ticks: u32,
    countdown_generation: u64,
}

impl ComputeAgent {
    pub fn new(countdown_ticks: u32) -> Self {
        Self {
            confirmed: false,
            phase: Phase::Idle,
            target: None,
            original_target: None,
            last_resolved: None,
            message_count: 0,
            cache: MemoCache::new(),
            pending: PendingQueue::new(),
            requests: RequestTracker::new(),
            storage_reachable: true,
            in_flight: 0,
            countdown: None,
            countdown_ticks,
            countdown_generation: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn cache(&self) -> &MemoCache {
        &self.cache
    }

    pub fn pending(&self) -> &PendingQueue {
        &self.pending
    }

    pub fn requests(&self) -> &RequestTracker {
        &self.requests
    }

    pub fn message_count(&self) -> u64 {
        self.message_count
    }

    pub fn countdown(&self) -> Option<Countdown> {
        self.countdown
    }

    // ============================================================
    // RESOLUTION
    // ============================================================

    fn advance(&mut self, effects: &mut Vec<Effect>) {
        if self.in_flight > 0 {
            return;
        }
        self.resolve(self.storage_reachable, effects);
    }

    /// Resolves the current target, then drains the pending queue and finally the original target.
    ///
    /// Stops when waiting on storage, after pushing a result (until `Resume`), or when done.
    fn resolve(&mut self, remote: bool, effects: &mut Vec<Effect>) {
        loop {
            let Some(target) = self.target else {
                return;
            };

            if target <= 1 {
                self.cache.merge(target, target);
                self.last_resolved = Some(target);
            } else if !self.cache.contains(target) {
                let pair = ValuePair::dependencies_of(target);

                match (self.cache.get(pair.n1), self.cache.get(pair.n2)) {
                    (Some(a), Some(b)) => {
                        let Some(value) = a.checked_add(b) else {
                            tracing::error!("F({}) overflows; abandoning session", target);
                            self.reset_session();
                            return;
                        };
                        self.cache.merge(target, value);
                        self.last_resolved = Some(target);
                        tracing::info!("F({}) = {}", target, value);

                        if remote {
                            let mut result = ValueMap::new();
                            result.insert(target, value);
                            self.message_count += 1;
                            self.in_flight += 1;
                            effects.push(Effect::SendAndResume(Event::ComputedResult(result)));
                        }
                    }
                    _ if remote => {
                        if self.requests.begin(pair) {
                            tracing::debug!("Requesting F({}) and F({})", pair.n1, pair.n2);
                            effects.push(Effect::Send(Event::RequestValues(pair)));
                        } else {
                            tracing::debug!("Request ({}, {}) already outstanding", pair.n1, pair.n2);
                        }
                        self.phase = Phase::AwaitingRemote;
                        return;
                    }
                    _ => {
                        self.defer_behind(target);
                        continue;
                    }
                }
            }

            if let Some(next) = self.pending.pop_min() {
                self.target = Some(next);
            } else if self.target != self.original_target {
                self.target = self.original_target;
            } else {
                self.phase = Phase::Done;
                if let Some(n) = self.original_target {
                    tracing::info!(
                        "Resolved F({}) = {} ({} messages)",
                        n,
                        self.cache.get(n).unwrap_or_default(),
                        self.message_count
                    );
                }
                return;
            }

            if self.in_flight > 0 {
                return;
            }
        }
    }

    /// Queues the missing dependencies of `target` (and `target` itself unless it is the original)
    /// and switches to the smallest queued index.
    fn defer_behind(&mut self, target: u64) {
        for index in ValuePair::dependencies_of(target).members() {
            self.pending.enqueue(index, &self.cache);
        }
        if Some(target) != self.original_target {
            self.pending.enqueue(target, &self.cache);
        }
        if let Some(next) = self.pending.pop_min() {
            self.target = Some(next);
        }
    }

    fn reset_session(&mut self) {
        self.cache.reset();
        self.pending.clear();
        self.requests.cancel_all();
        self.target = None;
        self.original_target = None;
        self.last_resolved = None;
        self.message_count = 0;
        self.phase = Phase::Idle;
    }

    // ============================================================
    // COMMANDS
    // ============================================================

    fn start_target(&mut self, n: i64, effects: &mut Vec<Effect>) {
        let target = match u64::try_from(n) {
            Ok(target) if target <= MAX_INDEX => target,
            _ => {
                tracing::warn!("Rejected target {}: expected an integer in 0..={}", n, MAX_INDEX);
                return;
            }
        };

        if self.countdown.take().is_some() {
            effects.push(Effect::CancelCountdown);
        }

        self.reset_session();
        self.target = Some(target);
        self.original_target = Some(target);
        self.phase = Phase::Computing;

        if self.storage_reachable {
            tracing::info!("Computing F({})", target);
        } else {
            tracing::warn!("Storage unreachable; computing F({}) locally", target);
        }

        self.advance(effects);
    }

    fn request_reconnect(&mut self, effects: &mut Vec<Effect>) {
        tracing::info!("Asking storage to reconnect");
        effects.push(Effect::Send(Event::RequestReconnect));
    }

    // ============================================================
    // EVENTS
    // ============================================================

    fn on_values_found(&mut self, values: ValueMap, effects: &mut Vec<Effect>) {
        self.message_count += 1;
        let summary = self.cache.merge_all(values.iter().map(|(k, v)| (*k, *v)));
        self.pending.retain_unmemoized(&self.cache);
        self.requests.complete_answered(|index| self.cache.contains(index));
        tracing::debug!("values-found: {} new, {} known", summary.inserted, summary.known);

        let Some(target) = self.target else {
            return;
        };
        if self.phase != Phase::AwaitingRemote || target < 2 {
            tracing::debug!("Merged values outside of a lookup");
            return;
        }

        let pair = ValuePair::dependencies_of(target);
        if self.cache.contains(pair.n1) && self.cache.contains(pair.n2) {
            self.phase = Phase::Computing;
            self.advance(effects);
        } else if values.contains_key(&pair.n1) || values.contains_key(&pair.n2) {
            // Partial answer: the missing member counts as not found.
            self.requests.complete(&pair);
            self.phase = Phase::Computing;
            self.defer_behind(target);
            self.advance(effects);
        } else {
            tracing::debug!("Answer does not cover F({}); still waiting", target);
        }
    }

    fn on_values_not_found(&mut self, pair: ValuePair, effects: &mut Vec<Effect>) {
        let Some(target) = self.target else {
            return;
        };
        if self.phase != Phase::AwaitingRemote || pair != ValuePair::dependencies_of(target) {
            tracing::debug!("Ignoring values-not-found for ({}, {})", pair.n1, pair.n2);
            return;
        }

        self.requests.complete(&pair);
        self.phase = Phase::Computing;
        self.defer_behind(target);
        self.advance(effects);
    }

    fn on_storage_disconnected(&mut self, effects: &mut Vec<Effect>) {
        self.storage_reachable = false;
        let cancelled = self.requests.cancel_all();

        match self.phase {
            Phase::Computing | Phase::AwaitingRemote => {
                self.phase = Phase::StorageDisconnected;
                self.countdown_generation += 1;
                self.countdown = Some(Countdown {
                    generation: self.countdown_generation,
                    remaining: self.countdown_ticks,
                });
                tracing::warn!(
                    "Storage disconnected ({} requests cancelled); resetting in {} s unless it returns",
                    cancelled,
                    self.countdown_ticks
                );
                effects.push(Effect::StartCountdown {
                    generation: self.countdown_generation,
                });
            }
            Phase::StorageDisconnected => {
                tracing::debug!("Storage already disconnected");
            }
            phase => {
                tracing::info!("Storage disconnected while {}", phase);
            }
        }
    }

    fn on_storage_reconnected(&mut self, snapshot: Snapshot, effects: &mut Vec<Effect>) {
        if self.countdown.take().is_some() {
            effects.push(Effect::CancelCountdown);
        }
        self.storage_reachable = true;

        let summary = self.cache.merge_all(snapshot.values);
        self.pending.retain_unmemoized(&self.cache);
        tracing::info!(
            "Storage reconnected; snapshot added {} values ({} rejected)",
            summary.inserted,
            summary.rejected
        );

        if matches!(self.phase, Phase::StorageDisconnected | Phase::AwaitingRemote) {
            self.requests.cancel_all();
            if let Some(target) = self.target {
                self.pending.enqueue(target, &self.cache);
            }
            if let Some(next) = self.pending.pop_min() {
                self.target = Some(next);
            }
            self.phase = Phase::Computing;
            self.advance(effects);
        }
    }

    fn on_countdown_tick(&mut self, generation: u64, effects: &mut Vec<Effect>) {
        let Some(countdown) = self.countdown.as_mut() else {
            tracing::debug!("Countdown tick {} with no countdown running", generation);
            return;
        };
        if countdown.generation != generation {
            tracing::debug!("Stale countdown tick {}", generation);
            return;
        }

        countdown.remaining = countdown.remaining.saturating_sub(1);
        if countdown.remaining > 0 {
            tracing::info!("Storage unreachable; resetting in {} s", countdown.remaining);
            return;
        }

        tracing::error!(
            "Storage did not return within {} s; session reset",
            self.countdown_ticks
        );
        self.countdown = None;
        effects.push(Effect::CancelCountdown);
        self.reset_session();
    }

    fn on_force_disconnect(&mut self, reason: String, effects: &mut Vec<Effect>) {
        tracing::warn!("Forced off the compute role: {}", reason);
        if self.countdown.take().is_some() {
            effects.push(Effect::CancelCountdown);
        }
        self.reset_session();
        self.confirmed = false;
        self.storage_reachable = true;
        self.in_flight = 0;
        effects.push(Effect::Close);
    }
}

impl Default for ComputeAgent {
    fn default() -> Self {
        Self::new(COUNTDOWN_TICKS)
    }
}

impl Agent for ComputeAgent {
    type Command = ComputeCommand;
    type Status = ComputeStatus;

    fn role(&self) -> Role {
        Role::Compute
    }

    fn dispatch(&mut self, input: Input<ComputeCommand>) -> Vec<Effect> {
        let mut effects = Vec::new();

        match input {
            Input::Event(Event::RoleConfirmed(Role::Compute)) => {
                tracing::info!("Confirmed as compute");
                self.confirmed = true;
            }
            Input::Event(Event::ForceDisconnect(reason)) => {
                self.on_force_disconnect(reason, &mut effects)
            }
            input if !self.confirmed => {
                tracing::debug!("Ignoring {:?} before role confirmation", input);
            }
            Input::Event(event) => match event {
                Event::ValuesFound(values) => self.on_values_found(values, &mut effects),
                Event::ValuesNotFound(pair) => self.on_values_not_found(pair, &mut effects),
                Event::StorageDisconnected => self.on_storage_disconnected(&mut effects),
                Event::StorageReconnected(snapshot) => {
                    self.on_storage_reconnected(snapshot, &mut effects)
                }
                other => tracing::debug!("Compute ignores '{}'", other.name()),
            },
            Input::Command(ComputeCommand::StartTarget(n)) => self.start_target(n, &mut effects),
            Input::Command(ComputeCommand::RequestReconnect) => {
                self.request_reconnect(&mut effects)
            }
            Input::Resume => {
                self.in_flight = self.in_flight.saturating_sub(1);
                if self.phase == Phase::Computing {
                    self.advance(&mut effects);
                }
            }
            Input::CountdownTick(generation) => self.on_countdown_tick(generation, &mut effects),
        }

        effects
    }

    fn status(&self) -> ComputeStatus {
        ComputeStatus {
            confirmed: self.confirmed,
            phase: self.phase,
            target: self.target,
            original_target: self.original_target,
            last_resolved: self.last_resolved,
            result: self.original_target.and_then(|n| self.cache.get(n)),
            cached: self.cache.len(),
            pending: self.pending.len(),
            message_count: self.message_count,
            countdown: self.countdown.map(|c| c.remaining),
            storage_reachable: self.storage_reachable,
        }
    }
}
