// src/engine/core.rs

//! Pure watch coordinator.
//!
//! The coordinator consumes change events and run completions, and answers
//! which tasks are due at a given instant. Every operation takes `now`
//! explicitly; it owns no timers, channels or Tokio types, so debounce and
//! coalescing behaviour can be tested with plain `Instant` arithmetic.

use std::collections::HashMap;
use std::time::Instant;

use tracing::{debug, info};

use crate::engine::queue::RerunQueue;
use crate::types::{ChangeEvent, TaskName};
use crate::watch::WatchSubscription;

/// Debounce state of one subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    Idle,
    /// A matching change arrived; the task becomes due at `deadline` unless
    /// another matching change pushes it back.
    PendingDebounce { deadline: Instant },
    /// Shutdown was requested; no further events are processed.
    Stopped,
}

#[derive(Debug)]
struct Slot {
    subscription: WatchSubscription,
    state: SubscriptionState,
}

/// At most one run per task at a time, counting prerequisites: a run of
/// `A` executes every task in its closure, so it may not start while any of
/// those tasks is part of another in-flight run.
#[derive(Debug)]
pub struct WatchCoordinator {
    slots: Vec<Slot>,
    /// Tasks each run executes (prerequisites first, the task itself last).
    /// Tasks missing here only execute themselves.
    closures: HashMap<TaskName, Vec<TaskName>>,
    /// Dispatched task -> tasks its run executes.
    in_flight: HashMap<TaskName, Vec<TaskName>>,
    reruns: RerunQueue,
    stopped: bool,
}

impl WatchCoordinator {
    pub fn new(subscriptions: Vec<WatchSubscription>) -> Self {
        let slots = subscriptions
            .into_iter()
            .map(|subscription| Slot {
                subscription,
                state: SubscriptionState::Idle,
            })
            .collect();
        Self {
            slots,
            closures: HashMap::new(),
            in_flight: HashMap::new(),
            reruns: RerunQueue::new(),
            stopped: false,
        }
    }

    /// Record the tasks a run of each task executes, as resolved by the
    /// scheduler.
    pub fn with_closures(mut self, closures: HashMap<TaskName, Vec<TaskName>>) -> Self {
        self.closures = closures;
        self
    }

    /// Feed one change event. Every matching subscription (re)starts its
    /// debounce timer. Returns the tasks whose timers were touched.
    pub fn on_event(&mut self, event: &ChangeEvent, now: Instant) -> Vec<TaskName> {
        if self.stopped {
            return Vec::new();
        }

        let mut touched = Vec::new();
        for slot in self.slots.iter_mut() {
            if !slot.subscription.matches(&event.path) {
                continue;
            }
            let deadline = now + slot.subscription.debounce();
            if matches!(slot.state, SubscriptionState::PendingDebounce { .. }) {
                debug!(task = slot.subscription.task(), path = %event.path, "debounce restarted");
            } else {
                debug!(task = slot.subscription.task(), path = %event.path, "debounce started");
            }
            slot.state = SubscriptionState::PendingDebounce { deadline };
            touched.push(slot.subscription.task().to_string());
        }
        touched
    }

    /// Tasks to start now: subscriptions whose quiet period has elapsed.
    ///
    /// Elapsed subscriptions return to `Idle`. A task whose closure overlaps
    /// an in-flight run is queued for one follow-up run instead of being
    /// returned.
    pub fn poll_due(&mut self, now: Instant) -> Vec<TaskName> {
        if self.stopped {
            return Vec::new();
        }

        let mut due = Vec::new();
        for idx in 0..self.slots.len() {
            let SubscriptionState::PendingDebounce { deadline } = self.slots[idx].state else {
                continue;
            };
            if deadline > now {
                continue;
            }
            self.slots[idx].state = SubscriptionState::Idle;
            let task = self.slots[idx].subscription.task().to_string();
            if let Some(task) = self.start_or_queue(task) {
                due.push(task);
            }
        }
        due
    }

    /// Ask for a run of `task` outside of any debounce (e.g. at startup).
    /// Returns the task if it should start now.
    pub fn request_run(&mut self, task: &str) -> Option<TaskName> {
        if self.stopped {
            return None;
        }
        self.start_or_queue(task.to_string())
    }

    fn start_or_queue(&mut self, task: TaskName) -> Option<TaskName> {
        if self.reruns.contains(&task) || self.overlaps_in_flight(&task) {
            self.reruns.push(&task);
            None
        } else {
            self.mark_in_flight(task.clone());
            Some(task)
        }
    }

    fn closure_of(&self, task: &str) -> Vec<TaskName> {
        self.closures
            .get(task)
            .cloned()
            .unwrap_or_else(|| vec![task.to_string()])
    }

    fn overlaps_in_flight(&self, task: &str) -> bool {
        let closure = self.closure_of(task);
        self.in_flight
            .values()
            .any(|running| running.iter().any(|t| closure.contains(t)))
    }

    fn mark_in_flight(&mut self, task: TaskName) {
        let closure = self.closure_of(&task);
        self.in_flight.insert(task, closure);
    }

    /// Earliest pending debounce deadline, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.slots
            .iter()
            .filter_map(|slot| match slot.state {
                SubscriptionState::PendingDebounce { deadline } => Some(deadline),
                _ => None,
            })
            .min()
    }

    /// Record that a run of `task` finished, whatever its outcome. Returns
    /// the queued tasks that no longer overlap any in-flight run, in queue
    /// order; they are marked as running.
    pub fn on_run_finished(&mut self, task: &str) -> Vec<TaskName> {
        self.in_flight.remove(task);
        if self.stopped {
            return Vec::new();
        }

        let mut started = Vec::new();
        for queued in self.reruns.tasks() {
            if self.overlaps_in_flight(&queued) {
                continue;
            }
            self.reruns.take(&queued);
            debug!(task = %queued, "starting queued rerun");
            self.mark_in_flight(queued.clone());
            started.push(queued);
        }
        started
    }

    /// Enter `Stopped`: pending timers and queued reruns are dropped. Runs
    /// already in flight are still tracked until they finish.
    pub fn stop(&mut self) {
        if self.stopped {
            return;
        }
        info!(in_flight = self.in_flight.len(), "watch coordinator stopping");
        self.stopped = true;
        self.reruns.clear();
        for slot in self.slots.iter_mut() {
            slot.state = SubscriptionState::Stopped;
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn state_of(&self, task: &str) -> Option<SubscriptionState> {
        self.slots
            .iter()
            .find(|slot| slot.subscription.task() == task)
            .map(|slot| slot.state)
    }

    /// Whether `task` executes as part of any in-flight run.
    pub fn is_running(&self, task: &str) -> bool {
        self.in_flight
            .values()
            .any(|running| running.iter().any(|t| t == task))
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    pub fn has_queued_rerun(&self, task: &str) -> bool {
        self.reruns.contains(task)
    }

    /// Names of all subscribed tasks, in subscription order.
    pub fn tasks(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|slot| slot.subscription.task())
    }
}
