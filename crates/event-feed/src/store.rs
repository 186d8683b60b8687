use std::sync::Arc;

use cfapps_core_types::AppGuid;
use parking_lot::RwLock;

use crate::model::{ClassifiedEvent, FeedSnapshot, RefreshStatus};

#[derive(Debug)]
struct FeedState {
    subject: AppGuid,
    events: Vec<ClassifiedEvent>,
    status: RefreshStatus,
    generation: u64,
    next_cycle: u64,
    /// Cycle whose fetch is still outstanding for `subject`. Tracked apart
    /// from `status` so a reset cannot open a second fetch beside it.
    in_flight: Option<u64>,
}

impl FeedState {
    fn release(&mut self, ticket: &CycleTicket) {
        if self.in_flight == Some(ticket.cycle) {
            self.in_flight = None;
        }
    }

    fn is_current(&self, ticket: &CycleTicket) -> bool {
        self.generation == ticket.generation && self.subject == ticket.subject
    }
}

/// In-memory page of classified events for one subject.
///
/// Cloning yields another handle onto the same state.
#[derive(Debug, Clone)]
pub struct FeedStore {
    inner: Arc<RwLock<FeedState>>,
}

/// What a finished refresh cycle writes back.
#[derive(Debug)]
pub(crate) enum CycleApply {
    Replace(Vec<ClassifiedEvent>),
    Append(Vec<ClassifiedEvent>),
    Failed { reason: String },
}

#[derive(Debug)]
pub(crate) enum BeginCycle {
    Started(CycleTicket),
    InFlight,
    Mismatch(AppGuid),
}

/// Identifies the store contents a refresh cycle started against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CycleTicket {
    pub subject: AppGuid,
    pub generation: u64,
    pub cycle: u64,
}

impl FeedStore {
    pub fn new(subject: AppGuid) -> Self {
        Self {
            inner: Arc::new(RwLock::new(FeedState {
                subject,
                events: Vec::new(),
                status: RefreshStatus::Idle,
                generation: 0,
                next_cycle: 0,
                in_flight: None,
            })),
        }
    }

    /// Clears every event and re-targets the store at `subject`.
    ///
    /// A fetch still outstanding for the same subject keeps blocking new
    /// cycles until it completes; its results are discarded.
    pub fn reset(&self, subject: AppGuid) {
        let mut state = self.inner.write();
        if state.subject != subject {
            state.in_flight = None;
        }
        state.subject = subject;
        state.events.clear();
        state.status = RefreshStatus::Idle;
        state.generation = state.generation.wrapping_add(1);
    }

    pub fn append(&self, events: Vec<ClassifiedEvent>) {
        self.inner.write().events.extend(events);
    }

    /// Clear-then-append in one critical section.
    pub fn replace(&self, events: Vec<ClassifiedEvent>) {
        self.inner.write().events = events;
    }

    pub fn events(&self) -> Vec<ClassifiedEvent> {
        self.inner.read().events.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.read().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().events.is_empty()
    }

    pub fn subject(&self) -> AppGuid {
        self.inner.read().subject.clone()
    }

    pub fn status(&self) -> RefreshStatus {
        self.inner.read().status.clone()
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        let state = self.inner.read();
        FeedSnapshot {
            subject: state.subject.clone(),
            status: state.status.clone(),
            events: state.events.clone(),
        }
    }

    /// Moves to `Fetching` unless a cycle is already outstanding or the
    /// store is attached to another subject. Check and transition happen
    /// under one write lock.
    pub(crate) fn try_begin(&self, subject: &AppGuid) -> BeginCycle {
        let mut state = self.inner.write();
        if &state.subject != subject {
            return BeginCycle::Mismatch(state.subject.clone());
        }
        if state.in_flight.is_some() {
            return BeginCycle::InFlight;
        }
        let cycle = state.next_cycle;
        state.next_cycle = state.next_cycle.wrapping_add(1);
        state.in_flight = Some(cycle);
        state.status = RefreshStatus::Fetching;
        BeginCycle::Started(CycleTicket {
            subject: state.subject.clone(),
            generation: state.generation,
            cycle,
        })
    }

    /// Releases a cycle that will never complete. Returns `true` when the
    /// store was still showing that cycle as `Fetching` and went back to
    /// `Idle`.
    pub(crate) fn abandon(&self, ticket: &CycleTicket) -> bool {
        let mut state = self.inner.write();
        state.release(ticket);
        if !state.is_current(ticket) || !state.status.is_fetching() {
            return false;
        }
        state.status = RefreshStatus::Idle;
        true
    }

    /// Applies a finished cycle if the store still holds the contents the
    /// cycle started against. Returns the resulting event count, or `None`
    /// when the results are stale.
    pub(crate) fn finish(&self, ticket: &CycleTicket, apply: CycleApply) -> Option<usize> {
        let mut state = self.inner.write();
        state.release(ticket);
        if !state.is_current(ticket) {
            return None;
        }
        let status = match apply {
            CycleApply::Replace(events) => {
                state.events = events;
                RefreshStatus::Idle
            }
            CycleApply::Append(events) => {
                state.events.extend(events);
                RefreshStatus::Idle
            }
            CycleApply::Failed { reason } => RefreshStatus::FetchFailed { reason },
        };
        state.status = status;
        Some(state.events.len())
    }
}
