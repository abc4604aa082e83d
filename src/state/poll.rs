use crate::types::{ActivePoll, Lifecycle, ParticipantName, PollDefinition, ResponseSet};
use serde::Serialize;

/// A poll that has been ended, kept for final tabulation
#[derive(Debug, Clone, Serialize)]
pub struct EndedPoll {
    pub poll: ActivePoll,
    pub responses: ResponseSet,
}

/// Idle <-> Active. At most one poll runs at a time.
#[derive(Debug, Default)]
pub struct PollLifecycle {
    active: Option<ActivePoll>,
    /// Bumped on every create so stale timers can be told apart
    generation: u64,
    last_ended: Option<EndedPoll>,
}

impl PollLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> Lifecycle {
        if self.active.is_some() {
            Lifecycle::Active
        } else {
            Lifecycle::Idle
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn active(&self) -> Option<&ActivePoll> {
        self.active.as_ref()
    }

    pub fn last_ended(&self) -> Option<&EndedPoll> {
        self.last_ended.as_ref()
    }

    /// True while the poll created at `generation` is still the running one
    pub fn is_current(&self, generation: u64) -> bool {
        self.is_active() && self.generation == generation
    }

    /// Start a poll, discarding any running one. Returns the new generation.
    pub fn create(&mut self, definition: PollDefinition, roster: Vec<ParticipantName>) -> u64 {
        self.generation += 1;
        self.active = Some(ActivePoll {
            definition,
            students: roster,
        });
        self.generation
    }

    /// Return to Idle. `final_responses` are archived alongside the poll.
    pub fn end(&mut self, final_responses: ResponseSet) -> Option<&EndedPoll> {
        let poll = self.active.take()?;
        self.last_ended = Some(EndedPoll {
            poll,
            responses: final_responses,
        });
        self.last_ended.as_ref()
    }

    /// Re-snapshot the roster of the running poll; no-op while Idle
    pub fn refresh_roster(&mut self, roster: Vec<ParticipantName>) -> Option<&ActivePoll> {
        let poll = self.active.as_mut()?;
        poll.students = roster;
        Some(poll)
    }
}
