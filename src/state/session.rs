//! The single polling session and its command dispatcher.
//!
//! [`Session::apply`] is synchronous and transport-free: it mutates the
//! session and returns the envelopes to deliver plus what to do with the
//! poll timer. The async layer in [`super::AppState`] serializes calls and
//! performs the delivery.

use super::chat::ChatLog;
use super::poll::{EndedPoll, PollLifecycle};
use super::registry::Registry;
use super::responses::ResponseAggregator;
use super::tally::{tabulate, QuestionTally};
use crate::error::{SessionError, SessionResult};
use crate::protocol::{ClientMessage, ServerMessage};
use crate::types::*;
use serde::Serialize;
use std::time::Duration;

/// Who receives an outbound message
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    All,
    One(ConnId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub target: Target,
    pub message: ServerMessage,
}

impl Envelope {
    pub fn all(message: ServerMessage) -> Self {
        Self {
            target: Target::All,
            message,
        }
    }

    pub fn one(conn: ConnId, message: ServerMessage) -> Self {
        Self {
            target: Target::One(conn),
            message,
        }
    }

    pub fn is_for(&self, conn: &str) -> bool {
        match &self.target {
            Target::All => true,
            Target::One(id) => id == conn,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TimerAction {
    Keep,
    /// Schedule expiry of the poll created at `generation`
    Arm { generation: u64, after: Duration },
    Cancel,
}

/// Result of applying one command
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub outbound: Vec<Envelope>,
    pub timer: TimerAction,
}

impl Transition {
    fn broadcast(outbound: Vec<Envelope>) -> Self {
        Self {
            outbound,
            timer: TimerAction::Keep,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionPolicy {
    /// Reject `submitAnswers` while no poll is running
    pub require_active_poll: bool,
    pub chat_history_limit: Option<usize>,
}

/// Point-in-time view of the session
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub state: Lifecycle,
    pub poll: Option<ActivePoll>,
    pub responses: ResponseSet,
    pub roster: Vec<ParticipantName>,
    pub chat_messages: usize,
}

/// Tabulated results of the running poll, or of the last one ended
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollResults {
    #[serde(rename = "final")]
    pub is_final: bool,
    pub poll: ActivePoll,
    pub responses: ResponseSet,
    pub questions: Vec<QuestionTally>,
}

#[derive(Debug, Default)]
pub struct Session {
    registry: Registry,
    poll: PollLifecycle,
    responses: ResponseAggregator,
    chat: ChatLog,
    policy: SessionPolicy,
}

impl Session {
    pub fn new(policy: SessionPolicy) -> Self {
        Self {
            registry: Registry::new(),
            poll: PollLifecycle::new(),
            responses: ResponseAggregator::new(),
            chat: ChatLog::new(policy.chat_history_limit),
            policy,
        }
    }

    /// Apply one inbound command from `conn`
    pub fn apply(
        &mut self,
        conn: &ConnId,
        msg: ClientMessage,
        now_ms: i64,
    ) -> SessionResult<Transition> {
        match msg {
            ClientMessage::CreatePoll(definition) => self.create_poll(definition),
            ClientMessage::SubmitAnswers { name, answers } => self.submit_answers(name, answers),
            ClientMessage::EndPoll => Ok(self.end_poll()),
            ClientMessage::ChatMessage { name, message } => {
                Ok(self.post_chat(name, message, now_ms))
            }
            ClientMessage::RegisterStudent(name) => self.register_student(name, conn),
            ClientMessage::RemoveStudent(name) => Ok(self.remove_student(&name)),
        }
    }

    /// Initial sync for a fresh connection: poll and responses if a poll is
    /// running, then always the chat history
    pub fn on_connect(&self) -> Vec<ServerMessage> {
        let mut messages = Vec::with_capacity(3);
        if let Some(poll) = self.poll.active() {
            messages.push(ServerMessage::PollCreated(poll.clone()));
            messages.push(ServerMessage::AnswerUpdate(self.responses.snapshot()));
        }
        messages.push(ServerMessage::ChatHistory(self.chat.history_snapshot()));
        messages
    }

    /// Roster cleanup only, nothing is broadcast
    pub fn on_disconnect(&mut self, conn: &str) -> Vec<ParticipantName> {
        self.registry.unregister(conn)
    }

    /// Timer expiry for the poll created at `generation`; ignored if that
    /// poll already ended or was replaced
    pub fn expire(&mut self, generation: u64) -> Option<Transition> {
        if !self.poll.is_current(generation) {
            return None;
        }
        Some(self.end_poll())
    }

    pub fn create_poll(&mut self, definition: PollDefinition) -> SessionResult<Transition> {
        if definition.questions.is_empty() {
            return Err(SessionError::InvalidPayload(
                "A poll needs at least one question".to_string(),
            ));
        }
        if definition.time_limit == 0 {
            return Err(SessionError::InvalidPayload(
                "timeLimit must be positive".to_string(),
            ));
        }

        if self.poll.is_active() {
            tracing::info!(
                "Replacing running poll, discarding {} responses",
                self.responses.len()
            );
        }

        let after = Duration::from_secs(u64::from(definition.time_limit));
        let generation = self.poll.create(definition, self.registry.names_snapshot());
        self.responses.reset();

        let mut outbound = Vec::with_capacity(2);
        if let Some(poll) = self.poll.active() {
            outbound.push(Envelope::all(ServerMessage::PollCreated(poll.clone())));
        }
        outbound.push(Envelope::all(ServerMessage::AnswerUpdate(ResponseSet::new())));

        Ok(Transition {
            outbound,
            timer: TimerAction::Arm { generation, after },
        })
    }

    /// Broadcast the final responses and go Idle. While Idle this still
    /// broadcasts an empty terminal set.
    pub fn end_poll(&mut self) -> Transition {
        let final_responses = self.responses.take();
        if self.poll.end(final_responses.clone()).is_none() {
            tracing::debug!("endPoll while idle");
        }

        Transition {
            outbound: vec![Envelope::all(ServerMessage::PollEnded(final_responses))],
            timer: TimerAction::Cancel,
        }
    }

    pub fn submit_answers(
        &mut self,
        name: ParticipantName,
        answers: AnswerRecord,
    ) -> SessionResult<Transition> {
        if name.trim().is_empty() {
            return Err(SessionError::InvalidPayload(
                "Participant name must not be empty".to_string(),
            ));
        }
        if !self.poll.is_active() {
            if self.policy.require_active_poll {
                return Err(SessionError::NoActivePoll);
            }
            tracing::debug!("Accepting answers from {} without an active poll", name);
        }

        self.responses.submit(name, answers);
        Ok(Transition::broadcast(vec![Envelope::all(
            ServerMessage::AnswerUpdate(self.responses.snapshot()),
        )]))
    }

    pub fn post_chat(&mut self, name: ParticipantName, message: String, now_ms: i64) -> Transition {
        let entry = self.chat.append(name, message, now_ms);
        Transition::broadcast(vec![Envelope::all(ServerMessage::ChatMessage(entry))])
    }

    pub fn register_student(
        &mut self,
        name: ParticipantName,
        conn: &ConnId,
    ) -> SessionResult<Transition> {
        if name.trim().is_empty() {
            return Err(SessionError::InvalidPayload(
                "Participant name must not be empty".to_string(),
            ));
        }

        if let Some(previous) = self.registry.register(name.clone(), conn.clone()) {
            if previous != *conn {
                tracing::warn!(
                    "Name {} re-registered, connection {} no longer receives its messages",
                    name,
                    previous
                );
            }
        }
        tracing::info!(
            "Registered: {} ({}), {} on the roster",
            name,
            conn,
            self.registry.len()
        );

        Ok(Transition::broadcast(self.roster_changed()))
    }

    /// Kick a participant: drop their answers, notify their connection, and
    /// refresh the roster
    pub fn remove_student(&mut self, name: &str) -> Transition {
        let had_answers = self.responses.remove(name);
        let mut outbound = vec![Envelope::all(ServerMessage::AnswerUpdate(
            self.responses.snapshot(),
        ))];

        match self.registry.remove(name) {
            Some(conn) => outbound.push(Envelope::one(
                conn,
                ServerMessage::StudentRemoved(REMOVED_BY_TEACHER.to_string()),
            )),
            None if !had_answers => {
                tracing::debug!("{}", SessionError::UnknownParticipant(name.to_string()));
            }
            None => {}
        }

        outbound.extend(self.roster_changed());
        Transition::broadcast(outbound)
    }

    /// Re-broadcast the running poll with a fresh roster
    fn roster_changed(&mut self) -> Vec<Envelope> {
        let roster = self.registry.names_snapshot();
        self.poll
            .refresh_roster(roster)
            .map(|poll| Envelope::all(ServerMessage::PollCreated(poll.clone())))
            .into_iter()
            .collect()
    }

    pub fn state(&self) -> Lifecycle {
        self.poll.state()
    }

    pub fn active_poll(&self) -> Option<&ActivePoll> {
        self.poll.active()
    }

    pub fn responses(&self) -> &ResponseSet {
        self.responses.responses()
    }

    pub fn roster(&self) -> Vec<ParticipantName> {
        self.registry.names_snapshot()
    }

    pub fn last_ended(&self) -> Option<&EndedPoll> {
        self.poll.last_ended()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.poll.state(),
            poll: self.poll.active().cloned(),
            responses: self.responses.snapshot(),
            roster: self.registry.names_snapshot(),
            chat_messages: self.chat.len(),
        }
    }

    /// Live results while a poll runs, otherwise the archived final results
    pub fn results(&self) -> Option<PollResults> {
        if let Some(poll) = self.poll.active() {
            return Some(PollResults {
                is_final: false,
                poll: poll.clone(),
                responses: self.responses.snapshot(),
                questions: tabulate(&poll.definition, self.responses.responses()),
            });
        }
        self.poll.last_ended().map(|ended| PollResults {
            is_final: true,
            poll: ended.poll.clone(),
            responses: ended.responses.clone(),
            questions: tabulate(&ended.poll.definition, &ended.responses),
        })
    }
}
