mod chat;
mod poll;
mod registry;
mod responses;
mod session;
pub mod tally;
mod timer;

pub use chat::ChatLog;
pub use poll::{EndedPoll, PollLifecycle};
pub use registry::Registry;
pub use responses::ResponseAggregator;
pub use session::{
    Envelope, PollResults, Session, SessionPolicy, SessionSnapshot, Target, TimerAction,
    Transition,
};

use crate::config::ServerConfig;
use crate::error::SessionResult;
use crate::protocol::{ClientMessage, ServerMessage};
use crate::types::ConnId;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Every command runs to completion under this lock
    pub session: Arc<Mutex<Session>>,
    /// Fan-out channel; each connection filters envelopes by target
    pub broadcast: broadcast::Sender<Envelope>,
    poll_timer: Arc<Mutex<Option<JoinHandle<()>>>>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let (tx, _rx) = broadcast::channel(config.broadcast_capacity);
        Self {
            session: Arc::new(Mutex::new(Session::new(config.session_policy()))),
            broadcast: tx,
            poll_timer: Arc::new(Mutex::new(None)),
            config: Arc::new(config),
        }
    }

    /// Subscribe a new connection and build its initial sync.
    ///
    /// Subscribing under the session lock means every change after the
    /// snapshot arrives on the receiver and none before it does.
    pub async fn connect(&self) -> (broadcast::Receiver<Envelope>, Vec<ServerMessage>) {
        let session = self.session.lock().await;
        let rx = self.broadcast.subscribe();
        (rx, session.on_connect())
    }

    /// Fresh initial sync for a connection that fell behind.
    ///
    /// The lagged receiver still queues envelopes already covered by the
    /// snapshot, so it is replaced with one subscribed under the same lock.
    pub async fn resync(&self, rx: &mut broadcast::Receiver<Envelope>) -> Vec<ServerMessage> {
        let session = self.session.lock().await;
        *rx = self.broadcast.subscribe();
        session.on_connect()
    }

    pub async fn disconnect(&self, conn: &ConnId) {
        let removed = self.session.lock().await.on_disconnect(conn);
        if !removed.is_empty() {
            tracing::info!("Connection {} closed, unregistered {:?}", conn, removed);
        }
    }

    /// Apply a client command and deliver everything it produced
    pub async fn dispatch(&self, conn: &ConnId, msg: ClientMessage) -> SessionResult<()> {
        let mut session = self.session.lock().await;
        let now_ms = chrono::Utc::now().timestamp_millis();
        let transition = session.apply(conn, msg, now_ms)?;
        // Still holding the session lock so deliveries keep processing order
        self.apply_transition(transition).await;
        Ok(())
    }

    pub(crate) async fn apply_transition(&self, transition: Transition) {
        self.publish(transition.outbound);
        match transition.timer {
            TimerAction::Keep => {}
            TimerAction::Arm { generation, after } => self.arm_poll_timer(generation, after).await,
            TimerAction::Cancel => self.cancel_poll_timer().await,
        }
    }

    fn publish(&self, outbound: Vec<Envelope>) {
        for envelope in outbound {
            tracing::debug!(
                event = envelope.message.event_name(),
                target = ?envelope.target,
                "Publishing"
            );
            // Ignore send errors (no connections is fine)
            let _ = self.broadcast.send(envelope);
        }
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.session.lock().await.snapshot()
    }

    pub async fn results(&self) -> Option<PollResults> {
        self.session.lock().await.results()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(ServerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Lifecycle, PollDefinition, Question};

    fn poll_definition() -> PollDefinition {
        PollDefinition {
            questions: vec![Question {
                question_text: "Q1".to_string(),
                options: vec!["A".to_string(), "B".to_string()],
                correct_answer: "A".to_string(),
            }],
            time_limit: 30,
        }
    }

    #[tokio::test]
    async fn test_dispatch_publishes_in_order() {
        let state = AppState::default();
        let (mut rx, initial) = state.connect().await;
        assert_eq!(initial.len(), 1);

        state
            .dispatch(&"teacher".to_string(), ClientMessage::CreatePoll(poll_definition()))
            .await
            .unwrap();

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first.message.event_name(), "pollCreated");
        assert_eq!(second.message.event_name(), "answerUpdate");
    }

    #[tokio::test]
    async fn test_dispatch_error_publishes_nothing() {
        let state = AppState::default();
        let (mut rx, _) = state.connect().await;

        let result = state
            .dispatch(&"c1".to_string(), ClientMessage::RegisterStudent(String::new()))
            .await;
        assert!(result.is_err());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_connect_mid_poll_gets_snapshot() {
        let state = AppState::default();
        state
            .dispatch(&"teacher".to_string(), ClientMessage::CreatePoll(poll_definition()))
            .await
            .unwrap();

        let (mut rx, initial) = state.connect().await;
        let names: Vec<_> = initial.iter().map(|m| m.event_name()).collect();
        assert_eq!(names, vec!["pollCreated", "answerUpdate", "chatHistory"]);
        // Earlier broadcasts are not replayed
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_resync_after_lag_skips_stale_envelopes() {
        let state = AppState::new(ServerConfig {
            broadcast_capacity: 2,
            ..Default::default()
        });
        let (mut rx, _) = state.connect().await;

        for text in ["m0", "m1", "m2"] {
            state
                .dispatch(
                    &"c1".to_string(),
                    ClientMessage::ChatMessage {
                        name: "alice".to_string(),
                        message: text.to_string(),
                    },
                )
                .await
                .unwrap();
        }
        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(_))
        ));

        let snapshot = state.resync(&mut rx).await;
        match snapshot.as_slice() {
            [ServerMessage::ChatHistory(history)] => {
                let texts: Vec<_> = history.iter().map(|m| m.message.as_str()).collect();
                assert_eq!(texts, vec!["m0", "m1", "m2"]);
            }
            other => panic!("Expected ChatHistory, got {:?}", other),
        }
        // Chat already in the history is not delivered a second time
        assert!(rx.try_recv().is_err());

        state
            .dispatch(
                &"c1".to_string(),
                ClientMessage::ChatMessage {
                    name: "alice".to_string(),
                    message: "m3".to_string(),
                },
            )
            .await
            .unwrap();
        match rx.try_recv().map(|envelope| envelope.message) {
            Ok(ServerMessage::ChatMessage(msg)) => assert_eq!(msg.message, "m3"),
            other => panic!("Expected ChatMessage, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_disconnect_unregisters() {
        let state = AppState::default();
        state
            .dispatch(&"c1".to_string(), ClientMessage::RegisterStudent("alice".to_string()))
            .await
            .unwrap();
        assert_eq!(state.snapshot().await.roster, vec!["alice"]);

        state.disconnect(&"c1".to_string()).await;
        let snapshot = state.snapshot().await;
        assert!(snapshot.roster.is_empty());
        assert_eq!(snapshot.state, Lifecycle::Idle);
    }
}
