//! WebSocket message dispatch
//!
//! Authorization is checked here, then dispatched to the teacher or student
//! handler modules. Broadcasts go out through the session's fan-out channel;
//! the return value is only a direct reply to the sender.

use crate::error::SessionError;
use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::AppState;
use crate::types::{ConnId, Role};
use std::sync::Arc;

use super::{student, teacher};

/// Reject teacher-only commands from students when roles are enforced
macro_rules! check_teacher {
    ($state:expr, $role:expr, $action:expr) => {
        if $state.config.enforce_roles && $role != Role::Teacher {
            tracing::warn!("Unauthorized attempt to {}", $action);
            return Some(ServerMessage::from(&SessionError::Unauthorized($action)));
        }
    };
}

/// Handle client messages and return optional direct reply
pub async fn handle_message(
    msg: ClientMessage,
    conn: &ConnId,
    role: Role,
    state: &Arc<AppState>,
) -> Option<ServerMessage> {
    match msg {
        // Teacher commands
        ClientMessage::CreatePoll(definition) => {
            check_teacher!(state, role, "create polls");
            teacher::handle_create_poll(state, conn, definition).await
        }

        ClientMessage::EndPoll => {
            check_teacher!(state, role, "end polls");
            teacher::handle_end_poll(state, conn).await
        }

        ClientMessage::RemoveStudent(name) => {
            check_teacher!(state, role, "remove students");
            teacher::handle_remove_student(state, conn, name).await
        }

        // Student commands
        ClientMessage::RegisterStudent(name) => {
            student::handle_register_student(state, conn, name).await
        }

        ClientMessage::SubmitAnswers { name, answers } => {
            student::handle_submit_answers(state, conn, name, answers).await
        }

        // Anyone can chat
        ClientMessage::ChatMessage { name, message } => {
            student::handle_chat_message(state, conn, name, message).await
        }
    }
}

/// Run a command through the session, turning failures into an error reply
pub(super) async fn dispatch(
    state: &Arc<AppState>,
    conn: &ConnId,
    msg: ClientMessage,
) -> Option<ServerMessage> {
    let event = msg.event_name();
    match state.dispatch(conn, msg).await {
        Ok(()) => None,
        Err(e) => {
            tracing::info!("Rejected {} from {}: {}", event, conn, e);
            Some(ServerMessage::from(&e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::types::{PollDefinition, Question};

    fn poll() -> PollDefinition {
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
    async fn test_student_may_create_poll_by_default() {
        let state = Arc::new(AppState::default());
        let result = handle_message(
            ClientMessage::CreatePoll(poll()),
            &"c1".to_string(),
            Role::Student,
            &state,
        )
        .await;

        assert!(result.is_none());
        assert!(state.snapshot().await.poll.is_some());
    }

    #[tokio::test]
    async fn test_unauthorized_teacher_command() {
        let state = Arc::new(AppState::new(ServerConfig {
            enforce_roles: true,
            ..Default::default()
        }));

        for msg in [
            ClientMessage::CreatePoll(poll()),
            ClientMessage::EndPoll,
            ClientMessage::RemoveStudent("alice".to_string()),
        ] {
            let result = handle_message(msg, &"c1".to_string(), Role::Student, &state).await;
            match result {
                Some(ServerMessage::Error { code, .. }) => assert_eq!(code, "UNAUTHORIZED"),
                other => panic!("Expected UNAUTHORIZED, got {:?}", other),
            }
        }
        assert!(state.snapshot().await.poll.is_none());
    }

    #[tokio::test]
    async fn test_teacher_authorized_when_enforced() {
        let state = Arc::new(AppState::new(ServerConfig {
            enforce_roles: true,
            ..Default::default()
        }));
        let result = handle_message(
            ClientMessage::CreatePoll(poll()),
            &"t1".to_string(),
            Role::Teacher,
            &state,
        )
        .await;

        assert!(result.is_none());
        assert!(state.snapshot().await.poll.is_some());
    }

    #[tokio::test]
    async fn test_invalid_payload_reply() {
        let state = Arc::new(AppState::default());
        let result = handle_message(
            ClientMessage::RegisterStudent("".to_string()),
            &"c1".to_string(),
            Role::Student,
            &state,
        )
        .await;

        match result {
            Some(ServerMessage::Error { code, .. }) => assert_eq!(code, "INVALID_PAYLOAD"),
            other => panic!("Expected INVALID_PAYLOAD, got {:?}", other),
        }
    }
}
