//! Student message handlers: registration, answers, and chat

use super::handlers::dispatch;
use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::AppState;
use crate::types::{AnswerRecord, ConnId, ParticipantName};
use std::sync::Arc;

pub async fn handle_register_student(
    state: &Arc<AppState>,
    conn: &ConnId,
    name: ParticipantName,
) -> Option<ServerMessage> {
    tracing::info!("Student registration: {}", name);
    dispatch(state, conn, ClientMessage::RegisterStudent(name)).await
}

pub async fn handle_submit_answers(
    state: &Arc<AppState>,
    conn: &ConnId,
    name: ParticipantName,
    answers: AnswerRecord,
) -> Option<ServerMessage> {
    tracing::debug!("Answers submitted by {}", name);
    dispatch(state, conn, ClientMessage::SubmitAnswers { name, answers }).await
}

pub async fn handle_chat_message(
    state: &Arc<AppState>,
    conn: &ConnId,
    name: ParticipantName,
    message: String,
) -> Option<ServerMessage> {
    tracing::debug!(
        "Chat from {}: {}",
        name,
        message.chars().take(50).collect::<String>()
    );
    dispatch(state, conn, ClientMessage::ChatMessage { name, message }).await
}
