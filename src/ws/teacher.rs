//! Teacher command handlers
//!
//! When roles are enforced, authorization is checked in the dispatch layer
//! before calling these.

use super::handlers::dispatch;
use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::AppState;
use crate::types::{ConnId, ParticipantName, PollDefinition};
use std::sync::Arc;

pub async fn handle_create_poll(
    state: &Arc<AppState>,
    conn: &ConnId,
    definition: PollDefinition,
) -> Option<ServerMessage> {
    tracing::info!(
        "Creating poll: {} questions, {}s",
        definition.questions.len(),
        definition.time_limit
    );
    dispatch(state, conn, ClientMessage::CreatePoll(definition)).await
}

pub async fn handle_end_poll(state: &Arc<AppState>, conn: &ConnId) -> Option<ServerMessage> {
    tracing::info!("Ending poll");
    dispatch(state, conn, ClientMessage::EndPoll).await
}

pub async fn handle_remove_student(
    state: &Arc<AppState>,
    conn: &ConnId,
    name: ParticipantName,
) -> Option<ServerMessage> {
    tracing::info!("Teacher removed: {}", name);
    dispatch(state, conn, ClientMessage::RemoveStudent(name)).await
}
