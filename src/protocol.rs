use crate::types::*;
use serde::{Deserialize, Serialize};

/// Inbound frames: `{"event": "<name>", "data": <payload>}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Teacher publishes a new poll, replacing any running one
    CreatePoll(PollDefinition),
    SubmitAnswers {
        name: ParticipantName,
        #[serde(default)]
        answers: AnswerRecord,
    },
    EndPoll,
    ChatMessage {
        #[serde(alias = "senderName")]
        name: ParticipantName,
        #[serde(alias = "text")]
        message: String,
    },
    RegisterStudent(ParticipantName),
    /// Teacher kicks a participant by name
    RemoveStudent(ParticipantName),
}

impl ClientMessage {
    pub fn event_name(&self) -> &'static str {
        match self {
            ClientMessage::CreatePoll(_) => "createPoll",
            ClientMessage::SubmitAnswers { .. } => "submitAnswers",
            ClientMessage::EndPoll => "endPoll",
            ClientMessage::ChatMessage { .. } => "chatMessage",
            ClientMessage::RegisterStudent(_) => "registerStudent",
            ClientMessage::RemoveStudent(_) => "removeStudent",
        }
    }
}

/// Outbound frames, same envelope shape as [`ClientMessage`]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerMessage {
    PollCreated(ActivePoll),
    AnswerUpdate(ResponseSet),
    /// Terminal snapshot of the responses; the poll is gone after this
    PollEnded(ResponseSet),
    ChatMessage(ChatMessage),
    ChatHistory(Vec<ChatMessage>),
    /// Sent only to the removed participant's connection
    StudentRemoved(String),
    Error {
        code: String,
        msg: String,
    },
}

impl ServerMessage {
    pub fn event_name(&self) -> &'static str {
        match self {
            ServerMessage::PollCreated(_) => "pollCreated",
            ServerMessage::AnswerUpdate(_) => "answerUpdate",
            ServerMessage::PollEnded(_) => "pollEnded",
            ServerMessage::ChatMessage(_) => "chatMessage",
            ServerMessage::ChatHistory(_) => "chatHistory",
            ServerMessage::StudentRemoved(_) => "studentRemoved",
            ServerMessage::Error { .. } => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_create_poll() {
        let json = r#"{"event": "createPoll", "data": {
            "questions": [{"questionText": "Q1", "options": ["A", "B"], "correctAnswer": "A"}],
            "timeLimit": 30
        }}"#;
        match serde_json::from_str::<ClientMessage>(json).unwrap() {
            ClientMessage::CreatePoll(def) => {
                assert_eq!(def.questions.len(), 1);
                assert_eq!(def.time_limit, 30);
            }
            other => panic!("Expected CreatePoll, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_end_poll_without_data() {
        let msg: ClientMessage = serde_json::from_str(r#"{"event": "endPoll"}"#).unwrap();
        assert_eq!(msg, ClientMessage::EndPoll);
    }

    #[test]
    fn test_parse_register_student_bare_string() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"event": "registerStudent", "data": "alice"}"#).unwrap();
        assert_eq!(msg, ClientMessage::RegisterStudent("alice".to_string()));
    }

    #[test]
    fn test_parse_submit_answers() {
        let json = r#"{"event": "submitAnswers", "data": {"name": "alice", "answers": {"0": "A"}}}"#;
        match serde_json::from_str::<ClientMessage>(json).unwrap() {
            ClientMessage::SubmitAnswers { name, answers } => {
                assert_eq!(name, "alice");
                assert_eq!(answers.answer(0), Some("A"));
            }
            other => panic!("Expected SubmitAnswers, got {:?}", other),
        }
    }

    #[test]
    fn test_chat_message_ignores_client_timestamp() {
        let json = r#"{"event": "chatMessage", "data": {"name": "bob", "message": "hi", "timestamp": 1}}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        assert_eq!(
            msg,
            ClientMessage::ChatMessage {
                name: "bob".to_string(),
                message: "hi".to_string(),
            }
        );
    }

    #[test]
    fn test_unknown_event_is_rejected() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"event": "dropTables"}"#).is_err());
    }

    #[test]
    fn test_serialize_student_removed() {
        let json =
            serde_json::to_string(&ServerMessage::StudentRemoved(REMOVED_BY_TEACHER.to_string()))
                .unwrap();
        assert_eq!(
            json,
            r#"{"event":"studentRemoved","data":"You were removed by the teacher"}"#
        );
    }
}
