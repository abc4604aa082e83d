use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Opaque per-connection handle
pub type ConnId = String;
pub type ParticipantName = String;

/// Mapping of participant name to their latest answers
pub type ResponseSet = BTreeMap<ParticipantName, AnswerRecord>;

pub const DEFAULT_TIME_LIMIT_SECS: u32 = 30;

pub const REMOVED_BY_TEACHER: &str = "You were removed by the teacher";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(alias = "text")]
    pub question_text: String,
    #[serde(default)]
    pub options: Vec<String>,
    /// May be empty when the poll is not graded
    #[serde(default, alias = "correctOption")]
    pub correct_answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PollDefinition {
    pub questions: Vec<Question>,
    #[serde(default = "default_time_limit", alias = "timeLimitSeconds")]
    pub time_limit: u32,
}

fn default_time_limit() -> u32 {
    DEFAULT_TIME_LIMIT_SECS
}

/// The running poll as participants see it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActivePoll {
    #[serde(flatten)]
    pub definition: PollDefinition,
    /// Roster captured at creation, refreshed whenever registrations change
    pub students: Vec<ParticipantName>,
}

/// One participant's answers, keyed by question index.
///
/// Serialized as a JSON object with decimal keys (`{"0": "A"}`). On input an
/// array aligned to question order is accepted as well; `null` entries are
/// treated as unanswered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawAnswers")]
pub struct AnswerRecord(BTreeMap<usize, String>);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAnswers {
    // Keys arrive as strings; integer keys do not survive untagged buffering
    Map(BTreeMap<String, Option<String>>),
    List(Vec<Option<String>>),
}

impl From<RawAnswers> for AnswerRecord {
    fn from(raw: RawAnswers) -> Self {
        let answers = match raw {
            RawAnswers::Map(map) => map
                .into_iter()
                .filter_map(|(key, answer)| Some((key.trim().parse().ok()?, answer?)))
                .collect(),
            RawAnswers::List(list) => list
                .into_iter()
                .enumerate()
                .filter_map(|(idx, answer)| answer.map(|a| (idx, a)))
                .collect(),
        };
        Self(answers)
    }
}

impl AnswerRecord {
    /// The selected option for a question, ignoring blank selections
    pub fn answer(&self, question_index: usize) -> Option<&str> {
        self.0
            .get(&question_index)
            .map(String::as_str)
            .filter(|a| !a.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<const N: usize> From<[(usize, &str); N]> for AnswerRecord {
    fn from(entries: [(usize, &str); N]) -> Self {
        Self(
            entries
                .into_iter()
                .map(|(idx, a)| (idx, a.to_string()))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    #[serde(alias = "senderName")]
    pub name: ParticipantName,
    #[serde(alias = "text")]
    pub message: String,
    /// Epoch millis, always assigned by the server at receipt
    pub timestamp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Participant {
    pub name: ParticipantName,
    pub conn: ConnId,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Teacher,
    Student,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Lifecycle {
    Idle,
    Active,
}
