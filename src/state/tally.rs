//! Per-question result tabulation.
//!
//! The denominator for every percentage is the number of participants who
//! answered that particular question, not the size of the roster.

use crate::types::{PollDefinition, ResponseSet};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OptionTally {
    pub option: String,
    pub count: u32,
    /// Rounded to the nearest integer, 0 when nobody answered
    pub percentage: u32,
    pub correct: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuestionTally {
    pub question_index: usize,
    pub question_text: String,
    /// Participants with a non-blank answer for this question
    pub respondents: u32,
    pub options: Vec<OptionTally>,
}

/// Count selections per option for every question of the poll
pub fn tabulate(definition: &PollDefinition, responses: &ResponseSet) -> Vec<QuestionTally> {
    definition
        .questions
        .iter()
        .enumerate()
        .map(|(idx, question)| {
            let mut counts: HashMap<&str, u32> = HashMap::new();
            let mut respondents = 0u32;
            for record in responses.values() {
                if let Some(answer) = record.answer(idx) {
                    respondents += 1;
                    *counts.entry(answer).or_insert(0) += 1;
                }
            }

            let options = question
                .options
                .iter()
                .map(|option| {
                    let count = counts.get(option.as_str()).copied().unwrap_or(0);
                    OptionTally {
                        option: option.clone(),
                        count,
                        percentage: percentage(count, respondents),
                        correct: !question.correct_answer.is_empty()
                            && question.correct_answer == *option,
                    }
                })
                .collect();

            QuestionTally {
                question_index: idx,
                question_text: question.question_text.clone(),
                respondents,
                options,
            }
        })
        .collect()
}

/// Round-half-up integer percentage
fn percentage(count: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    let (count, total) = (u64::from(count), u64::from(total));
    ((count * 200 + total) / (total * 2)) as u32
}
