use crate::types::{AnswerRecord, ParticipantName, ResponseSet};

/// Per-participant answers for the running poll
#[derive(Debug, Default)]
pub struct ResponseAggregator {
    responses: ResponseSet,
}

impl ResponseAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resubmission replaces the previous record, it never merges
    pub fn submit(&mut self, name: ParticipantName, answers: AnswerRecord) {
        self.responses.insert(name, answers);
    }

    /// Returns true if the participant had answered
    pub fn remove(&mut self, name: &str) -> bool {
        self.responses.remove(name).is_some()
    }

    pub fn reset(&mut self) {
        self.responses.clear();
    }

    /// Hand out the final set and leave the aggregator empty
    pub fn take(&mut self) -> ResponseSet {
        std::mem::take(&mut self.responses)
    }

    pub fn snapshot(&self) -> ResponseSet {
        self.responses.clone()
    }

    pub fn responses(&self) -> &ResponseSet {
        &self.responses
    }

    pub fn len(&self) -> usize {
        self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resubmission_replaces() {
        let mut aggregator = ResponseAggregator::new();
        aggregator.submit("alice".to_string(), AnswerRecord::from([(0, "A"), (1, "C")]));
        aggregator.submit("alice".to_string(), AnswerRecord::from([(0, "B")]));

        assert_eq!(aggregator.len(), 1);
        let record = &aggregator.responses()["alice"];
        assert_eq!(record.answer(0), Some("B"));
        // Not merged with the first submission
        assert_eq!(record.answer(1), None);
    }

    #[test]
    fn test_remove() {
        let mut aggregator = ResponseAggregator::new();
        aggregator.submit("alice".to_string(), AnswerRecord::from([(0, "A")]));

        assert!(aggregator.remove("alice"));
        assert!(!aggregator.remove("alice"));
        assert!(aggregator.is_empty());
    }

    #[test]
    fn test_take_leaves_empty() {
        let mut aggregator = ResponseAggregator::new();
        aggregator.submit("alice".to_string(), AnswerRecord::from([(0, "A")]));
        aggregator.submit("bob".to_string(), AnswerRecord::from([(0, "B")]));

        let taken = aggregator.take();
        assert_eq!(taken.len(), 2);
        assert!(aggregator.is_empty());
    }

    #[test]
    fn test_reset() {
        let mut aggregator = ResponseAggregator::new();
        aggregator.submit("alice".to_string(), AnswerRecord::from([(0, "A")]));
        let snapshot = aggregator.snapshot();
        aggregator.reset();

        assert!(aggregator.is_empty());
        assert_eq!(snapshot.len(), 1);
    }
}
