use std::collections::BTreeMap;

/// Options the user picked, keyed by question position.
///
/// Keys are only present for answered questions. The ledger does no bounds
/// checking; callers only record positions they actually rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerLedger {
    selections: BTreeMap<usize, usize>,
}

impl AnswerLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `option` for `question`, replacing any earlier choice.
    pub fn record(&mut self, question: usize, option: usize) {
        self.selections.insert(question, option);
    }

    #[must_use]
    pub fn get(&self, question: usize) -> Option<usize> {
        self.selections.get(&question).copied()
    }

    /// Copy of the current selections, as sent to the scoring service.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<usize, usize> {
        self.selections.clone()
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.selections.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_same_choice_twice_is_idempotent() {
        let mut ledger = AnswerLedger::new();
        ledger.record(1, 2);
        ledger.record(1, 2);
        assert_eq!(ledger.get(1), Some(2));
        assert_eq!(ledger.answered_count(), 1);
    }

    #[test]
    fn last_choice_wins() {
        let mut ledger = AnswerLedger::new();
        ledger.record(0, 3);
        ledger.record(0, 1);
        assert_eq!(ledger.get(0), Some(1));
    }

    #[test]
    fn unanswered_questions_are_absent() {
        let mut ledger = AnswerLedger::new();
        ledger.record(0, 2);
        ledger.record(2, 1);
        let snapshot = ledger.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(ledger.get(1), None);
        assert_eq!(snapshot.get(&0), Some(&2));
        assert_eq!(snapshot.get(&2), Some(&1));
    }

    #[test]
    fn full_ledger_snapshot_matches_last_records() {
        let mut ledger = AnswerLedger::new();
        for question in (0..10).rev() {
            ledger.record(question, 0);
        }
        for question in 0..10 {
            ledger.record(question, question % 4);
        }
        let snapshot = ledger.snapshot();
        assert_eq!(snapshot.len(), 10);
        for (question, option) in snapshot {
            assert_eq!(option, question % 4);
        }
    }

    #[test]
    fn snapshot_is_detached_from_later_edits() {
        let mut ledger = AnswerLedger::new();
        ledger.record(0, 0);
        let snapshot = ledger.snapshot();
        ledger.record(0, 3);
        assert_eq!(snapshot.get(&0), Some(&0));
    }
}
