//! Iteration history — append-only record of score over iterations.
//!
//! CRITICAL: This is append-only. No mutation or deletion API exists.
//! The record count doubles as the session's iteration count, which is what
//! selects the MajorRewrite vs GapTargeted strategy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One completed optimization iteration. Never mutated after append.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IterationRecord {
    /// 1-based.
    pub iteration_number: u32,
    pub score: u8,
    pub timestamp: DateTime<Utc>,
}

/// Append-only sequence of iteration records, ordered by append.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryLog {
    records: Vec<IterationRecord>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, record: IterationRecord) {
        self.records.push(record);
    }

    /// Number of completed iterations for this session.
    pub fn iteration_count(&self) -> u32 {
        self.records.len() as u32
    }

    pub fn records(&self) -> &[IterationRecord] {
        &self.records
    }

    pub fn last_score(&self) -> Option<u8> {
        self.records.last().map(|r| r.score)
    }

    /// Score movement of the latest iteration relative to the one before it,
    /// for user-facing reporting. None with fewer than two records.
    pub fn last_delta(&self) -> Option<i16> {
        match self.records.as_slice() {
            [.., prior, latest] => Some(latest.score as i16 - prior.score as i16),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(n: u32, score: u8) -> IterationRecord {
        IterationRecord {
            iteration_number: n,
            score,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_append_preserves_order() {
        let mut log = HistoryLog::new();
        log.append(record(1, 40));
        log.append(record(2, 65));
        log.append(record(3, 80));

        let scores: Vec<u8> = log.records().iter().map(|r| r.score).collect();
        assert_eq!(scores, vec![40, 65, 80]);
        assert_eq!(log.iteration_count(), 3);
    }

    #[test]
    fn test_last_delta_is_new_minus_prior() {
        let mut log = HistoryLog::new();
        log.append(record(1, 40));
        log.append(record(2, 65));
        assert_eq!(log.last_delta(), Some(25));

        log.append(record(3, 60));
        assert_eq!(log.last_delta(), Some(-5));
    }

    #[test]
    fn test_last_delta_needs_two_records() {
        let mut log = HistoryLog::new();
        assert_eq!(log.last_delta(), None);
        log.append(record(1, 50));
        assert_eq!(log.last_delta(), None);
    }

    #[test]
    fn test_empty_log_has_no_last_score() {
        assert_eq!(HistoryLog::new().last_score(), None);
    }
}
