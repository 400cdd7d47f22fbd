//! Reduction of a PR's review history to the counts the tracker cares about.
//!
//! A reviewer can submit many reviews; only their latest actionable one
//! (approved or changes requested) counts. Comments, dismissals and pending
//! reviews are skipped entirely and never override an earlier verdict.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReviewState {
    Approved,
    ChangesRequested,
    Other(String),
}

impl ReviewState {
    /// Accepts both webhook (`approved`) and REST (`APPROVED`) spellings.
    pub fn parse(state: &str) -> Self {
        match state.to_ascii_lowercase().as_str() {
            "approved" => ReviewState::Approved,
            "changes_requested" => ReviewState::ChangesRequested,
            other => ReviewState::Other(other.to_string()),
        }
    }

    pub fn is_actionable(&self) -> bool {
        !matches!(self, ReviewState::Other(_))
    }
}

/// One review as listed by the hosting API, oldest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewRecord {
    pub reviewer: String,
    pub state: ReviewState,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReviewTally {
    pub approvals: u32,
    pub changes_requested: bool,
}

pub fn reduce_reviews(reviews: &[ReviewRecord]) -> ReviewTally {
    let mut latest_by_user: HashMap<&str, &ReviewState> = HashMap::new();
    for review in reviews.iter().filter(|review| review.state.is_actionable()) {
        latest_by_user.insert(review.reviewer.as_str(), &review.state);
    }

    let mut tally = ReviewTally::default();
    for state in latest_by_user.values() {
        match state {
            ReviewState::Approved => tally.approvals += 1,
            ReviewState::ChangesRequested => tally.changes_requested = true,
            ReviewState::Other(_) => {}
        }
    }
    tally
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(reviewer: &str, state: &str) -> ReviewRecord {
        ReviewRecord {
            reviewer: reviewer.to_string(),
            state: ReviewState::parse(state),
        }
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(ReviewState::parse("APPROVED"), ReviewState::Approved);
        assert_eq!(ReviewState::parse("approved"), ReviewState::Approved);
        assert_eq!(
            ReviewState::parse("CHANGES_REQUESTED"),
            ReviewState::ChangesRequested
        );
        assert_eq!(
            ReviewState::parse("COMMENTED"),
            ReviewState::Other("commented".to_string())
        );
    }

    #[test]
    fn test_repeat_approvals_count_once() {
        let tally = reduce_reviews(&[
            review("alice", "APPROVED"),
            review("alice", "APPROVED"),
            review("bob", "APPROVED"),
        ]);
        assert_eq!(tally.approvals, 2);
        assert!(!tally.changes_requested);
    }

    #[test]
    fn test_latest_actionable_state_wins() {
        let tally = reduce_reviews(&[
            review("alice", "CHANGES_REQUESTED"),
            review("alice", "APPROVED"),
            review("bob", "APPROVED"),
            review("bob", "CHANGES_REQUESTED"),
        ]);
        assert_eq!(tally.approvals, 1);
        assert!(tally.changes_requested);
    }

    #[test]
    fn test_comments_and_dismissals_do_not_override() {
        let tally = reduce_reviews(&[
            review("alice", "APPROVED"),
            review("alice", "COMMENTED"),
            review("bob", "DISMISSED"),
            review("carol", "PENDING"),
        ]);
        assert_eq!(tally.approvals, 1);
        assert!(!tally.changes_requested);
    }

    #[test]
    fn test_no_reviews() {
        assert_eq!(reduce_reviews(&[]), ReviewTally::default());
    }
}
