use serde::{Deserialize, Serialize};

use crate::database::models::PrStatus;

/// Review state of one pull request at a point in time, either fetched from
/// GitHub or assembled from stored state plus one webhook event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewSnapshot {
    pub title: String,
    pub approval_count: u32,
    pub changes_requested: bool,
    pub merged: bool,
    pub closed: bool,
}

/// Maps a snapshot to exactly one status by fixed priority:
/// merged > closed > changes_requested > approved > open.
///
/// `Open` means "nothing to report"; callers do not persist it as a change.
pub fn derive_status(snapshot: &ReviewSnapshot, approvals_required: u32) -> PrStatus {
    if snapshot.merged {
        PrStatus::Merged
    } else if snapshot.closed {
        PrStatus::Closed
    } else if snapshot.changes_requested {
        PrStatus::ChangesRequested
    } else if snapshot.approval_count >= approvals_required {
        PrStatus::Approved
    } else {
        PrStatus::Open
    }
}

/// Snapshot flags implied by a stored terminal status, so that re-deriving
/// from stored state never walks a merged or closed PR back.
pub(crate) fn terminal_flags(status: PrStatus) -> (bool, bool) {
    (status == PrStatus::Merged, status == PrStatus::Closed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(approvals: u32, changes: bool, merged: bool, closed: bool) -> ReviewSnapshot {
        ReviewSnapshot {
            title: String::new(),
            approval_count: approvals,
            changes_requested: changes,
            merged,
            closed,
        }
    }

    #[test]
    fn test_merged_wins_over_everything() {
        for approvals in 0..4 {
            for changes in [false, true] {
                for closed in [false, true] {
                    let s = snapshot(approvals, changes, true, closed);
                    assert_eq!(derive_status(&s, 2), PrStatus::Merged);
                }
            }
        }
    }

    #[test]
    fn test_closed_when_not_merged() {
        for approvals in 0..4 {
            for changes in [false, true] {
                let s = snapshot(approvals, changes, false, true);
                assert_eq!(derive_status(&s, 1), PrStatus::Closed);
            }
        }
    }

    #[test]
    fn test_changes_requested_beats_approvals() {
        let s = snapshot(5, true, false, false);
        assert_eq!(derive_status(&s, 1), PrStatus::ChangesRequested);
    }

    #[test]
    fn test_approved_at_threshold() {
        assert_eq!(derive_status(&snapshot(2, false, false, false), 2), PrStatus::Approved);
        assert_eq!(derive_status(&snapshot(3, false, false, false), 2), PrStatus::Approved);
        assert_eq!(derive_status(&snapshot(1, false, false, false), 2), PrStatus::Open);
    }

    #[test]
    fn test_default_snapshot_is_open() {
        assert_eq!(derive_status(&ReviewSnapshot::default(), 1), PrStatus::Open);
    }

    #[test]
    fn test_terminal_flags() {
        assert_eq!(terminal_flags(PrStatus::Merged), (true, false));
        assert_eq!(terminal_flags(PrStatus::Closed), (false, true));
        assert_eq!(terminal_flags(PrStatus::Approved), (false, false));
    }
}
