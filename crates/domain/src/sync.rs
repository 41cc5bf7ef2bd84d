//! Outcome summaries of synchronisation passes.

use serde::Serialize;

/// What happened to one entity during reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Created,
    Updated,
    Unchanged,
    /// Left alone: grace period active, or hub entity missing.
    Skipped,
    Removed,
}

/// Per-pass counters for device reconciliation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub removed: usize,
}

impl SyncReport {
    pub fn record(&mut self, outcome: SyncOutcome) {
        match outcome {
            SyncOutcome::Created => self.created += 1,
            SyncOutcome::Updated => self.updated += 1,
            SyncOutcome::Unchanged => self.unchanged += 1,
            SyncOutcome::Skipped => self.skipped += 1,
            SyncOutcome::Removed => self.removed += 1,
        }
    }

    /// Whether the pass wrote anything to the registry.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        self.created + self.updated + self.removed > 0
    }
}

/// Counters for an area-to-room synchronisation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AreaSyncReport {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub devices_assigned: usize,
}

impl AreaSyncReport {
    /// Whether any room was created or renamed.
    #[must_use]
    pub fn touched_rooms(&self) -> bool {
        self.created + self.updated > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_count_each_outcome() {
        let mut report = SyncReport::default();
        report.record(SyncOutcome::Created);
        report.record(SyncOutcome::Updated);
        report.record(SyncOutcome::Updated);
        report.record(SyncOutcome::Skipped);

        assert_eq!(report.created, 1);
        assert_eq!(report.updated, 2);
        assert_eq!(report.skipped, 1);
        assert!(report.has_changes());
    }

    #[test]
    fn should_report_no_changes_when_only_unchanged_or_skipped() {
        let mut report = SyncReport::default();
        report.record(SyncOutcome::Unchanged);
        report.record(SyncOutcome::Skipped);
        assert!(!report.has_changes());
    }
}
