//! Pass outcome counters.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Counters reported at the end of a reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PassSummary {
    /// Correlates the summary with the pass's log lines.
    pub pass_id: Uuid,
    pub started_at: DateTime<Utc>,
    /// Pending charges returned by the accounting service.
    pub charges_seen: usize,
    /// Charges whose invoice page carried a PIX code.
    pub charges_with_pix: usize,
    /// Charges paid and recorded during this pass.
    pub charges_paid: usize,
    /// Charges skipped because a payment was already recorded.
    pub charges_already_paid: usize,
    /// Charges whose payment or recording failed.
    pub charges_failed: usize,
    /// Tax documents returned by the accounting service.
    pub documents_seen: usize,
    /// Documents stored for the first time.
    pub documents_new: usize,
    /// New documents that could not be resolved or stored.
    pub documents_failed: usize,
}

impl PassSummary {
    #[must_use]
    pub fn new(pass_id: Uuid) -> Self {
        Self {
            pass_id,
            started_at: Utc::now(),
            charges_seen: 0,
            charges_with_pix: 0,
            charges_paid: 0,
            charges_already_paid: 0,
            charges_failed: 0,
            documents_seen: 0,
            documents_new: 0,
            documents_failed: 0,
        }
    }

    /// Whether any item failed during the pass.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.charges_failed > 0 || self.documents_failed > 0
    }
}
