//! Sequence counter state and reset policy.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use super::ResetFrequency;

/// Persistent counter state for one document type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceCounter {
    /// Document type this counter belongs to.
    pub document_type: String,

    /// Highest sequence value consumed. Baseline is `starting_number - 1`.
    pub last_number: i64,

    /// When the counter was last reset, absent before the first reset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reset_at: Option<DateTime<Utc>>,

    /// Version for persistence bookkeeping.
    pub version: u64,

    /// Last update timestamp (milliseconds since epoch).
    pub updated_at: i64,
}

impl SequenceCounter {
    /// Create a counter at the given baseline.
    #[must_use]
    pub fn new(document_type: String, baseline: i64) -> Self {
        Self {
            document_type,
            last_number: baseline,
            last_reset_at: None,
            version: 0,
            updated_at: Utc::now().timestamp_millis(),
        }
    }

    /// Whether a reset is due at `now` for the given frequency.
    ///
    /// An absent `last_reset_at` counts as due for every periodic frequency,
    /// so the first allocation of a periodic sequence stamps its period.
    #[must_use]
    pub fn reset_due(&self, frequency: ResetFrequency, now: DateTime<Utc>) -> bool {
        if frequency == ResetFrequency::Never {
            return false;
        }

        let Some(last) = self.last_reset_at else {
            return true;
        };

        match frequency {
            ResetFrequency::Never => false,
            ResetFrequency::Yearly => last.year() != now.year(),
            ResetFrequency::Monthly => last.year() != now.year() || last.month() != now.month(),
            ResetFrequency::Daily => last.date_naive() != now.date_naive(),
        }
    }

    /// Reset the counter to `baseline` and stamp the reset time.
    pub fn apply_reset(&mut self, baseline: i64, now: DateTime<Utc>) {
        self.last_number = baseline;
        self.last_reset_at = Some(now);
    }
}
