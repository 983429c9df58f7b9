//! Per-note outcomes and batch aggregates.

use crate::error::NoteError;
use serde::{Deserialize, Serialize};

/// Terminal state of one note after a processing pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Outcome {
    /// The article was fetched and merged; `url` is the URL extracted from
    /// the note (before any rewrite).
    Processed { url: String },

    /// The note already carried `article_processed: true`; nothing was
    /// read past the marker check and nothing was written.
    Skipped,

    /// The note could not be processed; it is left exactly as it was.
    Failed(NoteError),
}

impl Outcome {
    pub fn is_processed(&self) -> bool {
        matches!(self, Outcome::Processed { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Outcome::Skipped)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }
}

/// Aggregate counts for a folder batch.
///
/// One note lands in exactly one bucket, so `processed + skipped + failed`
/// equals the number of notes visited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl BatchSummary {
    /// Total number of notes visited.
    pub fn total(&self) -> usize {
        self.processed + self.skipped + self.failed
    }

    /// Bump the bucket matching `outcome`.
    pub fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Processed { .. } => self.processed += 1,
            Outcome::Skipped => self.skipped += 1,
            Outcome::Failed(_) => self.failed += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_fills_each_bucket_once() {
        let mut summary = BatchSummary::default();
        summary.record(&Outcome::Processed {
            url: "http://x.test/a".into(),
        });
        summary.record(&Outcome::Skipped);
        summary.record(&Outcome::Failed(NoteError::NoUrlFound {
            path: "inbox/empty.md".into(),
        }));
        assert_eq!(
            summary,
            BatchSummary {
                processed: 1,
                skipped: 1,
                failed: 1
            }
        );
        assert_eq!(summary.total(), 3);
    }

    #[test]
    fn outcome_predicates() {
        assert!(Outcome::Skipped.is_skipped());
        assert!(Outcome::Processed {
            url: "http://x.test".into()
        }
        .is_processed());
        assert!(Outcome::Failed(NoteError::NoUrlFound {
            path: "a.md".into()
        })
        .is_failed());
    }

    #[test]
    fn summary_serialises_to_json() {
        let summary = BatchSummary {
            processed: 2,
            skipped: 1,
            failed: 0,
        };
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"processed\":2"));
    }
}
