// Core algorithms: dedup ledger, attention rotation, scoring boundary, result buffer
pub mod dedup_ledger;
pub mod rotator;
pub mod scoring;
pub mod signal_buffer;

// Re-export commonly used types
pub use dedup_ledger::{DedupLedger, LedgerMark};
pub use rotator::AttentionRotator;
pub use scoring::{AsyncScoringAdapter, ConfluenceScorer, Direction, ScoreOutcome, ScoringAdapter};
pub use signal_buffer::SignalBuffer;
