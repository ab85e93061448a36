//! Error types of the reference engine.
use std::time::Duration;

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, PairHmmError>;

/// Errors raised while generating a workload, distributing it, or
/// talking to an accelerator.
/// Numeric edge cases in the validator are never errors; they have defined outputs.
#[derive(Debug, thiserror::Error)]
pub enum PairHmmError {
    #[error("number of pairs ({pairs}) must be an integer multiple of {depth}")]
    InvalidPairCount { pairs: usize, depth: usize },
    #[error("a workload needs at least one pair")]
    NoPairs,
    #[error("{reads} read lengths but {hapls} haplotype lengths")]
    LengthMismatch { reads: usize, hapls: usize },
    #[error("core count must be in 1..={max}, got {cores}")]
    InvalidCoreCount { cores: usize, max: usize },
    #[error("{batches} batches cannot occupy {cores} cores; core {core} would be idle")]
    EmptyCore {
        cores: usize,
        batches: usize,
        core: usize,
    },
    #[error("the core assignment covers {assigned} batches, but the job has {batches}")]
    AssignmentMismatch { assigned: usize, batches: usize },
    #[error("batch {batch} is outside of the {batches} distributed batches")]
    BatchOutOfRange { batch: usize, batches: usize },
    #[error("lane {lane} is outside of the pipeline depth {depth}")]
    LaneOutOfRange { lane: usize, depth: usize },
    #[error("accelerator did not finish within {0:?}")]
    AcceleratorTimeout(Duration),
    #[error("accelerator left {pending} result slots unwritten")]
    IncompleteResult { pending: usize },
    #[error("accelerator has no job in flight or its worker hung up")]
    AcceleratorDisconnected,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
