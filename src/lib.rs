//! Software reference and verification engine for a pair-HMM forward accelerator.
//!
//! Workloads of sequence pairs are padded into batches, the forward
//! recurrence is evaluated under several number formats, batches are spread
//! over accelerator cores, and the accelerator's answers are checked against
//! the software references.
#[macro_use]
extern crate log;
pub mod accelerator;
pub mod batch;
pub mod cores;
pub mod dptable;
pub mod error;
pub mod forward;
pub mod gen_seq;
pub mod ledger;
pub mod numeric;
pub mod pipeline;
pub mod validate;
pub mod workload;
pub use error::{PairHmmError, Result};
pub use ledger::Ledger;
pub use numeric::{Decimal, Numeric, Posit32};

/// Processing elements of the systolic array.
pub const PES: usize = 16;
/// Pairs evaluated together in one batch, one per pipeline lane.
pub const PIPE_DEPTH: usize = 16;
/// Bases are stored in blocks of this many.
pub const BASE_STEPS: usize = 8;
/// Upper bound of independent accelerator cores.
pub const MAX_CORES: usize = 8;
/// Relative tolerance between software and accelerator results.
pub const ERROR_MARGIN: f64 = 1e-7;
/// Accelerator clock in Hz.
pub const FREQ: f64 = 166_666_666.67;
/// Peak cell updates per second of one core.
pub const MAX_CUPS: f64 = PES as f64 * FREQ;
/// Unwritten accelerator result slots hold this word.
pub const SENTINEL: u32 = 0xDEAD_BEEF;
