//! Distribution of batches over independent accelerator cores.
use crate::{PairHmmError, Result, MAX_CORES};
use std::ops::Range;

/// Contiguous batch ranges, one per core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreAssignment {
    pub offsets: Vec<usize>,
    pub lengths: Vec<usize>,
}

/// Splits `batches` evenly over `core_count` cores. The remainder goes to core 0.
pub fn distribute(core_count: usize, batches: usize) -> Result<CoreAssignment> {
    if core_count == 0 || core_count > MAX_CORES {
        return Err(PairHmmError::InvalidCoreCount {
            cores: core_count,
            max: MAX_CORES,
        });
    }
    let share = batches / core_count;
    if share == 0 {
        return Err(PairHmmError::EmptyCore {
            cores: core_count,
            batches,
            core: core_count - 1,
        });
    }
    let mut lengths = vec![share; core_count];
    lengths[0] += batches % core_count;
    let offsets = lengths
        .iter()
        .scan(0, |acc, &len| {
            let offset = *acc;
            *acc += len;
            Some(offset)
        })
        .collect();
    let assignment = CoreAssignment { offsets, lengths };
    debug!("Cores: {:?}", assignment);
    Ok(assignment)
}

impl CoreAssignment {
    pub fn cores(&self) -> usize {
        self.lengths.len()
    }
    pub fn batches(&self) -> usize {
        self.lengths.iter().sum()
    }
    /// Global batch indices handled by `core`.
    pub fn core_range(&self, core: usize) -> Option<Range<usize>> {
        let offset = *self.offsets.get(core)?;
        Some(offset..offset + self.lengths[core])
    }
    /// The core owning global batch `batch`.
    pub fn batch_to_core(&self, batch: usize) -> Result<usize> {
        self.offsets
            .iter()
            .zip(self.lengths.iter())
            .position(|(&offset, &len)| (offset..offset + len).contains(&batch))
            .ok_or_else(|| PairHmmError::BatchOutOfRange {
                batch,
                batches: self.batches(),
            })
    }
    /// Index of global batch `batch` within its core's range.
    pub fn batch_to_core_batch(&self, batch: usize) -> Result<usize> {
        let core = self.batch_to_core(batch)?;
        Ok(batch - self.offsets[core])
    }
}
