//! Workloads and the padding rules of the systolic array.
use crate::{PairHmmError, Result, BASE_STEPS, PES, PIPE_DEPTH};

/// `y` rounded up to a multiple of PES.
pub fn padded_hapl_len(y: usize) -> usize {
    (y + PES - 1) / PES * PES
}

/// Reads are at least PES long. When the haplotype needs more than one
/// pass, one extra cycle covers the latency of the feedback path.
pub fn padded_read_len(x: usize, y: usize) -> usize {
    if padded_hapl_len(y) > PES {
        if x <= PES {
            PES + 1
        } else {
            x
        }
    } else if x < PES {
        PES
    } else {
        x
    }
}

/// `n` rounded up to a multiple of BASE_STEPS.
pub fn base_pair_pad(n: usize) -> usize {
    (n + BASE_STEPS - 1) / BASE_STEPS * BASE_STEPS
}

/// Passes the array makes over a haplotype of length `y`.
pub fn passes(y: usize) -> usize {
    match y {
        0 => 0,
        _ => 1 + (y - 1) / PES,
    }
}

/// Working geometry of a batch: the longest read and haplotype among its lanes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Geometry {
    pub read_len: usize,
    pub hapl_len: usize,
}

impl Geometry {
    pub fn new(read_len: usize, hapl_len: usize) -> Self {
        Self { read_len, hapl_len }
    }
    pub fn padded_read_len(&self) -> usize {
        padded_read_len(self.read_len, self.hapl_len)
    }
    pub fn padded_hapl_len(&self) -> usize {
        padded_hapl_len(self.hapl_len)
    }
    pub fn read_bp_padded(&self) -> usize {
        base_pair_pad(self.padded_read_len())
    }
    pub fn hapl_bp_padded(&self) -> usize {
        base_pair_pad(self.padded_hapl_len())
    }
    pub fn passes(&self) -> usize {
        passes(self.hapl_len)
    }
}

#[derive(Debug, Clone)]
pub struct Workload {
    /// Read length of each pair.
    pub reads: Vec<usize>,
    /// Haplotype length of each pair.
    pub hapls: Vec<usize>,
    /// One geometry per batch of PIPE_DEPTH pairs.
    pub batches: Vec<Geometry>,
    /// Total cell updates, sum of read_len * hapl_len.
    pub cups: u64,
}

/// A workload of `pairs` pairs which all share the same lengths.
pub fn generate(pairs: usize, read_len: usize, hapl_len: usize) -> Result<Workload> {
    Workload::from_lengths(vec![read_len; pairs], vec![hapl_len; pairs])
}

impl Workload {
    pub fn from_lengths(reads: Vec<usize>, hapls: Vec<usize>) -> Result<Self> {
        if reads.len() != hapls.len() {
            return Err(PairHmmError::LengthMismatch {
                reads: reads.len(),
                hapls: hapls.len(),
            });
        }
        let pairs = reads.len();
        if pairs == 0 {
            return Err(PairHmmError::NoPairs);
        }
        if pairs % PIPE_DEPTH != 0 {
            return Err(PairHmmError::InvalidPairCount {
                pairs,
                depth: PIPE_DEPTH,
            });
        }
        let cups = reads
            .iter()
            .zip(hapls.iter())
            .map(|(&x, &y)| (x * y) as u64)
            .sum();
        let batches: Vec<_> = reads
            .chunks_exact(PIPE_DEPTH)
            .zip(hapls.chunks_exact(PIPE_DEPTH))
            .map(|(xs, ys)| {
                let read_len = xs.iter().copied().max().unwrap_or(0);
                let hapl_len = ys.iter().copied().max().unwrap_or(0);
                Geometry::new(read_len, hapl_len)
            })
            .collect();
        let workload = Self {
            reads,
            hapls,
            batches,
            cups,
        };
        workload.log_table();
        Ok(workload)
    }
    pub fn pairs(&self) -> usize {
        self.reads.len()
    }
    pub fn batch_count(&self) -> usize {
        self.batches.len()
    }
    fn log_table(&self) {
        debug!(
            "Workload: {} pairs, {} batches, {} CUPS",
            self.pairs(),
            self.batch_count(),
            self.cups
        );
        debug!("batch\tmax X\tmax Y\tpasses");
        for (b, geometry) in self.batches.iter().enumerate() {
            let (x, y) = (geometry.read_len, geometry.hapl_len);
            debug!("{}\t{}\t{}\t{}", b, x, y, geometry.passes());
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::Rng;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256StarStar;
    #[test]
    fn padding_rules() {
        assert_eq!(padded_hapl_len(1), 16);
        assert_eq!(padded_hapl_len(16), 16);
        assert_eq!(padded_hapl_len(17), 32);
        assert_eq!(padded_read_len(3, 16), 16);
        assert_eq!(padded_read_len(16, 16), 16);
        assert_eq!(padded_read_len(20, 16), 20);
        assert_eq!(padded_read_len(3, 17), 17);
        assert_eq!(padded_read_len(16, 17), 17);
        assert_eq!(padded_read_len(40, 17), 40);
        assert_eq!(base_pair_pad(17), 24);
        assert_eq!(base_pair_pad(16), 16);
        assert_eq!(passes(16), 1);
        assert_eq!(passes(17), 2);
        assert_eq!(passes(0), 0);
    }
    #[test]
    fn padding_is_idempotent() {
        let mut rng: Xoshiro256StarStar = SeedableRng::seed_from_u64(43);
        for _ in 0..1000 {
            let x = rng.gen_range(0..200);
            let y = rng.gen_range(0..200);
            let xp = padded_read_len(x, y);
            assert_eq!(padded_read_len(xp, y), xp);
            assert_eq!(padded_hapl_len(padded_hapl_len(y)), padded_hapl_len(y));
            assert_eq!(base_pair_pad(base_pair_pad(x)), base_pair_pad(x));
            assert!(xp >= x && xp >= PES);
        }
    }
    #[test]
    fn generate_checks_pair_count() {
        for pairs in (1..100).map(|k| k * PIPE_DEPTH) {
            let workload = generate(pairs, 10, 20).unwrap();
            assert_eq!(workload.batch_count(), pairs / PIPE_DEPTH);
            assert_eq!(workload.cups, (pairs * 200) as u64);
        }
        for pairs in (1..100).filter(|p| p % PIPE_DEPTH != 0) {
            match generate(pairs, 10, 20) {
                Err(PairHmmError::InvalidPairCount { .. }) => {}
                x => panic!("{:?}", x),
            }
        }
        assert!(matches!(generate(0, 10, 20), Err(PairHmmError::NoPairs)));
    }
    #[test]
    fn per_pair_lengths() {
        let reads: Vec<_> = (0..32).collect();
        let hapls: Vec<_> = (0..32).map(|i| 64 - i).collect();
        let workload = Workload::from_lengths(reads, hapls).unwrap();
        assert_eq!(workload.batches[0], Geometry::new(15, 64));
        assert_eq!(workload.batches[1], Geometry::new(31, 48));
        assert_eq!(workload.batches[1].padded_read_len(), 31);
        assert_eq!(workload.batches[0].padded_read_len(), 17);
        let mismatch = Workload::from_lengths(vec![1; 16], vec![1; 15]);
        assert!(matches!(mismatch, Err(PairHmmError::LengthMismatch { .. })));
    }
}
