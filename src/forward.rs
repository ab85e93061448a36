//! The forward recurrence of the pair-HMM, generic over the number format.
//!
//! ```text
//! M[i][j] = distm * (alpha * M[i-1][j-1] + beta * I[i-1][j-1] + beta * D[i-1][j-1])
//! I[i][j] = delta * M[i-1][j] + epsilon * I[i-1][j]
//! D[i][j] = zeta * M[i][j-1] + eta * D[i][j-1]
//! ```
//! Row 0 of D holds the lane's seed, every other boundary cell is zero.
//! All arithmetic happens in `T`, in the same order for every format.
use crate::batch::{Batch, Probabilities};
use crate::dptable::{MidTable, State};
use crate::ledger::{result_name, Ledger};
use crate::numeric::Numeric;
use crate::PIPE_DEPTH;
use rayon::prelude::*;
use std::marker::PhantomData;

/// Matches any base.
pub const WILDCARD: u8 = b'N';

// Probabilities of one read position, decoded into T.
#[derive(Debug, Clone)]
struct Transitions<T> {
    eta: T,
    zeta: T,
    epsilon: T,
    delta: T,
    beta: T,
    alpha: T,
    mismatch: T,
    matched: T,
}

impl<T: Numeric> Transitions<T> {
    fn decode(probs: &Probabilities) -> Self {
        Self {
            eta: T::from_posit_bits(probs.eta),
            zeta: T::from_posit_bits(probs.zeta),
            epsilon: T::from_posit_bits(probs.epsilon),
            delta: T::from_posit_bits(probs.delta),
            beta: T::from_posit_bits(probs.beta),
            alpha: T::from_posit_bits(probs.alpha),
            mismatch: T::from_posit_bits(probs.mismatch),
            matched: T::from_posit_bits(probs.matched),
        }
    }
    fn distm(&self, read: u8, hapl: u8) -> T {
        if read == hapl || read == WILDCARD || hapl == WILDCARD {
            self.matched.clone()
        } else {
            self.mismatch.clone()
        }
    }
}

/// Evaluates batches under the number format `T`.
#[derive(Debug, Clone)]
pub struct ForwardEngine<T> {
    show_table: bool,
    _format: PhantomData<T>,
}

impl<T: Numeric> Default for ForwardEngine<T> {
    fn default() -> Self {
        Self::new(false)
    }
}

impl<T: Numeric> ForwardEngine<T> {
    /// With `show_table`, every table is printed at trace level.
    pub fn new(show_table: bool) -> Self {
        Self {
            show_table,
            _format: PhantomData,
        }
    }
    /// Fills the tables of `lane` for a read of `read_len` and a haplotype of `hapl_len`.
    ///
    /// # Panics
    /// If `lane >= PIPE_DEPTH` or the batch's buffers are too short for the lane.
    /// Both are bugs of the caller: `calculate` only asks for lanes and lengths
    /// taken from the batch itself.
    pub fn calculate_mids(
        &self,
        batch: &Batch,
        lane: usize,
        read_len: usize,
        hapl_len: usize,
    ) -> MidTable<T> {
        assert!(lane < PIPE_DEPTH, "lane {} out of range", lane);
        assert!(
            lane + read_len <= batch.read.len() && lane + hapl_len <= batch.hapl.len(),
            "batch {} cannot hold {}x{} at lane {}",
            batch.id,
            read_len,
            hapl_len,
            lane
        );
        let read = &batch.read[lane..lane + read_len];
        let hapl = &batch.hapl[lane..lane + hapl_len];
        let probs = &batch.probs[lane..lane + read_len];
        let mut dptable = MidTable::new(read, hapl, T::zero());
        let seed = T::from_posit_bits(batch.initial(lane));
        for j in 0..=hapl_len {
            *dptable.get_mut(0, j, State::Del) = seed.clone();
        }
        for (i, (&x, probs)) in read.iter().zip(probs).enumerate().map(|(p, x)| (p + 1, x)) {
            let t = Transitions::<T>::decode(probs);
            for (j, &y) in hapl.iter().enumerate().map(|(p, y)| (p + 1, y)) {
                let mat = t.distm(x, y)
                    * (t.alpha.clone() * dptable.get(i - 1, j - 1, State::Mat).clone()
                        + t.beta.clone() * dptable.get(i - 1, j - 1, State::Ins).clone()
                        + t.beta.clone() * dptable.get(i - 1, j - 1, State::Del).clone());
                let ins = t.delta.clone() * dptable.get(i - 1, j, State::Mat).clone()
                    + t.epsilon.clone() * dptable.get(i - 1, j, State::Ins).clone();
                *dptable.get_mut(i, j, State::Mat) = mat;
                *dptable.get_mut(i, j, State::Ins) = ins;
                let del = t.zeta.clone() * dptable.get(i, j - 1, State::Mat).clone()
                    + t.eta.clone() * dptable.get(i, j - 1, State::Del).clone();
                *dptable.get_mut(i, j, State::Del) = del;
            }
        }
        dptable
    }
    /// Total probability of the pair at `lane`. Panics like `calculate_mids`.
    pub fn calculate_pair(
        &self,
        batch: &Batch,
        lane: usize,
        read_len: usize,
        hapl_len: usize,
    ) -> T {
        let dptable = self.calculate_mids(batch, lane, read_len, hapl_len);
        if self.show_table {
            trace!("{}[{}][{}]\n{}", T::NAME, batch.id, lane, dptable);
        }
        dptable.result()
    }
    /// Evaluates every lane of every batch with the batch's working geometry.
    /// Results are named `result[b][l]` and recorded in batch, then lane order.
    pub fn calculate(&self, batches: &[Batch]) -> Ledger<T> {
        let results: Vec<Vec<T>> = batches
            .par_iter()
            .map(|batch| {
                let (x, y) = (batch.geometry.read_len, batch.geometry.hapl_len);
                (0..PIPE_DEPTH)
                    .map(|lane| self.calculate_pair(batch, lane, x, y))
                    .collect()
            })
            .collect();
        let ledger: Ledger<T> = batches
            .iter()
            .zip(results)
            .flat_map(|(batch, lanes)| {
                let id = batch.id;
                lanes
                    .into_iter()
                    .enumerate()
                    .map(move |(lane, value)| (result_name(id, lane), value))
            })
            .collect();
        debug!("{}: {} results", T::NAME, ledger.len());
        ledger
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::batch::{fill_batch, BatchInit, ProbabilityModel, SequenceSource, SynthConfig};
    use crate::numeric::{Decimal, Posit32};
    use crate::workload::Geometry;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256StarStar;

    fn supplied_batch(read: &[u8], hapl: &[u8], probs: Probabilities, seed: f64) -> Batch {
        let geometry = Geometry::new(read.len(), hapl.len());
        let mut batch = fill_batch(
            0,
            geometry,
            &SynthConfig::new(
                1.0,
                SequenceSource::Supplied {
                    read: vec![],
                    hapl: vec![],
                },
                ProbabilityModel::Fixed(probs),
            ),
        );
        batch.read[..read.len()].copy_from_slice(read);
        batch.hapl[..hapl.len()].copy_from_slice(hapl);
        let init = BatchInit {
            initials: [Posit32::from_f64(seed).to_bits(); PIPE_DEPTH],
            ..batch.init
        };
        batch.init = init;
        batch
    }

    fn uniform() -> Probabilities {
        // eta zeta epsilon delta beta alpha mismatch match
        Probabilities::from_values([0.25, 0.25, 0.25, 0.25, 0.25, 0.25, 0.5, 0.5])
    }

    #[test]
    fn two_by_two() {
        // With D[0][*] = 1:
        // M[1][1] = .5*(.25*0 + .25*0 + .25*1) = 0.125, M[1][2] = 0.125
        // I[1][*] = 0
        // D[1][1] = .25*M[1][0] + .25*D[1][0] = 0, D[1][2] = .25*.125 = 0.03125
        // M[2][1] = .5*(.25*M[1][0] + .25*I[1][0] + .25*D[1][0]) = 0
        // M[2][2] = .5*(.25*.125 + 0 + 0) = 0.015625
        // I[2][1] = .25*.125 = 0.03125, I[2][2] = .25*.125 = 0.03125
        // result = (0 + 0.015625) + (0.03125 + 0.03125) = 0.078125
        let batch = supplied_batch(b"AC", b"AC", uniform(), 1.0);
        let engine = ForwardEngine::<f32>::default();
        assert_eq!(engine.calculate_pair(&batch, 0, 2, 2), 0.078125);
        let posit = ForwardEngine::<Posit32>::default().calculate_pair(&batch, 0, 2, 2);
        assert_eq!(posit.to_f64(), 0.078125);
        let exact = ForwardEngine::<Decimal>::default().calculate_pair(&batch, 0, 2, 2);
        assert_eq!(exact, Decimal::from_f64(0.078125));
        // Deterministic.
        assert_eq!(ForwardEngine::<Posit32>::default().calculate_pair(&batch, 0, 2, 2), posit);
    }
    #[test]
    fn wildcard_matches() {
        let probs = Probabilities::from_values([0.25, 0.25, 0.25, 0.25, 0.25, 0.25, 0.125, 0.5]);
        let with_n = supplied_batch(b"AN", b"AC", probs, 1.0);
        let exact = supplied_batch(b"AC", b"AC", probs, 1.0);
        let mismatch = supplied_batch(b"AG", b"AC", probs, 1.0);
        let engine = ForwardEngine::<f32>::default();
        let n = engine.calculate_pair(&with_n, 0, 2, 2);
        assert_eq!(n, engine.calculate_pair(&exact, 0, 2, 2));
        assert!(n > engine.calculate_pair(&mismatch, 0, 2, 2));
    }
    #[test]
    fn degenerate_geometry() {
        let batch = supplied_batch(b"ACGT", b"ACGT", uniform(), 1.0);
        let engine = ForwardEngine::<Posit32>::default();
        assert_eq!(engine.calculate_pair(&batch, 0, 0, 4), Posit32::ZERO);
        assert_eq!(engine.calculate_pair(&batch, 3, 4, 0), Posit32::ZERO);
        let table = engine.calculate_mids(&batch, 0, 0, 0);
        assert_eq!((table.row(), table.column()), (1, 1));
        assert_eq!(Numeric::to_bits(table.get(0, 0, State::Del)), batch.initial(0));
    }
    #[test]
    fn haplotype_permutation_invariance() {
        let mut rng: Xoshiro256StarStar = SeedableRng::seed_from_u64(3290);
        let engine = ForwardEngine::<Decimal>::default();
        for _ in 0..10 {
            let xs = crate::gen_seq::generate_seq(&mut rng, 12);
            let mut ys = crate::gen_seq::generate_seq(&mut rng, 14);
            let batch = supplied_batch(&xs, &ys, uniform(), 1.0);
            let before = engine.calculate_pair(&batch, 0, 12, 14);
            ys.shuffle(&mut rng);
            let batch = supplied_batch(&xs, &ys, uniform(), 1.0);
            let after = engine.calculate_pair(&batch, 0, 12, 14);
            assert_eq!(before, after);
            assert!(before > Decimal::zero());
        }
    }
    #[test]
    #[should_panic(expected = "lane 16 out of range")]
    fn lane_beyond_pipeline_panics() {
        let batch = supplied_batch(b"AC", b"AC", uniform(), 1.0);
        ForwardEngine::<f32>::default().calculate_pair(&batch, PIPE_DEPTH, 2, 2);
    }
    #[test]
    #[should_panic(expected = "cannot hold")]
    fn read_longer_than_buffer_panics() {
        let batch = supplied_batch(b"AC", b"AC", uniform(), 1.0);
        let too_long = batch.read.len();
        ForwardEngine::<f32>::default().calculate_pair(&batch, 1, too_long, 2);
    }
    #[test]
    fn zero_seed_gives_zero() {
        let batch = supplied_batch(b"AC", b"AC", uniform(), 0.0);
        let engine = ForwardEngine::<f32>::default();
        assert_eq!(engine.calculate_pair(&batch, 0, 2, 2), 0.0);
        assert_eq!(engine.calculate_pair(&batch, 0, 2, 2), 0.0);
    }
    #[test]
    fn lanes_read_staggered_positions() {
        let geometry = Geometry::new(8, 8);
        let config = SynthConfig::new(
            16.0,
            SequenceSource::Random { seed: 4 },
            ProbabilityModel::Random { seed: 4 },
        );
        let batch = fill_batch(0, geometry, &config);
        let engine = ForwardEngine::<f32>::default();
        let table = engine.calculate_mids(&batch, 5, 8, 8);
        let dump = table.to_string();
        let header: String = batch.hapl[5..13]
            .iter()
            .map(|&b| format!("\t{}", b as char))
            .collect();
        assert!(dump.lines().next().unwrap().ends_with(&header));
    }
    #[test]
    fn ledger_names_every_lane() {
        let workload = crate::workload::generate(32, 10, 12).unwrap();
        let config = SynthConfig::new(
            2f64.powi(20),
            SequenceSource::Random { seed: 24 },
            ProbabilityModel::Random { seed: 24 },
        );
        let batches = crate::batch::fill_batches(&workload, &config);
        let ledger = ForwardEngine::<Posit32>::default().calculate(&batches);
        assert_eq!(ledger.len(), 32);
        let names: Vec<_> = ledger.names().take(3).collect();
        assert_eq!(names, vec!["result[0][0]", "result[0][1]", "result[0][2]"]);
        let engine = ForwardEngine::<Posit32>::default();
        let direct = engine.calculate_pair(&batches[1], 7, 10, 12);
        assert_eq!(ledger.get("result[1][7]"), Some(&direct));
        assert!(ledger.iter().all(|(_, x)| *x > Posit32::ZERO));
    }
}
