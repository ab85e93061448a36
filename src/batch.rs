//! Batches of sequence pairs and their synthesis.
//!
//! All PIPE_DEPTH lanes of a batch share one set of buffers. Lane `l` reads
//! its bases and probabilities starting at offset `l`, so the buffers are
//! `PIPE_DEPTH - 1` entries longer than the padded lengths.
use crate::gen_seq::{self, Spread};
use crate::numeric::Posit32;
use crate::workload::{Geometry, Workload};
use crate::PIPE_DEPTH;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256StarStar;
use rayon::prelude::*;

/// The distributions of the eight probabilities, in wire order.
pub const RANDOM_SPREADS: [Spread; 8] = [
    Spread::new(0.5, 0.1),
    Spread::new(0.125, 0.05),
    Spread::new(0.5, 0.1),
    Spread::new(0.125, 0.05),
    Spread::new(0.5, 0.1),
    Spread::new(0.125, 0.05),
    Spread::new(0.5, 0.1),
    Spread::new(0.125, 0.05),
];

/// Per-position emission and transition probabilities as accelerator words.
/// Fields are declared in wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Probabilities {
    pub eta: u32,
    pub zeta: u32,
    pub epsilon: u32,
    pub delta: u32,
    pub beta: u32,
    pub alpha: u32,
    pub mismatch: u32,
    pub matched: u32,
}

impl Probabilities {
    /// Rounds each value (wire order) to the accelerator's format.
    pub fn from_values(values: [f64; 8]) -> Self {
        let [eta, zeta, epsilon, delta, beta, alpha, mismatch, matched] =
            values.map(|x| Posit32::from_f64(x).to_bits());
        Self {
            eta,
            zeta,
            epsilon,
            delta,
            beta,
            alpha,
            mismatch,
            matched,
        }
    }
    /// Every probability set to `value`.
    pub fn splat(value: f64) -> Self {
        Self::from_values([value; 8])
    }
    pub fn to_words(&self) -> [u32; 8] {
        [
            self.eta,
            self.zeta,
            self.epsilon,
            self.delta,
            self.beta,
            self.alpha,
            self.mismatch,
            self.matched,
        ]
    }
    /// The 32-byte record the accelerator reads per position.
    pub fn to_bytes(&self) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        for (chunk, word) in bytes.chunks_exact_mut(4).zip(self.to_words().iter()) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        bytes
    }
}

impl Default for Probabilities {
    fn default() -> Self {
        Self::from_values([0.5, 0.25, 0.5, 0.25, 0.5, 0.25, 0.5, 0.25])
    }
}

/// One scalar per base, used for all eight probabilities at a position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaseTable {
    pub a: f64,
    pub c: f64,
    pub g: f64,
    pub t: f64,
}

impl BaseTable {
    /// Bases other than ACGT are looked up as A.
    pub fn lookup(&self, base: u8) -> f64 {
        match base {
            b'C' | b'c' => self.c,
            b'G' | b'g' => self.g,
            b'T' | b't' => self.t,
            _ => self.a,
        }
    }
}

#[derive(Debug, Clone)]
pub enum SequenceSource {
    /// Uniform ACGT, seeded per batch and strand.
    Random { seed: u64 },
    /// Batch `b` takes the window starting at `b * buffer_len`, wrapping around.
    /// An empty source yields wildcards.
    Supplied { read: Vec<u8>, hapl: Vec<u8> },
}

#[derive(Debug, Clone)]
pub enum ProbabilityModel {
    Fixed(Probabilities),
    Random { seed: u64 },
    ByBase(BaseTable),
}

#[derive(Debug, Clone)]
pub struct SynthConfig {
    /// The D-matrix seed of a lane is `initial / padded_hapl_len`.
    pub initial: f64,
    pub sequences: SequenceSource,
    pub probabilities: ProbabilityModel,
}

impl SynthConfig {
    pub fn new(initial: f64, sequences: SequenceSource, probabilities: ProbabilityModel) -> Self {
        Self {
            initial,
            sequences,
            probabilities,
        }
    }
}

/// The per-batch block the accelerator is initialised with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchInit {
    pub initials: [u32; PIPE_DEPTH],
    pub read_padded: usize,
    pub read_bp_padded: usize,
    pub hapl_padded: usize,
    pub hapl_bp_padded: usize,
}

#[derive(Debug, Clone)]
pub struct Batch {
    pub id: usize,
    pub geometry: Geometry,
    pub init: BatchInit,
    pub read: Vec<u8>,
    pub hapl: Vec<u8>,
    pub probs: Vec<Probabilities>,
}

impl Batch {
    /// Read buffer length for the geometry.
    pub fn read_buffer_len(geometry: &Geometry) -> usize {
        geometry.padded_read_len() + PIPE_DEPTH - 1
    }
    /// Haplotype buffer length for the geometry.
    pub fn hapl_buffer_len(geometry: &Geometry) -> usize {
        geometry.padded_hapl_len() + PIPE_DEPTH - 1
    }
    pub fn initial(&self, lane: usize) -> u32 {
        self.init.initials[lane]
    }
}

/// Synthesizes batch `batch_num` of the given geometry.
pub fn fill_batch(batch_num: usize, geometry: Geometry, config: &SynthConfig) -> Batch {
    let xp = geometry.padded_read_len();
    let yp = geometry.padded_hapl_len();
    let read_len = Batch::read_buffer_len(&geometry);
    let hapl_len = Batch::hapl_buffer_len(&geometry);
    let (read, hapl) = match &config.sequences {
        SequenceSource::Random { seed } => {
            let strand = 2 * batch_num as u64;
            let mut rng: Xoshiro256StarStar = SeedableRng::seed_from_u64(seed.wrapping_add(strand));
            let read = gen_seq::generate_seq(&mut rng, read_len);
            let mut rng: Xoshiro256StarStar =
                SeedableRng::seed_from_u64(seed.wrapping_add(strand + 1));
            let hapl = gen_seq::generate_seq(&mut rng, hapl_len);
            (read, hapl)
        }
        SequenceSource::Supplied { read, hapl } => (
            window(read, batch_num, read_len),
            window(hapl, batch_num, hapl_len),
        ),
    };
    let probs: Vec<_> = match &config.probabilities {
        ProbabilityModel::Fixed(probs) => vec![*probs; read_len],
        ProbabilityModel::Random { seed } => (0..read_len)
            .map(|i| {
                let position = i * xp + geometry.read_len * 9949 + geometry.hapl_len * 9133;
                let mut rng: Xoshiro256StarStar =
                    SeedableRng::seed_from_u64(seed.wrapping_add(position as u64));
                let values = RANDOM_SPREADS.map(|dist| gen_seq::random_probability(&mut rng, dist));
                Probabilities::from_values(values)
            })
            .collect(),
        ProbabilityModel::ByBase(table) => read
            .iter()
            .map(|&b| Probabilities::splat(table.lookup(b)))
            .collect(),
    };
    let initial = Posit32::from_f64(config.initial / yp as f64).to_bits();
    let init = BatchInit {
        initials: [initial; PIPE_DEPTH],
        read_padded: xp,
        read_bp_padded: geometry.read_bp_padded(),
        hapl_padded: yp,
        hapl_bp_padded: geometry.hapl_bp_padded(),
    };
    trace!(
        "Batch {}: X={} Y={} wildcards={}/{}",
        batch_num,
        xp,
        yp,
        bytecount::count(&read, b'N'),
        bytecount::count(&hapl, b'N'),
    );
    Batch {
        id: batch_num,
        geometry,
        init,
        read,
        hapl,
        probs,
    }
}

/// Synthesizes every batch of the workload.
pub fn fill_batches(workload: &Workload, config: &SynthConfig) -> Vec<Batch> {
    workload
        .batches
        .par_iter()
        .enumerate()
        .map(|(b, &geometry)| fill_batch(b, geometry, config))
        .collect()
}

fn window(source: &[u8], batch_num: usize, len: usize) -> Vec<u8> {
    if source.is_empty() {
        return vec![b'N'; len];
    }
    let start = batch_num * len;
    (start..start + len).map(|i| source[i % source.len()]).collect()
}
