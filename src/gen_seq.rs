//! Random inputs for synthetic workloads.
//! Everything here is deterministic given the generator it is handed.
use crate::numeric::Posit;
use rand::seq::SliceRandom;
use rand::Rng;

/// Draws per distribution before giving up on an exactly representable value.
const MAX_DRAWS: usize = 1_000;

pub fn generate_seq<T: rand::Rng>(rng: &mut T, len: usize) -> Vec<u8> {
    let bases = b"ACTG";
    (0..len)
        .filter_map(|_| bases.choose(rng))
        .copied()
        .collect()
}

/// A probability distribution `offset + U[0,1) * spread`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spread {
    pub offset: f64,
    pub spread: f64,
}

impl Spread {
    pub const fn new(offset: f64, spread: f64) -> Self {
        Self { offset, spread }
    }
}

/// Draws a single precision value from `dist` which both posit<32,2> and
/// posit<32,3> hold exactly, so every representation starts from the same number.
/// If no draw qualifies, the offset rounded to posit<32,2> is returned.
pub fn random_probability<R: Rng>(rng: &mut R, dist: Spread) -> f64 {
    for _ in 0..MAX_DRAWS {
        let x = (dist.offset + rng.gen::<f64>() * dist.spread) as f32 as f64;
        if Posit::<2>::is_exact(x) && Posit::<3>::is_exact(x) {
            return x;
        }
    }
    warn!("No exact draw from {:?}", dist);
    Posit::<2>::from_f64(dist.offset).to_f64()
}
