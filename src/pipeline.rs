//! One complete verification run.
use crate::accelerator::{hardware_ledger, Accelerator, AcceleratorJob};
use crate::batch::{fill_batches, Batch, ProbabilityModel, SequenceSource, SynthConfig};
use crate::cores::distribute;
use crate::forward::ForwardEngine;
use crate::ledger::Ledger;
use crate::numeric::{Decimal, Numeric, Posit32};
use crate::validate::{count_errors, validate, ErrorCount, Validation};
use crate::workload::generate;
use crate::{Result, ERROR_MARGIN, MAX_CUPS};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub pairs: usize,
    pub read_len: usize,
    pub hapl_len: usize,
    /// The D-matrix seeds are `2^initial_power / padded_hapl_len`.
    pub initial_power: i32,
    pub cores: usize,
    pub sequences: SequenceSource,
    pub probabilities: ProbabilityModel,
    pub timeout: Duration,
    /// Relative tolerance of `count_errors`.
    pub margin: f64,
    /// Trace every M/I/D table of the posit engine.
    pub show_table: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            pairs: 16,
            read_len: 8,
            hapl_len: 16,
            initial_power: 1,
            cores: 1,
            sequences: SequenceSource::Random { seed: 42 },
            probabilities: ProbabilityModel::Fixed(Default::default()),
            timeout: Duration::from_secs(60),
            margin: ERROR_MARGIN,
            show_table: false,
        }
    }
}

impl RunConfig {
    pub fn new(pairs: usize, read_len: usize, hapl_len: usize, cores: usize) -> Self {
        Self {
            pairs,
            read_len,
            hapl_len,
            cores,
            ..Default::default()
        }
    }
    pub fn synth_config(&self) -> SynthConfig {
        SynthConfig::new(
            2f64.powi(self.initial_power),
            self.sequences.clone(),
            self.probabilities.clone(),
        )
    }
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub pairs: usize,
    pub batches: usize,
    pub cups: u64,
    pub validation: Validation,
    pub errors: ErrorCount,
    /// From submission until the accelerator's results arrived.
    pub hardware_time: Duration,
    /// Time the posit engine took for the same workload.
    pub software_time: Duration,
}

impl RunSummary {
    pub fn hardware_gcups(&self) -> f64 {
        self.cups as f64 / self.hardware_time.as_secs_f64() / 1e9
    }
    pub fn software_gcups(&self) -> f64 {
        self.cups as f64 / self.software_time.as_secs_f64() / 1e9
    }
    /// Fraction of the peak throughput of `cores` cores the accelerator reached.
    pub fn efficiency(&self, cores: usize) -> f64 {
        self.hardware_gcups() * 1e9 / (MAX_CUPS * cores as f64)
    }
}

fn timed<T: Numeric>(engine: &ForwardEngine<T>, batches: &[Batch]) -> (Ledger<T>, Duration) {
    let start = Instant::now();
    let ledger = engine.calculate(batches);
    let elapsed = start.elapsed();
    info!("{}\t{} results\t{:.3}s", T::NAME, ledger.len(), elapsed.as_secs_f64());
    (ledger, elapsed)
}

/// Generates the workload, hands it to the accelerator, computes the
/// software references while the accelerator runs, and compares them.
/// Configuration errors abort before anything is computed.
pub fn run<A: Accelerator>(config: &RunConfig, accelerator: &mut A) -> Result<RunSummary> {
    let workload = generate(config.pairs, config.read_len, config.hapl_len)?;
    let assignment = distribute(config.cores, workload.batch_count())?;
    info!(
        "Pairs:{}\tBatches:{}\tCores:{}\tCUPS:{}",
        workload.pairs(),
        workload.batch_count(),
        assignment.cores(),
        workload.cups
    );
    let batches = Arc::new(fill_batches(&workload, &config.synth_config()));
    let job = AcceleratorJob::new(batches.clone(), assignment.clone())?;
    let start = Instant::now();
    accelerator.submit(job)?;
    info!("Submitted");
    let (fast, _) = timed(&ForwardEngine::<f32>::default(), &batches);
    let (posit, software_time) = timed(&ForwardEngine::<Posit32>::new(config.show_table), &batches);
    let (exact, _) = timed(&ForwardEngine::<Decimal>::default(), &batches);
    let buffers = accelerator.wait(config.timeout)?;
    let hardware_time = start.elapsed();
    info!("Accelerator finished in {:.3}s", hardware_time.as_secs_f64());
    let hardware = hardware_ledger(&buffers, &assignment)?;
    let validation = validate(&exact, &fast, &posit, &hardware);
    let errors = count_errors(&posit, &hardware, config.margin);
    let summary = RunSummary {
        pairs: workload.pairs(),
        batches: workload.batch_count(),
        cups: workload.cups,
        validation,
        errors,
        hardware_time,
        software_time,
    };
    let (fast_digits, posit_digits, hw_digits) = summary.validation.mean_accuracy();
    info!(
        "Mean accuracy\tfloat:{:.2}\tposit:{:.2}\thardware:{:.2}",
        fast_digits, posit_digits, hw_digits
    );
    info!(
        "GCUPS\thardware:{:.3}\tsoftware:{:.3}\tpeak:{:.1}%",
        summary.hardware_gcups(),
        summary.software_gcups(),
        100f64 * summary.efficiency(assignment.cores())
    );
    if summary.errors.violations > 0 {
        warn!("{}/{} results out of tolerance", errors.violations, errors.checked);
    } else {
        info!("All {} results within tolerance", errors.checked);
    }
    Ok(summary)
}
