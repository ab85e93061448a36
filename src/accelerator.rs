//! The boundary to the accelerator.
//!
//! A job is submitted once and its results are collected with a blocking
//! wait. The accelerator writes one posit word per pair into a buffer per
//! core. Inside a core the batch order is reversed: the last batch of the
//! core occupies the first PIPE_DEPTH slots. Lanes keep their order.
//! `hardware_slot` is the only place which knows about this layout.
use crate::batch::{Batch, BatchInit};
use crate::cores::CoreAssignment;
use crate::forward::ForwardEngine;
use crate::ledger::{result_name, Ledger};
use crate::numeric::Posit32;
use crate::{PairHmmError, Result, PIPE_DEPTH, SENTINEL};
use crossbeam::channel::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;

/// Everything the accelerator needs for one run.
#[derive(Debug, Clone)]
pub struct AcceleratorJob {
    pub batches: Arc<Vec<Batch>>,
    pub assignment: CoreAssignment,
    /// Init block of each core, taken from the core's first batch.
    pub inits: Vec<BatchInit>,
}

impl AcceleratorJob {
    pub fn new(batches: Arc<Vec<Batch>>, assignment: CoreAssignment) -> Result<Self> {
        if assignment.batches() != batches.len() {
            return Err(PairHmmError::AssignmentMismatch {
                assigned: assignment.batches(),
                batches: batches.len(),
            });
        }
        let inits = assignment
            .offsets
            .iter()
            .map(|&offset| {
                batches
                    .get(offset)
                    .map(|batch| batch.init)
                    .ok_or(PairHmmError::BatchOutOfRange {
                        batch: offset,
                        batches: batches.len(),
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            batches,
            assignment,
            inits,
        })
    }
}

/// Raw result words, one buffer per core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultBuffers {
    pub cores: Vec<Vec<u32>>,
}

impl ResultBuffers {
    /// Buffers of the right size, every slot holding the sentinel.
    pub fn new(assignment: &CoreAssignment) -> Self {
        let cores = assignment
            .lengths
            .iter()
            .map(|&len| vec![SENTINEL; len * PIPE_DEPTH])
            .collect();
        Self { cores }
    }
    /// Slots the accelerator has not written.
    pub fn pending(&self) -> usize {
        self.cores
            .iter()
            .map(|buffer| buffer.iter().filter(|&&x| x == SENTINEL).count())
            .sum()
    }
    /// Fails if any slot is unwritten.
    pub fn check(self) -> Result<Self> {
        match self.pending() {
            0 => Ok(self),
            pending => Err(PairHmmError::IncompleteResult { pending }),
        }
    }
}

/// Core and slot of the result of `lane` in global batch `batch`.
pub fn hardware_slot(
    assignment: &CoreAssignment,
    batch: usize,
    lane: usize,
) -> Result<(usize, usize)> {
    if lane >= PIPE_DEPTH {
        return Err(PairHmmError::LaneOutOfRange {
            lane,
            depth: PIPE_DEPTH,
        });
    }
    let core = assignment.batch_to_core(batch)?;
    let local = assignment.batch_to_core_batch(batch)?;
    let slot = (assignment.lengths[core] - 1 - local) * PIPE_DEPTH + lane;
    Ok((core, slot))
}

/// Reads the buffers back into submission order.
pub fn hardware_ledger(
    buffers: &ResultBuffers,
    assignment: &CoreAssignment,
) -> Result<Ledger<Posit32>> {
    let pending = buffers.pending();
    if pending > 0 {
        return Err(PairHmmError::IncompleteResult { pending });
    }
    let mut ledger = Ledger::new();
    for batch in 0..assignment.batches() {
        for lane in 0..PIPE_DEPTH {
            let (core, slot) = hardware_slot(assignment, batch, lane)?;
            let word = buffers
                .cores
                .get(core)
                .and_then(|buffer| buffer.get(slot))
                .ok_or(PairHmmError::IncompleteResult { pending: 1 })?;
            ledger.record(result_name(batch, lane), Posit32::from_bits(*word));
        }
    }
    Ok(ledger)
}

pub trait Accelerator {
    /// Starts a job. Results are collected with `wait`.
    fn submit(&mut self, job: AcceleratorJob) -> Result<()>;
    /// Blocks until the submitted job finishes or `timeout` elapses.
    fn wait(&mut self, timeout: Duration) -> Result<ResultBuffers>;
}

/// Computes results with the posit engine on one thread per core and
/// delivers them after an artificial latency.
#[derive(Debug, Default)]
pub struct SimulatedAccelerator {
    latency: Duration,
    receiver: Option<Receiver<ResultBuffers>>,
}

impl SimulatedAccelerator {
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            receiver: None,
        }
    }
}

impl Accelerator for SimulatedAccelerator {
    fn submit(&mut self, job: AcceleratorJob) -> Result<()> {
        let (sender, receiver) = crossbeam::channel::bounded(1);
        let latency = self.latency;
        for (core, init) in job.inits.iter().enumerate() {
            debug!(
                "Core {}: X={} Y={} batches={}",
                core, init.read_padded, init.hapl_padded, job.assignment.lengths[core]
            );
        }
        std::thread::spawn(move || {
            let buffers = run_cores(&job);
            std::thread::sleep(latency);
            // Nobody listens anymore if the caller gave up.
            if sender.send(buffers).is_err() {
                debug!("Results dropped");
            }
        });
        self.receiver = Some(receiver);
        Ok(())
    }
    fn wait(&mut self, timeout: Duration) -> Result<ResultBuffers> {
        let receiver = self
            .receiver
            .as_ref()
            .ok_or(PairHmmError::AcceleratorDisconnected)?;
        match receiver.recv_timeout(timeout) {
            Ok(buffers) => {
                self.receiver = None;
                buffers.check()
            }
            Err(RecvTimeoutError::Timeout) => Err(PairHmmError::AcceleratorTimeout(timeout)),
            Err(RecvTimeoutError::Disconnected) => {
                self.receiver = None;
                Err(PairHmmError::AcceleratorDisconnected)
            }
        }
    }
}

fn run_cores(job: &AcceleratorJob) -> ResultBuffers {
    let engine = ForwardEngine::<Posit32>::default();
    let mut buffers = ResultBuffers::new(&job.assignment);
    let result = crossbeam::scope(|s| {
        for (core, buffer) in buffers.cores.iter_mut().enumerate() {
            let engine = &engine;
            s.spawn(move |_| {
                let range = match job.assignment.core_range(core) {
                    Some(range) => range,
                    None => return,
                };
                for batch in job.batches[range].iter() {
                    let (x, y) = (batch.geometry.read_len, batch.geometry.hapl_len);
                    for lane in 0..PIPE_DEPTH {
                        let value = engine.calculate_pair(batch, lane, x, y);
                        match hardware_slot(&job.assignment, batch.id, lane) {
                            Ok((_, slot)) => buffer[slot] = value.to_bits(),
                            Err(why) => error!("{}", why),
                        }
                    }
                }
            });
        }
    });
    if result.is_err() {
        error!("A core panicked. Its slots stay unwritten.");
    }
    buffers
}
