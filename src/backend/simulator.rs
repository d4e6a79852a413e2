//! Exact state-vector backend.
//!
//! Evolves the full `2^n` amplitude vector layer by layer and samples the
//! histogram from `|amplitude|²`. Circuits wider than the ceiling are
//! rejected before anything is allocated; there is no approximate mode.
//!
//! The backend is a cheap `Clone` around shared configuration and
//! counters, so async execution can move a copy onto a blocking worker.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use rand::rngs::StdRng;

use crate::circuit::CircuitDescriptor;
use crate::{Error, Result};

use super::{
    BackendCapabilities, ExecutionResult, ExecutionStats, Histogram, SimulationBackend, StateVector,
};

/// Default maximum width for exact simulation.
pub const DEFAULT_EXACT_SIMULATION_CEILING: usize = 20;

/// Widest register the dense simulator will ever allocate, `2^30` amplitudes.
pub const MAX_EXACT_SIMULATION_CEILING: usize = 30;

// ============================================================================
// StateVectorBackend
// ============================================================================

#[derive(Clone)]
pub struct StateVectorBackend {
    inner: Arc<SimulatorInner>,
}

struct SimulatorInner {
    ceiling: usize,
    circuits_executed: AtomicU64,
    shots_sampled: AtomicU64,
    timings: RwLock<Timings>,
}

#[derive(Default)]
struct Timings {
    peak_qubits: usize,
    last: Duration,
    total: Duration,
}

impl Default for StateVectorBackend {
    fn default() -> Self {
        Self::new(DEFAULT_EXACT_SIMULATION_CEILING)
    }
}

impl std::fmt::Debug for StateVectorBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateVectorBackend")
            .field("ceiling", &self.inner.ceiling)
            .finish_non_exhaustive()
    }
}

impl StateVectorBackend {
    /// Ceilings above [`MAX_EXACT_SIMULATION_CEILING`] are clamped to it.
    pub fn new(exact_simulation_ceiling: usize) -> Self {
        Self {
            inner: Arc::new(SimulatorInner {
                ceiling: exact_simulation_ceiling.min(MAX_EXACT_SIMULATION_CEILING),
                circuits_executed: AtomicU64::new(0),
                shots_sampled: AtomicU64::new(0),
                timings: RwLock::new(Timings::default()),
            }),
        }
    }

    pub fn ceiling(&self) -> usize {
        self.inner.ceiling
    }

    fn check(&self, circuit: &CircuitDescriptor, shots: u64) -> Result<()> {
        let qubits = circuit.num_qubits();
        if qubits > self.inner.ceiling {
            return Err(Error::SimulationTooLarge { qubits, ceiling: self.inner.ceiling });
        }
        if qubits == 0 {
            return Err(Error::InvalidCircuit("circuit has no qubits".into()));
        }
        if shots == 0 {
            return Err(Error::InvalidShots(shots));
        }
        if let Some(gate) = circuit.gates().find(|g| g.max_qubit() >= qubits) {
            return Err(Error::InvalidCircuit(format!(
                "gate {gate:?} addresses a qubit outside 0..{qubits}"
            )));
        }
        Ok(())
    }

    fn record(&self, qubits: usize, shots: u64, elapsed: Duration) {
        self.inner.circuits_executed.fetch_add(1, Ordering::Relaxed);
        self.inner.shots_sampled.fetch_add(shots, Ordering::Relaxed);
        let mut t = self.inner.timings.write();
        t.peak_qubits = t.peak_qubits.max(qubits);
        t.last = elapsed;
        t.total += elapsed;
    }
}

#[async_trait]
impl SimulationBackend for StateVectorBackend {
    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities {
            name: "state_vector".into(),
            exact_simulation_ceiling: self.inner.ceiling,
            returns_state_vector: true,
            supports_async: true,
        }
    }

    fn execute_with_rng(
        &self,
        circuit: &CircuitDescriptor,
        shots: u64,
        rng: &mut StdRng,
    ) -> Result<ExecutionResult> {
        self.check(circuit, shots)?;

        let started = Instant::now();
        let state = StateVector::simulate(circuit);
        let counts = state.sample(shots, rng);
        let histogram = Histogram::from_counts(circuit.num_qubits(), counts);
        let duration = started.elapsed();

        self.record(circuit.num_qubits(), shots, duration);
        tracing::debug!(
            qubits = circuit.num_qubits(),
            shots,
            outcomes = histogram.distinct(),
            elapsed_us = duration.as_micros() as u64,
            "executed circuit"
        );

        Ok(ExecutionResult {
            num_qubits: circuit.num_qubits(),
            shots,
            histogram,
            state: Some(state),
            duration,
            executed_at: Utc::now(),
        })
    }

    async fn execute_async(
        &self,
        circuit: CircuitDescriptor,
        shots: u64,
        seed: Option<u64>,
    ) -> Result<ExecutionResult> {
        // Fail fast on the caller's task; no worker is spawned for a
        // circuit that cannot run.
        self.check(&circuit, shots)?;
        let backend = self.clone();
        tokio::task::spawn_blocking(move || match seed {
            Some(seed) => backend.execute_seeded(&circuit, shots, seed),
            None => backend.execute(&circuit, shots),
        })
        .await
        .map_err(|e| Error::ExecutionError(format!("simulation worker failed: {e}")))?
    }

    fn stats(&self) -> ExecutionStats {
        let t = self.inner.timings.read();
        ExecutionStats {
            circuits_executed: self.inner.circuits_executed.load(Ordering::Relaxed),
            shots_sampled: self.inner.shots_sampled.load(Ordering::Relaxed),
            peak_qubits: t.peak_qubits,
            last_duration: t.last,
            total_duration: t.total,
        }
    }
}
