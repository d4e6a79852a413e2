//! # Simulation Backend Trait
//!
//! The contract between circuit construction and execution. A backend
//! takes a `CircuitDescriptor` and a shot count and returns an
//! `ExecutionResult`: the measurement histogram plus, when available, the
//! exact final state.
//!
//! ## Implementations
//!
//! | Backend | Module | Description |
//! |---------|--------|-------------|
//! | `StateVectorBackend` | `simulator` | Exact dense evolution up to a qubit ceiling |

pub mod statevector;
pub mod simulator;

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::ser::{Serialize, Serializer};
use serde::Deserialize;

use crate::circuit::CircuitDescriptor;
use crate::Result;

pub use simulator::{StateVectorBackend, DEFAULT_EXACT_SIMULATION_CEILING, MAX_EXACT_SIMULATION_CEILING};
pub use statevector::StateVector;

/// Default number of measurement samples.
pub const DEFAULT_SHOTS: u64 = 8192;

/// Widest outcome a `u64` index can address.
pub const MAX_BITSTRING_WIDTH: usize = 64;

// ============================================================================
// Histogram
// ============================================================================

/// Measurement outcomes keyed by basis-state index.
///
/// Serializes as a bit-string → count map, qubit `n - 1` leftmost.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Histogram {
    num_qubits: usize,
    counts: BTreeMap<u64, u64>,
}

impl Histogram {
    pub fn new(num_qubits: usize) -> Self {
        Self { num_qubits, counts: BTreeMap::new() }
    }

    pub fn from_counts(num_qubits: usize, counts: impl IntoIterator<Item = (u64, u64)>) -> Self {
        let mut hist = Self::new(num_qubits);
        for (outcome, count) in counts {
            if count > 0 {
                *hist.counts.entry(outcome).or_insert(0) += count;
            }
        }
        hist
    }

    /// Parse bit-string keys (qubit `n - 1` first). Invalid keys, and keys
    /// wider than [`MAX_BITSTRING_WIDTH`], are skipped.
    pub fn from_bitstrings<'a>(counts: impl IntoIterator<Item = (&'a str, u64)>) -> Self {
        let mut width = 0;
        let mut parsed = Vec::new();
        for (bits, count) in counts {
            if bits.len() > MAX_BITSTRING_WIDTH {
                continue;
            }
            if let Ok(outcome) = u64::from_str_radix(bits, 2) {
                width = width.max(bits.len());
                parsed.push((outcome, count));
            }
        }
        Self::from_counts(width, parsed)
    }

    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Total number of shots recorded.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Number of distinct outcomes observed.
    pub fn distinct(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn count(&self, outcome: u64) -> u64 {
        self.counts.get(&outcome).copied().unwrap_or(0)
    }

    /// `(outcome, count)` in ascending outcome order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, u64)> + '_ {
        self.counts.iter().map(|(&k, &v)| (k, v))
    }

    /// `(outcome, empirical probability)` in ascending outcome order.
    pub fn probabilities(&self) -> Vec<(u64, f64)> {
        let total = self.total() as f64;
        if total == 0.0 {
            return Vec::new();
        }
        self.iter().map(|(k, v)| (k, v as f64 / total)).collect()
    }

    /// Highest-count outcome; ties go to the smallest outcome.
    pub fn most_probable(&self) -> Option<(u64, u64)> {
        self.iter().fold(None, |best, (k, v)| match best {
            Some((_, bv)) if bv >= v => best,
            _ => Some((k, v)),
        })
    }

    pub fn bitstring(&self, outcome: u64) -> String {
        format_bits(outcome, self.num_qubits)
    }

    pub fn to_bitstring_map(&self) -> BTreeMap<String, u64> {
        self.iter().map(|(k, v)| (self.bitstring(k), v)).collect()
    }
}

impl Serialize for Histogram {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter().map(|(k, v)| (self.bitstring(k), v)))
    }
}

impl<'de> Deserialize<'de> for Histogram {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = BTreeMap::<String, u64>::deserialize(deserializer)?;
        Ok(Histogram::from_bitstrings(raw.iter().map(|(k, v)| (k.as_str(), *v))))
    }
}

/// `outcome` as `width` bits, most significant (highest qubit) first.
/// Positions past bit 63 print as `'0'`.
pub fn format_bits(outcome: u64, width: usize) -> String {
    (0..width)
        .rev()
        .map(|q| {
            let set = u32::try_from(q)
                .ok()
                .and_then(|q| outcome.checked_shr(q))
                .is_some_and(|b| b & 1 == 1);
            if set { '1' } else { '0' }
        })
        .collect()
}

// ============================================================================
// ExecutionResult
// ============================================================================

/// Output of one circuit execution. Request-scoped; never persisted.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ExecutionResult {
    pub num_qubits: usize,
    pub shots: u64,
    pub histogram: Histogram,
    /// Exact final state. Absent when the result was built from counts alone.
    #[serde(skip)]
    pub state: Option<StateVector>,
    pub duration: Duration,
    pub executed_at: DateTime<Utc>,
}

impl ExecutionResult {
    /// Result carrying only a histogram, e.g. counts obtained elsewhere.
    pub fn from_histogram(histogram: Histogram) -> Self {
        Self {
            num_qubits: histogram.num_qubits(),
            shots: histogram.total(),
            histogram,
            state: None,
            duration: Duration::ZERO,
            executed_at: Utc::now(),
        }
    }

    pub fn has_state(&self) -> bool {
        self.state.is_some()
    }
}

// ============================================================================
// Capabilities and statistics
// ============================================================================

/// What a backend can do.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, Deserialize)]
pub struct BackendCapabilities {
    pub name: String,
    pub exact_simulation_ceiling: usize,
    pub returns_state_vector: bool,
    pub supports_async: bool,
}

/// Cumulative execution counters. Observability only.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, Deserialize)]
pub struct ExecutionStats {
    pub circuits_executed: u64,
    pub shots_sampled: u64,
    pub peak_qubits: usize,
    pub last_duration: Duration,
    pub total_duration: Duration,
}

// ============================================================================
// SimulationBackend Trait
// ============================================================================

/// The execution contract.
///
/// Implementations must be safe to call concurrently: every call owns its
/// buffers, and shared state is limited to read-only configuration and
/// observability counters.
#[async_trait]
pub trait SimulationBackend: Send + Sync + 'static {
    fn capabilities(&self) -> BackendCapabilities;

    /// Execute, drawing shots from `rng`.
    fn execute_with_rng(
        &self,
        circuit: &CircuitDescriptor,
        shots: u64,
        rng: &mut StdRng,
    ) -> Result<ExecutionResult>;

    /// Execute with an OS-seeded sampler.
    fn execute(&self, circuit: &CircuitDescriptor, shots: u64) -> Result<ExecutionResult> {
        let mut rng = StdRng::from_entropy();
        self.execute_with_rng(circuit, shots, &mut rng)
    }

    /// Execute with a reproducible sampler.
    fn execute_seeded(&self, circuit: &CircuitDescriptor, shots: u64, seed: u64) -> Result<ExecutionResult> {
        let mut rng = StdRng::seed_from_u64(seed);
        self.execute_with_rng(circuit, shots, &mut rng)
    }

    /// Execute off the caller's task. Same semantics as `execute` /
    /// `execute_seeded`; the descriptor is consumed.
    async fn execute_async(
        &self,
        circuit: CircuitDescriptor,
        shots: u64,
        seed: Option<u64>,
    ) -> Result<ExecutionResult>;

    /// Snapshot of cumulative counters.
    fn stats(&self) -> ExecutionStats {
        ExecutionStats::default()
    }
}
