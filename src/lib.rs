//! # bagua-quantum: Trigram Circuits on an Exact State-Vector Simulator
//!
//! Turns sequences of the eight trigrams into layered quantum circuits,
//! simulates them exactly, and reduces the measurements to a handful of
//! scalar metrics.
//!
//! ## Design Principles
//!
//! 1. **Trait-first**: `SimulationBackend` is the contract between circuit construction and execution
//! 2. **Frozen tables**: trigrams, elements and the 64 hexagrams are built once and never mutated
//! 3. **Builder owns nothing**: trigram sequence → `CircuitDescriptor` is a pure function
//! 4. **Reproducible by default**: every sampler is seeded from its inputs
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bagua_quantum::{QuantumEngine, Trigram};
//!
//! # fn example() -> bagua_quantum::Result<()> {
//! let engine = QuantumEngine::new();
//!
//! let seq = [Trigram::Qian, Trigram::Kun, Trigram::Zhen, Trigram::Xun];
//! let metrics = engine.compute_metrics(&seq, 4, Some(1024))?;
//! println!("quotient {:.3}, balance {:.3}", metrics.quotient, metrics.balance.balance_index);
//!
//! let answer = engine.divine("hello world", None)?;
//! println!("{}: {}", answer.trigram.han(), answer.guidance);
//! # Ok(())
//! # }
//! ```
//!
//! ## Pipeline
//!
//! ```text
//!  UserContext / query
//!        │
//!        ▼
//!  trigram sequence ──► CircuitBuilder ──► SimulationBackend ──► metrics::extract
//!                        (layers)           (histogram + state)    QuantumMetricsResult
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod circuit;
pub mod backend;
pub mod metrics;
pub mod divination;
pub mod config;

use serde::{Deserialize, Serialize};

// ============================================================================
// Re-exports: Model
// ============================================================================

pub use model::{
    Trigram, Symbol, SymbolTable, GateKind, GateSpec,
    Element, Relation, Hexagram, HexagramTable,
    UserContext, ContextValue,
};

// ============================================================================
// Re-exports: Circuits and Backends
// ============================================================================

pub use circuit::{CircuitBuilder, CircuitDescriptor, Gate, Layer, LayerKind};
pub use backend::{
    SimulationBackend, StateVectorBackend, ExecutionResult, Histogram,
    BackendCapabilities, ExecutionStats,
};

// ============================================================================
// Re-exports: Results and Config
// ============================================================================

pub use metrics::{QuantumMetricsResult, BalanceScore};
pub use divination::{DivinationResult, GuidanceProvider, StaticGuidance};
pub use config::EngineConfig;

// ============================================================================
// Top-level QuantumEngine handle
// ============================================================================

/// The primary entry point. Wraps a backend with a builder and a
/// configuration, and exposes the end-to-end operations.
///
/// Holds no per-request state; share it freely across threads and tasks.
#[derive(Debug, Clone)]
pub struct QuantumEngine<B: SimulationBackend = StateVectorBackend> {
    config: EngineConfig,
    builder: CircuitBuilder,
    backend: B,
}

/// Metrics for a context-derived hexagram sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextReport {
    pub hexagram_sequence: Vec<String>,
    pub hexagram_ids: Vec<u8>,
    pub used_qubits: usize,
    pub metrics: QuantumMetricsResult,
}

/// What the engine is configured to do, plus cumulative backend counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityReport {
    pub max_qubits: usize,
    pub exact_simulation_ceiling: usize,
    pub default_shots: u64,
    pub supported_features: Vec<String>,
    pub supported_trigrams: Vec<Trigram>,
    pub entanglement_capacity: String,
    pub backend: BackendCapabilities,
    pub stats: ExecutionStats,
}

const SUPPORTED_FEATURES: [&str; 8] = [
    "hexagram-sequence-metrics",
    "layered-trigram-circuits",
    "entanglement-network",
    "five-element-balance",
    "fourier-transform-layer",
    "async-execution",
    "coherence-measurement",
    "divination",
];

impl QuantumEngine<StateVectorBackend> {
    /// Default configuration on the state-vector backend.
    pub fn new() -> Self {
        let config = EngineConfig::default();
        Self {
            builder: CircuitBuilder::new(config.max_qubits),
            backend: StateVectorBackend::new(config.exact_simulation_ceiling),
            config,
        }
    }

    pub fn with_config(config: EngineConfig) -> Result<Self> {
        let backend = StateVectorBackend::new(config.exact_simulation_ceiling);
        Self::with_backend(config, backend)
    }

    /// Configuration from `BAGUA_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::with_config(EngineConfig::from_env()?)
    }
}

impl Default for QuantumEngine<StateVectorBackend> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: SimulationBackend> QuantumEngine<B> {
    /// Create an engine over the given backend.
    pub fn with_backend(config: EngineConfig, backend: B) -> Result<Self> {
        config.validate()?;
        Ok(Self { builder: CircuitBuilder::new(config.max_qubits), backend, config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Access the underlying backend (for advanced use).
    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn builder(&self) -> &CircuitBuilder {
        &self.builder
    }

    pub fn build_circuit(&self, sequence: &[Trigram], num_qubits: usize) -> Result<CircuitDescriptor> {
        self.builder.build(sequence, num_qubits)
    }

    /// Build, execute and extract metrics for a trigram sequence.
    ///
    /// Sampling is seeded from the circuit itself, so identical calls give
    /// identical results. `shots` defaults to the configured count.
    pub fn compute_metrics(
        &self,
        sequence: &[Trigram],
        num_qubits: usize,
        shots: Option<u64>,
    ) -> Result<QuantumMetricsResult> {
        let circuit = self.builder.build(sequence, num_qubits)?;
        let seed = self.sampling_seed(&circuit)?;
        let result = self.backend.execute_seeded(&circuit, self.shots(shots), seed)?;
        Ok(metrics::extract(&result, &metric_hexagrams(sequence, num_qubits)))
    }

    /// As [`compute_metrics`](Self::compute_metrics), for a sequence of
    /// symbol tokens (`"qian"`, `"☲"`, `"坎"`, ...). Fails on the first
    /// unknown token before anything is built.
    pub fn compute_metrics_for_symbols<S: AsRef<str>>(
        &self,
        tokens: &[S],
        num_qubits: usize,
        shots: Option<u64>,
    ) -> Result<QuantumMetricsResult> {
        let sequence = SymbolTable.parse_sequence(tokens)?;
        self.compute_metrics(&sequence, num_qubits, shots)
    }

    /// As [`compute_metrics`](Self::compute_metrics), with the simulation
    /// running off the caller's task.
    pub async fn compute_metrics_async(
        &self,
        sequence: &[Trigram],
        num_qubits: usize,
        shots: Option<u64>,
    ) -> Result<QuantumMetricsResult> {
        let circuit = self.builder.build(sequence, num_qubits)?;
        let seed = self.sampling_seed(&circuit)?;
        let result = self.backend.execute_async(circuit, self.shots(shots), Some(seed)).await?;
        Ok(metrics::extract(&result, &metric_hexagrams(sequence, num_qubits)))
    }

    /// Divine a trigram for `query`. `num_qubits` defaults to the configured
    /// divination width.
    pub fn divine(&self, query: &str, num_qubits: Option<usize>) -> Result<DivinationResult> {
        let width = num_qubits.unwrap_or(self.config.divination_qubits);
        divination::divine(&self.backend, query, width, self.config.divination_shots)
    }

    /// As [`divine`](Self::divine), with guidance from `provider`.
    pub fn divine_with<G: GuidanceProvider + ?Sized>(
        &self,
        provider: &G,
        query: &str,
        num_qubits: Option<usize>,
    ) -> Result<DivinationResult> {
        let width = num_qubits.unwrap_or(self.config.divination_qubits);
        divination::divine_with(&self.backend, provider, query, width, self.config.divination_shots)
    }

    /// Default length of a context-derived sequence: `min(8, max_qubits / 2)`.
    pub fn default_sequence_len(&self) -> usize {
        (self.config.max_qubits / 2).clamp(1, 8)
    }

    /// Hexagrams derived from `ctx`, `len` defaulting to
    /// [`default_sequence_len`](Self::default_sequence_len).
    pub fn derive_hexagram_sequence(&self, ctx: &UserContext, len: Option<usize>) -> Vec<Hexagram> {
        ctx.hexagram_sequence(len.unwrap_or_else(|| self.default_sequence_len()))
    }

    /// Full context pipeline: derive hexagrams, run a circuit over their
    /// upper trigrams on `min(2 × len, exact ceiling)` qubits, extract metrics.
    pub async fn calculate_from_context(&self, ctx: &UserContext) -> Result<ContextReport> {
        let hexagrams = self.derive_hexagram_sequence(ctx, None);
        let used_qubits = (hexagrams.len() * 2).min(self.config.exact_simulation_ceiling);
        let uppers: Vec<Trigram> = hexagrams.iter().map(|h| h.upper).collect();

        let circuit = self.builder.build(&uppers, used_qubits)?;
        let seed = self.sampling_seed(&circuit)?;
        let result = self
            .backend
            .execute_async(circuit, self.config.default_shots, Some(seed))
            .await?;

        Ok(ContextReport {
            hexagram_sequence: hexagrams.iter().map(|h| h.name.clone()).collect(),
            hexagram_ids: hexagrams.iter().map(|h| h.id).collect(),
            used_qubits,
            metrics: metrics::extract(&result, &hexagrams),
        })
    }

    pub fn capacity_report(&self) -> CapacityReport {
        CapacityReport {
            max_qubits: self.config.max_qubits,
            exact_simulation_ceiling: self.config.exact_simulation_ceiling,
            default_shots: self.config.default_shots,
            supported_features: SUPPORTED_FEATURES.iter().map(|s| s.to_string()).collect(),
            supported_trigrams: Trigram::ALL.to_vec(),
            entanglement_capacity: "full_connectivity".into(),
            backend: self.backend.capabilities(),
            stats: self.backend.stats(),
        }
    }

    fn shots(&self, shots: Option<u64>) -> u64 {
        shots.unwrap_or(self.config.default_shots)
    }

    fn sampling_seed(&self, circuit: &CircuitDescriptor) -> Result<u64> {
        Ok(self.config.sampling_seed ^ circuit.fingerprint()?)
    }
}

/// Cyclic hexagram pairs over the part of `sequence` that fits the register.
fn metric_hexagrams(sequence: &[Trigram], num_qubits: usize) -> Vec<Hexagram> {
    let active = &sequence[..sequence.len().min(num_qubits)];
    HexagramTable::global().cyclic_pairs(active)
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unknown symbol: {0}")]
    UnknownSymbol(String),

    #[error("Circuit size error: {qubits} qubits requested, allowed range is 1..={max}")]
    CircuitSize { qubits: usize, max: usize },

    #[error("Simulation too large: {qubits} qubits exceeds the exact-simulation ceiling of {ceiling}")]
    SimulationTooLarge { qubits: usize, ceiling: usize },

    #[error("Index error: {0}")]
    IndexError(String),

    #[error("Invalid shot count: {0}")]
    InvalidShots(u64),

    #[error("Invalid circuit: {0}")]
    InvalidCircuit(String),

    #[error("Execution error: {0}")]
    ExecutionError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
