//! # Divination
//!
//! Maps an arbitrary text query onto a trigram through a seeded circuit:
//!
//! ```text
//!  query ──sha256──► h ──mod 2^n──► X on set bits ──► H ──► Ry(θ_i) ──► cyclic CX ──► sample
//!                                                          θ_i ~ StdRng(h + i)         │
//!                                                                                      ▼
//!                                     trigram ◄── leading 3 bits ◄── most probable outcome
//! ```
//!
//! Everything random is seeded from the query hash, so the same query on
//! the same register width always lands on the same trigram.

use std::f64::consts::TAU;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::backend::{Histogram, SimulationBackend};
use crate::circuit::{CircuitDescriptor, Gate, Layer};
use crate::model::{stable_hash_str, Trigram};
use crate::{Error, Result};

/// Register width used when the caller does not pick one.
pub const DEFAULT_DIVINATION_QUBITS: usize = 8;

/// Shots used when the caller does not pick a count.
pub const DEFAULT_DIVINATION_SHOTS: u64 = 1024;

// ============================================================================
// Guidance
// ============================================================================

/// Source of the guidance text attached to a divined trigram.
///
/// The engine only needs a key → text lookup; richer sources (localized
/// tables, a remote service) plug in here.
pub trait GuidanceProvider: Send + Sync {
    fn guidance(&self, trigram: Trigram) -> String;
}

/// Built-in English guidance, one line per trigram.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticGuidance;

impl StaticGuidance {
    pub fn text(trigram: Trigram) -> &'static str {
        match trigram {
            Trigram::Qian => "Heaven moves with vigor; a time to press forward with steady effort.",
            Trigram::Kun => "The earth bears all things; meet the situation with patience and breadth.",
            Trigram::Zhen => "Thunder wakes the world; change is coming, so prepare for it.",
            Trigram::Xun => "Wind crosses the water and leaves a pattern; follow the current and yield to win.",
            Trigram::Kan => "Water keeps flowing through the gorge; persist through difficulty and it will pay.",
            Trigram::Li => "Fire keeps its light; insight and clarity will show the way.",
            Trigram::Gen => "The mountain rests yet holds motion; a season for stillness and reflection.",
            Trigram::Dui => "The lake refreshes all it touches; cooperation and good company bring fortune.",
        }
    }
}

impl GuidanceProvider for StaticGuidance {
    fn guidance(&self, trigram: Trigram) -> String {
        Self::text(trigram).to_owned()
    }
}

// ============================================================================
// DivinationResult
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DivinationResult {
    pub query: String,
    pub trigram: Trigram,
    /// Table position of the matched trigram, `0..8`.
    pub symbol_id: usize,
    /// Lookup key for external guidance tables (the trigram name).
    pub guidance_key: String,
    pub guidance: String,
    /// Empirical probability of the winning outcome.
    pub probability: f64,
    /// Winning outcome, qubit `n - 1` leftmost.
    pub bitstring: String,
    pub counts: Histogram,
    pub num_qubits: usize,
    pub shots: u64,
    pub divined_at: DateTime<Utc>,
}

impl DivinationResult {
    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

// ============================================================================
// Circuit + adapter
// ============================================================================

/// The seeded divination circuit for a query hash.
///
/// Preparation flips qubit `i` when bit `i` of `hash mod 2^n` is set (qubits
/// past bit 63 start at zero); the
/// gate layer puts every qubit in superposition and rotates it by an angle
/// drawn from `StdRng::seed_from_u64(hash + i)`; the entanglement layer
/// chains CX around the register.
pub fn divination_circuit(hash: u64, num_qubits: usize) -> CircuitDescriptor {
    let flips: Vec<Gate> = (0..num_qubits)
        .filter(|&q| {
            u32::try_from(q)
                .ok()
                .and_then(|q| hash.checked_shr(q))
                .is_some_and(|h| h & 1 == 1)
        })
        .map(|qubit| Gate::X { qubit })
        .collect();

    let mut gates = Vec::with_capacity(num_qubits * 2);
    gates.extend((0..num_qubits).map(|qubit| Gate::H { qubit }));
    gates.extend((0..num_qubits).map(|qubit| {
        let mut rng = StdRng::seed_from_u64(hash.wrapping_add(qubit as u64));
        Gate::Ry { qubit, theta: rng.r#gen::<f64>() * TAU }
    }));

    let mut ring = Vec::new();
    if num_qubits >= 2 {
        ring.extend((0..num_qubits - 1).map(|i| Gate::Cx { control: i, target: i + 1 }));
        ring.push(Gate::Cx { control: num_qubits - 1, target: 0 });
    }

    let mut layers = Vec::with_capacity(3);
    if !flips.is_empty() {
        layers.push(Layer::Preparation { gates: flips });
    }
    layers.push(Layer::Gate { gates });
    if !ring.is_empty() {
        layers.push(Layer::Entanglement { gates: ring });
    }
    CircuitDescriptor::from_layers(num_qubits, layers)
}

/// Trigram for the leading three bits of `bitstring`, right-padded with
/// `'0'` when shorter.
pub fn trigram_for_bits(bitstring: &str) -> Option<Trigram> {
    let mut code: String = bitstring.chars().take(3).collect();
    while code.len() < 3 {
        code.push('0');
    }
    Trigram::from_lines(&code)
}

/// Divine `query` on a `num_qubits` register with `shots` samples, using the
/// built-in guidance table.
pub fn divine<B>(backend: &B, query: &str, num_qubits: usize, shots: u64) -> Result<DivinationResult>
where
    B: SimulationBackend + ?Sized,
{
    divine_with(backend, &StaticGuidance, query, num_qubits, shots)
}

/// As [`divine`], with a caller-supplied guidance source.
pub fn divine_with<B, G>(
    backend: &B,
    guidance: &G,
    query: &str,
    num_qubits: usize,
    shots: u64,
) -> Result<DivinationResult>
where
    B: SimulationBackend + ?Sized,
    G: GuidanceProvider + ?Sized,
{
    let ceiling = backend.capabilities().exact_simulation_ceiling;
    if num_qubits == 0 {
        return Err(Error::CircuitSize { qubits: 0, max: ceiling });
    }
    if num_qubits > ceiling {
        return Err(Error::SimulationTooLarge { qubits: num_qubits, ceiling });
    }

    let hash = stable_hash_str(query);
    let circuit = divination_circuit(hash, num_qubits);
    let result = backend.execute_seeded(&circuit, shots, hash)?;

    let (outcome, count) = result
        .histogram
        .most_probable()
        .ok_or_else(|| Error::ExecutionError("divination produced no outcomes".into()))?;
    let bitstring = result.histogram.bitstring(outcome);
    let trigram = trigram_for_bits(&bitstring)
        .ok_or_else(|| Error::UnknownSymbol(format!("line code of {bitstring}")))?;

    tracing::debug!(qubits = num_qubits, shots, outcome = %bitstring, trigram = trigram.name(), "divined");

    Ok(DivinationResult {
        query: query.to_owned(),
        trigram,
        symbol_id: trigram.index(),
        guidance_key: trigram.name().to_owned(),
        guidance: guidance.guidance(trigram),
        probability: count as f64 / result.shots as f64,
        bitstring,
        counts: result.histogram,
        num_qubits,
        shots: result.shots,
        divined_at: Utc::now(),
    })
}
