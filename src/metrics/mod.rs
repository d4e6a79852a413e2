//! # Metric Extraction
//!
//! Reduces an `ExecutionResult` and the hexagram sequence that produced it
//! to scalar diagnostics:
//!
//! | Metric | Source | Range |
//! |--------|--------|-------|
//! | quotient | probability-weighted outcome value | `[-1, 1]` |
//! | entanglement | von Neumann entropy of half the register | `[0, 1]` |
//! | balance | five-element shares of the hexagram trigrams | `[0, 1]` |
//! | coherence | `1 - |Gini|` of the outcome distribution | `[0, 1]` |
//! | resonance | mean energy weight × normalized measurement entropy | `≥ 0` |
//!
//! Every function here is pure. No randomness, no hidden state.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use nalgebra::DMatrix;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::backend::{ExecutionResult, Histogram, StateVector};
use crate::model::{Element, Hexagram};
use crate::Result;

/// Eigenvalues below this are treated as zero in entropy sums.
const EIGEN_EPSILON: f64 = 1e-12;

/// Even share of each element.
const IDEAL_SHARE: f64 = 0.2;

// ============================================================================
// Result types
// ============================================================================

/// Five-element distribution over a hexagram sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceScore {
    pub counts: BTreeMap<Element, u64>,
    pub ratios: BTreeMap<Element, f64>,
    /// `1 - Σ|share - 0.2| / 2`. 1.0 means perfectly even.
    pub balance_index: f64,
    /// Element with the largest share. `None` for an empty sequence.
    pub dominant: Option<Element>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantumMetricsResult {
    pub quotient: f64,
    pub entanglement: f64,
    /// Set when the result had no state vector to measure entanglement on.
    pub entanglement_unavailable: bool,
    pub balance: BalanceScore,
    pub coherence: f64,
    pub resonance: f64,
    /// Shannon entropy of the histogram over `log2(distinct outcomes)`.
    pub measurement_entropy: f64,
    pub num_qubits: usize,
    pub shots: u64,
    /// Wall-clock duration of the execution that produced the histogram.
    pub timing: Duration,
    pub computed_at: DateTime<Utc>,
}

impl QuantumMetricsResult {
    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

// ============================================================================
// Extraction
// ============================================================================

/// All metrics for one execution.
pub fn extract(result: &ExecutionResult, hexagrams: &[Hexagram]) -> QuantumMetricsResult {
    let (entanglement, entanglement_unavailable) = match &result.state {
        Some(state) => (entanglement_entropy(state), false),
        None => (0.0, true),
    };
    let measurement_entropy = normalized_measurement_entropy(&result.histogram);

    QuantumMetricsResult {
        quotient: quotient(&result.histogram),
        entanglement,
        entanglement_unavailable,
        balance: balance(hexagrams),
        coherence: coherence(&result.histogram),
        resonance: mean_energy(hexagrams) * measurement_entropy,
        measurement_entropy,
        num_qubits: result.num_qubits,
        shots: result.shots,
        timing: result.duration,
        computed_at: Utc::now(),
    }
}

/// Expected outcome value, mapped from `[0, 2^n - 1]` onto `[-1, 1]`.
///
/// An empty histogram maps to 0.0.
pub fn quotient(histogram: &Histogram) -> f64 {
    let n = histogram.num_qubits();
    if histogram.is_empty() || n == 0 {
        return 0.0;
    }
    let max_value = (n as f64).exp2() - 1.0;
    let expected: f64 = histogram
        .probabilities()
        .into_iter()
        .map(|(outcome, p)| outcome as f64 * p)
        .sum();
    (expected / max_value * 2.0 - 1.0).clamp(-1.0, 1.0)
}

/// Reduced density matrix of qubits `0..⌊n/2⌋`, tracing out the rest.
pub fn reduced_density_matrix(state: &StateVector) -> DMatrix<Complex64> {
    let n = state.num_qubits();
    let kept = n / 2;
    let dim_a = 1usize << kept;
    let dim_b = 1usize << (n - kept);
    let amps = state.amplitudes();
    // Row i, column b holds ψ[i + b·dim_a]; ρ_A = M M†.
    let m = DMatrix::from_fn(dim_a, dim_b, |i, b| amps[i + b * dim_a]);
    &m * m.adjoint()
}

/// Normalized entanglement entropy across the `⌊n/2⌋ | ⌈n/2⌉` cut.
///
/// 0.0 for product states and single-qubit registers, 1.0 at maximal
/// entanglement.
pub fn entanglement_entropy(state: &StateVector) -> f64 {
    let n = state.num_qubits();
    if n <= 1 {
        return 0.0;
    }
    let kept = n / 2;
    let rho = reduced_density_matrix(state);
    let entropy: f64 = rho
        .symmetric_eigenvalues()
        .iter()
        .filter(|&&l| l > EIGEN_EPSILON)
        .map(|&l| -l * l.log2())
        .sum();
    (entropy / kept as f64).clamp(0.0, 1.0)
}

/// Element shares of every upper and lower trigram in the sequence.
pub fn balance(hexagrams: &[Hexagram]) -> BalanceScore {
    let mut counts: BTreeMap<Element, u64> = Element::ALL.iter().map(|&e| (e, 0)).collect();
    for h in hexagrams {
        for e in h.elements() {
            *counts.entry(e).or_insert(0) += 1;
        }
    }
    let total: u64 = counts.values().sum();
    if total == 0 {
        return BalanceScore {
            ratios: counts.keys().map(|&e| (e, 0.0)).collect(),
            counts,
            balance_index: 0.0,
            dominant: None,
        };
    }

    let ratios: BTreeMap<Element, f64> =
        counts.iter().map(|(&e, &c)| (e, c as f64 / total as f64)).collect();
    let deviation: f64 = ratios.values().map(|r| (r - IDEAL_SHARE).abs()).sum();
    let dominant = Element::ALL
        .iter()
        .copied()
        .fold(None, |best: Option<Element>, e| match best {
            Some(b) if counts[&b] >= counts[&e] => Some(b),
            _ => Some(e),
        });

    BalanceScore {
        counts,
        ratios,
        balance_index: (1.0 - deviation / 2.0).clamp(0.0, 1.0),
        dominant,
    }
}

/// `1 - |Gini|` of the sorted outcome distribution.
///
/// 1.0 for a single outcome or a perfectly uniform spread.
pub fn coherence(histogram: &Histogram) -> f64 {
    let mut probs: Vec<f64> = histogram.probabilities().into_iter().map(|(_, p)| p).collect();
    let n = probs.len();
    if n <= 1 {
        return 1.0;
    }
    probs.sort_by(f64::total_cmp);
    let sum: f64 = probs.iter().sum();
    let weighted: f64 = probs
        .iter()
        .enumerate()
        .map(|(i, p)| (2.0 * (i + 1) as f64 - n as f64 - 1.0) * p)
        .sum();
    let gini = weighted / (n as f64 * sum);
    (1.0 - gini.abs()).clamp(0.0, 1.0)
}

/// Shannon entropy (bits) of the empirical distribution.
pub fn measurement_entropy(histogram: &Histogram) -> f64 {
    histogram
        .probabilities()
        .into_iter()
        .filter(|&(_, p)| p > 0.0)
        .map(|(_, p)| -p * p.log2())
        .sum()
}

/// Shannon entropy over `log2(distinct)`; the divisor is 1.0 when only one
/// outcome was seen.
pub fn normalized_measurement_entropy(histogram: &Histogram) -> f64 {
    let distinct = histogram.distinct();
    let max_entropy = if distinct > 1 { (distinct as f64).log2() } else { 1.0 };
    measurement_entropy(histogram) / max_entropy
}

/// Mean energy weight, 0.0 for an empty sequence.
pub fn mean_energy(hexagrams: &[Hexagram]) -> f64 {
    if hexagrams.is_empty() {
        return 0.0;
    }
    hexagrams.iter().map(|h| h.energy_weight).sum::<f64>() / hexagrams.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::Gate;
    use crate::model::{HexagramTable, Trigram};

    fn hex(upper: Trigram, lower: Trigram) -> Hexagram {
        HexagramTable::global().lookup_by_symbols(upper, lower).clone()
    }

    #[test]
    fn test_quotient_extremes() {
        assert_eq!(quotient(&Histogram::from_counts(3, [(0, 10)])), -1.0);
        assert_eq!(quotient(&Histogram::from_counts(3, [(7, 10)])), 1.0);
        let mid = quotient(&Histogram::from_counts(2, [(0, 5), (3, 5)]));
        assert!(mid.abs() < 1e-12);
    }

    #[test]
    fn test_quotient_wide_register() {
        assert_eq!(quotient(&Histogram::from_counts(64, [(u64::MAX, 4)])), 1.0);
        assert_eq!(quotient(&Histogram::from_counts(130, [(0, 4)])), -1.0);
    }

    #[test]
    fn test_entanglement_product_state_is_zero() {
        let mut s = StateVector::zero(4);
        for q in 0..4 {
            s.apply(&Gate::H { qubit: q });
        }
        assert!(entanglement_entropy(&s) < 1e-9);
    }

    #[test]
    fn test_entanglement_bell_pair_is_one() {
        let mut s = StateVector::zero(2);
        s.apply(&Gate::H { qubit: 0 });
        s.apply(&Gate::Cx { control: 0, target: 1 });
        assert!((entanglement_entropy(&s) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_entanglement_two_bell_pairs_across_cut() {
        // (q0,q2) and (q1,q3) entangled: cut {q0,q1} | {q2,q3} is maximal.
        let mut s = StateVector::zero(4);
        for (a, b) in [(0, 2), (1, 3)] {
            s.apply(&Gate::H { qubit: a });
            s.apply(&Gate::Cx { control: a, target: b });
        }
        assert!((entanglement_entropy(&s) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_entanglement_single_qubit() {
        let mut s = StateVector::zero(1);
        s.apply(&Gate::H { qubit: 0 });
        assert_eq!(entanglement_entropy(&s), 0.0);
    }

    #[test]
    fn test_balance_even() {
        // Metal, Earth, Wood, Water, Fire once each as upper; same as lower.
        let seq = [
            hex(Trigram::Qian, Trigram::Qian),
            hex(Trigram::Kun, Trigram::Kun),
            hex(Trigram::Zhen, Trigram::Zhen),
            hex(Trigram::Kan, Trigram::Kan),
            hex(Trigram::Li, Trigram::Li),
        ];
        let b = balance(&seq);
        assert!((b.balance_index - 1.0).abs() < 1e-12);
        assert_eq!(b.counts[&Element::Fire], 2);
    }

    #[test]
    fn test_balance_skewed() {
        let seq = vec![hex(Trigram::Qian, Trigram::Dui); 3];
        let b = balance(&seq);
        assert!((b.balance_index - 0.2).abs() < 1e-12);
        assert_eq!(b.dominant, Some(Element::Metal));
        assert_eq!(b.ratios[&Element::Metal], 1.0);
    }

    #[test]
    fn test_balance_empty() {
        let b = balance(&[]);
        assert_eq!(b.balance_index, 0.0);
        assert_eq!(b.dominant, None);
    }

    #[test]
    fn test_coherence() {
        assert_eq!(coherence(&Histogram::from_counts(2, [(1, 9)])), 1.0);
        let uniform = coherence(&Histogram::from_counts(2, [(0, 5), (1, 5), (2, 5), (3, 5)]));
        assert!((uniform - 1.0).abs() < 1e-12);
        let skewed = coherence(&Histogram::from_counts(2, [(0, 97), (1, 1), (2, 1), (3, 1)]));
        assert!(skewed < 0.5);
    }

    #[test]
    fn test_measurement_entropy_normalization() {
        let single = Histogram::from_counts(2, [(3, 100)]);
        assert_eq!(normalized_measurement_entropy(&single), 0.0);
        let uniform = Histogram::from_counts(2, [(0, 25), (1, 25), (2, 25), (3, 25)]);
        assert!((normalized_measurement_entropy(&uniform) - 1.0).abs() < 1e-12);
        assert!((measurement_entropy(&uniform) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_extract_without_state() {
        let result = ExecutionResult::from_histogram(Histogram::from_counts(2, [(0, 3), (3, 1)]));
        let seq = [hex(Trigram::Dui, Trigram::Dui)];
        let m = extract(&result, &seq);
        assert!(m.entanglement_unavailable);
        assert_eq!(m.entanglement, 0.0);
        assert_eq!(m.shots, 4);
        assert!((m.resonance - measurement_entropy(&result.histogram) / 2.0_f64.log2()).abs() < 1e-12);
    }
}
