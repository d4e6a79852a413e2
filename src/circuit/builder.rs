//! Circuit builder: trigram sequence to layered circuit.
//!
//! ```text
//!  sequence ──► gate layer ──► interaction layer ──► transform layer ──► entanglement layer
//!               per qubit       adjacent pairs         QFT on q0..q3       (p+q) mod 3 / 5 / 8
//! ```
//!
//! Pure and deterministic: the same `(sequence, qubits)` always yields the
//! same descriptor. Layers with no gates are omitted.

use std::f64::consts::PI;

use crate::model::{interaction_strength, Trigram};
use crate::{Error, Result};

use super::{CircuitDescriptor, Gate, Interaction, Layer};

/// Default hard ceiling on circuit width.
pub const DEFAULT_MAX_QUBITS: usize = 24;

/// Width of the Fourier transform layer.
pub const TRANSFORM_WIDTH: usize = 4;

/// Couplings above this strength use CX, the rest CZ.
pub const STRONG_COUPLING_THRESHOLD: f64 = 0.5;

/// Builds trigram circuits up to a configured width.
#[derive(Debug, Clone, Copy)]
pub struct CircuitBuilder {
    max_qubits: usize,
}

impl Default for CircuitBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_QUBITS)
    }
}

impl CircuitBuilder {
    pub fn new(max_qubits: usize) -> Self {
        Self { max_qubits }
    }

    pub fn max_qubits(&self) -> usize {
        self.max_qubits
    }

    /// Reject widths outside `1..=max_qubits`.
    pub fn check_width(&self, num_qubits: usize) -> Result<()> {
        if num_qubits == 0 || num_qubits > self.max_qubits {
            return Err(Error::CircuitSize { qubits: num_qubits, max: self.max_qubits });
        }
        Ok(())
    }

    /// Build the layered circuit for `sequence` on `num_qubits` qubits.
    ///
    /// Extra symbols beyond the register are dropped. Qubits past the end of
    /// the sequence only take part in the transform and entanglement layers.
    pub fn build(&self, sequence: &[Trigram], num_qubits: usize) -> Result<CircuitDescriptor> {
        self.check_width(num_qubits)?;
        let active = &sequence[..sequence.len().min(num_qubits)];

        let mut layers = Vec::with_capacity(4);

        let gates: Vec<Gate> = active
            .iter()
            .enumerate()
            .flat_map(|(q, t)| t.gate_spec().gates_for(q))
            .collect();
        if !gates.is_empty() {
            layers.push(Layer::Gate { gates });
        }

        let couplings = interaction_layer(active);
        if !couplings.is_empty() {
            layers.push(Layer::Interaction { couplings });
        }

        if num_qubits >= TRANSFORM_WIDTH {
            layers.push(Layer::Transform {
                width: TRANSFORM_WIDTH,
                gates: qft_gates(TRANSFORM_WIDTH),
            });
        }

        let gates = entanglement_network(num_qubits);
        if !gates.is_empty() {
            layers.push(Layer::Entanglement { gates });
        }

        let circuit = CircuitDescriptor::from_layers(num_qubits, layers);
        tracing::debug!(
            qubits = num_qubits,
            symbols = active.len(),
            layers = circuit.layers().len(),
            gates = circuit.gate_count(),
            "built trigram circuit"
        );
        Ok(circuit)
    }
}

/// Adjacent-pair couplings: CX when the pair's affinity is strong, else CZ.
fn interaction_layer(active: &[Trigram]) -> Vec<Interaction> {
    active
        .windows(2)
        .enumerate()
        .map(|(i, pair)| {
            let strength = interaction_strength(pair[0], pair[1]);
            let gate = if strength > STRONG_COUPLING_THRESHOLD {
                Gate::Cx { control: i, target: i + 1 }
            } else {
                Gate::Cz { control: i, target: i + 1 }
            };
            Interaction { position: i, strength, gate }
        })
        .collect()
}

/// Quantum Fourier transform on qubits `0..width`, with the final swaps.
///
/// Qubit `j` (highest first) gets H followed by controlled phases
/// `π / 2^(j-k)` onto every lower qubit `k`.
pub fn qft_gates(width: usize) -> Vec<Gate> {
    let mut gates = Vec::new();
    for j in (0..width).rev() {
        gates.push(Gate::H { qubit: j });
        for k in (0..j).rev() {
            let theta = PI / f64::from(1u32 << (j - k));
            gates.push(Gate::Cp { control: j, target: k, theta });
        }
    }
    for i in 0..width / 2 {
        gates.push(Gate::Swap { a: i, b: width - i - 1 });
    }
    gates
}

/// Full-connectivity network over all pairs `p < q`.
///
/// `(p+q) mod 3 == 0` → CX, `mod 5` → CZ, `mod 8` → CY. A pair matching
/// several moduli gets every matching gate, in ascending modulus order.
pub fn entanglement_network(num_qubits: usize) -> Vec<Gate> {
    let mut gates = Vec::new();
    for p in 0..num_qubits {
        for q in (p + 1)..num_qubits {
            let sum = p + q;
            if sum % 3 == 0 {
                gates.push(Gate::Cx { control: p, target: q });
            }
            if sum % 5 == 0 {
                gates.push(Gate::Cz { control: p, target: q });
            }
            if sum % 8 == 0 {
                gates.push(Gate::Cy { control: p, target: q });
            }
        }
    }
    gates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::LayerKind;

    #[test]
    fn test_rejects_bad_width() {
        let builder = CircuitBuilder::new(8);
        assert!(matches!(builder.build(&[Trigram::Qian], 0), Err(Error::CircuitSize { qubits: 0, max: 8 })));
        assert!(matches!(builder.build(&[Trigram::Qian], 9), Err(Error::CircuitSize { qubits: 9, .. })));
        assert!(builder.build(&[Trigram::Qian], 8).is_ok());
    }

    #[test]
    fn test_single_qubit_has_no_couplings() {
        let c = CircuitBuilder::default().build(&[Trigram::Xun], 1).unwrap();
        assert_eq!(c.layers().len(), 1);
        assert_eq!(c.layers()[0].kind(), LayerKind::Gate);
        assert_eq!(c.two_qubit_gate_count(), 0);
    }

    #[test]
    fn test_truncates_long_sequence() {
        let seq = [Trigram::Gen, Trigram::Gen, Trigram::Gen, Trigram::Gen];
        let c = CircuitBuilder::default().build(&seq, 2).unwrap();
        let Some(Layer::Gate { gates }) = c.layer(LayerKind::Gate) else { panic!("no gate layer") };
        assert_eq!(gates, &vec![Gate::T { qubit: 0 }, Gate::T { qubit: 1 }]);
    }

    #[test]
    fn test_short_sequence_keeps_full_width() {
        let c = CircuitBuilder::default().build(&[Trigram::Gen], 6).unwrap();
        assert_eq!(c.num_qubits(), 6);
        assert!(c.gates().any(|g| g.max_qubit() == 5));
        let Some(Layer::Gate { gates }) = c.layer(LayerKind::Gate) else { panic!("no gate layer") };
        assert!(gates.iter().all(|g| g.max_qubit() == 0));
        assert!(!c.has_layer(LayerKind::Interaction));
    }

    #[test]
    fn test_interaction_threshold() {
        // Wood → Fire generates (0.8), Fire → Fire neutral (0.5)
        let c = CircuitBuilder::default().build(&[Trigram::Zhen, Trigram::Li, Trigram::Li], 3).unwrap();
        let Some(Layer::Interaction { couplings }) = c.layer(LayerKind::Interaction) else { panic!() };
        assert_eq!(couplings[0].gate, Gate::Cx { control: 0, target: 1 });
        assert_eq!(couplings[1].gate, Gate::Cz { control: 1, target: 2 });
    }

    #[test]
    fn test_transform_only_from_four_qubits() {
        let b = CircuitBuilder::default();
        assert!(!b.build(&[], 3).unwrap().has_layer(LayerKind::Transform));
        let c = b.build(&[], 4).unwrap();
        let Some(Layer::Transform { width, gates }) = c.layer(LayerKind::Transform) else { panic!() };
        assert_eq!(*width, 4);
        // 4 H + 6 CP + 2 swaps
        assert_eq!(gates.len(), 12);
    }

    #[test]
    fn test_entanglement_moduli_overlap() {
        // p + q = 15 matches both 3 and 5
        let gates = entanglement_network(9);
        let pair: Vec<_> = gates
            .iter()
            .filter(|g| matches!(g, Gate::Cx { control: 7, target: 8 } | Gate::Cz { control: 7, target: 8 } | Gate::Cy { control: 7, target: 8 }))
            .collect();
        assert_eq!(pair, vec![&Gate::Cx { control: 7, target: 8 }, &Gate::Cz { control: 7, target: 8 }]);
        // p + q = 8 matches only mod 8
        assert!(gates.contains(&Gate::Cy { control: 1, target: 7 }));
        assert!(gates.contains(&Gate::Cy { control: 3, target: 5 }));
    }

    #[test]
    fn test_layer_order() {
        let seq = [Trigram::Qian, Trigram::Kun, Trigram::Zhen, Trigram::Xun];
        let c = CircuitBuilder::default().build(&seq, 4).unwrap();
        let kinds: Vec<_> = c.layers().iter().map(|l| l.kind()).collect();
        assert_eq!(
            kinds,
            vec![LayerKind::Gate, LayerKind::Interaction, LayerKind::Transform, LayerKind::Entanglement]
        );
    }
}
