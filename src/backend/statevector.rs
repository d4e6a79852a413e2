//! Dense state-vector kernels.
//!
//! Amplitude `i` is the coefficient of basis state `|i⟩`, where bit `q` of
//! `i` is the value of qubit `q`. Every kernel works in place on a buffer
//! owned by the caller.

use std::f64::consts::{FRAC_1_SQRT_2, FRAC_PI_4};

use num_complex::Complex64;
use rand::Rng;

use crate::circuit::{CircuitDescriptor, Gate};

type Matrix2 = [[Complex64; 2]; 2];

const ZERO: Complex64 = Complex64::new(0.0, 0.0);
const ONE: Complex64 = Complex64::new(1.0, 0.0);
const I: Complex64 = Complex64::new(0.0, 1.0);

// ============================================================================
// Gate matrices
// ============================================================================

fn pauli_x() -> Matrix2 { [[ZERO, ONE], [ONE, ZERO]] }
fn pauli_y() -> Matrix2 { [[ZERO, -I], [I, ZERO]] }
fn pauli_z() -> Matrix2 { [[ONE, ZERO], [ZERO, -ONE]] }

fn hadamard() -> Matrix2 {
    let h = Complex64::new(FRAC_1_SQRT_2, 0.0);
    [[h, h], [h, -h]]
}

fn phase(theta: f64) -> Matrix2 {
    [[ONE, ZERO], [ZERO, Complex64::from_polar(1.0, theta)]]
}

fn rx(theta: f64) -> Matrix2 {
    let c = Complex64::new((theta / 2.0).cos(), 0.0);
    let s = Complex64::new(0.0, -(theta / 2.0).sin());
    [[c, s], [s, c]]
}

fn ry(theta: f64) -> Matrix2 {
    let c = Complex64::new((theta / 2.0).cos(), 0.0);
    let s = Complex64::new((theta / 2.0).sin(), 0.0);
    [[c, -s], [s, c]]
}

fn rz(theta: f64) -> Matrix2 {
    [
        [Complex64::from_polar(1.0, -theta / 2.0), ZERO],
        [ZERO, Complex64::from_polar(1.0, theta / 2.0)],
    ]
}

// ============================================================================
// StateVector
// ============================================================================

/// Dense `2^n` amplitude vector.
#[derive(Debug, Clone, PartialEq)]
pub struct StateVector {
    num_qubits: usize,
    amplitudes: Vec<Complex64>,
}

impl StateVector {
    /// `|0…0⟩` on `num_qubits` qubits.
    pub fn zero(num_qubits: usize) -> Self {
        let mut amplitudes = vec![ZERO; 1usize << num_qubits];
        amplitudes[0] = ONE;
        Self { num_qubits, amplitudes }
    }

    /// Evolve `|0…0⟩` through every gate of `circuit`.
    pub fn simulate(circuit: &CircuitDescriptor) -> Self {
        let mut state = Self::zero(circuit.num_qubits());
        for layer in circuit.layers() {
            for gate in layer.gates() {
                state.apply(gate);
            }
            tracing::trace!(layer = ?layer.kind(), gates = layer.gate_count(), "applied layer");
        }
        state
    }

    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    pub fn amplitudes(&self) -> &[Complex64] {
        &self.amplitudes
    }

    pub fn probabilities(&self) -> Vec<f64> {
        self.amplitudes.iter().map(|a| a.norm_sqr()).collect()
    }

    pub fn norm_sqr(&self) -> f64 {
        self.amplitudes.iter().map(|a| a.norm_sqr()).sum()
    }

    pub fn apply(&mut self, gate: &Gate) {
        match *gate {
            Gate::X { qubit } => self.apply_single(qubit, &pauli_x()),
            Gate::Y { qubit } => self.apply_single(qubit, &pauli_y()),
            Gate::Z { qubit } => self.apply_single(qubit, &pauli_z()),
            Gate::H { qubit } => self.apply_single(qubit, &hadamard()),
            Gate::S { qubit } => self.apply_single(qubit, &phase(std::f64::consts::FRAC_PI_2)),
            Gate::T { qubit } => self.apply_single(qubit, &phase(FRAC_PI_4)),
            Gate::Rx { qubit, theta } => self.apply_single(qubit, &rx(theta)),
            Gate::Ry { qubit, theta } => self.apply_single(qubit, &ry(theta)),
            Gate::Rz { qubit, theta } => self.apply_single(qubit, &rz(theta)),
            Gate::Cx { control, target } => self.apply_controlled(control, target, &pauli_x()),
            Gate::Cy { control, target } => self.apply_controlled(control, target, &pauli_y()),
            Gate::Cz { control, target } => self.apply_controlled_phase(control, target, std::f64::consts::PI),
            Gate::Cp { control, target, theta } => self.apply_controlled_phase(control, target, theta),
            Gate::Swap { a, b } => self.apply_swap(a, b),
        }
    }

    fn apply_single(&mut self, qubit: usize, m: &Matrix2) {
        let stride = 1usize << qubit;
        let len = self.amplitudes.len();
        for base in (0..len).step_by(stride << 1) {
            for i in base..base + stride {
                let j = i + stride;
                let (a0, a1) = (self.amplitudes[i], self.amplitudes[j]);
                self.amplitudes[i] = m[0][0] * a0 + m[0][1] * a1;
                self.amplitudes[j] = m[1][0] * a0 + m[1][1] * a1;
            }
        }
    }

    fn apply_controlled(&mut self, control: usize, target: usize, m: &Matrix2) {
        let cmask = 1usize << control;
        let tmask = 1usize << target;
        for i in 0..self.amplitudes.len() {
            if i & cmask != 0 && i & tmask == 0 {
                let j = i | tmask;
                let (a0, a1) = (self.amplitudes[i], self.amplitudes[j]);
                self.amplitudes[i] = m[0][0] * a0 + m[0][1] * a1;
                self.amplitudes[j] = m[1][0] * a0 + m[1][1] * a1;
            }
        }
    }

    fn apply_controlled_phase(&mut self, control: usize, target: usize, theta: f64) {
        let mask = (1usize << control) | (1usize << target);
        let factor = Complex64::from_polar(1.0, theta);
        for (i, amp) in self.amplitudes.iter_mut().enumerate() {
            if i & mask == mask {
                *amp *= factor;
            }
        }
    }

    fn apply_swap(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        let amask = 1usize << a;
        let bmask = 1usize << b;
        for i in 0..self.amplitudes.len() {
            if i & amask != 0 && i & bmask == 0 {
                self.amplitudes.swap(i, i ^ amask ^ bmask);
            }
        }
    }

    /// Draw `shots` basis-state indices from `|amplitude|²`.
    pub fn sample<R: Rng + ?Sized>(&self, shots: u64, rng: &mut R) -> hashbrown::HashMap<u64, u64> {
        let mut cumulative = Vec::with_capacity(self.amplitudes.len());
        let mut running = 0.0;
        for amp in &self.amplitudes {
            running += amp.norm_sqr();
            cumulative.push(running);
        }
        let last = cumulative.len() - 1;

        let mut counts = hashbrown::HashMap::new();
        for _ in 0..shots {
            let u = rng.r#gen::<f64>() * running;
            let idx = cumulative.partition_point(|&c| c <= u).min(last);
            *counts.entry(idx as u64).or_insert(0) += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn test_bit_flip_on_high_qubit() {
        let mut s = StateVector::zero(3);
        s.apply(&Gate::X { qubit: 2 });
        assert!(approx(s.probabilities()[0b100], 1.0));
    }

    #[test]
    fn test_bell_pair() {
        let mut s = StateVector::zero(2);
        s.apply(&Gate::H { qubit: 0 });
        s.apply(&Gate::Cx { control: 0, target: 1 });
        let p = s.probabilities();
        assert!(approx(p[0b00], 0.5));
        assert!(approx(p[0b11], 0.5));
        assert!(approx(p[0b01], 0.0));
    }

    #[test]
    fn test_swap() {
        let mut s = StateVector::zero(2);
        s.apply(&Gate::X { qubit: 0 });
        s.apply(&Gate::Swap { a: 0, b: 1 });
        assert!(approx(s.probabilities()[0b10], 1.0));
    }

    #[test]
    fn test_rotations_preserve_norm() {
        let mut s = StateVector::zero(2);
        for gate in [
            Gate::Rx { qubit: 0, theta: 0.7 },
            Gate::Ry { qubit: 1, theta: 1.3 },
            Gate::Rz { qubit: 0, theta: -0.4 },
            Gate::Cy { control: 0, target: 1 },
            Gate::Cp { control: 1, target: 0, theta: 0.9 },
            Gate::S { qubit: 1 },
            Gate::T { qubit: 0 },
        ] {
            s.apply(&gate);
        }
        assert!(approx(s.norm_sqr(), 1.0));
    }

    #[test]
    fn test_ry_pi_is_flip() {
        let mut s = StateVector::zero(1);
        s.apply(&Gate::Ry { qubit: 0, theta: std::f64::consts::PI });
        assert!(approx(s.probabilities()[1], 1.0));
    }

    #[test]
    fn test_sample_counts_sum_to_shots() {
        let mut s = StateVector::zero(3);
        for q in 0..3 {
            s.apply(&Gate::H { qubit: q });
        }
        let mut rng = StdRng::seed_from_u64(7);
        let counts = s.sample(1000, &mut rng);
        assert_eq!(counts.values().sum::<u64>(), 1000);
        assert!(counts.keys().all(|&k| k < 8));
    }

    #[test]
    fn test_sample_deterministic_state() {
        let mut s = StateVector::zero(2);
        s.apply(&Gate::X { qubit: 1 });
        let counts = s.sample(64, &mut StdRng::seed_from_u64(1));
        assert_eq!(counts.len(), 1);
        assert_eq!(counts.get(&0b10), Some(&64));
    }
}
