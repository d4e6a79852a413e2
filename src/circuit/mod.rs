//! # Circuit Descriptors
//!
//! A circuit is an ordered list of layers over `num_qubits` qubits. Each
//! layer records which construction stage produced it together with its
//! gates. Descriptors are immutable once built and are consumed by a
//! `SimulationBackend`.
//!
//! Qubit `q` is bit `q` of a basis-state index (little-endian); bit-strings
//! print qubit `n - 1` first.

pub mod builder;

use serde::{Deserialize, Serialize};

use crate::model::stable_hash;
use crate::Result;

pub use builder::{CircuitBuilder, DEFAULT_MAX_QUBITS};

// ============================================================================
// Gates
// ============================================================================

/// A concrete gate on specific qubits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Gate {
    X { qubit: usize },
    Y { qubit: usize },
    Z { qubit: usize },
    H { qubit: usize },
    S { qubit: usize },
    T { qubit: usize },
    Rx { qubit: usize, theta: f64 },
    Ry { qubit: usize, theta: f64 },
    Rz { qubit: usize, theta: f64 },
    Cx { control: usize, target: usize },
    Cy { control: usize, target: usize },
    Cz { control: usize, target: usize },
    /// Controlled phase `diag(1, 1, 1, e^{iθ})`.
    Cp { control: usize, target: usize, theta: f64 },
    Swap { a: usize, b: usize },
}

impl Gate {
    /// Highest qubit index touched.
    pub fn max_qubit(&self) -> usize {
        match *self {
            Gate::X { qubit }
            | Gate::Y { qubit }
            | Gate::Z { qubit }
            | Gate::H { qubit }
            | Gate::S { qubit }
            | Gate::T { qubit }
            | Gate::Rx { qubit, .. }
            | Gate::Ry { qubit, .. }
            | Gate::Rz { qubit, .. } => qubit,
            Gate::Cx { control, target }
            | Gate::Cy { control, target }
            | Gate::Cz { control, target }
            | Gate::Cp { control, target, .. } => control.max(target),
            Gate::Swap { a, b } => a.max(b),
        }
    }

    pub fn is_two_qubit(&self) -> bool {
        matches!(
            self,
            Gate::Cx { .. } | Gate::Cy { .. } | Gate::Cz { .. } | Gate::Cp { .. } | Gate::Swap { .. }
        )
    }
}

// ============================================================================
// Layers
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    /// Classical bit preparation (X on selected qubits).
    Preparation,
    /// Per-qubit trigram gates.
    Gate,
    /// Couplings between adjacent sequence positions.
    Interaction,
    /// Quantum Fourier transform on a prefix of the register.
    Transform,
    /// Modular or cyclic entanglement network.
    Entanglement,
}

/// Coupling chosen for an adjacent pair in the interaction layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub position: usize,
    pub strength: f64,
    pub gate: Gate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "layer", rename_all = "snake_case")]
pub enum Layer {
    Preparation { gates: Vec<Gate> },
    Gate { gates: Vec<Gate> },
    Interaction { couplings: Vec<Interaction> },
    Transform { width: usize, gates: Vec<Gate> },
    Entanglement { gates: Vec<Gate> },
}

impl Layer {
    pub fn kind(&self) -> LayerKind {
        match self {
            Layer::Preparation { .. } => LayerKind::Preparation,
            Layer::Gate { .. } => LayerKind::Gate,
            Layer::Interaction { .. } => LayerKind::Interaction,
            Layer::Transform { .. } => LayerKind::Transform,
            Layer::Entanglement { .. } => LayerKind::Entanglement,
        }
    }

    /// Gates in application order.
    pub fn gates(&self) -> Box<dyn Iterator<Item = &Gate> + '_> {
        match self {
            Layer::Preparation { gates }
            | Layer::Gate { gates }
            | Layer::Transform { gates, .. }
            | Layer::Entanglement { gates } => Box::new(gates.iter()),
            Layer::Interaction { couplings } => Box::new(couplings.iter().map(|c| &c.gate)),
        }
    }

    pub fn gate_count(&self) -> usize {
        match self {
            Layer::Interaction { couplings } => couplings.len(),
            Layer::Preparation { gates }
            | Layer::Gate { gates }
            | Layer::Transform { gates, .. }
            | Layer::Entanglement { gates } => gates.len(),
        }
    }
}

// ============================================================================
// CircuitDescriptor
// ============================================================================

/// An immutable, fully specified circuit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitDescriptor {
    num_qubits: usize,
    layers: Vec<Layer>,
}

impl CircuitDescriptor {
    /// Assemble a descriptor. Callers are responsible for qubit bounds;
    /// `CircuitBuilder` is the checked entry point.
    pub(crate) fn from_layers(num_qubits: usize, layers: Vec<Layer>) -> Self {
        Self { num_qubits, layers }
    }

    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer(&self, kind: LayerKind) -> Option<&Layer> {
        self.layers.iter().find(|l| l.kind() == kind)
    }

    pub fn has_layer(&self, kind: LayerKind) -> bool {
        self.layer(kind).is_some()
    }

    /// All gates in application order.
    pub fn gates(&self) -> impl Iterator<Item = &Gate> {
        self.layers.iter().flat_map(|l| l.gates())
    }

    pub fn gate_count(&self) -> usize {
        self.layers.iter().map(Layer::gate_count).sum()
    }

    pub fn two_qubit_gate_count(&self) -> usize {
        self.gates().filter(|g| g.is_two_qubit()).count()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Stable digest of the descriptor's canonical JSON form.
    pub fn fingerprint(&self) -> Result<u64> {
        Ok(stable_hash(&serde_json::to_vec(self)?))
    }
}
