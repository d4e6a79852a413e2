//! The eight trigrams and their gate specifications.
//!
//! This is the fixed symbol vocabulary of the engine. Every trigram is bound
//! to a primary gate kind with a rotation angle, plus an optional secondary
//! operation applied right after it on the same qubit.
//!
//! ```text
//!  idx  trigram  glyph  lines  primary          angle   secondary
//!  0    Qian 乾   ☰      111    fixed-phase      0       Rz(π/8)
//!  1    Kun  坤   ☷      000    bit-flip         π       Rz(−π/8)
//!  2    Zhen 震   ☳      001    phase-flip       π/2     Ry(π/6)
//!  3    Xun  巽   ☴      110    superposition    π/4     Rz(π/4)
//!  4    Kan  坎   ☵      010    Y-rotation       π/2     Rx(π/3)
//!  5    Li   离   ☲      101    S-phase          π       Ry(−π/4)
//!  6    Gen  艮   ☶      100    T-phase          π       -
//!  7    Dui  兑   ☱      011    X-rotation       3π/4    Rz(π/6)
//! ```

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::circuit::Gate;
use crate::{Error, Result};

// ============================================================================
// Gate kinds
// ============================================================================

/// Closed set of single-qubit operation kinds a trigram can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateKind {
    /// Rz(angle)
    FixedPhase,
    /// Pauli-X
    BitFlip,
    /// Pauli-Z
    PhaseFlip,
    /// Hadamard
    Superposition,
    /// Ry(angle)
    RotationY,
    /// S = diag(1, i)
    SPhase,
    /// T = diag(1, e^{iπ/4})
    TPhase,
    /// Rx(angle)
    RotationX,
}

impl GateKind {
    pub fn name(self) -> &'static str {
        match self {
            GateKind::FixedPhase => "fixed-phase",
            GateKind::BitFlip => "bit-flip",
            GateKind::PhaseFlip => "phase-flip",
            GateKind::Superposition => "superposition",
            GateKind::RotationY => "y-rotation",
            GateKind::SPhase => "s-phase",
            GateKind::TPhase => "t-phase",
            GateKind::RotationX => "x-rotation",
        }
    }

    /// Realise this kind as a concrete gate on `qubit`.
    ///
    /// Non-parametric kinds ignore `angle`.
    pub fn realize(self, qubit: usize, angle: f64) -> Gate {
        match self {
            GateKind::FixedPhase => Gate::Rz { qubit, theta: angle },
            GateKind::BitFlip => Gate::X { qubit },
            GateKind::PhaseFlip => Gate::Z { qubit },
            GateKind::Superposition => Gate::H { qubit },
            GateKind::RotationY => Gate::Ry { qubit, theta: angle },
            GateKind::SPhase => Gate::S { qubit },
            GateKind::TPhase => Gate::T { qubit },
            GateKind::RotationX => Gate::Rx { qubit, theta: angle },
        }
    }
}

impl fmt::Display for GateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Gate specification
// ============================================================================

/// A kind paired with its angle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GateOp {
    pub kind: GateKind,
    pub angle: f64,
}

impl GateOp {
    pub const fn new(kind: GateKind, angle: f64) -> Self {
        Self { kind, angle }
    }
}

/// Gate specification of one trigram: primary operation, then secondary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GateSpec {
    pub primary: GateKind,
    /// Rotation angle in radians. May be 0.
    pub angle: f64,
    pub secondary: Option<GateOp>,
}

impl GateSpec {
    /// Concrete gates for `qubit`, primary first.
    pub fn gates_for(&self, qubit: usize) -> SmallVec<[Gate; 2]> {
        let mut gates = SmallVec::new();
        gates.push(self.primary.realize(qubit, self.angle));
        if let Some(op) = self.secondary {
            gates.push(op.kind.realize(qubit, op.angle));
        }
        gates
    }
}

// ============================================================================
// Trigram
// ============================================================================

/// One of the eight trigrams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigram {
    Qian,
    Kun,
    Zhen,
    Xun,
    Kan,
    Li,
    Gen,
    Dui,
}

/// Static record for a trigram.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Symbol {
    pub trigram: Trigram,
    pub name: &'static str,
    pub han: &'static str,
    pub glyph: char,
    /// Line code, top line first (`'1'` = solid).
    pub lines: &'static str,
    pub spec: GateSpec,
}

const fn spec(primary: GateKind, angle: f64, secondary: Option<GateOp>) -> GateSpec {
    GateSpec { primary, angle, secondary }
}

/// The symbol table, indexed by `Trigram::index()`.
pub static SYMBOLS: [Symbol; 8] = [
    Symbol {
        trigram: Trigram::Qian, name: "qian", han: "乾", glyph: '☰', lines: "111",
        spec: spec(GateKind::FixedPhase, 0.0, Some(GateOp::new(GateKind::FixedPhase, PI / 8.0))),
    },
    Symbol {
        trigram: Trigram::Kun, name: "kun", han: "坤", glyph: '☷', lines: "000",
        spec: spec(GateKind::BitFlip, PI, Some(GateOp::new(GateKind::FixedPhase, -PI / 8.0))),
    },
    Symbol {
        trigram: Trigram::Zhen, name: "zhen", han: "震", glyph: '☳', lines: "001",
        spec: spec(GateKind::PhaseFlip, PI / 2.0, Some(GateOp::new(GateKind::RotationY, PI / 6.0))),
    },
    Symbol {
        trigram: Trigram::Xun, name: "xun", han: "巽", glyph: '☴', lines: "110",
        spec: spec(GateKind::Superposition, PI / 4.0, Some(GateOp::new(GateKind::FixedPhase, PI / 4.0))),
    },
    Symbol {
        trigram: Trigram::Kan, name: "kan", han: "坎", glyph: '☵', lines: "010",
        spec: spec(GateKind::RotationY, PI / 2.0, Some(GateOp::new(GateKind::RotationX, PI / 3.0))),
    },
    Symbol {
        trigram: Trigram::Li, name: "li", han: "离", glyph: '☲', lines: "101",
        spec: spec(GateKind::SPhase, PI, Some(GateOp::new(GateKind::RotationY, -PI / 4.0))),
    },
    Symbol {
        trigram: Trigram::Gen, name: "gen", han: "艮", glyph: '☶', lines: "100",
        spec: spec(GateKind::TPhase, PI, None),
    },
    Symbol {
        trigram: Trigram::Dui, name: "dui", han: "兑", glyph: '☱', lines: "011",
        spec: spec(GateKind::RotationX, 3.0 * PI / 4.0, Some(GateOp::new(GateKind::FixedPhase, PI / 6.0))),
    },
];

impl Trigram {
    pub const ALL: [Trigram; 8] = [
        Trigram::Qian,
        Trigram::Kun,
        Trigram::Zhen,
        Trigram::Xun,
        Trigram::Kan,
        Trigram::Li,
        Trigram::Gen,
        Trigram::Dui,
    ];

    /// Position in the table (0..8).
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Result<Self> {
        Self::ALL
            .get(index)
            .copied()
            .ok_or_else(|| Error::UnknownSymbol(format!("trigram index {index}")))
    }

    pub fn symbol(self) -> &'static Symbol {
        &SYMBOLS[self.index()]
    }

    pub fn gate_spec(self) -> &'static GateSpec {
        &self.symbol().spec
    }

    pub fn name(self) -> &'static str {
        self.symbol().name
    }

    pub fn han(self) -> &'static str {
        self.symbol().han
    }

    pub fn glyph(self) -> char {
        self.symbol().glyph
    }

    /// Trigram whose line code equals the given 3 characters.
    pub fn from_lines(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.symbol().lines == code)
    }
}

impl fmt::Display for Trigram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.han())
    }
}

impl FromStr for Trigram {
    type Err = Error;

    /// Accepts the ASCII name, the Han character (simplified or
    /// traditional), the Unicode glyph, or the table index.
    fn from_str(s: &str) -> Result<Self> {
        let token = s.trim();
        let normalized = match token {
            "離" => "离",
            "兌" => "兑",
            other => other,
        };
        if let Ok(index) = normalized.parse::<usize>() {
            return Self::from_index(index);
        }
        SYMBOLS
            .iter()
            .find(|sym| {
                sym.name.eq_ignore_ascii_case(normalized)
                    || sym.han == normalized
                    || normalized.chars().eq(std::iter::once(sym.glyph))
            })
            .map(|sym| sym.trigram)
            .ok_or_else(|| Error::UnknownSymbol(token.to_string()))
    }
}

// ============================================================================
// SymbolTable
// ============================================================================

/// Read-only lookup over the static symbol table.
#[derive(Debug, Clone, Copy, Default)]
pub struct SymbolTable;

impl SymbolTable {
    pub fn symbols(&self) -> &'static [Symbol; 8] {
        &SYMBOLS
    }

    /// Gate specification for a symbol token.
    pub fn gate_spec_for(&self, symbol: &str) -> Result<GateSpec> {
        let trigram: Trigram = symbol.parse()?;
        Ok(*trigram.gate_spec())
    }

    /// Parse a whole sequence of tokens, failing on the first unknown one.
    pub fn parse_sequence<S: AsRef<str>>(&self, tokens: &[S]) -> Result<Vec<Trigram>> {
        tokens.iter().map(|t| t.as_ref().parse()).collect()
    }
}

/// Gate specification for a symbol token.
pub fn gate_spec_for(symbol: &str) -> Result<GateSpec> {
    SymbolTable.gate_spec_for(symbol)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_order_matches_index() {
        for (i, sym) in SYMBOLS.iter().enumerate() {
            assert_eq!(sym.trigram.index(), i);
            assert_eq!(Trigram::from_index(i).unwrap(), sym.trigram);
        }
    }

    #[test]
    fn test_parse_variants() {
        assert_eq!("qian".parse::<Trigram>().unwrap(), Trigram::Qian);
        assert_eq!("KUN".parse::<Trigram>().unwrap(), Trigram::Kun);
        assert_eq!("震".parse::<Trigram>().unwrap(), Trigram::Zhen);
        assert_eq!("離".parse::<Trigram>().unwrap(), Trigram::Li);
        assert_eq!("兌".parse::<Trigram>().unwrap(), Trigram::Dui);
        assert_eq!("☵".parse::<Trigram>().unwrap(), Trigram::Kan);
        assert_eq!("6".parse::<Trigram>().unwrap(), Trigram::Gen);
    }

    #[test]
    fn test_unknown_symbol() {
        assert!(matches!("fire".parse::<Trigram>(), Err(Error::UnknownSymbol(_))));
        assert!(matches!(gate_spec_for("☯"), Err(Error::UnknownSymbol(_))));
        assert!(matches!(Trigram::from_index(8), Err(Error::UnknownSymbol(_))));
    }

    #[test]
    fn test_gate_spec_primary_then_secondary() {
        let gates = Trigram::Kan.gate_spec().gates_for(3);
        assert_eq!(gates.len(), 2);
        assert_eq!(gates[0], Gate::Ry { qubit: 3, theta: PI / 2.0 });
        assert_eq!(gates[1], Gate::Rx { qubit: 3, theta: PI / 3.0 });

        let gates = Trigram::Gen.gate_spec().gates_for(0);
        assert_eq!(gates.len(), 1);
        assert_eq!(gates[0], Gate::T { qubit: 0 });
    }

    #[test]
    fn test_line_codes_unique() {
        for t in Trigram::ALL {
            assert_eq!(Trigram::from_lines(t.symbol().lines), Some(t));
        }
        assert_eq!(Trigram::from_lines("111"), Some(Trigram::Qian));
        assert_eq!(Trigram::from_lines("000"), Some(Trigram::Kun));
    }
}
