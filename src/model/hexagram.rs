//! The 64 hexagrams: every ordered pair of trigrams.
//!
//! Built once per process and never mutated. Ids are `upper * 8 + lower`.

use std::f64::consts::TAU;
use std::fmt;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use super::digest::stable_hash_str;
use super::{Element, Trigram};
use crate::{Error, Result};

/// Number of hexagrams.
pub const HEXAGRAM_COUNT: usize = 64;

/// Composite of an upper and a lower trigram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hexagram {
    pub id: u8,
    pub name: String,
    pub upper: Trigram,
    pub lower: Trigram,
    /// `[angle_u / 2π, angle_l / 2π, h(kind_u) % 100 / 100, h(kind_l) % 100 / 100]`
    pub signature: [f64; 4],
    /// `(upper_index + lower_index) / 14`, in `[0, 1]`.
    pub energy_weight: f64,
}

impl Hexagram {
    fn new(upper: Trigram, lower: Trigram) -> Self {
        let (i, j) = (upper.index(), lower.index());
        let su = upper.gate_spec();
        let sl = lower.gate_spec();
        let signature = [
            su.angle / TAU,
            sl.angle / TAU,
            kind_fraction(su.primary.name()),
            kind_fraction(sl.primary.name()),
        ];
        Self {
            id: (i * 8 + j) as u8,
            name: format!("{}{}", upper.han(), lower.han()),
            upper,
            lower,
            signature,
            energy_weight: (i + j) as f64 / 14.0,
        }
    }

    /// Glyph pair, e.g. `☰☷`.
    pub fn glyphs(&self) -> String {
        [self.upper.glyph(), self.lower.glyph()].iter().collect()
    }

    /// Elements of the upper and lower trigram.
    pub fn elements(&self) -> [Element; 2] {
        [Element::of(self.upper), Element::of(self.lower)]
    }
}

impl fmt::Display for Hexagram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}", self.id, self.name)
    }
}

fn kind_fraction(kind_name: &str) -> f64 {
    (stable_hash_str(kind_name) % 100) as f64 / 100.0
}

// ============================================================================
// HexagramTable
// ============================================================================

/// Precomputed table of all 64 hexagrams.
#[derive(Debug, Clone)]
pub struct HexagramTable {
    entries: Vec<Hexagram>,
}

static GLOBAL: LazyLock<HexagramTable> = LazyLock::new(HexagramTable::build);

impl HexagramTable {
    pub fn build() -> Self {
        let mut entries = Vec::with_capacity(HEXAGRAM_COUNT);
        for upper in Trigram::ALL {
            for lower in Trigram::ALL {
                entries.push(Hexagram::new(upper, lower));
            }
        }
        Self { entries }
    }

    /// The process-wide table.
    pub fn global() -> &'static HexagramTable {
        &GLOBAL
    }

    pub fn lookup(&self, id: usize) -> Result<&Hexagram> {
        self.entries
            .get(id)
            .ok_or_else(|| Error::IndexError(format!("hexagram id {id} outside 0..{HEXAGRAM_COUNT}")))
    }

    pub fn lookup_by_indices(&self, upper: usize, lower: usize) -> Result<&Hexagram> {
        if upper >= 8 || lower >= 8 {
            return Err(Error::IndexError(format!(
                "trigram indices ({upper}, {lower}) outside 0..8"
            )));
        }
        self.lookup(upper * 8 + lower)
    }

    pub fn lookup_by_symbols(&self, upper: Trigram, lower: Trigram) -> &Hexagram {
        &self.entries[upper.index() * 8 + lower.index()]
    }

    /// Hexagram `(s[k], s[(k + 1) % len])` for every position `k`.
    pub fn cyclic_pairs(&self, sequence: &[Trigram]) -> Vec<Hexagram> {
        let len = sequence.len();
        (0..len)
            .map(|k| self.lookup_by_symbols(sequence[k], sequence[(k + 1) % len]).clone())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Hexagram> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
