//! Five-element affinity rules.
//!
//! Trigrams fold onto five elements. Ordered element pairs are related by
//! the generating cycle (Wood → Fire → Earth → Metal → Water → Wood), the
//! restraining cycle (Wood → Earth → Water → Fire → Metal → Wood), or not at
//! all. The circuit builder reads the strength to pick a coupling gate.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::Trigram;

/// Strength of a generating pair.
pub const GENERATES_STRENGTH: f64 = 0.8;
/// Strength of a restraining pair.
pub const RESTRAINS_STRENGTH: f64 = 0.3;
/// Strength of every other pair, including equal elements.
pub const NEUTRAL_STRENGTH: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Element {
    Metal,
    Wood,
    Water,
    Fire,
    Earth,
}

impl Element {
    /// Reporting order.
    pub const ALL: [Element; 5] = [
        Element::Metal,
        Element::Wood,
        Element::Water,
        Element::Fire,
        Element::Earth,
    ];

    pub fn of(trigram: Trigram) -> Self {
        match trigram {
            Trigram::Qian | Trigram::Dui => Element::Metal,
            Trigram::Li => Element::Fire,
            Trigram::Zhen | Trigram::Xun => Element::Wood,
            Trigram::Kan => Element::Water,
            Trigram::Gen | Trigram::Kun => Element::Earth,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// The element this one generates.
    pub fn generates(self) -> Element {
        match self {
            Element::Wood => Element::Fire,
            Element::Fire => Element::Earth,
            Element::Earth => Element::Metal,
            Element::Metal => Element::Water,
            Element::Water => Element::Wood,
        }
    }

    /// The element this one restrains.
    pub fn restrains(self) -> Element {
        match self {
            Element::Wood => Element::Earth,
            Element::Earth => Element::Water,
            Element::Water => Element::Fire,
            Element::Fire => Element::Metal,
            Element::Metal => Element::Wood,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Element::Metal => "metal",
            Element::Wood => "wood",
            Element::Water => "water",
            Element::Fire => "fire",
            Element::Earth => "earth",
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    Generates,
    Restrains,
    Neutral,
}

/// Ordered element pair with its relation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AffinityPair {
    pub from: Element,
    pub to: Element,
    pub relation: Relation,
    pub strength: f64,
}

/// Relation of the ordered pair `(from, to)`.
pub fn affinity(from: Element, to: Element) -> AffinityPair {
    let (relation, strength) = if from == to {
        (Relation::Neutral, NEUTRAL_STRENGTH)
    } else if from.generates() == to {
        (Relation::Generates, GENERATES_STRENGTH)
    } else if from.restrains() == to {
        (Relation::Restrains, RESTRAINS_STRENGTH)
    } else {
        (Relation::Neutral, NEUTRAL_STRENGTH)
    };
    AffinityPair { from, to, relation, strength }
}

/// Interaction strength between two adjacent trigrams, in `[0, 1]`.
pub fn interaction_strength(a: Trigram, b: Trigram) -> f64 {
    affinity(Element::of(a), Element::of(b)).strength
}
