//! # Symbolic Model
//!
//! The fixed vocabulary of the engine: trigrams, their elements, the 64
//! hexagrams, and the caller context that seeds hexagram sequences.
//!
//! Design rule: this module is pure data. No I/O, no mutable state, no
//! async. Every table is built once and shared read-only.

pub mod trigram;
pub mod element;
pub mod hexagram;
pub mod context;
pub mod digest;

pub use trigram::{
    Trigram, Symbol, SymbolTable, GateKind, GateOp, GateSpec,
    gate_spec_for, SYMBOLS,
};
pub use element::{
    Element, Relation, AffinityPair, affinity, interaction_strength,
    GENERATES_STRENGTH, RESTRAINS_STRENGTH, NEUTRAL_STRENGTH,
};
pub use hexagram::{Hexagram, HexagramTable, HEXAGRAM_COUNT};
pub use context::{UserContext, ContextValue};
pub use digest::{stable_hash, stable_hash_str};
