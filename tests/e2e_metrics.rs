//! End-to-end tests for the metrics pipeline.
//!
//! Each test exercises: trigram sequence -> build -> execute -> extract
//! through `QuantumEngine::compute_metrics()`.

use bagua_quantum::{
    CircuitBuilder, Element, EngineConfig, Error, QuantumEngine, SimulationBackend,
    StateVectorBackend, Trigram,
};
use pretty_assertions::assert_eq;

const SCENARIO: [Trigram; 4] = [Trigram::Qian, Trigram::Kun, Trigram::Zhen, Trigram::Xun];

// ============================================================================
// 1. Four-symbol scenario stays in range and repeats exactly
// ============================================================================

#[test]
fn test_scenario_bounds_and_repeatability() {
    let engine = QuantumEngine::new();

    let first = engine.compute_metrics(&SCENARIO, 4, Some(1024)).unwrap();
    let second = engine.compute_metrics(&SCENARIO, 4, Some(1024)).unwrap();

    assert!((-1.0..=1.0).contains(&first.quotient));
    assert!((0.0..=1.0).contains(&first.balance.balance_index));
    assert!((0.0..=1.0).contains(&first.entanglement));
    assert!((0.0..=1.0).contains(&first.coherence));
    assert!(first.resonance >= 0.0);
    assert!(!first.entanglement_unavailable);
    assert_eq!(first.shots, 1024);
    assert_eq!(first.num_qubits, 4);

    assert_eq!(first.quotient, second.quotient);
    assert_eq!(first.balance, second.balance);
    assert_eq!(first.coherence, second.coherence);
    assert_eq!(first.resonance, second.resonance);
    assert_eq!(first.entanglement, second.entanglement);
}

// ============================================================================
// 2. Balance: scenario elements
// ============================================================================

#[test]
fn test_scenario_balance_counts() {
    // Pairs: 乾坤, 坤震, 震巽, 巽乾 -> Metal 2, Earth 2, Wood 4
    let m = QuantumEngine::new().compute_metrics(&SCENARIO, 4, Some(64)).unwrap();
    assert_eq!(m.balance.counts[&Element::Wood], 4);
    assert_eq!(m.balance.counts[&Element::Metal], 2);
    assert_eq!(m.balance.counts[&Element::Earth], 2);
    assert_eq!(m.balance.counts[&Element::Fire], 0);
    assert_eq!(m.balance.dominant, Some(Element::Wood));
}

#[test]
fn test_single_element_is_less_balanced_than_all_five() {
    let engine = QuantumEngine::new();
    let one = [Trigram::Kun, Trigram::Gen, Trigram::Kun, Trigram::Gen, Trigram::Kun];
    let five = [Trigram::Qian, Trigram::Zhen, Trigram::Kan, Trigram::Li, Trigram::Kun];

    let skewed = engine.compute_metrics(&one, 5, Some(128)).unwrap();
    let even = engine.compute_metrics(&five, 5, Some(128)).unwrap();

    assert!(skewed.balance.balance_index < even.balance.balance_index);
    assert!((even.balance.balance_index - 1.0).abs() < 1e-12);
    assert_eq!(skewed.balance.dominant, Some(Element::Earth));
}

// ============================================================================
// 3. Entanglement edge cases
// ============================================================================

#[test]
fn test_single_qubit_entanglement_is_exactly_zero() {
    for t in Trigram::ALL {
        let m = QuantumEngine::new().compute_metrics(&[t], 1, Some(32)).unwrap();
        assert_eq!(m.entanglement, 0.0, "{t:?}");
    }
}

#[test]
fn test_wide_register_is_entangled() {
    let m = QuantumEngine::new()
        .compute_metrics(&[Trigram::Xun; 6], 6, Some(256))
        .unwrap();
    assert!(m.entanglement > 0.0);
    assert!(m.entanglement <= 1.0);
}

// ============================================================================
// 4. Error propagation
// ============================================================================

#[test]
fn test_width_errors() {
    let engine = QuantumEngine::new();
    assert!(matches!(
        engine.compute_metrics(&SCENARIO, 0, None),
        Err(Error::CircuitSize { qubits: 0, max: 24 })
    ));
    assert!(matches!(
        engine.compute_metrics(&SCENARIO, 25, None),
        Err(Error::CircuitSize { qubits: 25, .. })
    ));
    // Builds fine, but exceeds the exact-simulation ceiling.
    assert!(matches!(
        engine.compute_metrics(&SCENARIO, 21, None),
        Err(Error::SimulationTooLarge { qubits: 21, ceiling: 20 })
    ));
}

#[test]
fn test_symbol_tokens_match_trigrams() {
    let engine = QuantumEngine::new();
    let tokens = ["qian", "坤", "☳", "Xun"];
    let from_tokens = engine.compute_metrics_for_symbols(&tokens, 4, Some(256)).unwrap();
    let from_trigrams = engine.compute_metrics(&SCENARIO, 4, Some(256)).unwrap();
    assert_eq!(from_tokens.quotient, from_trigrams.quotient);
    assert_eq!(from_tokens.entanglement, from_trigrams.entanglement);
    assert_eq!(from_tokens.balance, from_trigrams.balance);

    let err = engine.compute_metrics_for_symbols(&["qian", "thunder"], 4, None).unwrap_err();
    assert!(matches!(err, Error::UnknownSymbol(t) if t == "thunder"));
    assert_eq!(engine.backend().stats().circuits_executed, 2);
}

#[test]
fn test_ceiling_plus_one_does_no_work() {
    let backend = StateVectorBackend::new(6);
    let circuit = CircuitBuilder::default().build(&SCENARIO, 7).unwrap();
    let err = backend.execute(&circuit, 100).unwrap_err();
    assert!(matches!(err, Error::SimulationTooLarge { qubits: 7, ceiling: 6 }));
    assert_eq!(backend.stats().circuits_executed, 0);
    assert_eq!(backend.stats().shots_sampled, 0);
}

#[test]
fn test_zero_shots() {
    assert!(matches!(
        QuantumEngine::new().compute_metrics(&SCENARIO, 4, Some(0)),
        Err(Error::InvalidShots(0))
    ));
}

// ============================================================================
// 5. Configuration flows through
// ============================================================================

#[test]
fn test_default_shots_and_seed_from_config() {
    let cfg = EngineConfig::default().with_default_shots(300).with_sampling_seed(11);
    let engine = QuantumEngine::with_config(cfg).unwrap();
    let m = engine.compute_metrics(&SCENARIO, 4, None).unwrap();
    assert_eq!(m.shots, 300);

    let json = m.to_json().unwrap();
    assert_eq!(json["shots"], 300);
    assert!(json["balance"]["ratios"]["wood"].is_number());
}
