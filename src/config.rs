//! Engine configuration.
//!
//! Defaults suit an embedded library; `from_env` overlays `BAGUA_*`
//! variables for deployments that configure through the environment.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::backend::{DEFAULT_EXACT_SIMULATION_CEILING, DEFAULT_SHOTS, MAX_EXACT_SIMULATION_CEILING};
use crate::circuit::DEFAULT_MAX_QUBITS;
use crate::divination::{DEFAULT_DIVINATION_QUBITS, DEFAULT_DIVINATION_SHOTS};
use crate::{Error, Result};

pub const ENV_MAX_QUBITS: &str = "BAGUA_MAX_QUBITS";
pub const ENV_EXACT_SIMULATION_CEILING: &str = "BAGUA_EXACT_SIMULATION_CEILING";
pub const ENV_DEFAULT_SHOTS: &str = "BAGUA_DEFAULT_SHOTS";
pub const ENV_DIVINATION_QUBITS: &str = "BAGUA_DIVINATION_QUBITS";
pub const ENV_DIVINATION_SHOTS: &str = "BAGUA_DIVINATION_SHOTS";
pub const ENV_SAMPLING_SEED: &str = "BAGUA_SAMPLING_SEED";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Hard ceiling on circuit width accepted by the builder.
    pub max_qubits: usize,
    /// Widest circuit the state-vector backend will simulate.
    pub exact_simulation_ceiling: usize,
    pub default_shots: u64,
    pub divination_qubits: usize,
    pub divination_shots: u64,
    /// Mixed into every metrics sampling seed.
    pub sampling_seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_qubits: DEFAULT_MAX_QUBITS,
            exact_simulation_ceiling: DEFAULT_EXACT_SIMULATION_CEILING,
            default_shots: DEFAULT_SHOTS,
            divination_qubits: DEFAULT_DIVINATION_QUBITS,
            divination_shots: DEFAULT_DIVINATION_SHOTS,
            sampling_seed: 0,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_qubits(mut self, n: usize) -> Self {
        self.max_qubits = n;
        self
    }

    pub fn with_exact_simulation_ceiling(mut self, n: usize) -> Self {
        self.exact_simulation_ceiling = n;
        self
    }

    pub fn with_default_shots(mut self, shots: u64) -> Self {
        self.default_shots = shots;
        self
    }

    pub fn with_divination_qubits(mut self, n: usize) -> Self {
        self.divination_qubits = n;
        self
    }

    pub fn with_divination_shots(mut self, shots: u64) -> Self {
        self.divination_shots = shots;
        self
    }

    pub fn with_sampling_seed(mut self, seed: u64) -> Self {
        self.sampling_seed = seed;
        self
    }

    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Result<Self> {
        Self::default().overlay(|key| std::env::var(key).ok())
    }

    /// Overlay values from `lookup` (keyed by the `ENV_*` names), then
    /// validate.
    pub fn overlay<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        set(&lookup, ENV_MAX_QUBITS, &mut self.max_qubits)?;
        set(&lookup, ENV_EXACT_SIMULATION_CEILING, &mut self.exact_simulation_ceiling)?;
        set(&lookup, ENV_DEFAULT_SHOTS, &mut self.default_shots)?;
        set(&lookup, ENV_DIVINATION_QUBITS, &mut self.divination_qubits)?;
        set(&lookup, ENV_DIVINATION_SHOTS, &mut self.divination_shots)?;
        set(&lookup, ENV_SAMPLING_SEED, &mut self.sampling_seed)?;
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_qubits == 0 {
            return Err(Error::ConfigError("max_qubits must be at least 1".into()));
        }
        if self.exact_simulation_ceiling == 0 {
            return Err(Error::ConfigError("exact_simulation_ceiling must be at least 1".into()));
        }
        if self.exact_simulation_ceiling > MAX_EXACT_SIMULATION_CEILING {
            return Err(Error::ConfigError(format!(
                "exact_simulation_ceiling ({}) exceeds the dense simulator limit ({MAX_EXACT_SIMULATION_CEILING})",
                self.exact_simulation_ceiling
            )));
        }
        if self.exact_simulation_ceiling > self.max_qubits {
            return Err(Error::ConfigError(format!(
                "exact_simulation_ceiling ({}) exceeds max_qubits ({})",
                self.exact_simulation_ceiling, self.max_qubits
            )));
        }
        if self.default_shots == 0 || self.divination_shots == 0 {
            return Err(Error::ConfigError("shot counts must be at least 1".into()));
        }
        if self.divination_qubits == 0 || self.divination_qubits > self.exact_simulation_ceiling {
            return Err(Error::ConfigError(format!(
                "divination_qubits ({}) must lie in 1..={}",
                self.divination_qubits, self.exact_simulation_ceiling
            )));
        }
        Ok(())
    }
}

fn set<F, T>(lookup: &F, key: &str, slot: &mut T) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    if let Some(raw) = lookup(key) {
        *slot = raw
            .trim()
            .parse()
            .map_err(|_| Error::ConfigError(format!("{key}={raw:?} is not a valid value")))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let cfg = EngineConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.max_qubits, 24);
        assert_eq!(cfg.exact_simulation_ceiling, 20);
        assert_eq!(cfg.default_shots, 8192);
    }

    #[test]
    fn test_overlay() {
        let cfg = EngineConfig::default()
            .overlay(env(&[(ENV_EXACT_SIMULATION_CEILING, "12"), (ENV_SAMPLING_SEED, " 7 ")]))
            .unwrap();
        assert_eq!(cfg.exact_simulation_ceiling, 12);
        assert_eq!(cfg.sampling_seed, 7);
        assert_eq!(cfg.max_qubits, 24);
    }

    #[test]
    fn test_overlay_rejects_garbage() {
        let err = EngineConfig::default().overlay(env(&[(ENV_DEFAULT_SHOTS, "many")])).unwrap_err();
        assert!(matches!(err, Error::ConfigError(msg) if msg.contains(ENV_DEFAULT_SHOTS)));
    }

    #[test]
    fn test_validate_ceiling_order() {
        let cfg = EngineConfig::default().with_max_qubits(10).with_exact_simulation_ceiling(16);
        assert!(matches!(cfg.validate(), Err(Error::ConfigError(_))));
        assert!(EngineConfig::default().with_default_shots(0).validate().is_err());
    }

    #[test]
    fn test_validate_ceiling_limit() {
        let at_limit = EngineConfig::default().with_max_qubits(64).with_exact_simulation_ceiling(30);
        assert!(at_limit.validate().is_ok());
        for ceiling in [31, 64] {
            let cfg = EngineConfig::default().with_max_qubits(64).with_exact_simulation_ceiling(ceiling);
            assert!(matches!(cfg.validate(), Err(Error::ConfigError(msg)) if msg.contains("limit")));
        }
        let err = EngineConfig::default()
            .overlay(env(&[(ENV_MAX_QUBITS, "70"), (ENV_EXACT_SIMULATION_CEILING, "64")]))
            .unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
    }

    #[test]
    fn test_serde_fills_missing_fields() {
        let cfg: EngineConfig = serde_json::from_str(r#"{"default_shots": 100}"#).unwrap();
        assert_eq!(cfg.default_shots, 100);
        assert_eq!(cfg.divination_qubits, 8);
    }
}
