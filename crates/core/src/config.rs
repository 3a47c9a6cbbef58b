use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub simulation: SimulationConfig,
    pub session: SessionConfig,
}

/// Tunables of the fake trade simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Probability a resolving position settles as a win.
    ///
    /// The demo's deliberate house edge: losses are a rare 1% by default.
    pub win_probability: f64,
    /// Tick period in milliseconds. Smoothness only, never correctness.
    pub tick_interval_ms: u64,
    /// How long the transient trade-result banner stays up.
    pub result_banner_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub account_id: String,
    pub starting_balance: Decimal,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            win_probability: 0.99,
            tick_interval_ms: 100,
            result_banner_ms: 5000,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            account_id: "demo".to_string(),
            starting_balance: Decimal::from(10_000),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_keep_the_house_edge() {
        let config = AppConfig::default();
        assert!((config.simulation.win_probability - 0.99).abs() < f64::EPSILON);
        assert_eq!(config.simulation.tick_interval_ms, 100);
        assert_eq!(config.simulation.result_banner_ms, 5000);
    }

    #[test]
    fn partial_toml_fills_from_defaults() {
        let config: AppConfig = serde_json::from_str(r#"{"simulation":{"win_probability":0.5}}"#)
            .expect("partial config should deserialize");
        assert!((config.simulation.win_probability - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.simulation.tick_interval_ms, 100);
        assert_eq!(config.session.account_id, "demo");
    }
}
