use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thor_core::tools::ToolConfig;
use thor_core::{CoordinatorConfig, LedgerConfig};

/// Default daily spend limit in dollars
pub const DEFAULT_DAILY_LIMIT: f64 = 0.17;

/// Configuration as stored in TOML files (with optional fields for merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawThorConfig {
    #[serde(default)]
    pub budget: RawBudgetConfig,

    #[serde(default)]
    pub swarm: RawSwarmConfig,

    #[serde(default)]
    pub memory: RawMemoryConfig,

    #[serde(default)]
    pub tools: RawToolsConfig,

    #[serde(default)]
    pub model: RawModelConfig,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawBudgetConfig {
    pub daily_limit: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawSwarmConfig {
    pub max_parallel: Option<usize>,
    pub step_timeout_secs: Option<u64>,
    pub simulate_delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawMemoryConfig {
    pub conversation_limit: Option<usize>,
    pub database: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawToolsConfig {
    pub timeout_secs: Option<u64>,
    pub root: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawModelConfig {
    pub provider: Option<String>,
    pub classification: Option<String>,
}

/// Final configuration with defaults applied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThorConfig {
    pub budget: BudgetConfig,
    pub swarm: SwarmConfig,
    pub memory: MemoryConfig,
    pub tools: ToolsConfig,
    pub model: ModelConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetConfig {
    /// Once today's spend reaches this, every call uses the cheapest model
    pub daily_limit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwarmConfig {
    pub max_parallel: usize,
    pub step_timeout_secs: u64,
    /// Per-step delay in `--simulate` mode
    pub simulate_delay_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Messages kept in memory per conversation
    pub conversation_limit: usize,
    /// SQLite database for the ledger
    pub database: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolsConfig {
    pub timeout_secs: u64,
    /// Directory tools may read and write under
    pub root: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub provider: String,
    /// Task classification used to pick models, e.g. `architecture`
    pub classification: String,
}

impl ThorConfig {
    pub fn coordinator_config(&self) -> CoordinatorConfig {
        CoordinatorConfig {
            max_parallel: self.swarm.max_parallel,
            step_timeout: Duration::from_secs(self.swarm.step_timeout_secs),
            ..CoordinatorConfig::default()
        }
    }

    pub fn ledger_config(&self) -> LedgerConfig {
        LedgerConfig {
            conversation_limit: self.memory.conversation_limit,
            ..LedgerConfig::default()
        }
    }

    pub fn tool_config(&self) -> ToolConfig {
        ToolConfig {
            root: self.tools.root.clone(),
            timeout: Duration::from_secs(self.tools.timeout_secs),
        }
    }

    pub fn simulate_delay(&self) -> Duration {
        Duration::from_millis(self.swarm.simulate_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_config_partial_parsing() {
        let toml_str = r#"
[budget]
daily_limit = 1.5

[swarm]
max_parallel = 3
"#;
        let raw: RawThorConfig = toml::from_str(toml_str).unwrap();

        assert_eq!(raw.budget.daily_limit, Some(1.5));
        assert_eq!(raw.swarm.max_parallel, Some(3));
        assert!(raw.swarm.step_timeout_secs.is_none());
        assert!(raw.memory.database.is_none());
        assert!(raw.model.provider.is_none());
    }

    #[test]
    fn test_raw_config_empty_uses_none() {
        let raw: RawThorConfig = toml::from_str("").unwrap();

        assert!(raw.budget.daily_limit.is_none());
        assert!(raw.tools.root.is_none());
        assert!(raw.memory.conversation_limit.is_none());
    }

    #[test]
    fn test_unknown_field_type_is_rejected() {
        let result = toml::from_str::<RawThorConfig>("[swarm]\nmax_parallel = \"many\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_core_configs_carry_values() {
        let config = ThorConfig {
            budget: BudgetConfig { daily_limit: 2.0 },
            swarm: SwarmConfig {
                max_parallel: 8,
                step_timeout_secs: 60,
                simulate_delay_ms: 10,
            },
            memory: MemoryConfig {
                conversation_limit: 20,
                database: PathBuf::from("/tmp/thor.db"),
            },
            tools: ToolsConfig {
                timeout_secs: 5,
                root: PathBuf::from("/work"),
            },
            model: ModelConfig {
                provider: "anthropic".into(),
                classification: "general".into(),
            },
        };

        assert_eq!(config.coordinator_config().max_parallel, 8);
        assert_eq!(
            config.coordinator_config().step_timeout,
            Duration::from_secs(60)
        );
        assert_eq!(config.ledger_config().conversation_limit, 20);
        assert_eq!(config.tool_config().timeout, Duration::from_secs(5));
        assert_eq!(config.simulate_delay(), Duration::from_millis(10));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = ThorConfig {
            budget: BudgetConfig { daily_limit: 0.5 },
            swarm: SwarmConfig {
                max_parallel: 2,
                step_timeout_secs: 30,
                simulate_delay_ms: 0,
            },
            memory: MemoryConfig {
                conversation_limit: 10,
                database: PathBuf::from("thor.db"),
            },
            tools: ToolsConfig {
                timeout_secs: 30,
                root: PathBuf::from("."),
            },
            model: ModelConfig {
                provider: "anthropic".into(),
                classification: "architecture".into(),
            },
        };

        let toml_str = toml::to_string(&config).unwrap();
        let parsed: ThorConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }
}
