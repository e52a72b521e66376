use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;

use super::types::{
    BudgetConfig, DEFAULT_DAILY_LIMIT, MemoryConfig, ModelConfig, RawBudgetConfig,
    RawMemoryConfig, RawModelConfig, RawSwarmConfig, RawThorConfig, RawToolsConfig, SwarmConfig,
    ThorConfig, ToolsConfig,
};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load merged configuration (user + project)
    pub fn load() -> Result<ThorConfig> {
        Self::load_layers(Self::user_config_path().as_deref(), &Self::project_config_path())
    }

    /// Merge the user file and then the project file, skipping missing ones
    pub fn load_layers(user: Option<&Path>, project: &Path) -> Result<ThorConfig> {
        let mut raw = RawThorConfig::default();

        // Layer 1: User config
        if let Some(user_path) = user
            && user_path.exists()
        {
            raw = Self::merge_raw(raw, Self::read(user_path)?);
        }

        // Layer 2: Project config
        if project.exists() {
            raw = Self::merge_raw(raw, Self::read(project)?);
        }

        Ok(Self::finalize(raw))
    }

    fn read(path: &Path) -> Result<RawThorConfig> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("parsing {}", path.display()))
    }

    /// Get user config path (platform-specific)
    pub fn user_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "thor").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Get project config path
    /// Can be overridden with THOR_PROJECT_CONFIG_DIR env var (useful for isolated tests)
    pub fn project_config_path() -> PathBuf {
        if let Ok(dir) = std::env::var("THOR_PROJECT_CONFIG_DIR") {
            PathBuf::from(dir).join("config.toml")
        } else {
            PathBuf::from(".thor/config.toml")
        }
    }

    /// Ledger database used when the config names none
    pub fn default_database_path() -> PathBuf {
        ProjectDirs::from("", "", "thor")
            .map(|dirs| dirs.data_dir().join("thor.db"))
            .unwrap_or_else(|| PathBuf::from(".thor/thor.db"))
    }

    /// Merge two raw configs (overlay values override base only if explicitly set)
    fn merge_raw(base: RawThorConfig, overlay: RawThorConfig) -> RawThorConfig {
        RawThorConfig {
            budget: RawBudgetConfig {
                daily_limit: overlay.budget.daily_limit.or(base.budget.daily_limit),
            },
            swarm: RawSwarmConfig {
                max_parallel: overlay.swarm.max_parallel.or(base.swarm.max_parallel),
                step_timeout_secs: overlay
                    .swarm
                    .step_timeout_secs
                    .or(base.swarm.step_timeout_secs),
                simulate_delay_ms: overlay
                    .swarm
                    .simulate_delay_ms
                    .or(base.swarm.simulate_delay_ms),
            },
            memory: RawMemoryConfig {
                conversation_limit: overlay
                    .memory
                    .conversation_limit
                    .or(base.memory.conversation_limit),
                database: overlay.memory.database.or(base.memory.database),
            },
            tools: RawToolsConfig {
                timeout_secs: overlay.tools.timeout_secs.or(base.tools.timeout_secs),
                root: overlay.tools.root.or(base.tools.root),
            },
            model: RawModelConfig {
                provider: overlay.model.provider.or(base.model.provider),
                classification: overlay.model.classification.or(base.model.classification),
            },
        }
    }

    /// Convert raw config to final config with defaults applied
    fn finalize(raw: RawThorConfig) -> ThorConfig {
        ThorConfig {
            budget: BudgetConfig {
                daily_limit: raw.budget.daily_limit.unwrap_or(DEFAULT_DAILY_LIMIT),
            },
            swarm: SwarmConfig {
                max_parallel: raw.swarm.max_parallel.unwrap_or(5),
                step_timeout_secs: raw.swarm.step_timeout_secs.unwrap_or(300),
                simulate_delay_ms: raw.swarm.simulate_delay_ms.unwrap_or(100),
            },
            memory: MemoryConfig {
                conversation_limit: raw.memory.conversation_limit.unwrap_or(50),
                database: raw
                    .memory
                    .database
                    .unwrap_or_else(Self::default_database_path),
            },
            tools: ToolsConfig {
                timeout_secs: raw.tools.timeout_secs.unwrap_or(30),
                root: raw.tools.root.unwrap_or_else(|| PathBuf::from(".")),
            },
            model: ModelConfig {
                provider: raw.model.provider.unwrap_or_else(|| "anthropic".to_string()),
                classification: raw
                    .model
                    .classification
                    .unwrap_or_else(|| "general".to_string()),
            },
        }
    }
}
