use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

use crate::agents::AgentKind;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub agents: AgentsConfig,
}

/// Deployment-wide settings
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_environment")]
    pub environment: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            environment: default_environment(),
            log_level: default_log_level(),
        }
    }
}

/// Gemini API settings
#[derive(Debug, Clone, Deserialize)]
pub struct GeminiConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Environment variables checked for the API key, first set one wins
    #[serde(default = "default_api_key_envs")]
    pub api_key_envs: Vec<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            api_key_envs: default_api_key_envs(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Per-agent model selection
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AgentsConfig {
    #[serde(default)]
    pub ingestion: AgentConfig,
    #[serde(default)]
    pub database: AgentConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_model")]
    pub model: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
        }
    }
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_api_base() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_api_key_envs() -> Vec<String> {
    vec!["GOOGLE_API_KEY".to_string(), "GEMINI_API_KEY".to_string()]
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

impl Config {
    /// Load configuration
    ///
    /// Loads environment variables from .env file (if present) first.
    /// The config file is `PDF2KG_CONFIG` if set, otherwise `./config.toml`;
    /// a missing default file means built-in defaults, a missing explicit one is an error.
    /// `ENVIRONMENT`, `INGESTION_AGENT_MODEL` and `DATABASE_AGENT_MODEL` override the file.
    pub fn load() -> Result<Self> {
        let _ = dotenv::dotenv();

        let explicit = std::env::var("PDF2KG_CONFIG").ok().map(PathBuf::from);
        let config_path = explicit.clone().unwrap_or_else(|| PathBuf::from("config.toml"));

        let mut config = if explicit.is_some() || config_path.exists() {
            let config_str = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
            toml::from_str(&config_str)
                .with_context(|| format!("Failed to parse {}", config_path.display()))?
        } else {
            Config::default()
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(environment) = std::env::var("ENVIRONMENT") {
            self.pipeline.environment = environment;
        }
        for kind in [AgentKind::Ingestion, AgentKind::Database] {
            if let Ok(model) = std::env::var(kind.model_env()) {
                self.agent_mut(kind).model = model;
            }
        }
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        for kind in [AgentKind::Ingestion, AgentKind::Database] {
            if self.agent(kind).model.trim().is_empty() {
                anyhow::bail!("agents.{}.model must not be empty", kind.config_key());
            }
        }

        if self.gemini.timeout_secs == 0 {
            anyhow::bail!("gemini.timeout_secs must be greater than 0");
        }

        if self.gemini.api_key_envs.is_empty() {
            anyhow::bail!("gemini.api_key_envs must name at least one environment variable");
        }

        Ok(())
    }

    pub fn agent(&self, kind: AgentKind) -> &AgentConfig {
        match kind {
            AgentKind::Ingestion => &self.agents.ingestion,
            AgentKind::Database => &self.agents.database,
        }
    }

    fn agent_mut(&mut self, kind: AgentKind) -> &mut AgentConfig {
        match kind {
            AgentKind::Ingestion => &mut self.agents.ingestion,
            AgentKind::Database => &mut self.agents.database,
        }
    }

    /// First API key found among `gemini.api_key_envs`, with the variable it came from
    pub fn api_key(&self) -> Option<(&str, String)> {
        self.gemini.api_key_envs.iter().find_map(|name| {
            std::env::var(name)
                .ok()
                .filter(|key| !key.trim().is_empty())
                .map(|key| (name.as_str(), key))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Serialize config tests that mutate process-wide cwd and env so they don't race.
    static CONFIG_TEST_LOCK: Mutex<()> = Mutex::new(());

    const VARS: [&str; 6] = [
        "PDF2KG_CONFIG",
        "ENVIRONMENT",
        "INGESTION_AGENT_MODEL",
        "DATABASE_AGENT_MODEL",
        "GOOGLE_API_KEY",
        "GEMINI_API_KEY",
    ];

    /// Restores cwd when dropped (e.g. on panic).
    struct CwdGuard(std::path::PathBuf);
    impl Drop for CwdGuard {
        fn drop(&mut self) {
            let _ = std::env::set_current_dir(&self.0);
        }
    }

    /// Run `f` in an empty temp dir with only `vars` set among the variables config reads.
    fn with_env(vars: &[(&str, &str)], f: impl FnOnce(&TempDir)) {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let saved: Vec<_> = VARS.iter().map(|k| (*k, std::env::var(k).ok())).collect();
        for k in VARS {
            std::env::remove_var(k);
        }
        for (k, v) in vars {
            std::env::set_var(k, v);
        }

        let temp_dir = TempDir::new().unwrap();
        let _cwd = CwdGuard(std::env::current_dir().unwrap());
        std::env::set_current_dir(temp_dir.path()).unwrap();
        f(&temp_dir);

        for (k, v) in saved {
            match v {
                Some(v) => std::env::set_var(k, v),
                None => std::env::remove_var(k),
            }
        }
    }

    #[test]
    fn test_defaults_without_config_file() {
        with_env(&[], |_| {
            let config = Config::load().unwrap();
            assert_eq!(config.pipeline.environment, "development");
            assert_eq!(config.pipeline.log_level, "info");
            assert_eq!(config.agent(AgentKind::Ingestion).model, "gemini-2.0-flash");
            assert_eq!(config.agent(AgentKind::Database).model, "gemini-2.0-flash");
            assert_eq!(config.gemini.timeout_secs, 30);
            assert!(config.api_key().is_none());
        });
    }

    #[test]
    fn test_config_file_and_env_overrides() {
        with_env(&[("DATABASE_AGENT_MODEL", "gemini-2.5-pro"), ("ENVIRONMENT", "staging")], |dir| {
            fs::write(
                dir.path().join("config.toml"),
                r#"
[pipeline]
environment = "production"
log_level = "debug"

[gemini]
timeout_secs = 5

[agents.ingestion]
model = "gemini-1.5-flash"

[agents.database]
model = "gemini-1.5-pro"
"#,
            )
            .unwrap();

            let config = Config::load().unwrap();
            assert_eq!(config.pipeline.environment, "staging");
            assert_eq!(config.pipeline.log_level, "debug");
            assert_eq!(config.gemini.timeout_secs, 5);
            assert_eq!(config.agent(AgentKind::Ingestion).model, "gemini-1.5-flash");
            assert_eq!(config.agent(AgentKind::Database).model, "gemini-2.5-pro");
        });
    }

    #[test]
    fn test_explicit_missing_config_is_an_error() {
        with_env(&[("PDF2KG_CONFIG", "nonexistent.toml")], |_| {
            let err = Config::load().unwrap_err();
            assert!(err.to_string().contains("nonexistent.toml"));
        });
    }

    #[test]
    fn test_invalid_values_rejected() {
        with_env(&[], |dir| {
            fs::write(dir.path().join("config.toml"), "[gemini]\ntimeout_secs = 0\n").unwrap();
            let err = Config::load().unwrap_err();
            assert!(err.to_string().contains("timeout_secs"));
        });

        with_env(&[("INGESTION_AGENT_MODEL", "  ")], |_| {
            let err = Config::load().unwrap_err();
            assert!(err.to_string().contains("agents.ingestion.model"));
        });
    }

    #[test]
    fn test_api_key_fallback_order() {
        with_env(&[("GEMINI_API_KEY", "gemini-key")], |_| {
            let config = Config::load().unwrap();
            assert_eq!(config.api_key(), Some(("GEMINI_API_KEY", "gemini-key".to_string())));
        });

        with_env(&[("GOOGLE_API_KEY", "google-key"), ("GEMINI_API_KEY", "gemini-key")], |_| {
            let config = Config::load().unwrap();
            assert_eq!(config.api_key(), Some(("GOOGLE_API_KEY", "google-key".to_string())));
        });
    }

    #[test]
    fn test_api_key_from_env_file() {
        with_env(&[], |dir| {
            fs::write(dir.path().join(".env"), "GOOGLE_API_KEY=key-from-env-file\n").unwrap();
            let config = Config::load().unwrap();
            assert_eq!(config.api_key().map(|(_, key)| key), Some("key-from-env-file".to_string()));
        });
    }
}
