//! Committee Portal core
//!
//! The entity-relationship graph and context resolution engine behind a
//! tenant-committee administration portal:
//! - typed, logically undirected relationship edges between record kinds
//! - one-hop transitive link expansion
//! - on-demand context resolution with fixed value precedence
//! - non-destructive autofill for record edit forms
//! - AI-assisted draft-entity analysis
//!
//! Route handlers, auth, and persistent storage live outside this crate;
//! they plug in through `RecordStore` and `TextGenerator`.

pub mod ai;
pub mod analyzer;
pub mod autofill;
pub mod context;
pub mod error;
pub mod records;
pub mod relations;

#[cfg(test)]
pub(crate) mod test_helpers;

use anyhow::Result;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

// ============================================================================
// YAML config structs (deserialization targets)
// ============================================================================

/// Top-level YAML configuration file structure
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub ai: AiYamlConfig,
    pub resolver: ResolverYamlConfig,
    pub analyzer: AnalyzerYamlConfig,
}

/// Generative-text capability section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AiYamlConfig {
    /// Chat completions endpoint. Empty or "disabled" turns AI features
    /// off; everything deterministic keeps working.
    pub url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for AiYamlConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:11434/v1/chat/completions".into(),
            api_key: None,
            model: "llama3.1:8b".into(),
            timeout_secs: 30,
        }
    }
}

/// Context resolver section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResolverYamlConfig {
    pub divergence_epsilon: f64,
}

impl Default for ResolverYamlConfig {
    fn default() -> Self {
        Self {
            divergence_epsilon: 0.01,
        }
    }
}

/// Draft analyzer section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalyzerYamlConfig {
    pub confidence_threshold: f64,
    pub durable_min_price: f64,
}

impl Default for AnalyzerYamlConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.7,
            durable_min_price: 50.0,
        }
    }
}

// ============================================================================
// Runtime config (what the application actually uses)
// ============================================================================

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub ai_url: String,
    pub ai_api_key: Option<String>,
    pub ai_model: String,
    pub ai_timeout_secs: u64,
    pub divergence_epsilon: f64,
    pub confidence_threshold: f64,
    pub durable_min_price: f64,
}

impl Default for Config {
    fn default() -> Self {
        let yaml = YamlConfig::default();
        Self {
            ai_url: yaml.ai.url,
            ai_api_key: yaml.ai.api_key,
            ai_model: yaml.ai.model,
            ai_timeout_secs: yaml.ai.timeout_secs,
            divergence_epsilon: yaml.resolver.divergence_epsilon,
            confidence_threshold: yaml.analyzer.confidence_threshold,
            durable_min_price: yaml.analyzer.durable_min_price,
        }
    }
}

impl Config {
    /// Load configuration from environment variables only.
    /// Equivalent to `from_yaml_and_env(None)`.
    pub fn from_env() -> Result<Self> {
        Self::from_yaml_and_env(None)
    }

    /// Load configuration from an optional YAML file, then override with
    /// env vars. Priority: env var > YAML > default.
    ///
    /// If `yaml_path` is None, tries "config.yaml" in CWD; a missing
    /// file just means defaults.
    pub fn from_yaml_and_env(yaml_path: Option<&Path>) -> Result<Self> {
        let yaml = Self::load_yaml(yaml_path);

        Ok(Self {
            ai_url: std::env::var("PORTAL_AI_URL").unwrap_or(yaml.ai.url),
            ai_api_key: std::env::var("PORTAL_AI_API_KEY")
                .ok()
                .filter(|k| !k.is_empty())
                .or(yaml.ai.api_key),
            ai_model: std::env::var("PORTAL_AI_MODEL").unwrap_or(yaml.ai.model),
            ai_timeout_secs: std::env::var("PORTAL_AI_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(yaml.ai.timeout_secs),
            divergence_epsilon: std::env::var("PORTAL_DIVERGENCE_EPSILON")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(yaml.resolver.divergence_epsilon),
            confidence_threshold: std::env::var("PORTAL_CONFIDENCE_THRESHOLD")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(yaml.analyzer.confidence_threshold),
            durable_min_price: std::env::var("PORTAL_DURABLE_MIN_PRICE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(yaml.analyzer.durable_min_price),
        })
    }

    /// Try to load and parse a YAML config file. Returns defaults on any
    /// failure.
    fn load_yaml(yaml_path: Option<&Path>) -> YamlConfig {
        let default_path = Path::new("config.yaml");
        let path = yaml_path.unwrap_or(default_path);

        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_yaml::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                    YamlConfig::default()
                }
            },
            Err(_) => {
                tracing::debug!(
                    "No config file at {}, using env vars / defaults",
                    path.display()
                );
                YamlConfig::default()
            }
        }
    }

    /// Whether the generative capability is configured at all.
    pub fn ai_enabled(&self) -> bool {
        !self.ai_url.is_empty() && !self.ai_url.eq_ignore_ascii_case("disabled")
    }
}

// ============================================================================
// Shared application state
// ============================================================================

/// Shared application state: the storage seam, the optional generator,
/// and factories for the engine components wired to both.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn records::RecordStore>,
    pub generator: Option<Arc<dyn ai::TextGenerator>>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Create application state over an externally provided store.
    pub fn new(store: Arc<dyn records::RecordStore>, config: Config) -> Self {
        let generator: Option<Arc<dyn ai::TextGenerator>> = if config.ai_enabled() {
            Some(Arc::new(ai::HttpTextGenerator::new(
                config.ai_url.clone(),
                config.ai_api_key.clone(),
                config.ai_timeout_secs,
            )))
        } else {
            None
        };
        Self {
            store,
            generator,
            config: Arc::new(config),
        }
    }

    /// State over the in-memory store, with AI disabled. Used by tests
    /// and local experiments.
    pub fn in_memory() -> Self {
        let config = Config {
            ai_url: "disabled".into(),
            ..Config::default()
        };
        Self::new(Arc::new(records::MemoryStore::new()), config)
    }

    /// Swap in a different generator (e.g. a mock).
    pub fn with_generator(mut self, generator: Arc<dyn ai::TextGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn relations(&self) -> relations::RelationManager {
        relations::RelationManager::new(self.store.clone())
    }

    pub fn expansion(&self) -> relations::ExpansionEngine {
        relations::ExpansionEngine::new(self.store.clone())
    }

    pub fn resolver(&self) -> context::ContextResolver {
        context::ContextResolver::with_config(
            self.store.clone(),
            context::ResolverConfig {
                divergence_epsilon: self.config.divergence_epsilon,
            },
        )
    }

    pub fn autofill(&self) -> autofill::AutofillOrchestrator {
        autofill::AutofillOrchestrator::new(
            self.store.clone(),
            self.generator.clone(),
            autofill::AutofillConfig {
                model: self.config.ai_model.clone(),
                ai_timeout_secs: self.config.ai_timeout_secs,
            },
        )
        .with_resolver_config(context::ResolverConfig {
            divergence_epsilon: self.config.divergence_epsilon,
        })
    }

    pub fn analyzer(&self) -> analyzer::DraftAnalyzer {
        analyzer::DraftAnalyzer::new(
            self.store.clone(),
            self.generator.clone(),
            analyzer::AnalyzerConfig {
                confidence_threshold: self.config.confidence_threshold,
                durable_min_price: self.config.durable_min_price,
                model: self.config.ai_model.clone(),
                ai_timeout_secs: self.config.ai_timeout_secs,
            },
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod config_tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_yaml_config_loading() {
        let yaml = r#"
ai:
  url: http://ai.internal:8000/v1/chat/completions
  api_key: test-key
  model: mistral-small
  timeout_secs: 10

resolver:
  divergence_epsilon: 0.05

analyzer:
  confidence_threshold: 0.8
  durable_min_price: 25.0
"#;
        let config: YamlConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.ai.url, "http://ai.internal:8000/v1/chat/completions");
        assert_eq!(config.ai.api_key, Some("test-key".into()));
        assert_eq!(config.ai.model, "mistral-small");
        assert_eq!(config.ai.timeout_secs, 10);
        assert!((config.resolver.divergence_epsilon - 0.05).abs() < f64::EPSILON);
        assert!((config.analyzer.confidence_threshold - 0.8).abs() < f64::EPSILON);
        assert!((config.analyzer.durable_min_price - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_yaml_defaults() {
        let config = YamlConfig::default();
        assert_eq!(config.ai.url, "http://localhost:11434/v1/chat/completions");
        assert!(config.ai.api_key.is_none());
        assert_eq!(config.ai.timeout_secs, 30);
        assert!((config.resolver.divergence_epsilon - 0.01).abs() < f64::EPSILON);
        assert!((config.analyzer.confidence_threshold - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn test_partial_yaml_falls_back_per_section() {
        let yaml = r#"
analyzer:
  confidence_threshold: 0.9
"#;
        let config: YamlConfig = serde_yaml::from_str(yaml).unwrap();
        assert!((config.analyzer.confidence_threshold - 0.9).abs() < f64::EPSILON);
        // Untouched sections keep their defaults
        assert!((config.analyzer.durable_min_price - 50.0).abs() < f64::EPSILON);
        assert_eq!(config.ai.model, "llama3.1:8b");
    }

    /// Combined test for YAML file loading and env var overrides.
    /// Runs as a single test to avoid parallel env var race conditions.
    #[test]
    fn test_yaml_and_env_lifecycle() {
        let _env = crate::test_helpers::ENV_LOCK.lock().unwrap();

        fn clear_env() {
            for var in &[
                "PORTAL_AI_URL",
                "PORTAL_AI_API_KEY",
                "PORTAL_AI_MODEL",
                "PORTAL_AI_TIMEOUT_SECS",
                "PORTAL_DIVERGENCE_EPSILON",
                "PORTAL_CONFIDENCE_THRESHOLD",
                "PORTAL_DURABLE_MIN_PRICE",
            ] {
                std::env::remove_var(var);
            }
        }

        // --- Phase 1: YAML values loaded correctly ---
        let yaml = r#"
ai:
  url: http://yaml-host/v1/chat/completions
  model: yaml-model
analyzer:
  confidence_threshold: 0.75
"#;
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("config.yaml");
        let mut file = std::fs::File::create(&file_path).unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        clear_env();

        let config = Config::from_yaml_and_env(Some(&file_path)).unwrap();
        assert_eq!(config.ai_url, "http://yaml-host/v1/chat/completions");
        assert_eq!(config.ai_model, "yaml-model");
        assert!((config.confidence_threshold - 0.75).abs() < f64::EPSILON);
        assert!(config.ai_enabled());

        // --- Phase 2: Env vars override YAML ---
        std::env::set_var("PORTAL_AI_MODEL", "env-model");
        std::env::set_var("PORTAL_CONFIDENCE_THRESHOLD", "0.85");

        let config = Config::from_yaml_and_env(Some(&file_path)).unwrap();
        assert_eq!(config.ai_model, "env-model");
        assert!((config.confidence_threshold - 0.85).abs() < f64::EPSILON);
        // YAML value still used where no env override
        assert_eq!(config.ai_url, "http://yaml-host/v1/chat/completions");

        clear_env();

        // --- Phase 3: No YAML file → defaults ---
        let nonexistent = Path::new("/tmp/nonexistent-portal-config.yaml");
        let config = Config::from_yaml_and_env(Some(nonexistent)).unwrap();
        assert_eq!(config.ai_url, "http://localhost:11434/v1/chat/completions");
        assert!((config.divergence_epsilon - 0.01).abs() < f64::EPSILON);

        // --- Phase 4: Disabling AI ---
        std::env::set_var("PORTAL_AI_URL", "disabled");
        let config = Config::from_yaml_and_env(Some(nonexistent)).unwrap();
        assert!(!config.ai_enabled());
        clear_env();
    }

    #[tokio::test]
    async fn test_in_memory_state_wires_components() {
        let state = AppState::in_memory();
        assert!(state.generator.is_none());

        // Every factory produces a working component against the store.
        let _ = state.relations();
        let _ = state.expansion();
        let _ = state.resolver();
        let _ = state.autofill();
        let _ = state.analyzer();
    }
}
