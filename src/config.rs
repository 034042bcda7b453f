//! Configuration for the context service.

use crate::core::items::ContextType;
use crate::core::scoring::ScoringPolicy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration for the context service.
///
/// Missing fields in the config file take their default values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Ranking policy for the top-context feed
    pub ranking: RankingConfig,

    /// Signal source behaviour for environment snapshots
    pub signals: SignalConfig,

    /// Timezone override (IANA name); resolved from the host when unset
    pub timezone: Option<String>,

    /// Path for storing state
    pub data_path: PathBuf,

    /// JSON dataset backing the record store
    pub dataset_path: PathBuf,

    /// Port for the HTTP surface
    pub server_port: u16,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("hearth-context");

        Self {
            ranking: RankingConfig::default(),
            signals: SignalConfig::default(),
            timezone: None,
            dataset_path: data_dir.join("records.json"),
            data_path: data_dir,
            server_port: 7420,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from an explicit path, falling back to defaults
    /// when the file does not exist.
    pub fn load_from(config_path: &std::path::Path) -> Result<Self, ConfigError> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)
                .map_err(|e| ConfigError::IoError(e.to_string()))?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let config_path = Self::config_path();
        self.save_to(&config_path)?;
        Ok(config_path)
    }

    /// Save configuration to an explicit path, creating parent directories.
    pub fn save_to(&self, config_path: &std::path::Path) -> Result<(), ConfigError> {
        self.validate()?;
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;
        std::fs::write(config_path, content).map_err(|e| ConfigError::IoError(e.to_string()))
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("hearth-context")
            .join("config.json")
    }

    /// Ensure all required directories exist.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.data_path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        if let Some(parent) = self.dataset_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }
        Ok(())
    }

    /// Reject values the ranker cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ScoringPolicy::try_from(&self.ranking)?;
        if let Some(ref tz) = self.timezone {
            tz.parse::<chrono_tz::Tz>()
                .map_err(|_| ConfigError::Invalid(format!("unknown timezone '{tz}'")))?;
        }
        Ok(())
    }
}

/// How many candidates to pull from each store before the global re-rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidatePool {
    /// Fetch `limit` records per type. Cheap, but only approximates the
    /// global top-K when one type holds many relevant older records.
    PerTypeLimit,
    /// Fetch `limit * requested types` records per type.
    Expanded,
}

/// Ranking policy for the top-context feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    /// Recency half-life in minutes
    pub half_life_minutes: f64,
    /// Score added per matched keyword
    pub keyword_boost: f64,
    /// Upper bound on the summed keyword boost
    pub keyword_boost_cap: f64,
    /// Keywords that mark an item as critical
    pub keywords: Vec<String>,
    /// Result size when the caller gives none
    pub default_limit: usize,
    /// Per-type candidate fetch strategy
    pub candidate_pool: CandidatePool,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            half_life_minutes: 60.0,
            keyword_boost: 0.2,
            keyword_boost_cap: 0.8,
            keywords: crate::core::scoring::CRITICAL_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
            default_limit: 20,
            candidate_pool: CandidatePool::PerTypeLimit,
        }
    }
}

/// Behaviour of the environment signal sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    /// Upper bound on each individual signal fetch
    #[serde(with = "duration_serde")]
    pub source_timeout: Duration,

    /// Network state reported when the real state cannot be read
    pub assume_online_when_unknown: bool,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            source_timeout: Duration::from_secs(2),
            assume_online_when_unknown: false,
        }
    }
}

/// Selection of context types to rank.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceSelection {
    pub types: Vec<ContextType>,
}

impl SourceSelection {
    /// Parse a type selection from a comma-separated string.
    ///
    /// `all` (or an empty string) selects every producer-backed type.
    pub fn from_csv(s: &str) -> Result<Self, crate::ambient::ContextError> {
        let mut types = Vec::new();
        for part in s.split(',').map(|p| p.trim().to_lowercase()) {
            if part.is_empty() {
                continue;
            }
            if part == "all" {
                return Ok(Self::default());
            }
            let ty: ContextType = part.parse()?;
            if !types.contains(&ty) {
                types.push(ty);
            }
        }
        Ok(Self { types })
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
            ConfigError::Invalid(e) => write!(f, "Invalid configuration: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Serde support for Duration.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
