use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, TabletalkError};

/// Top-level configuration for tabletalk.
///
/// Loaded from `~/.tabletalk/config.toml` by default. Every section has
/// defaults, so a partial (or empty) file is valid.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TabletalkConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub schema: SchemaConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub safety: SafetyConfig,
}

impl TabletalkConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: TabletalkConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| TabletalkError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Data store location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file. `~/` is expanded.
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "~/.tabletalk/company.db".to_string(),
        }
    }
}

/// Schema grounding settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    /// Optional schema feed YAML. When unset the live database is introspected.
    pub feed_path: Option<String>,
    /// Schema name recorded in generated feeds.
    pub default_schema: String,
    /// SQL dialect named in the prompt.
    pub dialect: String,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            feed_path: None,
            default_schema: "company_db".to_string(),
            dialect: "sqlite".to_string(),
        }
    }
}

/// Chat-completion service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible API (without `/chat/completions`).
    pub base_url: String,
    /// Model identifier sent with every request.
    pub model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 60,
        }
    }
}

/// Conversation retention settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Turns (utterance, query, result) kept for follow-up resolution.
    pub memory_turns: usize,
    /// Utterance/response exchanges replayed to the model.
    pub history_exchanges: usize,
    /// (utterance, query) pairs listed in the query log message.
    pub query_history: usize,
    /// Maximum utterance length in characters.
    pub max_message_length: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            memory_turns: 10,
            history_exchanges: 10,
            query_history: 5,
            max_message_length: 2000,
        }
    }
}

/// Query safety gate settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyConfig {
    /// Keywords denied in addition to DROP, DELETE, ALTER and TRUNCATE.
    pub extra_denied_keywords: Vec<String>,
}

/// Expand a leading `~/` to the user's home directory.
pub fn resolve_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        #[cfg(target_os = "windows")]
        let home = std::env::var("USERPROFILE").unwrap_or_else(|_| ".".to_string());
        #[cfg(not(target_os = "windows"))]
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(rest)
    } else {
        PathBuf::from(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = TabletalkConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.database.path, "~/.tabletalk/company.db");
        assert!(config.schema.feed_path.is_none());
        assert_eq!(config.schema.default_schema, "company_db");
        assert_eq!(config.schema.dialect, "sqlite");
        assert_eq!(config.llm.base_url, "https://api.openai.com/v1");
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.api_key_env, "OPENAI_API_KEY");
        assert_eq!(config.llm.timeout_secs, 60);
        assert_eq!(config.chat.memory_turns, 10);
        assert_eq!(config.chat.history_exchanges, 10);
        assert_eq!(config.chat.query_history, 5);
        assert_eq!(config.chat.max_message_length, 2000);
        assert!(config.safety.extra_denied_keywords.is_empty());
    }

    #[test]
    fn test_load_valid_config() {
        let content = r#"
[general]
log_level = "debug"

[database]
path = "/var/lib/tabletalk/hr.db"

[schema]
feed_path = "/etc/tabletalk/feed.yaml"
default_schema = "hr"

[llm]
base_url = "http://localhost:11434/v1"
model = "llama3"
api_key_env = "LOCAL_KEY"
timeout_secs = 15

[chat]
memory_turns = 3
history_exchanges = 4
query_history = 2
max_message_length = 500

[safety]
extra_denied_keywords = ["GRANT", "REPLACE"]
"#;
        let file = create_temp_config(content);
        let config = TabletalkConfig::load(file.path()).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.database.path, "/var/lib/tabletalk/hr.db");
        assert_eq!(
            config.schema.feed_path.as_deref(),
            Some("/etc/tabletalk/feed.yaml")
        );
        assert_eq!(config.schema.default_schema, "hr");
        // Unset field in a present section keeps its default.
        assert_eq!(config.schema.dialect, "sqlite");
        assert_eq!(config.llm.base_url, "http://localhost:11434/v1");
        assert_eq!(config.llm.model, "llama3");
        assert_eq!(config.llm.api_key_env, "LOCAL_KEY");
        assert_eq!(config.llm.timeout_secs, 15);
        assert_eq!(config.chat.memory_turns, 3);
        assert_eq!(config.chat.history_exchanges, 4);
        assert_eq!(config.chat.query_history, 2);
        assert_eq!(config.chat.max_message_length, 500);
        assert_eq!(config.safety.extra_denied_keywords, vec!["GRANT", "REPLACE"]);
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let content = r#"
[chat]
memory_turns = 7
"#;
        let file = create_temp_config(content);
        let config = TabletalkConfig::load(file.path()).unwrap();
        assert_eq!(config.chat.memory_turns, 7);
        assert_eq!(config.chat.query_history, 5);
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.general.log_level, "info");
    }

    #[test]
    fn test_config_empty_toml_uses_all_defaults() {
        let file = create_temp_config("");
        let config = TabletalkConfig::load(file.path()).unwrap();
        assert_eq!(config.database.path, "~/.tabletalk/company.db");
        assert_eq!(config.chat.memory_turns, 10);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = TabletalkConfig::load_or_default(Path::new("/nonexistent/config.toml"));
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.chat.memory_turns, 10);
    }

    #[test]
    fn test_config_load_invalid_toml() {
        let file = create_temp_config("this is {{ not valid TOML");
        let result = TabletalkConfig::load(file.path());
        assert!(matches!(result, Err(TabletalkError::Config(_))));
    }

    #[test]
    fn test_load_or_default_invalid_toml() {
        let file = create_temp_config("[chat]\nmemory_turns = \"many\"");
        let config = TabletalkConfig::load_or_default(file.path());
        assert_eq!(config.chat.memory_turns, 10);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = TabletalkConfig::default();
        config.chat.memory_turns = 4;
        config.schema.feed_path = Some("feed.yaml".to_string());
        config.save(&path).unwrap();

        let reloaded = TabletalkConfig::load(&path).unwrap();
        assert_eq!(reloaded.chat.memory_turns, 4);
        assert_eq!(reloaded.schema.feed_path.as_deref(), Some("feed.yaml"));
        assert_eq!(reloaded.llm.model, config.llm.model);
    }

    #[test]
    fn test_config_save_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("dir").join("config.toml");

        TabletalkConfig::default().save(&path).unwrap();

        assert!(path.exists());
        let reloaded = TabletalkConfig::load(&path).unwrap();
        assert_eq!(reloaded.general.log_level, "info");
    }

    // ---- Path resolution ----

    #[test]
    fn test_resolve_path_absolute_unchanged() {
        assert_eq!(resolve_path("/tmp/x.db"), PathBuf::from("/tmp/x.db"));
    }

    #[test]
    fn test_resolve_path_relative_unchanged() {
        assert_eq!(resolve_path("data/x.db"), PathBuf::from("data/x.db"));
    }

    #[test]
    fn test_resolve_path_expands_home() {
        let resolved = resolve_path("~/.tabletalk/company.db");
        assert!(resolved.ends_with(".tabletalk/company.db"));
        assert!(!resolved.to_string_lossy().starts_with('~'));
    }
}
