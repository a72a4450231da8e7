use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::modules::error::{AgentError, Result};
use crate::modules::scheduler::Rule;

/// Local working directory for the map, runtime state and config.
pub const HUNTER_DIR: &str = ".hunter";
pub const CONFIG_FILE: &str = "config.toml";
/// Token file holding nothing but the API token.
pub const KEY_FILE: &str = ".key";

pub const TOKEN_ENV: &str = "HUNTER_TOKEN";
pub const BASE_URL_ENV: &str = "HUNTER_BASE_URL";

pub const DEFAULT_BASE_URL: &str = "https://lambda-treasure-hunt.herokuapp.com/";

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_request_timeout_ms() -> u64 {
    15_000
}

fn default_cooldown_guard_ms() -> u64 {
    100
}

fn default_player_name() -> String {
    "hunter".to_string()
}

fn default_name_change_gold() -> u64 {
    1000
}

fn default_task_order() -> Vec<Rule> {
    Rule::DEFAULT_ORDER.to_vec()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Prefer `.hunter/.key` or `HUNTER_TOKEN` over putting the token here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Margin added on top of every server cooldown.
    #[serde(default = "default_cooldown_guard_ms")]
    pub cooldown_guard_ms: u64,
    /// Name requested from the pirate.
    #[serde(default = "default_player_name")]
    pub player_name: String,
    #[serde(default = "default_name_change_gold")]
    pub name_change_gold: u64,
    /// Rules the scheduler evaluates, first match wins.
    #[serde(default = "default_task_order")]
    pub task_order: Vec<Rule>,
    #[serde(default)]
    pub hunt_snitches: bool,
    /// External clue decoder; the clue program is written to its stdin.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decoder_command: Option<String>,
    /// Fixed RNG seed for reproducible foraging.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
            request_timeout_ms: default_request_timeout_ms(),
            cooldown_guard_ms: default_cooldown_guard_ms(),
            player_name: default_player_name(),
            name_change_gold: default_name_change_gold(),
            task_order: default_task_order(),
            hunt_snitches: false,
            decoder_command: None,
            seed: None,
        }
    }
}

/// Values given on the command line; they win over everything else.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub token: Option<String>,
    pub base_url: Option<String>,
}

pub fn hunter_dir() -> PathBuf {
    PathBuf::from(HUNTER_DIR)
}

pub fn config_file_path(dir: &Path) -> PathBuf {
    dir.join(CONFIG_FILE)
}

impl Config {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| AgentError::Config(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`; a missing or empty file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Self::from_toml_str(&content).map_err(|e| match e {
            AgentError::Config(msg) => AgentError::Config(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    /// Write the defaults to `path` unless a file is already there.
    pub fn create_default(path: &Path) -> Result<bool> {
        if path.exists() {
            return Ok(false);
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(&Config::default())
            .map_err(|e| AgentError::Config(format!("failed to serialize default config: {}", e)))?;
        fs::write(path, content)?;
        Ok(true)
    }

    /// Full precedence: CLI > environment > key file > config file > defaults.
    pub fn resolve(dir: &Path, config_path: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        let path = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| config_file_path(dir));
        let mut config = Self::load(&path)?;
        if let Some(token) = read_key_file(dir)? {
            config.token = Some(token);
        }
        config.apply_env(|key| std::env::var(key).ok());
        config.apply_overrides(overrides);
        Ok(config)
    }

    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(token) = lookup(TOKEN_ENV).filter(|t| !t.trim().is_empty()) {
            self.token = Some(token.trim().to_string());
        }
        if let Some(url) = lookup(BASE_URL_ENV).filter(|u| !u.trim().is_empty()) {
            self.base_url = url.trim().to_string();
        }
    }

    pub fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(token) = &overrides.token {
            self.token = Some(token.clone());
        }
        if let Some(url) = &overrides.base_url {
            self.base_url = url.clone();
        }
    }

    fn validate(&self) -> Result<()> {
        if self.task_order.is_empty() {
            return Err(AgentError::Config("task_order must name at least one rule".into()));
        }
        if self.base_url.trim().is_empty() {
            return Err(AgentError::Config("base_url is empty".into()));
        }
        Ok(())
    }

    /// Token for commands that talk to the remote world.
    pub fn require_token(&self) -> Result<&str> {
        match self.token.as_deref().map(str::trim) {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(AgentError::Config(format!(
                "no API token; set {}, write {}/{} or pass --token",
                TOKEN_ENV, HUNTER_DIR, KEY_FILE
            ))),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn cooldown_guard(&self) -> Duration {
        Duration::from_millis(self.cooldown_guard_ms)
    }
}

pub fn read_key_file(dir: &Path) -> io::Result<Option<String>> {
    let path = dir.join(KEY_FILE);
    if !path.exists() {
        return Ok(None);
    }
    let token = fs::read_to_string(path)?.trim().to_string();
    if token.is_empty() {
        return Ok(None);
    }
    Ok(Some(token))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.task_order, Rule::DEFAULT_ORDER.to_vec());
        assert_eq!(config.cooldown_guard(), Duration::from_millis(100));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = Config::from_toml_str(
            r#"
                player_name = "ada"
                hunt_snitches = true
                task_order = ["liquidate", "milestones", "forage"]
            "#,
        )
        .unwrap();
        assert_eq!(config.player_name, "ada");
        assert!(config.hunt_snitches);
        assert_eq!(
            config.task_order,
            vec![Rule::Liquidate, Rule::Milestones, Rule::Forage]
        );
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.request_timeout_ms, 15_000);
    }

    #[test]
    fn unknown_rule_is_rejected() {
        let err = Config::from_toml_str(r#"task_order = ["nap"]"#).unwrap_err();
        assert!(matches!(err, AgentError::Config(_)));
        let err = Config::from_toml_str("task_order = []").unwrap_err();
        assert!(matches!(err, AgentError::Config(_)));
    }

    #[test]
    fn precedence_cli_env_key_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            config_file_path(dir.path()),
            "token = \"from-file\"\nbase_url = \"http://file/\"\n",
        )
        .unwrap();

        let config = Config::load(&config_file_path(dir.path())).unwrap();
        assert_eq!(config.token.as_deref(), Some("from-file"));

        fs::write(dir.path().join(KEY_FILE), "from-key\n").unwrap();
        assert_eq!(read_key_file(dir.path()).unwrap().as_deref(), Some("from-key"));

        let mut config = config;
        config.token = read_key_file(dir.path()).unwrap();
        config.apply_env(|key| match key {
            TOKEN_ENV => Some("from-env".into()),
            _ => None,
        });
        assert_eq!(config.token.as_deref(), Some("from-env"));
        assert_eq!(config.base_url, "http://file/");

        config.apply_overrides(&Overrides {
            token: Some("from-cli".into()),
            base_url: None,
        });
        assert_eq!(config.require_token().unwrap(), "from-cli");
    }

    #[test]
    fn missing_token_is_config_error() {
        let config = Config::default();
        assert!(matches!(config.require_token(), Err(AgentError::Config(_))));
    }

    #[test]
    fn default_file_is_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = config_file_path(&dir.path().join(HUNTER_DIR));
        assert!(Config::create_default(&path).unwrap());
        assert!(!Config::create_default(&path).unwrap());
        assert_eq!(Config::load(&path).unwrap(), Config::default());
    }
}
