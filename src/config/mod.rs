use crate::catalog::QueryKey;
use anyhow::Context;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub catalog: CatalogConfig,
    pub query: QueryConfig,
    pub player: PlayerConfig,
    pub input: InputConfig,
    pub paths: PathsConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Base URL of the catalog service, e.g. `http://localhost:3000/api`
    pub base_url: String,
    pub per_page: u32,
    pub timeout_secs: u64,
}

/// Query used when no previous session was saved.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    pub lang: String,
    pub seed: String,
    pub like_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// mpv audio device name (see `mpv --audio-device=help`)
    pub audio_device: Option<String>,
    /// Volume level (0-100)
    pub volume: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub mouse: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Query of the last session (restored on startup)
    pub last_query: Option<QueryKey>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/api".to_string(),
            per_page: 20,
            timeout_secs: 10,
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        let key = QueryKey::default();
        Self {
            lang: key.lang,
            seed: key.seed,
            like_score: key.like_score,
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            audio_device: None,
            volume: 80,
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self { mouse: true }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        let proj = ProjectDirs::from("dev", "cadenza", "cadenza");
        let data_dir = proj
            .as_ref()
            .map(|p| p.data_dir().to_path_buf())
            .unwrap_or_else(|| std::env::temp_dir().join("cadenza"));
        Self { data_dir }
    }
}

impl Config {
    /// Query to start with: the saved session, else the configured default.
    pub fn initial_query(&self) -> QueryKey {
        match &self.ui.last_query {
            Some(q) => QueryKey::new(q.lang.clone(), q.seed.clone(), q.like_score),
            None => QueryKey::new(
                self.query.lang.clone(),
                self.query.seed.clone(),
                self.query.like_score,
            ),
        }
    }

    pub fn preview_dir(&self) -> PathBuf {
        self.paths.data_dir.join("previews")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.paths.data_dir.join("logs")
    }
}

pub fn save(cfg: &Config, override_path: Option<&Path>) -> anyhow::Result<()> {
    let path = match override_path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()?,
    };
    write_config(cfg, &path)
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    let proj = ProjectDirs::from("dev", "cadenza", "cadenza").context("ProjectDirs unavailable")?;
    Ok(proj.config_dir().join("config.toml"))
}

pub fn load(override_path: Option<&Path>) -> anyhow::Result<Config> {
    let path = match override_path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()?,
    };

    if !path.exists() {
        let cfg = Config::default();
        write_config(&cfg, &path)?;
        return Ok(cfg);
    }

    let raw = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    let cfg = toml::from_str::<Config>(&raw).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}

fn write_config(cfg: &Config, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create dir {}", parent.display()))?;
    }
    let raw = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(path, raw).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_falls_back_to_defaults() {
        let raw = r#"
[catalog]
base_url = "http://example.test/api"

[query]
lang = "de"
"#;
        let cfg: Config = toml::from_str(raw).unwrap();
        assert_eq!(cfg.catalog.base_url, "http://example.test/api");
        assert_eq!(cfg.catalog.per_page, 20);
        assert_eq!(cfg.query.lang, "de");
        assert_eq!(cfg.query.seed, "0");
        assert_eq!(cfg.player.volume, 80);
    }

    #[test]
    fn test_saved_session_wins_over_default_query() {
        let mut cfg = Config::default();
        assert_eq!(cfg.initial_query(), QueryKey::default());
        cfg.ui.last_query = Some(QueryKey::new("de", "123", 4.0));
        assert_eq!(cfg.initial_query().seed, "123");
    }

    #[test]
    fn test_load_creates_and_reloads_file() {
        let dir = std::env::temp_dir().join(format!("cadenza-config-test-{}", std::process::id()));
        let path = dir.join("config.toml");
        let _ = fs::remove_dir_all(&dir);

        let mut cfg = load(Some(&path)).unwrap();
        assert!(path.exists());
        cfg.player.volume = 33;
        cfg.ui.last_query = Some(QueryKey::new("de", "9", 2.0));
        save(&cfg, Some(&path)).unwrap();

        let again = load(Some(&path)).unwrap();
        assert_eq!(again.player.volume, 33);
        assert_eq!(again.initial_query(), QueryKey::new("de", "9", 2.0));
        let _ = fs::remove_dir_all(&dir);
    }
}
