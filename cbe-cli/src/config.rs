use anyhow::{Context, Result};
use cbe_client::{FetchConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerSection,
    pub output: OutputSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub base_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
    /// The receipt server's certificate does not validate; keep `true` unless
    /// pointing at a different host.
    pub accept_invalid_certs: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    pub include_details: bool,
    pub json: bool,
}

impl Default for ServerSection {
    fn default() -> Self {
        let fetch = FetchConfig::default();
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: fetch.user_agent,
            accept_invalid_certs: fetch.accept_invalid_certs,
        }
    }
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            include_details: true,
            json: false,
        }
    }
}

impl Config {
    pub fn fetch_config(&self) -> FetchConfig {
        let mut fetch = FetchConfig {
            base_url: self.server.base_url.clone(),
            user_agent: self.server.user_agent.clone(),
            accept_invalid_certs: self.server.accept_invalid_certs,
            ..FetchConfig::default()
        };
        if self.server.timeout_secs > 0 {
            fetch.timeout = Duration::from_secs(self.server.timeout_secs);
        }
        fetch
    }
}

pub fn cbe_home() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".cbe-verify"))
}

pub fn config_path() -> Result<PathBuf> {
    Ok(cbe_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    let p = config_path()?;
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let dir = cbe_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    let p = config_path()?;
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}

pub fn show_config() -> Result<()> {
    let cfg = load_config()?;
    println!("# {}", config_path()?.display());
    print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
    Ok(())
}
