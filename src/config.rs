// src/config.rs

use anyhow::Context;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct CrtShConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_crtsh_url")]
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EntrustConfig {
    #[serde(default)]
    pub enabled: bool,  // Service has been unreliable for years, opt-in
    #[serde(default = "default_entrust_url")]
    pub base_url: String,
    #[serde(default = "default_entrust_limit")]
    pub limit: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourcesConfig {
    #[serde(default)]
    pub include_expired: bool,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default)]
    pub dump_responses_dir: Option<String>,
    #[serde(default)]
    pub crtsh: CrtShConfig,
    #[serde(default)]
    pub entrust: EntrustConfig,
}

fn default_true() -> bool { true }
fn default_crtsh_url() -> String { "https://crt.sh/".to_string() }
fn default_entrust_url() -> String {
    "https://ctsearch.entrust.com/api/v1/certificates".to_string()
}
fn default_entrust_limit() -> u32 { 5000 }
fn default_concurrency() -> usize { 4 }

#[derive(Debug, Deserialize, Clone)]
pub struct ResolverConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub max_fetches: Option<usize>,  // None = follow every reference
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_accept")]
    pub accept: String,
    #[serde(default = "default_accept_language")]
    pub accept_language: String,
}

fn default_timeout_secs() -> u64 { 30 }
fn default_user_agent() -> String {
    concat!("ct-explorer/", env!("CARGO_PKG_VERSION")).to_string()
}
fn default_accept() -> String {
    "application/json,application/pkix-cert,application/pkix-crl,*/*;q=0.8".to_string()
}
fn default_accept_language() -> String { "en-US,en;q=0.8".to_string() }

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    #[serde(default = "default_directory")]
    pub directory: String,
    #[serde(default = "default_csv_file")]
    pub csv_file: String,
    #[serde(default = "default_domains_file")]
    pub domains_file: String,
    #[serde(default = "default_ca_dir")]
    pub ca_dir: String,
    #[serde(default = "default_crl_dir")]
    pub crl_dir: String,
}

fn default_directory() -> String { ".".to_string() }
fn default_csv_file() -> String { "certificates.csv".to_string() }
fn default_domains_file() -> String { "certificate_domains_found.txt".to_string() }
fn default_ca_dir() -> String { "cacerts".to_string() }
fn default_crl_dir() -> String { "crls".to_string() }

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String { "info".to_string() }

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for CrtShConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_crtsh_url(),
        }
    }
}

impl Default for EntrustConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: default_entrust_url(),
            limit: default_entrust_limit(),
        }
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            include_expired: false,
            concurrency: default_concurrency(),
            dump_responses_dir: None,
            crtsh: CrtShConfig::default(),
            entrust: EntrustConfig::default(),
        }
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_fetches: None,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            accept: default_accept(),
            accept_language: default_accept_language(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            csv_file: default_csv_file(),
            domains_file: default_domains_file(),
            ca_dir: default_ca_dir(),
            crl_dir: default_crl_dir(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {:?}", path))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject values that would make the run meaningless
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.sources.concurrency == 0 {
            anyhow::bail!("sources.concurrency must be greater than 0");
        }
        if self.resolver.max_fetches == Some(0) {
            anyhow::bail!("resolver.max_fetches must be greater than 0 (omit it for no limit)");
        }
        if self.http.timeout_secs == 0 {
            anyhow::bail!("http.timeout_secs must be greater than 0");
        }
        Ok(())
    }
}
