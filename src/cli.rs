// src/cli.rs
use clap::Parser;

use crate::config::Config;

/// ct-explorer: Certificate Transparency explorer
///
/// Collects every certificate CT logs have recorded for a list of domains,
/// writes them to a CSV listing and downloads the CA certificates and CRLs
/// their chains reference.
#[derive(Parser, Debug, Clone)]
#[command(name = "ct-explorer")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// File with one domain per line
    #[arg(default_value = "domains.txt")]
    pub domains_file: String,

    // ===== Input & Configuration =====
    /// Path to TOML config file (defaults are used when omitted)
    #[arg(short = 'c', long = "config")]
    pub config: Option<String>,

    /// Also collect expired certificates
    #[arg(long = "include-expired")]
    pub include_expired: bool,

    // ===== Chain Resolution =====
    /// Skip downloading CA certificates and CRLs
    #[arg(long = "no-chain")]
    pub no_chain: bool,

    /// Stop chain resolution after this many downloads
    #[arg(long = "max-fetches")]
    pub max_fetches: Option<usize>,

    // ===== Output =====
    /// Directory for all output files
    #[arg(short = 'o', long = "output-dir")]
    pub output_dir: Option<String>,

    /// Disable progress indicator
    #[arg(long = "no-progress")]
    pub no_progress: bool,

    // ===== Logging =====
    /// Verbose logging (set log level to debug)
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Quiet logging (set log level to warn)
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,
}

impl Cli {
    /// Validate flag combinations and return errors for invalid usage
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.verbose && self.quiet {
            anyhow::bail!("Cannot specify both --verbose and --quiet");
        }

        if self.max_fetches == Some(0) {
            anyhow::bail!("--max-fetches must be greater than 0");
        }

        Ok(())
    }

    /// Override configuration values with the flags that were given
    pub fn apply_to(&self, config: &mut Config) {
        if self.include_expired {
            config.sources.include_expired = true;
        }
        if self.no_chain {
            config.resolver.enabled = false;
        }
        if let Some(max) = self.max_fetches {
            config.resolver.max_fetches = Some(max);
        }
        if let Some(dir) = &self.output_dir {
            config.output.directory = dir.clone();
        }
        if let Some(level) = self.log_level() {
            config.logging.level = level.to_string();
        }
    }

    pub fn should_show_progress(&self) -> bool {
        !self.no_progress && !self.quiet
    }

    /// Log level requested by -v/-q, if any
    pub fn log_level(&self) -> Option<&str> {
        if self.verbose {
            Some("debug")
        } else if self.quiet {
            Some("warn")
        } else {
            None
        }
    }
}
