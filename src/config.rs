//! Command line configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::error::Result;
use crate::logging::LogFormat;
use crate::matcher::PrefixPattern;
use crate::search::{default_workers, DEFAULT_PROGRESS_INTERVAL};

/// Default hidden service directory for generated key sets
pub const DEFAULT_KEY_DIR: &str = "data/vanity/default";

/// Tor v3 vanity onion identity generator
#[derive(Parser, Debug, Clone)]
#[command(name = "onion-vanity", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Default log level when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Search for a vanity address, then print or save the key set
    Generate(GenerateArgs),
    /// Check that a saved key set is internally consistent
    Verify(VerifyArgs),
    /// Verify the key set in a directory, generating one if none exists
    Provision(ProvisionArgs),
}

/// Options shared by every command that may run a search
#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    /// Desired address prefix (base32: a-z, 2-7; case-insensitive)
    #[arg(short, long, default_value = "")]
    pub prefix: String,

    /// Number of worker threads (default: number of CPU cores)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Give up after this many seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Attempts between progress reports
    #[arg(long, default_value_t = DEFAULT_PROGRESS_INTERVAL)]
    pub progress_interval: u64,
}

impl SearchArgs {
    /// Returns the number of workers, defaulting to CPU count
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(default_workers)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_secs)
    }

    /// Validates the prefix before any work starts
    pub fn pattern(&self) -> Result<PrefixPattern> {
        PrefixPattern::new(&self.prefix)
    }
}

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub search: SearchArgs,

    /// Save the key set instead of printing it
    #[arg(short, long)]
    pub save: bool,

    /// Hidden service directory to write when saving
    #[arg(short, long, default_value = DEFAULT_KEY_DIR)]
    pub dst: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct VerifyArgs {
    /// Hidden service directory to check
    #[arg(short, long, default_value = DEFAULT_KEY_DIR)]
    pub dst: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct ProvisionArgs {
    #[command(flatten)]
    pub search: SearchArgs,

    /// Hidden service directory to verify or create
    #[arg(short, long, default_value = DEFAULT_KEY_DIR)]
    pub dst: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VanityError;

    #[test]
    fn test_generate_defaults() {
        let cli = Cli::try_parse_from(["onion-vanity", "generate"]).unwrap();
        match cli.command {
            Command::Generate(args) => {
                assert_eq!(args.search.prefix, "");
                assert!(!args.save);
                assert_eq!(args.dst, PathBuf::from(DEFAULT_KEY_DIR));
                assert_eq!(args.search.progress_interval, DEFAULT_PROGRESS_INTERVAL);
                assert!(args.search.worker_count() >= 1);
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert_eq!(cli.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_generate_flags() {
        let cli = Cli::try_parse_from([
            "onion-vanity",
            "--log-format",
            "json",
            "generate",
            "--prefix",
            "abc",
            "--workers",
            "3",
            "--save",
            "--dst",
            "/tmp/hs",
            "--timeout",
            "60",
        ])
        .unwrap();

        assert_eq!(cli.log_format, LogFormat::Json);
        let Command::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.search.worker_count(), 3);
        assert_eq!(args.search.timeout(), Some(Duration::from_secs(60)));
        assert!(args.save);
        assert_eq!(args.dst, PathBuf::from("/tmp/hs"));
        assert_eq!(args.search.pattern().unwrap().as_str(), "abc");
    }

    #[test]
    fn test_invalid_prefix_is_reported() {
        let cli = Cli::try_parse_from(["onion-vanity", "provision", "-p", "bad1"]).unwrap();
        let Command::Provision(args) = cli.command else {
            panic!("expected provision");
        };
        assert!(matches!(
            args.search.pattern(),
            Err(VanityError::InvalidPrefix { .. })
        ));
    }
}
