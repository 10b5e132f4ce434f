//! Tor V3 Vanity Onion Identity CLI

use std::process;
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use crossbeam_channel::{bounded, Receiver};
use tracing::{error, warn};

use onion_vanity::config::{Cli, Command, GenerateArgs, ProvisionArgs, SearchArgs, VerifyArgs};
use onion_vanity::keyset::{self, HOSTNAME_FILE, PUBLIC_KEY_FILE, SECRET_KEY_FILE};
use onion_vanity::logging::init_logging;
use onion_vanity::{
    format_speed, load_and_verify, provision_identity, IdentityState, Progress,
    Result, SearchCoordinator,
};

/// Pretty duration formatter
struct PrettyDur(chrono::Duration);

impl PrettyDur {
    fn from_secs_f64(secs: f64) -> Self {
        let secs = if secs.is_finite() { secs.max(0.0) } else { 0.0 };
        PrettyDur(
            Duration::try_from_secs_f64(secs)
                .ok()
                .and_then(|d| chrono::Duration::from_std(d).ok())
                .unwrap_or(chrono::Duration::MAX),
        )
    }
}

impl std::fmt::Display for PrettyDur {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.num_weeks() >= 52 {
            write!(f, "{} years, ", self.0.num_weeks() / 52)?;
        }
        if self.0.num_weeks() % 52 > 0 {
            write!(f, "{} weeks, ", self.0.num_weeks() % 52)?;
        }
        if self.0.num_days() % 7 > 0 {
            write!(f, "{} days, ", self.0.num_days() % 7)?;
        }
        if self.0.num_hours() % 24 > 0 {
            write!(f, "{} hours, ", self.0.num_hours() % 24)?;
        }
        if self.0.num_minutes() % 60 > 0 {
            write!(f, "{} minutes, ", self.0.num_minutes() % 60)?;
        }
        write!(f, "{} seconds", self.0.num_seconds() % 60)
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli.log_level, cli.log_format) {
        eprintln!("Warning: could not initialize logging: {}", e);
    }

    let outcome = match cli.command {
        Command::Generate(args) => generate(args),
        Command::Verify(args) => verify(args),
        Command::Provision(args) => provision(args),
    };

    if let Err(e) = outcome {
        error!(error = %e, "command failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Build a coordinator wired to Ctrl+C and a progress channel
fn coordinator_for(args: &SearchArgs) -> Result<(SearchCoordinator, Receiver<Progress>)> {
    let (progress_tx, progress_rx) = bounded(16);
    let mut coordinator = SearchCoordinator::new(args.worker_count())?
        .with_progress(progress_tx)
        .with_progress_interval(args.progress_interval);
    if let Some(timeout) = args.timeout() {
        coordinator = coordinator.with_timeout(timeout);
    }

    let handler_token = coordinator.cancel_handle();
    if let Err(e) = ctrlc::set_handler(move || {
        eprintln!("\nStopping...");
        handler_token.cancel();
    }) {
        warn!(error = %e, "could not install Ctrl+C handler");
    }
    Ok((coordinator, progress_rx))
}

/// Print progress until the coordinator (and its sender) is dropped
fn spawn_progress_display(
    progress_rx: Receiver<Progress>,
    expected: f64,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut last_log: Option<Instant> = None;
        for progress in progress_rx.iter() {
            if last_log.map_or(false, |t| t.elapsed() < Duration::from_secs(10)) {
                continue;
            }
            last_log = Some(Instant::now());

            let progress_pct = progress.keys_checked as f64 / expected;
            let expected_dur = if progress_pct > 0.0 {
                progress.elapsed_secs / progress_pct
            } else {
                0.0
            };

            println!();
            println!(
                "Progress: {:.2e} / {:.2e} keys ({:.4}%)",
                progress.keys_checked as f64,
                expected,
                progress_pct * 100.0
            );
            println!("Speed: {} keys/sec", format_speed(progress.keys_per_sec as u64));
            println!(
                "Elapsed: {} / Est. total: {}",
                PrettyDur::from_secs_f64(progress.elapsed_secs),
                PrettyDur::from_secs_f64(expected_dur)
            );
        }
    })
}

fn generate(args: GenerateArgs) -> Result<()> {
    let pattern = args.search.pattern()?;
    let (coordinator, progress_rx) = coordinator_for(&args.search)?;

    println!("=== Tor V3 Vanity Generator ===");
    println!("Prefix: {:?}", pattern.as_str());
    println!("Workers: {}", coordinator.workers());
    if args.save {
        println!("Output: {}", args.dst.display());
    }
    println!();

    let display = spawn_progress_display(progress_rx, pattern.expected_attempts());
    let start_time = Instant::now();
    let outcome = coordinator.search_with(&pattern);
    drop(coordinator);
    let _ = display.join();
    let result = outcome?;

    println!();
    println!(
        "Found in {}",
        PrettyDur::from_secs_f64(start_time.elapsed().as_secs_f64())
    );

    if args.save {
        keyset::save(&args.dst, &result)?;
        println!("Hostname: {}", result.hostname());
        for file in [SECRET_KEY_FILE, PUBLIC_KEY_FILE, HOSTNAME_FILE] {
            println!("Saved: {}", args.dst.join(file).display());
        }
    } else {
        println!("Vanity Onion Address: {}", result.onion_address);
        println!("Public Key (hex): {}", result.public_key_hex());
        println!("Expanded Private Key (hex): {}", result.expanded_secret_hex());
        println!("Total Attempts: {}", result.attempts);
    }
    Ok(())
}

fn verify(args: VerifyArgs) -> Result<()> {
    let identity = load_and_verify(&args.dst)?;
    println!("Verified: {}", identity.hostname);
    println!("Public Key (hex): {}", identity.public_key_hex());
    Ok(())
}

fn provision(args: ProvisionArgs) -> Result<()> {
    let expected = args.search.pattern()?.expected_attempts();
    let (coordinator, progress_rx) = coordinator_for(&args.search)?;

    let display = spawn_progress_display(progress_rx, expected);
    let outcome = provision_identity(&args.dst, &args.search.prefix, &coordinator);
    drop(coordinator);
    let _ = display.join();
    let provisioned = outcome?;

    match provisioned.state {
        IdentityState::Saved => println!(
            "Generated {} after {} attempts",
            provisioned.identity.hostname,
            provisioned.attempts.unwrap_or_default()
        ),
        _ => println!("Verified {}", provisioned.identity.hostname),
    }
    Ok(())
}
