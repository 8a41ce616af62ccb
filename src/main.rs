// src/main.rs
use clap::Parser;
use ct_explorer::chain::{ChainResolver, FetchLedger, HttpFetcher};
use ct_explorer::cli::Cli;
use ct_explorer::config::Config;
use ct_explorer::coordinator::Explorer;
use ct_explorer::output::{self, DirectorySink};
use ct_explorer::progress::ProgressIndicator;
use ct_explorer::stats::RunSummary;
use ct_explorer::{domains, http, sources};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();
    cli.validate()?;

    // Load config file, if one was given
    let mut config = match &cli.config {
        Some(path) => Config::from_file(Path::new(path))?,
        None => Config::default(),
    };

    // CLI flags override config values
    cli.apply_to(&mut config);
    config.validate()?;

    // Initialize logging: RUST_LOG wins over flags and config
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .init();

    tracing::info!("Starting ct-explorer...");
    let started = Instant::now();

    let domains = domains::from_file(Path::new(&cli.domains_file))?;
    tracing::info!("Loaded {} domains from {}", domains.len(), cli.domains_file);
    if domains.is_empty() {
        tracing::warn!("Domain list is empty, nothing to query");
    }

    let output_dir = PathBuf::from(&config.output.directory);
    std::fs::create_dir_all(&output_dir)?;

    let client = http::build_client(&config.http)?;
    let sources = sources::from_config(&config.sources, &client);
    if sources.is_empty() {
        tracing::warn!("No CT log source is enabled");
    }

    // Ctrl-C stops scheduling new work; files already written stay intact
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing current requests...");
            shutdown_tx.send(true).ok();
        }
    });

    let progress = ProgressIndicator::new(cli.should_show_progress());

    // Collect certificates from every source
    let explorer = Explorer::new(
        sources,
        config.sources.include_expired,
        config.sources.concurrency,
    )
    .with_progress(progress.clone());

    let set = explorer.collect(&domains, &shutdown_rx).await;

    for domain in set.failed_domains() {
        tracing::warn!(domain, "At least one source failed for this domain");
    }

    // Reports derived from the certificate set
    progress.set_message("Writing reports");

    let csv_path = output_dir.join(&config.output.csv_file);
    if let Err(e) = output::csv::write_certificates_file(&csv_path, &set.certificates) {
        tracing::error!("{:#}", e);
    }

    let names_path = output_dir.join(&config.output.domains_file);
    let distinct_names = match output::dns_list::write_names_file(&names_path, &set.certificates) {
        Ok(count) => count,
        Err(e) => {
            tracing::error!("{:#}", e);
            output::dns_list::collect_names(&set.certificates).len()
        }
    };

    let mut summary = RunSummary::new(domains.len(), &set, distinct_names);

    // Chain resolution
    if !config.resolver.enabled {
        tracing::info!("Chain resolution disabled");
    } else if *shutdown_rx.borrow() {
        tracing::info!("Skipping chain resolution after interrupt");
    } else {
        let sink = DirectorySink::new(
            output_dir.join(&config.output.ca_dir),
            output_dir.join(&config.output.crl_dir),
        );

        match sink.prepare().await {
            Ok(()) => {
                progress.set_message(format!(
                    "Resolving chains of {} certificates",
                    set.certificates.len()
                ));

                let resolver = ChainResolver::new(
                    Arc::new(HttpFetcher::new(client.clone())),
                    Arc::new(sink),
                )
                .with_max_fetches(config.resolver.max_fetches);

                let mut ledger = FetchLedger::new();
                let resolved = resolver
                    .resolve(&set.certificates, &mut ledger, &shutdown_rx)
                    .await;

                tracing::debug!("{} distinct references visited", ledger.len());
                summary = summary.with_chain(&resolved);
            }
            Err(e) => tracing::error!("Skipping chain resolution: {:#}", e),
        }
    }

    progress.finish();

    let cancelled = *shutdown_rx.borrow();
    let summary = summary.finish(started.elapsed(), cancelled);
    summary.log();

    let use_colors = is_terminal::is_terminal(std::io::stdout());
    println!("\n{}", summary.render(use_colors));

    Ok(())
}
