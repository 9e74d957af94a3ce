mod cli;
mod config;
mod pipeline;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tunep_core::ReferencePeriod;
use tunep_storage::{DirectoryStore, ReferenceCache, Remote};

use cli::Args;
use config::AppConfig;
use pipeline::{Pipeline, RunRequest, Settings};

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = AppConfig::load(args.config.as_deref()).context("loading configuration")?;
    config.apply_args(&args);

    let current = ReferencePeriod::current();
    let period = ReferencePeriod::new(
        args.year.unwrap_or(u32::from(current.year())),
        args.month.unwrap_or(u32::from(current.month())),
    )
    .context("invalid reference period")?;

    let sigtap_remote = Remote::from_location(config.sigtap.remote.as_deref())
        .context("configuring the reference table remote")?;
    let billing_remote = Remote::from_location(config.billing.remote_for(args.source).as_deref())
        .context("configuring the billing remote")?;

    let settings = Settings {
        sigtap_prefix: config.sigtap.prefix.clone(),
        rate_table: config.rate_table.clone(),
        output_dir: config.output_dir.clone(),
        state: config.billing.state.clone(),
        billing_profile: config.billing.profile()?,
        format: config.format,
    };
    let pipeline = Pipeline::new(
        ReferenceCache::new(DirectoryStore::new(&config.cache_dir), sigtap_remote),
        ReferenceCache::new(DirectoryStore::new(&config.cache_dir), billing_remote),
        settings,
    );

    tracing::info!(
        "Reconciling facility {} for {} ({})",
        args.cnes,
        period,
        args.source
    );
    let outcome = pipeline
        .run(&RunRequest {
            facility_code: args.cnes.trim().to_string(),
            period,
            source: args.source,
            timestamp: chrono::Utc::now().timestamp(),
        })
        .with_context(|| format!("reconciliation for facility {} failed", args.cnes))?;

    tracing::info!(
        "{} report rows ({} procedures with a single rate, {} averaged, {} without)",
        outcome.rows,
        outcome.reconciliation.single,
        outcome.reconciliation.averaged,
        outcome.reconciliation.unmatched
    );
    if outcome.skipped > 0 {
        tracing::warn!("{} malformed input line(s) were skipped", outcome.skipped);
    }
    println!("{}", outcome.report_path.display());
    Ok(())
}
