//! Profile rebuild entry point, invoked by an external scheduler.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use uuid::Uuid;

use mindvane::config::Config;
use mindvane::profile::ProfileAggregator;
use mindvane::store::Store;

/// Rebuild user profiles from recent log entries.
#[derive(Debug, Parser)]
#[command(name = "mindvane-profiler", version, about)]
struct Args {
    /// Rebuild a single user's profile.
    #[arg(long, conflicts_with = "all")]
    user_id: Option<Uuid>,

    /// Rebuild every user's profile.
    #[arg(long)]
    all: bool,

    /// Apply pending database migrations before running.
    #[arg(long)]
    migrate: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let config = Config::from_env().context("loading configuration")?;
    let store = Arc::new(
        Store::new(&config.database)
            .await
            .context("connecting to database")?,
    );

    if args.migrate {
        store.run_migrations().await.context("running migrations")?;
    }

    let user_ids = if args.all {
        store.list_user_ids().await.context("listing users")?
    } else if let Some(user_id) = args.user_id {
        vec![user_id]
    } else {
        anyhow::bail!("pass --user-id <uuid> or --all");
    };

    let aggregator = ProfileAggregator::new(store);
    let mut failures = 0usize;

    for user_id in &user_ids {
        match aggregator.build_and_save(*user_id).await {
            Ok(profile) => {
                tracing::info!(%user_id, log_count = profile.log_count, "profile rebuilt");
            }
            Err(e) => {
                failures += 1;
                tracing::error!(%user_id, error = %e, "profile rebuild failed");
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{failures} of {} profile rebuilds failed", user_ids.len());
    }

    Ok(())
}
