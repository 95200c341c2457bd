//! Concept publish/subscribe administrative CLI
//!
//! Bootstraps the local concept source, runs mapping synchronization and
//! answers identifier and locality queries against a PostgreSQL database.

mod cli;
mod config;
mod logging;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Command};
use conceptpubsub_core::{
    settings::{SettingsImplementationId, StaticImplementationId},
    ConceptPubSubService, ImplementationIdProvider, SettingsStore,
};
use conceptpubsub_postgres::{PgConceptRepository, PgSettingsStore};
use crate::config::Config;
use serde::Serialize;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {e}"))?;

    let _logging_guard =
        logging::init_logging(&config.logging).context("Failed to initialize logging")?;

    let pool = conceptpubsub_postgres::connect(&config.database.url, config.database.max_connections)
        .await
        .context("Failed to connect to database")?;

    let service = build_service(&config, pool.clone());
    run(&pool, &service, cli.command).await
}

fn build_service(config: &Config, pool: sqlx::PgPool) -> ConceptPubSubService {
    let repo = Arc::new(PgConceptRepository::new(pool.clone()));
    let settings: Arc<dyn SettingsStore> = Arc::new(PgSettingsStore::new(pool));
    let identity: Arc<dyn ImplementationIdProvider> = match &config.implementation_id {
        Some(id) => Arc::new(StaticImplementationId::new(Some(id.clone()))),
        None => Arc::new(SettingsImplementationId::new(settings.clone())),
    };
    let strategy = config.mapping.strategy.resolve(&*repo);

    tracing::debug!(%strategy, batch_size = config.sync.batch_size, "Composed service");

    ConceptPubSubService::with_strategy(repo, settings, identity, strategy)
        .with_batch_size(config.sync.batch_size)
}

async fn run(
    pool: &sqlx::PgPool,
    service: &ConceptPubSubService,
    command: Command,
) -> anyhow::Result<()> {
    match command {
        Command::Migrate => {
            conceptpubsub_postgres::migrate(pool)
                .await
                .context("Failed to apply migrations")?;
            println!("Migrations applied");
        }
        Command::Bootstrap { force } => {
            let source = if force {
                service.create_local_namespace().await?
            } else {
                service.get_or_create_local_namespace().await?
            };
            print_json(&source)?;
        }
        Command::LocalSource => {
            print_json(&service.get_local_namespace().await?)?;
        }
        Command::Sync { batch_size } => {
            let service = match batch_size {
                Some(n) => service.clone().with_batch_size(n as usize),
                None => service.clone(),
            };
            let report = service
                .add_local_mappings_to_all_concepts()
                .await
                .context("Synchronization aborted; rerun to resume from the start")?;
            print_json(&report)?;
        }
        Command::Map { concept_id } => {
            let added = service.add_local_mapping_by_id(concept_id).await?;
            if added {
                println!("Added local mapping to concept {}", concept_id);
            } else {
                println!("Concept {} already has a local mapping", concept_id);
            }
        }
        Command::Resolve { identifier } => match service.resolve_concept(&identifier).await? {
            Some(concept) => print_json(&concept)?,
            None => anyhow::bail!("No concept found for '{}'", identifier),
        },
        Command::IsLocal { concept_id } => {
            let local = service.is_local_concept_by_id(concept_id).await?;
            println!("{}", if local { "local" } else { "subscribed" });
        }
        Command::Subscribed => {
            let subscribed = service.get_subscribed_namespaces().await?;
            let mut sources: Vec<_> = subscribed.sources().collect();
            sources.sort_by(|a, b| a.name.cmp(&b.name));
            print_json(&sources)?;
            for token in subscribed.unresolved() {
                eprintln!("warning: subscribed source '{}' does not exist", token);
            }
        }
        Command::Subscribe { sources } => {
            service.set_subscribed_namespaces(&sources).await?;
            println!("Subscribed to {} concept source(s)", sources.len());
        }
    }

    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
