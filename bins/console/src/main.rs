//! Puente operator console.
//!
//! Validates and submits transaction drafts and reads or deactivates records
//! against the configured backend. The overlay cache lives on disk so writes
//! survive between runs of the same session.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use puente_core::cache::{FileStore, OverlayCache};
use puente_core::ledger::{TransactionDraft, ValidationPolicy, validate};
use puente_data::{
    Account, AccountGroup, CostCenter, Entity, EntityRepository, HttpRemote, Transaction,
    TransactionComposer, TransactionGateway,
};
use puente_shared::types::{ListFilters, ListOptions, PageRequest};
use puente_shared::{AppConfig, Session};

#[derive(Parser)]
#[command(name = "puente")]
#[command(about = "Puente accounting data console")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a transaction draft against the ledger rules
    Validate { draft: PathBuf },
    /// Validate and submit a transaction draft
    Submit {
        draft: PathBuf,
        /// Login payload of the active session
        #[arg(long)]
        session: PathBuf,
    },
    /// List one page merged with the local overlay cache
    List {
        entity: EntityArg,
        #[arg(long)]
        session: PathBuf,
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Only active records
        #[arg(long)]
        active: bool,
    },
    /// Mark a record inactive
    Deactivate {
        entity: EntityArg,
        id: String,
        #[arg(long)]
        session: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum EntityArg {
    Accounts,
    Groups,
    CostCenters,
    Transactions,
}

/// Everything a repository needs for one session.
struct Backend {
    remote: Arc<HttpRemote>,
    cache: OverlayCache,
    session: Session,
}

impl Backend {
    fn open(config: &AppConfig, session_path: &Path) -> anyhow::Result<Self> {
        let raw: Value = read_json(session_path)?;
        let session = Session::ingest(&raw).context("invalid session file")?;
        let remote = HttpRemote::new(&config.remote).context("failed to build HTTP client")?;
        let store = FileStore::new(config.cache.directory.clone());
        info!(
            base_url = %config.remote.base_url,
            cache_dir = %store.root().display(),
            "backend ready"
        );

        Ok(Self {
            remote: Arc::new(remote),
            cache: OverlayCache::from_config(Arc::new(store), &config.cache),
            session,
        })
    }

    fn repository<E: Entity>(&self) -> EntityRepository<E, HttpRemote> {
        EntityRepository::new(
            Arc::clone(&self.remote),
            self.cache.clone(),
            self.session.clone(),
        )
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr; stdout carries JSON output only
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "puente=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load().context("failed to load configuration")?;
    let policy = ValidationPolicy::from(&config.ledger);

    match cli.command {
        Commands::Validate { draft } => {
            let draft: TransactionDraft = read_json(&draft)?;
            let validated = validate(&draft, policy)?;
            print_json(&json!({
                "lines": validated.lines,
                "totals": validated.totals,
            }))
        }
        Commands::Submit { draft, session } => {
            let draft: TransactionDraft = read_json(&draft)?;
            let backend = Backend::open(&config, &session)?;
            submit(&backend, &config, policy, draft).await
        }
        Commands::List {
            entity,
            session,
            page,
            active,
        } => {
            let backend = Backend::open(&config, &session)?;
            let filters = if active {
                ListFilters::active_only()
            } else {
                ListFilters::default()
            };
            let options = ListOptions::from(PageRequest {
                page,
                per_page: config.listing.page_size,
            })
            .with_filters(filters);

            match entity {
                EntityArg::Accounts => list_page::<Account>(&backend, options).await,
                EntityArg::Groups => list_page::<AccountGroup>(&backend, options).await,
                EntityArg::CostCenters => list_page::<CostCenter>(&backend, options).await,
                EntityArg::Transactions => list_page::<Transaction>(&backend, options).await,
            }
        }
        Commands::Deactivate {
            entity,
            id,
            session,
        } => {
            let backend = Backend::open(&config, &session)?;
            match entity {
                EntityArg::Accounts => deactivate::<Account>(&backend, &id).await,
                EntityArg::Groups => deactivate::<AccountGroup>(&backend, &id).await,
                EntityArg::CostCenters => deactivate::<CostCenter>(&backend, &id).await,
                EntityArg::Transactions => deactivate::<Transaction>(&backend, &id).await,
            }
        }
    }
}

async fn submit(
    backend: &Backend,
    config: &AppConfig,
    policy: ValidationPolicy,
    draft: TransactionDraft,
) -> anyhow::Result<()> {
    let mut accounts = backend.repository::<Account>();
    let options = ListOptions::from(PageRequest {
        page: 1,
        per_page: config.listing.page_size,
    })
    .with_filters(ListFilters::active_only());
    let known = match accounts.list(options).await {
        Ok(items) => items.to_vec(),
        Err(err) => {
            warn!(error = %err, "accounts unavailable; lines keep their entered labels");
            Vec::new()
        }
    };

    let mut transactions = backend.repository::<Transaction>();
    let mut composer = TransactionComposer::with_draft(
        TransactionGateway::new(Arc::clone(&backend.remote)),
        policy,
        draft,
    );

    match composer.submit(&mut transactions, &known).await {
        Ok(committed) => print_json(&json!({
            "state": composer.state().to_string(),
            "transaction_id": committed.transaction_id,
            "line_ids": committed.line_ids,
            "message": committed.message,
        })),
        Err(err) => {
            warn!(state = %composer.state(), code = err.error_code(), "submission not committed");
            if let Some(raw) = err.raw_response() {
                eprintln!("{raw}");
            }
            Err(err.into())
        }
    }
}

async fn list_page<E: Entity>(backend: &Backend, options: ListOptions) -> anyhow::Result<()> {
    let mut repository = backend.repository::<E>();
    let items = repository.list(options).await?;
    print_json(&items)
}

async fn deactivate<E: Entity>(backend: &Backend, id: &str) -> anyhow::Result<()> {
    let mut repository = backend.repository::<E>();
    let record = repository.deactivate(id).await?;
    print_json(&record)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
