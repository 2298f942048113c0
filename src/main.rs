use anyhow::{Context, Result};
use clap::Parser;
use moon_catalog::bot::{TelegramClient, run_polling};
use moon_catalog::catalog::{BookRecord, CatalogStore};
use moon_catalog::cli::{Cli, Commands};
use moon_catalog::config::{
    publish_settings, resolve_catalog_path, resolve_telegram_api, resolve_telegraph_api,
    resolve_token,
};
use moon_catalog::indexer::{CatalogState, Indexer};
use moon_catalog::page::PageDraft;
use moon_catalog::partition::partition;
use moon_catalog::publish::{IndexRow, PublishFailure, Publisher, ThreadPacer};
use moon_catalog::query::{Keyword, random_pick, search};
use moon_catalog::telegraph::TelegraphClient;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let store = load_store(&cli)?;

    match cli.effective_command() {
        Commands::Run {
            token,
            telegram_api,
        } => {
            let token = resolve_token(token.as_deref())?;
            let state = CatalogState::new(store);
            let indexer = Indexer::spawn(
                state.clone(),
                TelegraphClient::new(resolve_telegraph_api(&cli)),
                ThreadPacer,
                publish_settings(&cli),
            );

            let shutdown = Arc::new(AtomicBool::new(false));
            for signal in [signal_hook::consts::SIGINT, signal_hook::consts::SIGTERM] {
                signal_hook::flag::register(signal, Arc::clone(&shutdown))
                    .context("Failed to install signal handler")?;
            }

            let api = resolve_telegram_api(telegram_api.as_deref());
            let client = TelegramClient::new(&api, &token);
            let polled = run_polling(&client, &state, shutdown);
            tracing::info!("bot stopped");
            indexer.shutdown();
            polled?;
        }
        Commands::Search { keywords } => {
            let keyword = Keyword::from_args(keywords.as_slice())?;
            let results = search(store.records(), &keyword);
            let output = SearchOutput {
                keyword: results.keyword.clone(),
                total: results.total,
                shown: results.shown.len(),
                more: results.more(),
                results: results.shown.clone(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Commands::Random => {
            let book = random_pick(store.records(), &mut rand::thread_rng())?;
            println!("{}", serde_json::to_string_pretty(book)?);
        }
        Commands::Publish { dry_run: true } => {
            let output = render_pages(&cli, &store);
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Commands::Publish { dry_run: false } => {
            let output = publish_now(&cli, &store)?;
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Commands::Stats => {
            let letters: BTreeMap<String, usize> = partition(store.records())
                .iter()
                .map(|g| (g.letter.to_string(), g.len()))
                .collect();
            let output = StatsOutput {
                catalog: resolve_catalog_path(&cli)?.display().to_string(),
                books: store.len(),
                fingerprint: store.fingerprint().to_string(),
                letters,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

fn load_store(cli: &Cli) -> Result<CatalogStore> {
    let path = resolve_catalog_path(cli)?;
    let store = CatalogStore::load(&path).with_context(|| {
        format!(
            "Failed to load catalog (make sure {} exists and has `title` and `link` columns)",
            path.display()
        )
    })?;
    if store.is_empty() {
        anyhow::bail!("Catalog {} contains no books", path.display());
    }
    tracing::info!(books = store.len(), path = %path.display(), "loaded catalog");
    Ok(store)
}

#[derive(Debug, Serialize)]
struct SearchOutput<'a> {
    keyword: String,
    total: usize,
    shown: usize,
    more: usize,
    results: Vec<&'a BookRecord>,
}

#[derive(Debug, Serialize)]
struct PublishOutput {
    published: usize,
    failed: Vec<PublishFailure>,
    letters: Vec<IndexRow>,
}

#[derive(Debug, Serialize)]
struct PageOutput {
    letter: String,
    title: String,
    count: usize,
    html: String,
}

#[derive(Debug, Serialize)]
struct StatsOutput {
    catalog: String,
    books: usize,
    fingerprint: String,
    letters: BTreeMap<String, usize>,
}

fn publish_now(cli: &Cli, store: &CatalogStore) -> Result<PublishOutput> {
    let service = TelegraphClient::new(resolve_telegraph_api(cli));
    let settings = publish_settings(cli);
    let groups = partition(store.records());
    let report = Publisher::new(&service, &ThreadPacer, &settings)
        .publish_all(&groups, &())
        .context("Publishing aborted")?;

    Ok(PublishOutput {
        published: report.index.len(),
        letters: report.index.rows(),
        failed: report.failures,
    })
}

fn render_pages(cli: &Cli, store: &CatalogStore) -> Vec<PageOutput> {
    let settings = publish_settings(cli);
    partition(store.records())
        .iter()
        .map(|group| {
            let draft = PageDraft::for_group(&settings.title_prefix, group);
            PageOutput {
                letter: group.letter.to_string(),
                count: group.len(),
                html: draft.to_html(),
                title: draft.title,
            }
        })
        .collect()
}
