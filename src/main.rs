use chrono::Datelike;

mod ai;
mod config;
mod db;
mod error;
mod models;
mod pipeline;
mod report;
mod review;
mod services;

use ai::ClaudeAnnotator;
use config::Config;
use db::ArticleStore;
use error::{AppError, Result};
use pipeline::{run_annotate, run_fetch, run_sync};
use review::run_review_console;
use services::{HttpContentFetcher, HttpListingFetcher};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (only show warnings and errors by default)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("help");

    if matches!(command, "help" | "--help" | "-h") {
        print_usage();
        return Ok(());
    }

    let config = Config::load()?;
    let store = ArticleStore::open(&config.db_path).await?;

    let result = dispatch(command, &args, &config, &store).await;
    store.close().await?;

    if let Err(e) = &result {
        eprintln!("Error: {}", e);
    }
    result
}

async fn dispatch(
    command: &str,
    args: &[String],
    config: &Config,
    store: &ArticleStore,
) -> Result<()> {
    match command {
        "sync" => {
            let pages = parse_flag(args, "--pages")?.unwrap_or(config.pages);
            let summary = run_sync(store, &listing_fetcher(config), pages).await?;
            println!("sync: {summary}");
        }
        "fetch" => {
            let limit = parse_flag(args, "--limit")?.unwrap_or(config.batch_limit);
            let summary = run_fetch(store, &content_fetcher(config), limit).await?;
            println!("fetch: {summary}");
        }
        "annotate" => {
            let limit = parse_flag(args, "--limit")?.unwrap_or(config.batch_limit);
            let annotator = annotator(config)?;
            let summary =
                run_annotate(store, &annotator, limit, config.annotate_retries).await?;
            println!("annotate: {summary}");
        }
        "run" => {
            // One full pass: stages run sequentially and only talk to each
            // other through store state.
            let summary = run_sync(store, &listing_fetcher(config), config.pages).await?;
            println!("sync: {summary}");
            let summary =
                run_fetch(store, &content_fetcher(config), config.batch_limit).await?;
            println!("fetch: {summary}");
            let annotator = annotator(config)?;
            let summary = run_annotate(
                store,
                &annotator,
                config.batch_limit,
                config.annotate_retries,
            )
            .await?;
            println!("annotate: {summary}");
        }
        "review" => {
            run_review_console(store).await?;
        }
        "report" => {
            let year =
                parse_flag(args, "--year")?.unwrap_or_else(|| chrono::Utc::now().year());
            let articles = store.select_for_report(year).await?;
            let digest = report::compile(year, &articles);

            let output = if has_flag(args, "--json") {
                serde_json::to_string_pretty(&digest)?
            } else {
                report::render_markdown(&digest)
            };

            match flag_value(args, "--out") {
                Some(path) => {
                    std::fs::write(&path, output)?;
                    println!("Wrote report with {} summaries to {path}", digest.total);
                }
                None => println!("{output}"),
            }
        }
        "status" => {
            for (status, count) in store.status_counts().await? {
                println!("{:>26}  {}", status.as_str(), count);
            }
        }
        "delete" => {
            let url = args
                .get(2)
                .ok_or_else(|| AppError::Config("usage: semi-weekly delete <url>".into()))?;
            store.delete(url).await?;
            println!("deleted {url}");
        }
        other => {
            eprintln!("unknown command: {other}");
            print_usage();
        }
    }
    Ok(())
}

fn listing_fetcher(config: &Config) -> HttpListingFetcher {
    HttpListingFetcher::new(
        &config.listing_base_url,
        &config.listing_path,
        &config.source_name,
        config.request_timeout(),
    )
}

fn content_fetcher(config: &Config) -> HttpContentFetcher {
    HttpContentFetcher::new(config.request_timeout())
}

fn annotator(config: &Config) -> Result<ClaudeAnnotator> {
    let api_key = config.anthropic_api_key.clone().ok_or_else(|| {
        AppError::Config(format!(
            "anthropic_api_key is not set in {}",
            Config::config_path().display()
        ))
    })?;
    Ok(ClaudeAnnotator::new(
        api_key,
        config.annotation_model.clone(),
        config.request_timeout(),
    ))
}

fn flag_value(args: &[String], name: &str) -> Option<String> {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn has_flag(args: &[String], name: &str) -> bool {
    args.iter().any(|a| a == name)
}

fn parse_flag<T: std::str::FromStr>(args: &[String], name: &str) -> Result<Option<T>> {
    match flag_value(args, name) {
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| AppError::Config(format!("invalid value for {name}: {raw}"))),
        None => Ok(None),
    }
}

fn print_usage() {
    println!(
        "semi-weekly - semiconductor industry news tracker

USAGE:
    semi-weekly <command> [options]

COMMANDS:
    sync      [--pages N]          discover new articles from listing pages
    fetch     [--limit N]          fetch bodies for discovered articles
    annotate  [--limit N]          classify and summarize fetched articles
    run                            sync, fetch, annotate in one pass
    review                         walk the pending queue interactively
    report    [--year Y] [--out PATH] [--json]
                                   compile the weekly digest of approved items
    status                         show article counts per pipeline state
    delete    <url>                hard-delete one article
    help                           show this message"
    );
}
