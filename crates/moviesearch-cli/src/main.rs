//! moviesearch - movie search CLI backed by the OMDb API.

/// Application configuration (TOML).
mod config;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::instrument;
use tracing_subscriber::filter::EnvFilter;
#[cfg(not(feature = "otel"))]
use tracing_subscriber::fmt;
#[cfg(feature = "otel")]
use tracing_subscriber::layer::SubscriberExt;
#[cfg(feature = "otel")]
use tracing_subscriber::util::SubscriberInitExt;
use url::Url;

use crate::config::{AppConfig, resolve_config_path};
use moviesearch_api::omdb::{LocalOmdbApi, OmdbClient, decode_poster};
use moviesearch_api::rows::collect_plots;
use moviesearch_api::session::{LoadOutcome, SearchSession};

/// Environment variable that overrides `omdb.api_key`.
const API_KEY_ENV: &str = "OMDB_API_KEY";

/// CLI argument parser.
#[derive(Parser)]
#[command(about, version)]
struct Cli {
    /// Override config directory.
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Search movies by title.
    Search(SearchArgs),
    /// Show the short plot of a movie.
    Plot(PlotArgs),
    /// Download and validate a poster image.
    Poster(PosterArgs),
    /// Write the OMDb settings to the config file.
    Init(InitArgs),
}

/// Arguments for the `search` subcommand.
#[derive(clap::Args)]
struct SearchArgs {
    /// Title search text (e.g. "alien").
    #[arg(long, required = true)]
    query: String,

    /// Number of result pages to load.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pages: u32,

    /// Also fetch the short plot of every result.
    #[arg(long)]
    plots: bool,
}

/// Arguments for the `plot` subcommand.
#[derive(clap::Args)]
struct PlotArgs {
    /// IMDb id (e.g. "tt0078748").
    #[arg(long, required = true)]
    id: String,
}

/// Arguments for the `poster` subcommand.
#[derive(clap::Args)]
struct PosterArgs {
    /// Poster URL as returned by a search.
    #[arg(long, required = true)]
    url: String,

    /// File to write the image to.
    #[arg(long, required = true)]
    output: PathBuf,
}

/// Arguments for the `init` subcommand.
#[derive(clap::Args)]
struct InitArgs {
    /// OMDb API key.
    #[arg(long, required = true)]
    api_key: String,

    /// Endpoint override.
    #[arg(long)]
    base_url: Option<Url>,

    /// Request timeout in seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,
}

/// Builds an `OmdbClient` from the config file and `OMDB_API_KEY`.
///
/// # Errors
///
/// Returns an error if the config cannot be loaded, no API key is
/// available, `omdb.base_url` is invalid, or the client fails to build.
#[instrument(skip_all)]
fn build_omdb_client(dir: Option<&PathBuf>) -> Result<OmdbClient> {
    let path = resolve_config_path(dir)?;
    let config = AppConfig::load(&path)?;

    let api_key = config
        .api_key(std::env::var(API_KEY_ENV).ok())
        .with_context(|| {
            format!(
                "OMDb API key is required: set {API_KEY_ENV} or omdb.api_key in {}",
                path.display()
            )
        })?;

    let mut builder = OmdbClient::builder().api_key(api_key).user_agent(concat!(
        env!("CARGO_PKG_NAME"),
        "/",
        env!("CARGO_PKG_VERSION")
    ));
    if let Some(raw) = config.omdb.base_url.as_deref() {
        let url = Url::parse(raw).with_context(|| format!("invalid omdb.base_url '{raw}'"))?;
        builder = builder.base_url(url);
    }
    if let Some(secs) = config.omdb.timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }

    builder.build().context("failed to build OMDb client")
}

/// Runs the `search` subcommand.
///
/// # Errors
///
/// Returns an error if the client fails to build or a search request fails.
#[instrument(skip_all)]
async fn run_search(args: &SearchArgs, dir: Option<&PathBuf>) -> Result<()> {
    let client = Arc::new(build_omdb_client(dir)?);
    let session = SearchSession::new(Arc::clone(&client));

    let outcome = session
        .new_search(&args.query)
        .await
        .context("OMDb search request failed")?;
    if outcome == LoadOutcome::NoQuery {
        tracing::warn!("Search query is empty");
        return Ok(());
    }

    for _ in 1..args.pages {
        match session
            .load_more()
            .await
            .context("OMDb search page request failed")?
        {
            LoadOutcome::Appended(count) => tracing::debug!(count, "Loaded next page"),
            LoadOutcome::Exhausted => {
                tracing::debug!("No more results");
                break;
            }
            other => {
                tracing::debug!(?other, "Pagination stopped");
                break;
            }
        }
    }

    let results = session.results();
    let plots = if args.plots {
        collect_plots(client, &results).await
    } else {
        HashMap::new()
    };

    tracing::info!(
        "Results: {} of {} (pages loaded: {})",
        results.len(),
        session
            .total_results()
            .map_or_else(|| String::from("-"), |total| total.to_string()),
        session.current_page()
    );
    tracing::info!("ID\t\tYear\tTitle");
    for movie in &results {
        tracing::info!("{}\t{}\t{}", movie.id(), movie.year(), movie.title());
        if let Some(plot) = plots.get(movie.id()).filter(|plot| !plot.is_empty()) {
            tracing::info!("\t\t\t{plot}");
        }
    }

    Ok(())
}

/// Runs the `plot` subcommand.
///
/// # Errors
///
/// Returns an error if the client fails to build or the lookup fails.
#[instrument(skip_all)]
async fn run_plot(args: &PlotArgs, dir: Option<&PathBuf>) -> Result<()> {
    let client = build_omdb_client(dir)?;

    let plot = client
        .fetch_plot(&args.id)
        .await
        .context("OMDb plot request failed")?;

    if plot.is_empty() {
        tracing::info!("{}: no plot available", args.id);
    } else {
        tracing::info!("{}: {plot}", args.id);
    }

    Ok(())
}

/// Runs the `poster` subcommand.
///
/// # Errors
///
/// Returns an error if the request fails, the bytes are not an image, or
/// the output file cannot be written.
#[instrument(skip_all)]
async fn run_poster(args: &PosterArgs, dir: Option<&PathBuf>) -> Result<()> {
    let client = build_omdb_client(dir)?;

    let poster = client
        .fetch_poster(&args.url)
        .await
        .context("poster request failed")?;
    let decoded = decode_poster(poster).context("poster is not a valid image")?;

    std::fs::write(&args.output, &decoded.bytes)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    tracing::info!(
        "Saved {}x{} {:?} poster to {}",
        decoded.width,
        decoded.height,
        decoded.format,
        args.output.display()
    );

    Ok(())
}

/// Runs the `init` subcommand.
///
/// # Errors
///
/// Returns an error if the config cannot be loaded or saved.
fn run_init(args: &InitArgs, dir: Option<&PathBuf>) -> Result<()> {
    let path = resolve_config_path(dir)?;
    let mut config = AppConfig::load(&path)?;

    config.omdb.api_key = Some(args.api_key.clone());
    if let Some(url) = &args.base_url {
        config.omdb.base_url = Some(url.to_string());
    }
    if let Some(secs) = args.timeout_secs {
        config.omdb.timeout_secs = Some(secs);
    }

    config.save(&path)?;
    tracing::info!("Saved config to {}", path.display());

    Ok(())
}

/// Entry point.
///
/// # Errors
///
/// Returns an error if subcommand execution fails.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    #[cfg(not(feature = "otel"))]
    {
        fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_target(false)
            .init();
    }

    #[cfg(feature = "otel")]
    {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);

        let otel_layer = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
            .ok()
            .and_then(|_| {
                let exporter = opentelemetry_otlp::SpanExporter::builder()
                    .with_http()
                    .build()
                    .ok()?;

                let tracer_provider = opentelemetry_sdk::trace::SdkTracerProvider::builder()
                    .with_simple_exporter(exporter)
                    .build();

                let tracer = opentelemetry::trace::TracerProvider::tracer(
                    &tracer_provider,
                    env!("CARGO_PKG_NAME"),
                );
                opentelemetry::global::set_tracer_provider(tracer_provider);

                Some(tracing_opentelemetry::layer().with_tracer(tracer))
            });

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .with(otel_layer)
            .init();
    }

    let cli = Cli::parse();
    match cli.command {
        Commands::Search(args) => run_search(&args, cli.dir.as_ref()).await,
        Commands::Plot(args) => run_plot(&args, cli.dir.as_ref()).await,
        Commands::Poster(args) => run_poster(&args, cli.dir.as_ref()).await,
        Commands::Init(args) => run_init(&args, cli.dir.as_ref()),
    }
}
