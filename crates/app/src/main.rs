//! taskshell entry point.
//!
//! Wires the offline worker, the proxy client, and the terminal renderer
//! together. Logging goes to stderr so stdout stays clean for the checklist.

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use taskshell_client::{FetchClient, FetchConfig, ProxyClient, ShellRequest, ShellWorker, normalize};
use taskshell_core::{AppConfig, AssetManifest, StoreDb};

mod cli;
mod prompt;
mod render;

use cli::{Cli, Commands};
use prompt::InstallPrompt;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load().context("loading configuration")?;
    tracing::info!("taskshell starting against {}", config.base_url);

    match cli.command {
        Commands::Install => install(&config).await,
        Commands::Plan { goal } => plan(&config, &goal).await,
        Commands::Open { path, navigate } => open(&config, &path, navigate).await,
    }
}

/// Build the worker over the configured origin and store.
async fn build_worker(config: &AppConfig) -> Result<ShellWorker<FetchClient>> {
    let store = StoreDb::open(&config.db_path).await?;
    let fetch_config = FetchConfig {
        user_agent: config.user_agent.clone(),
        max_bytes: config.max_bytes,
        timeout: config.timeout(),
    };
    let network = FetchClient::new(&config.base_url, fetch_config)?;
    Ok(ShellWorker::new(store, network, AssetManifest::default()))
}

/// Run the worker lifecycle: mirror the shell if needed, then activate.
async fn bring_up(worker: &mut ShellWorker<FetchClient>) -> Result<()> {
    match InstallPrompt::when_missing(worker.is_installed().await?) {
        Some(offer) => offer.accept(worker).await.context("installing shell assets")?,
        None => worker.install().await.context("installing shell assets")?,
    }
    worker.activate().await.context("activating cache generation")?;
    Ok(())
}

async fn install(config: &AppConfig) -> Result<()> {
    let mut worker = build_worker(config).await?;
    bring_up(&mut worker).await?;
    println!("Offline shell ready ({}).", worker.version());
    Ok(())
}

async fn plan(config: &AppConfig, goal: &str) -> Result<()> {
    let goal = goal.trim();
    if goal.is_empty() {
        bail!("goal must not be empty");
    }

    let mut worker = build_worker(config).await?;
    bring_up(&mut worker).await?;

    // All outbound traffic, the proxy call included, goes through the
    // worker's routing.
    let proxy = ProxyClient::new(worker);

    eprintln!("Thinking…");
    let text = proxy
        .submit(goal)
        .await
        .context("could not fetch tasks; check the connection and the proxy")?;

    let tasks = normalize(&text);
    if tasks.is_empty() {
        println!("No tasks found.");
    } else {
        print!("{}", render::checklist(&tasks));
    }
    Ok(())
}

async fn open(config: &AppConfig, path: &str, navigate: bool) -> Result<()> {
    let mut worker = build_worker(config).await?;
    bring_up(&mut worker).await?;

    let request = if navigate { ShellRequest::navigate(path) } else { ShellRequest::get(path) };
    let response = worker.handle(&request).await?;

    eprintln!(
        "{} {} ({} bytes, {} ms)",
        response.status.as_u16(),
        response.path,
        response.body.len(),
        response.fetch_ms
    );
    print!("{}", response.text());
    Ok(())
}
