//! `worldhud` binary: loads configuration, wires the LLM provider and the
//! document store, and launches the server.

use anyhow::{Context, anyhow};
use autoagents_llm::LLMProvider;
use autoagents_llm::backends::openai::OpenAI;
use autoagents_llm::builder::LLMBuilder;
use clap::Parser;
use log::{error, info};
use std::net::IpAddr;
use std::sync::Arc;
use worldhud_config::HudConfig;
use worldhud_core::{HudService, LlmGateway};
use worldhud_server::{Relay, build_rocket_with};
use worldhud_store::open_store;

/// Command-line overrides for the server.
#[derive(Parser)]
#[command(name = "worldhud", version)]
struct Cli {
    /// Address to bind (overrides ROCKET_ADDRESS).
    #[arg(long)]
    address: Option<IpAddr>,
    /// Port to bind (overrides ROCKET_PORT).
    #[arg(long)]
    port: Option<u16>,
    /// Document store URL (overrides HUD_STORE_URL).
    #[arg(long)]
    store_url: Option<String>,
}

#[rocket::main]
async fn main() -> anyhow::Result<()> {
    let _ = env_logger::builder()
        .format_timestamp_millis()
        .parse_default_env()
        .try_init();

    let cli = Cli::parse();
    let mut config = HudConfig::from_env().context("failed to load configuration")?;
    if let Some(url) = cli.store_url {
        config.store.url = url;
    }
    info!(
        "starting world hud (model={}, store={}, database={})",
        config.llm.model, config.store.url, config.store.database
    );

    let store = open_store(&config.store).context("failed to open document store")?;
    let llm: Arc<dyn LLMProvider> = LLMBuilder::<OpenAI>::new()
        .api_key(config.llm.api_key.clone())
        .model(config.llm.model.clone())
        .build()
        .context("failed to build OpenAI LLM provider")?;
    let service = HudService::new(LlmGateway::new(llm, config.llm.model.clone()), store);

    let mut figment = rocket::Config::figment();
    if let Some(address) = cli.address {
        figment = figment.merge(("address", address));
    }
    if let Some(port) = cli.port {
        figment = figment.merge(("port", port));
    }

    if let Err(err) = build_rocket_with(figment, service, Relay::new())
        .launch()
        .await
    {
        error!("server stopped with error: {err}");
        return Err(anyhow!("server stopped with error: {err}"));
    }
    Ok(())
}
