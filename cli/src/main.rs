//! CLI entrypoint for lattia
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use lattia_application::{
    IntakeAgent, IntakeService, PiiDetector, RateLimiterRegistry, SessionStore,
};
use lattia_infrastructure::{
    ConfigLoader, FileConfig, JsonlConversationLogger, MemorySessionStore, OpenAiGateway,
    QdrantRetriever, RegexPiiDetector, SqliteSessionStore,
};
use lattia_presentation::{ChatRepl, Cli, Command, serve, spawn_bucket_eviction};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const EVICTION_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity level; RUST_LOG wins when set
    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    if cli.show_config {
        ConfigLoader::print_config_sources();
        return Ok(());
    }

    let mut config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow!("Failed to load configuration: {}", e))?
    };

    let command = cli.command();
    if let Command::Serve {
        bind: Some(bind), ..
    } = &command
    {
        config.server.bind = bind.clone();
    }

    let issues = config.validate();
    if !issues.is_empty() {
        for issue in &issues {
            eprintln!("config: {}", issue);
        }
        bail!("Invalid configuration ({} problem(s))", issues.len());
    }

    info!("Starting lattia");

    // === Dependency Injection ===
    let agent = build_agent(&config)?;
    let pii_detector: Arc<dyn PiiDetector> = Arc::new(RegexPiiDetector::new()?);

    match command {
        Command::Serve { .. } => run_server(&config, agent, pii_detector).await,
        Command::Chat { name } => {
            let mut repl = ChatRepl::new(agent, name).with_pii_detector(pii_detector);
            repl.run().await?;
            Ok(())
        }
    }
}

fn build_agent(config: &FileConfig) -> Result<IntakeAgent> {
    let gateway = OpenAiGateway::from_config(&config.llm)?;
    let mut agent = IntakeAgent::new(Arc::new(gateway), config.agent_params());

    if config.retrieval.enabled {
        let api_key = config.llm.api_key().unwrap_or_default();
        let retriever = QdrantRetriever::new(&config.llm, &config.retrieval, api_key)?;
        agent = agent.with_retriever(Arc::new(retriever));
    }

    if let Some(path) = &config.logging.conversation_log {
        match JsonlConversationLogger::open(path) {
            Some(logger) => {
                info!("Conversation log: {}", logger.path().display());
                agent = agent.with_conversation_logger(Arc::new(logger));
            }
            None => warn!("Conversation log disabled: cannot open {}", path.display()),
        }
    }

    Ok(agent)
}

fn build_store(config: &FileConfig) -> Result<Arc<dyn SessionStore>> {
    if config.database.is_in_memory() {
        info!("Using in-memory session store");
        return Ok(Arc::new(MemorySessionStore::new()));
    }
    let store = SqliteSessionStore::open(&config.database.path)
        .with_context(|| format!("Failed to open database {}", config.database.path))?;
    Ok(Arc::new(store))
}

async fn run_server(
    config: &FileConfig,
    agent: IntakeAgent,
    pii_detector: Arc<dyn PiiDetector>,
) -> Result<()> {
    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .with_context(|| format!("Invalid bind address {}", config.server.bind))?;

    let limiter = Arc::new(RateLimiterRegistry::new(config.rate_limit_params()));
    let service = IntakeService::new(agent, build_store(config)?)
        .with_pii_detector(pii_detector)
        .with_rate_limiter(limiter.clone());

    let shutdown = CancellationToken::new();
    let max_idle = limiter.params().idle_eviction;
    let eviction = spawn_bucket_eviction(limiter, EVICTION_INTERVAL, max_idle, shutdown.clone());

    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown requested");
                signal_token.cancel();
            }
            Err(e) => warn!("Cannot listen for shutdown signal: {}", e),
        }
    });

    serve(Arc::new(service), addr, shutdown.clone()).await?;

    shutdown.cancel();
    let _ = eviction.await;
    Ok(())
}
