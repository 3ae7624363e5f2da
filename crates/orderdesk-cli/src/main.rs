mod output;
mod session;
mod session_file;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use orderdesk::agents::build_agents;
use orderdesk::config::Config;
use orderdesk::logsearch::LogSearchClient;
use orderdesk::providers::configs::OpenAiProviderConfig;
use orderdesk::providers::openai::OpenAiProvider;
use orderdesk::store::OrderStore;
use orderdesk::turn::TurnExecutor;

use crate::session::Session;
use crate::session_file::ensure_session_dir;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Model identifier, overriding ORDERDESK_MODEL
    #[arg(short, long)]
    model: Option<String>,

    /// Path to the resolution database, overriding ORDERDESK_DB_PATH
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Base URL of the log-search service, overriding ORDERDESK_LOG_SEARCH_URL
    #[arg(long)]
    log_search_url: Option<String>,

    /// Session name; the transcript is recorded under this name
    #[arg(short, long, default_value = "support")]
    session: String,

    /// Resume the named session instead of starting fresh
    #[arg(short, long)]
    resume: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    if let Some(model) = cli.model {
        config.model = model;
    }
    if let Some(db_path) = cli.db_path {
        config.database_path = db_path;
    }
    if let Some(log_search_url) = cli.log_search_url {
        config.log_search_url = log_search_url;
    }

    let store = Arc::new(OrderStore::open(&config.database_path)?);
    let logsearch = Arc::new(LogSearchClient::new(&config.log_search_url)?);
    let agent = build_agents(&config.model, store, logsearch)?;

    let provider = OpenAiProvider::new(OpenAiProviderConfig {
        host: config.model_host.clone(),
        api_key: config.api_key.clone(),
        temperature: config.temperature,
        max_tokens: None,
    })?;
    let executor = TurnExecutor::new(Box::new(provider));

    let session_file = ensure_session_dir()?.join(format!("{}.jsonl", cli.session));
    let mut session = Session::new(executor, agent, session_file);
    if cli.resume {
        session.resume()?;
    }
    session.start().await
}
