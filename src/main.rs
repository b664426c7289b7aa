use anyhow::{Context, Result};
use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

mod api;
mod app;
mod config;
mod exchange;
mod handler;
mod history;
mod reveal;
mod session;
mod surface;
mod tui;
mod ui;

use api::ChatClient;
use app::App;
use config::{Config, DEFAULT_MAX_TOKENS};
use tui::EventHandler;

#[derive(Parser)]
#[command(name = "charla")]
#[command(about = "Terminal chat client for OpenAI-compatible completion endpoints")]
struct Cli {
    /// Chat-completions endpoint URL
    #[arg(long)]
    endpoint: Option<String>,

    /// API key (overrides CHARLA_API_KEY and the config file)
    #[arg(long)]
    api_key: Option<String>,

    /// Response size bound sent with every request
    #[arg(long)]
    max_tokens: Option<u32>,

    /// Write the resolved settings to the config file and exit
    #[arg(long)]
    save_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load().unwrap_or_default();
    let _log_guard = init_tracing()?;

    let endpoint = cli
        .endpoint
        .or_else(|| config.endpoint.clone())
        .context("no endpoint configured; pass --endpoint or set it in config.json")?;
    let api_key = cli
        .api_key
        .or_else(|| config.resolve_api_key())
        .context("no API key; pass --api-key, set CHARLA_API_KEY, or add it to config.json")?;
    let max_tokens = cli
        .max_tokens
        .or(config.max_tokens)
        .unwrap_or(DEFAULT_MAX_TOKENS);

    if cli.save_config {
        Config {
            endpoint: Some(endpoint),
            api_key: Some(api_key),
            max_tokens: Some(max_tokens),
        }
        .save()?;
        println!("Configuration saved");
        return Ok(());
    }

    let client = ChatClient::new(&endpoint, &api_key, max_tokens);
    let (mut app, mut exchange_rx) = App::new(client);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();

    // Restore the terminal whether the loop exits cleanly or not
    let result = run(&mut terminal, &mut app, &mut events, &mut exchange_rx).await;
    tui::restore()?;
    result
}

async fn run(
    terminal: &mut tui::Tui,
    app: &mut App,
    events: &mut EventHandler,
    exchange_rx: &mut tokio::sync::mpsc::UnboundedReceiver<exchange::ExchangeEvent>,
) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        tokio::select! {
            Some(event) = events.next() => handler::handle_event(app, event),
            Some(outcome) = exchange_rx.recv() => app.session.on_exchange_event(outcome),
            else => break,
        }
    }
    Ok(())
}

/// File logging, enabled by `CHARLA_LOG` (an env-filter directive);
/// stdout and stderr belong to the TUI.
fn init_tracing() -> Result<Option<WorkerGuard>> {
    if std::env::var("CHARLA_LOG").is_err() {
        return Ok(None);
    }

    let appender = tracing_appender::rolling::never(Config::log_dir()?, "charla.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_env("CHARLA_LOG"))
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Ok(Some(guard))
}
