//! Terminal client for the UWV chatbot
//!
//! Without a subcommand the interactive chat opens. `ask` and `models` talk to
//! the backend once and print the result.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uwv_chat_core::{ChatSession, Config, ConversationStore};

mod app;
mod handler;
mod markdown;
mod tui;
mod ui;

use app::App;

#[derive(Parser)]
#[command(name = "uwv-chat")]
#[command(about = "Chat with the UWV chatbot from your terminal")]
#[command(version)]
struct Cli {
    /// Chat backend base URL (overrides UWV_CHAT_API_URL and the config file)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Show assistant replies as plain text instead of formatted markdown
    #[arg(long, global = true)]
    plain: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Log file for the interactive chat (default: cache dir)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a conversation, send one message and print the reply
    Ask {
        /// Your question
        text: String,
    },
    /// List the models the backend offers
    Models,
    /// Write the default config file if none exists
    InitConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Could not read config, using defaults: {}", e);
            Config::new()
        }
    };
    if cli.plain {
        config.render_markdown = false;
    }

    match cli.command {
        None => {
            init_file_logging(cli.log_file, cli.debug)?;
            run_tui(&config, cli.base_url.as_deref()).await
        }
        Some(Commands::Ask { text }) => {
            init_stderr_logging(cli.debug);
            ask(&config, cli.base_url.as_deref(), &text).await
        }
        Some(Commands::Models) => {
            init_stderr_logging(cli.debug);
            list_models(&config, cli.base_url.as_deref()).await
        }
        Some(Commands::InitConfig) => init_config(),
    }
}

fn env_filter(debug: bool) -> EnvFilter {
    let default_filter = if debug { "debug" } else { "warn" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter))
}

/// The chat owns the terminal, so logs go to a file.
fn init_file_logging(log_file: Option<PathBuf>, debug: bool) -> Result<()> {
    let path = match log_file {
        Some(path) => path,
        None => dirs::cache_dir()
            .context("Could not determine cache directory")?
            .join("uwv-chat")
            .join("uwv-chat.log"),
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Could not open log file {}", path.display()))?;

    tracing_subscriber::registry()
        .with(env_filter(debug))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();

    tracing::debug!("logging to {}", path.display());
    Ok(())
}

fn init_stderr_logging(debug: bool) {
    tracing_subscriber::registry()
        .with(env_filter(debug))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run_tui(config: &Config, base_url: Option<&str>) -> Result<()> {
    let client = config.build_client(base_url)?;
    tracing::info!(base_url = client.base_url(), "starting chat");

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new();

    let mut app = App::new(config, client, events.sender());
    app.on_startup();

    let result = async {
        while !app.should_quit {
            terminal.draw(|frame| ui::render(&mut app, frame))?;
            match events.next().await {
                Some(event) => handler::handle_event(&mut app, event),
                None => break,
            }
        }
        Ok::<(), anyhow::Error>(())
    }
    .await;

    tui::restore()?;
    result
}

async fn ask(config: &Config, base_url: Option<&str>, text: &str) -> Result<()> {
    let texts = config.texts.clone();
    if config.maintenance {
        println!("{}\n{}", texts.maintenance_title, texts.maintenance_body);
        return Ok(());
    }

    let client = config.build_client(base_url)?;
    let mut session = ChatSession::new(client, ConversationStore::new(texts));

    session.start_conversation().await;
    if !session.send_message(text).await {
        anyhow::bail!("Nothing to send: the message is empty");
    }

    if let Some(reply) = session.store().last() {
        let lines = if config.render_markdown {
            markdown::render(&reply.content)
        } else {
            markdown::render_plain(&reply.content)
        };
        for line in lines {
            let rendered: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
            println!("{}", rendered);
        }
    }
    Ok(())
}

async fn list_models(config: &Config, base_url: Option<&str>) -> Result<()> {
    let client = config.build_client(base_url)?;
    let mut session = ChatSession::new(client, ConversationStore::new(config.texts.clone()));
    session.list_models().await;

    let store = session.store();
    if store.available_models().is_empty() {
        println!(
            "No models available from {} (run with --debug for details)",
            session.client().base_url()
        );
        return Ok(());
    }
    for model in store.available_models() {
        let marker = if Some(model.as_str()) == store.selected_model() { "*" } else { " " };
        println!("{} {}", marker, model);
    }
    Ok(())
}

fn init_config() -> Result<()> {
    let path = Config::get_config_path()?;
    if path.exists() {
        println!("Config already exists at {}", path.display());
        return Ok(());
    }
    let written = Config::new().save()?;
    println!("Wrote default config to {}", written.display());
    Ok(())
}
