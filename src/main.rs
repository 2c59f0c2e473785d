use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info, warn};

use endee_chat::api::{self, ApiClient, Backend};
use endee_chat::app::App;
use endee_chat::logging::{self, LogTarget};
use endee_chat::state::Conversation;
use endee_chat::{handler, tui, ui, Config, Mode};

#[derive(Parser, Debug)]
#[command(name = "endee-chat")]
#[command(version, about = "Chat with your documents through an Endee RAG backend")]
struct Cli {
    /// Base URL of the RAG backend
    #[arg(long, global = true, env = "ENDEE_API_URL")]
    api_url: Option<String>,

    /// Log file for the interactive UI
    #[arg(long)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask a single question and print the formatted reply
    Ask {
        /// Your question
        question: String,
        /// Response mode: search or chat
        #[arg(short, long, value_parser = parse_mode)]
        mode: Option<Mode>,
    },
    /// Upload a document for indexing
    Ingest {
        /// Path to a .pdf, .txt or .md file
        file: PathBuf,
    },
    /// Check that the backend is reachable
    Status,
}

fn parse_mode(s: &str) -> Result<Mode, String> {
    Mode::from_str(s).ok_or_else(|| format!("unknown mode '{}' (expected search or chat)", s))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logging is not up yet, so a bad config file is reported once it is
    let (config, config_error) = match Config::load() {
        Ok(config) => (config, None),
        Err(e) => (Config::new(), Some(e)),
    };
    let api_url = config.resolve_api_url(cli.api_url.as_deref());
    let client = ApiClient::new(&api_url);

    match cli.command {
        None => {
            let log_path = match cli.log_file {
                Some(path) => path,
                None => logging::default_log_path()?,
            };
            logging::init(&LogTarget::File(log_path))?;
            report_config_error(config_error);
            run_tui(Arc::new(client), api_url, config.resolve_mode()).await
        }
        Some(command) => {
            logging::init(&LogTarget::Stderr)?;
            report_config_error(config_error);
            debug!("Starting endee-chat with arguments: {:?}", command);
            run_command(&client, command, config.resolve_mode()).await
        }
    }
}

fn report_config_error(error: Option<anyhow::Error>) {
    if let Some(e) = error {
        warn!("Ignoring config file, using defaults: {:#}", e);
    }
}

async fn run_tui(backend: Arc<dyn Backend>, api_url: String, mode: Mode) -> Result<()> {
    info!("Starting endee-chat v{} against {}", env!("CARGO_PKG_VERSION"), api_url);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new(tui::TICK_RATE);

    let picker_dir = std::env::current_dir()?;
    let mut app = App::new(backend, api_url, mode, picker_dir, events.sender());
    app.check_backend();

    let result = async {
        while !app.should_quit {
            terminal.draw(|frame| ui::render(&mut app, frame))?;

            match events.next().await {
                Some(event) => handler::handle_event(&mut app, event)?,
                None => break,
            }
        }
        Ok::<(), anyhow::Error>(())
    }
    .await;

    tui::restore()?;
    info!("Exiting endee-chat");
    result
}

/// One-shot commands reuse the conversation transitions so their output
/// matches what the interactive UI would append.
async fn run_command(client: &ApiClient, command: Commands, default_mode: Mode) -> Result<()> {
    match command {
        Commands::Ask { question, mode } => {
            let mode = mode.unwrap_or(default_mode);
            let mut conversation = Conversation::new(mode);
            let query = conversation
                .submit_query(&question)
                .ok_or_else(|| anyhow!("Question must not be empty"))?;
            let outcome = client.query(&query, mode).await;
            conversation.finish_query(mode, outcome);
            print_last_reply(&conversation);
        }
        Commands::Ingest { file } => {
            let filename = api::file_name(&file);
            let mut conversation = Conversation::new(default_mode);
            conversation.begin_upload();
            let outcome = client.ingest_path(&file).await;
            conversation.finish_upload(&filename, outcome);
            print_last_reply(&conversation);
        }
        Commands::Status => {
            let status = client.status().await?;
            println!(
                "{} at {}: {}",
                status.service,
                client.base_url(),
                status.status
            );
        }
    }
    Ok(())
}

fn print_last_reply(conversation: &Conversation) {
    if let Some(reply) = conversation.messages().last() {
        println!("{}", reply.content);
    }
}
