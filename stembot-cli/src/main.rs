//! CLI entry point for stembot

mod repl;

use anyhow::{anyhow, bail, Result};
use clap::{Parser, Subcommand};
use console::style;
use dialoguer::{Confirm, Password};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use stembot_core::config::{Config, ConfigLoader};
use stembot_core::export::{self, ExportFormat, RoleFilter, TextEncoder};
use stembot_core::session::SessionStore;
use stembot_core::users::UserStore;
use stembot_core::utils::expand_home;
use stembot_providers::{ChatEndpoint, OllamaClient};

#[derive(Parser)]
#[command(name = "stembot")]
#[command(about = "A terminal chat front-end for a local Ollama-style model server")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration directory
    #[arg(short, long, global = true)]
    config_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a new account
    Register {
        /// Username for the new account
        #[arg(short, long)]
        username: String,
    },
    /// Start an interactive chat
    Chat {
        /// Account to chat as
        #[arg(short, long)]
        username: String,
        /// Model to use
        #[arg(short, long)]
        model: Option<String>,
        /// Session to resume
        #[arg(short, long)]
        session: Option<String>,
        /// UTF-8 text file whose contents open the conversation
        #[arg(long)]
        context_file: Option<PathBuf>,
    },
    /// Send a single prompt and print the reply
    Ask {
        /// Account to ask as
        #[arg(short, long)]
        username: String,
        /// Prompt text
        prompt: String,
        /// Model to use
        #[arg(short, long)]
        model: Option<String>,
        /// Session to continue (a new one is created otherwise)
        #[arg(short, long)]
        session: Option<String>,
    },
    /// List models installed on the server
    Models,
    /// Manage stored sessions
    Sessions {
        #[command(subcommand)]
        command: SessionCommands,
    },
}

#[derive(Subcommand)]
enum SessionCommands {
    /// List sessions, newest first
    List {
        #[arg(short, long)]
        username: String,
    },
    /// Print one session's transcript
    Show {
        #[arg(short, long)]
        username: String,
        /// Session identifier
        session: String,
        /// Transcript page (1 = newest)
        #[arg(short, long, default_value_t = 1)]
        page: usize,
    },
    /// Delete one session
    Delete {
        #[arg(short, long)]
        username: String,
        /// Session identifier
        session: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Delete every session the account has
    Clear {
        #[arg(short, long)]
        username: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Export a session to a document
    Export {
        #[arg(short, long)]
        username: String,
        /// Session identifier
        session: String,
        /// Output format (text, word, pdf, excel, powerpoint)
        #[arg(short, long, default_value = "text")]
        format: String,
        /// Output path (defaults to <session>.<extension>)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Content selection: both, user, assistant
        #[arg(long, default_value = "both")]
        include: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loader = match &cli.config_dir {
        Some(dir) => ConfigLoader::with_dir(dir),
        None => ConfigLoader::new(),
    };
    let config = loader.load()?;
    let _guard = stembot_core::logging::init_logging(&config.logging);

    match cli.command {
        Commands::Register { username } => cmd_register(&config, &username),
        Commands::Chat {
            username,
            model,
            session,
            context_file,
        } => {
            authenticate(&config, &username)?;
            repl::run_chat(&config, &username, model, session, context_file).await
        }
        Commands::Ask {
            username,
            prompt,
            model,
            session,
        } => {
            authenticate(&config, &username)?;
            cmd_ask(&config, &username, &prompt, model, session).await
        }
        Commands::Models => cmd_models(&config).await,
        Commands::Sessions { command } => cmd_sessions(&config, command),
    }
}

fn data_dir(config: &Config) -> PathBuf {
    expand_home(&config.storage.data_dir)
}

fn build_endpoint(config: &Config) -> Arc<OllamaClient> {
    Arc::new(OllamaClient::new(
        &config.server.base_url,
        &config.server.default_model,
        Duration::from_secs(config.server.list_timeout_secs),
    ))
}

fn authenticate(config: &Config, username: &str) -> Result<()> {
    let users = UserStore::new(data_dir(config));
    if !users.exists(username) {
        bail!(
            "unknown user '{}'; create an account with `stembot register`",
            username
        );
    }
    let password = Password::new()
        .with_prompt(format!("Password for {}", username))
        .interact()?;
    if !users.verify(username, &password) {
        bail!("invalid username or password");
    }
    Ok(())
}

fn cmd_register(config: &Config, username: &str) -> Result<()> {
    let users = UserStore::new(data_dir(config));
    let password = Password::new()
        .with_prompt("Password")
        .with_confirmation("Confirm password", "Passwords do not match")
        .interact()?;
    users.register(username, &password)?;
    println!(
        "{} Account '{}' created.",
        style("✓").green(),
        style(username).bold()
    );
    Ok(())
}

async fn cmd_models(config: &Config) -> Result<()> {
    let endpoint = build_endpoint(config);
    let models = endpoint.list_models().await;
    if models.is_empty() {
        println!(
            "No models found. Is the server running at {}?",
            config.server.base_url
        );
    } else {
        for model in models {
            println!("{}", model);
        }
    }
    Ok(())
}

async fn cmd_ask(
    config: &Config,
    username: &str,
    prompt: &str,
    model: Option<String>,
    session: Option<String>,
) -> Result<()> {
    let mut store = SessionStore::new(data_dir(config));
    let endpoint = build_endpoint(config);
    let orchestrator = stembot_chat::ChatOrchestrator::new(
        endpoint,
        Duration::from_secs(config.server.request_timeout_secs),
    );

    let session_id = session.unwrap_or_else(|| store.next_session_id(username));
    let mut messages = store.load(username, &session_id);

    messages.push(stembot_core::session::Message::user(prompt));
    let exchange = orchestrator.send(prompt, &messages, model).await;
    messages.push(exchange.to_message());

    if let Err(e) = store.save(username, &session_id, &messages) {
        tracing::warn!("Failed to save session '{}': {}", session_id, e);
        eprintln!("{} could not save session: {}", style("warning:").yellow(), e);
    }

    repl::print_exchange(&exchange);
    println!("{}", style(format!("session: {}", session_id)).dim());
    Ok(())
}

fn cmd_sessions(config: &Config, command: SessionCommands) -> Result<()> {
    let mut store = SessionStore::new(data_dir(config));
    match command {
        SessionCommands::List { username } => {
            authenticate(config, &username)?;
            let ids = store.list_sessions(&username);
            if ids.is_empty() {
                println!("No sessions.");
            } else {
                for id in ids {
                    println!("{}", id);
                }
            }
            Ok(())
        }
        SessionCommands::Show {
            username,
            session,
            page,
        } => {
            authenticate(config, &username)?;
            let messages = store.load(&username, &session);
            if messages.is_empty() {
                println!("Session '{}' has no messages.", session);
                return Ok(());
            }
            let page_size = config.chat.page_size;
            let shown = export::page_slice(&messages, page, page_size);
            println!(
                "{}",
                export::render_transcript(shown, RoleFilter::Both)
            );
            println!(
                "{}",
                style(format!(
                    "page {}/{} ({} messages)",
                    export::clamp_page(page, messages.len(), page_size),
                    export::page_count(messages.len(), page_size),
                    messages.len()
                ))
                .dim()
            );
            Ok(())
        }
        SessionCommands::Delete {
            username,
            session,
            yes,
        } => {
            authenticate(config, &username)?;
            if !yes
                && !Confirm::new()
                    .with_prompt(format!("Delete session '{}'?", session))
                    .default(false)
                    .interact()?
            {
                return Ok(());
            }
            if store.delete(&username, &session)? {
                println!("Deleted session '{}'.", session);
            } else {
                println!("Session '{}' was not found.", session);
            }
            Ok(())
        }
        SessionCommands::Clear { username, yes } => {
            authenticate(config, &username)?;
            if !yes
                && !Confirm::new()
                    .with_prompt(format!("Delete ALL sessions for '{}'?", username))
                    .default(false)
                    .interact()?
            {
                return Ok(());
            }
            let report = store.delete_all(&username)?;
            for failure in &report.failures {
                eprintln!("{} {}", style("warning:").yellow(), failure);
            }
            println!("Deleted {} session(s).", report.deleted);
            Ok(())
        }
        SessionCommands::Export {
            username,
            session,
            format,
            output,
            include,
        } => {
            authenticate(config, &username)?;
            let format: ExportFormat = format.parse()?;
            let filter = parse_filter(&include)?;
            let messages = store.load(&username, &session);
            if messages.is_empty() {
                bail!("session '{}' has no messages to export", session);
            }

            let path = output
                .unwrap_or_else(|| PathBuf::from(format!("{}.{}", session, format.extension())));
            match format {
                ExportFormat::Text => {
                    export::export_to_file(&path, &TextEncoder, &messages, filter)?;
                }
                other => {
                    // Binary document encoders plug in externally; only the
                    // text encoder ships with the CLI.
                    bail!(
                        "{} export needs an external document encoder; use --format text",
                        other.label()
                    );
                }
            }
            println!("Exported to {}", path.display());
            Ok(())
        }
    }
}

fn parse_filter(include: &str) -> Result<RoleFilter> {
    match include.to_ascii_lowercase().as_str() {
        "both" | "all" => Ok(RoleFilter::Both),
        "user" => Ok(RoleFilter::UserOnly),
        "assistant" => Ok(RoleFilter::AssistantOnly),
        other => Err(anyhow!(
            "unknown content selection '{}'; expected both, user, or assistant",
            other
        )),
    }
}
