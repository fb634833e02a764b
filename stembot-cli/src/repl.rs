//! Interactive chat loop
//!
//! The loop owns an explicit `ChatApp` state struct (user, model, session,
//! transcript page) instead of ambient globals; one exchange is in flight at
//! a time and the session file is rewritten after every exchange.

use anyhow::Result;
use console::style;
use dialoguer::{Confirm, Input};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use stembot_chat::{ChatOrchestrator, Exchange};
use stembot_core::config::Config;
use stembot_core::export::{self, ExportFormat, RoleFilter, TextEncoder};
use stembot_core::session::{Message, Role, SessionStore};
use stembot_providers::{ChatEndpoint, OllamaClient};

use crate::{build_endpoint, data_dir};

/// Interactive chat state
struct ChatApp {
    username: String,
    model: String,
    session_id: Option<String>,
    messages: Vec<Message>,
    page_size: usize,
    store: SessionStore,
    endpoint: Arc<OllamaClient>,
    orchestrator: ChatOrchestrator,
}

/// Run the interactive chat command
pub async fn run_chat(
    config: &Config,
    username: &str,
    model: Option<String>,
    session: Option<String>,
    context_file: Option<PathBuf>,
) -> Result<()> {
    let endpoint = build_endpoint(config);
    let available = endpoint.list_models().await;
    if available.is_empty() {
        println!(
            "{} could not load the model list from {}; continuing with '{}'",
            style("warning:").yellow(),
            config.server.base_url,
            config.server.default_model
        );
    }
    let model = choose_model(model, &available, &config.server.default_model);

    let mut store = SessionStore::new(data_dir(config));
    let messages = match &session {
        Some(id) => store.load(username, id),
        None => Vec::new(),
    };
    if let Some(id) = &session {
        println!(
            "Resumed session '{}' with {} message(s).",
            id,
            messages.len()
        );
    }

    let mut app = ChatApp {
        username: username.to_string(),
        model,
        session_id: session,
        messages,
        page_size: config.chat.page_size,
        store,
        endpoint: endpoint.clone(),
        orchestrator: ChatOrchestrator::new(
            endpoint,
            Duration::from_secs(config.server.request_timeout_secs),
        ),
    };

    println!(
        "Chatting as {} with {}. Type /help for commands.",
        style(&app.username).bold(),
        style(&app.model).bold()
    );

    if let Some(path) = context_file {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        let text = std::fs::read_to_string(&path)?;
        let wrapped = format!("Contents of file '{}':\n\n{}", name, text.trim());
        println!("Sending the contents of '{}' for analysis...", name);
        submit(&mut app, wrapped).await;
    }

    loop {
        let line: String = match Input::new()
            .with_prompt(style("you").cyan().bold().to_string())
            .allow_empty(true)
            .interact_text()
        {
            Ok(line) => line,
            Err(_) => break,
        };
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }
        if let Some(command) = line.strip_prefix('/') {
            if handle_command(&mut app, command).await? {
                break;
            }
            continue;
        }
        submit(&mut app, line).await;
    }

    Ok(())
}

fn choose_model(requested: Option<String>, available: &[String], default: &str) -> String {
    if let Some(model) = requested {
        return model;
    }
    if available.iter().any(|m| m == default) {
        return default.to_string();
    }
    available
        .first()
        .cloned()
        .unwrap_or_else(|| default.to_string())
}

/// Run one exchange: append the prompt, call the endpoint, persist.
async fn submit(app: &mut ChatApp, prompt: String) {
    app.messages.push(Message::user(prompt.as_str()));

    println!("{}", style(format!("… waiting for {}", app.model)).dim());
    let exchange = app
        .orchestrator
        .send(&prompt, &app.messages, Some(app.model.clone()))
        .await;
    app.messages.push(exchange.to_message());

    // A session gets its identifier at the first save
    if app.session_id.is_none() {
        app.session_id = Some(app.store.next_session_id(&app.username));
    }
    if let Some(id) = &app.session_id {
        if let Err(e) = app.store.save(&app.username, id, &app.messages) {
            tracing::warn!("Failed to save session '{}': {}", id, e);
            eprintln!(
                "{} could not save session: {}",
                style("warning:").yellow(),
                e
            );
        }
    }

    print_exchange(&exchange);
}

/// Print one exchange: reasoning block (if any), answer, elapsed time
pub fn print_exchange(exchange: &Exchange) {
    if !exchange.reasoning.is_empty() {
        println!("{}", style("reasoning").dim().italic());
        for line in exchange.reasoning.lines() {
            println!("  {}", style(line).dim());
        }
    }
    if exchange.answer.is_empty() {
        println!("{}", style("(no answer content)").dim());
    } else if exchange.outcome.is_success() {
        println!("{}", exchange.answer);
    } else {
        println!("{}", style(&exchange.answer).yellow());
    }
    println!(
        "{}",
        style(format!("⏱ {:.2}s", exchange.elapsed_seconds)).dim()
    );
}

fn print_message(message: &Message) {
    match message.role {
        Role::User => println!("{} {}", style("You:").cyan().bold(), message.content),
        Role::Assistant => {
            if let Some(reasoning) = message.reasoning_text() {
                println!("{}", style("reasoning").dim().italic());
                for line in reasoning.lines() {
                    println!("  {}", style(line).dim());
                }
            }
            println!(
                "{} {}",
                style("Assistant:").green().bold(),
                message.content
            );
        }
    }
}

/// Handle a `/command`; returns true when the loop should exit
async fn handle_command(app: &mut ChatApp, command: &str) -> Result<bool> {
    let mut parts = command.split_whitespace();
    let name = parts.next().unwrap_or("");
    let rest: Vec<&str> = parts.collect();

    match name {
        "quit" | "exit" | "q" => return Ok(true),
        "help" => {
            println!("/history [page]   show a transcript page (1 = newest)");
            println!("/sessions         list your sessions");
            println!("/switch <id>      load another session");
            println!("/new              start a fresh session");
            println!("/delete           delete the current session");
            println!("/models           list installed models");
            println!("/model <name>     switch model");
            println!("/export <format> [path]   export this session");
            println!("/quit             leave the chat");
        }
        "history" => {
            if app.messages.is_empty() {
                println!("No messages yet.");
                return Ok(false);
            }
            let page = rest
                .first()
                .and_then(|p| p.parse::<usize>().ok())
                .unwrap_or(1);
            let page = export::clamp_page(page, app.messages.len(), app.page_size);
            for message in export::page_slice(&app.messages, page, app.page_size) {
                print_message(message);
            }
            println!(
                "{}",
                style(format!(
                    "page {}/{}",
                    page,
                    export::page_count(app.messages.len(), app.page_size)
                ))
                .dim()
            );
        }
        "sessions" => {
            let ids = app.store.list_sessions(&app.username);
            if ids.is_empty() {
                println!("No stored sessions.");
            }
            for id in ids {
                let marker = if Some(&id) == app.session_id.as_ref() {
                    "*"
                } else {
                    " "
                };
                println!("{} {}", marker, id);
            }
        }
        "switch" => match rest.first() {
            Some(id) => {
                app.messages = app.store.load(&app.username, id);
                app.session_id = Some(id.to_string());
                println!(
                    "Switched to session '{}' ({} message(s)).",
                    id,
                    app.messages.len()
                );
            }
            None => println!("Usage: /switch <session-id>"),
        },
        "new" => {
            app.session_id = None;
            app.messages.clear();
            println!("Started a new session.");
        }
        "delete" => match app.session_id.clone() {
            Some(id) => {
                let confirmed = Confirm::new()
                    .with_prompt(format!("Delete session '{}'?", id))
                    .default(false)
                    .interact()?;
                if confirmed {
                    match app.store.delete(&app.username, &id) {
                        Ok(true) => println!("Deleted session '{}'.", id),
                        Ok(false) => println!("Session '{}' was not found.", id),
                        Err(e) => println!("{} {}", style("warning:").yellow(), e),
                    }
                    app.session_id = None;
                    app.messages.clear();
                }
            }
            None => println!("Nothing saved yet."),
        },
        "models" => {
            let models = app.endpoint.list_models().await;
            if models.is_empty() {
                println!("No models found.");
            }
            for model in models {
                println!("{}", model);
            }
        }
        "model" => match rest.first() {
            Some(model) => {
                app.model = model.to_string();
                println!("Now using {}.", style(&app.model).bold());
            }
            None => println!("Current model: {}", app.model),
        },
        "export" => {
            if app.messages.is_empty() {
                println!("Nothing to export yet.");
                return Ok(false);
            }
            let format: ExportFormat = match rest.first().unwrap_or(&"text").parse() {
                Ok(format) => format,
                Err(e) => {
                    println!("{}", e);
                    return Ok(false);
                }
            };
            if format != ExportFormat::Text {
                println!(
                    "{} export needs an external document encoder; use /export text",
                    format.label()
                );
                return Ok(false);
            }
            let default_name = format!(
                "{}.{}",
                app.session_id.as_deref().unwrap_or("conversation"),
                format.extension()
            );
            let path = PathBuf::from(rest.get(1).copied().unwrap_or(default_name.as_str()));
            match export::export_to_file(&path, &TextEncoder, &app.messages, RoleFilter::Both) {
                Ok(()) => println!("Exported to {}", path.display()),
                Err(e) => println!("{} {}", style("warning:").yellow(), e),
            }
        }
        other => println!("Unknown command '/{}'; try /help.", other),
    }

    Ok(false)
}
