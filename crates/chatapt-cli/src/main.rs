//! chatapt - chat with Gemini from the terminal

mod commands;
mod config;
mod ui;

use anyhow::Context;
use chatapt_ai::GeminiClient;
use chatapt_core::{JsonlStore, MessageStore, Orchestrator, SendOutcome};
use clap::Parser;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use commands::{CommandResult, execute_command, list_templates};

/// chatapt - chat with Gemini from the terminal
#[derive(Parser, Debug)]
#[command(name = "chatapt")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Model to use (default: gemini-2.0-flash)
    #[arg(short, long)]
    model: Option<String>,

    /// API key (overrides config and GOOGLE_API_KEY / GEMINI_API_KEY)
    #[arg(long)]
    api_key: Option<String>,

    /// Directory holding messages.jsonl
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Send a single message, print the reply and exit
    #[arg(short = 'c', long)]
    command: Option<String>,

    /// Disable TUI mode (use simple stdin/stdout)
    #[arg(long)]
    no_tui: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Initialize config file
    #[arg(long)]
    init_config: bool,

    /// List models that support generateContent
    #[arg(long)]
    list_models: bool,

    /// Delete all saved messages and exit
    #[arg(long)]
    clear: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.init_config {
        match config::Config::init() {
            Ok(path) => {
                println!("Config file created at: {}", path.display());
                println!("\nExample config:\n{}", config::example_config());
            }
            Err(e) => {
                eprintln!("Error creating config: {}", e);
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    let mut cfg = config::Config::load();
    if args.model.is_some() {
        cfg.model = args.model.clone();
    }
    if args.data_dir.is_some() {
        cfg.data_dir = args.data_dir.clone();
    }
    let data_dir = cfg.data_dir();

    let use_tui = args.command.is_none()
        && !args.no_tui
        && !args.list_models
        && !args.clear
        && cfg.tui.unwrap_or(true);

    if args.verbose {
        // Keep the TUI screen clean by logging to a file
        let log_file = use_tui.then(|| data_dir.join("chatapt.log"));
        init_tracing(log_file.as_deref())?;
    }
    tracing::debug!(model = cfg.model(), data_dir = %data_dir.display(), "starting");

    let store = Arc::new(
        JsonlStore::open(data_dir.join("messages.jsonl"))
            .with_context(|| format!("failed to open message log in {}", data_dir.display()))?,
    );

    if args.clear {
        store.clear().await?;
        println!("Cleared saved messages in {}", store.path().display());
        return Ok(());
    }

    let Some(api_key) = cfg.get_api_key(args.api_key.as_deref()) else {
        eprintln!("Error: No Gemini API key found");
        eprintln!();
        eprintln!("Set your API key with: export GOOGLE_API_KEY=your-key");
        eprintln!("Or add it to config file: chatapt --init-config");
        std::process::exit(1);
    };

    let mut client = GeminiClient::new(api_key)
        .with_model(cfg.model())
        .with_timeout(cfg.request_timeout())?;
    if let Some(base_url) = &cfg.base_url {
        client = client.with_base_url(base_url);
    }

    if args.list_models {
        return list_models(&client).await;
    }

    let orchestrator = Arc::new(Orchestrator::new(
        cfg.conversation_config(),
        store,
        Arc::new(client),
    ));

    let result = if let Some(command) = args.command {
        run_command(&orchestrator, &command).await
    } else if use_tui {
        ui::run_tui(Arc::clone(&orchestrator), cfg.model()).await
    } else {
        run_interactive(&orchestrator, cfg.model()).await
    };

    orchestrator.flush().await;
    orchestrator.shutdown();
    result
}

/// Install the `tracing` subscriber; `RUST_LOG` overrides the default filter
fn init_tracing(log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chatapt=debug"));

    match log_file {
        Some(path) => {
            if let Some(dir) = path.parent() {
                fs::create_dir_all(dir)?;
            }
            let file = File::options().create(true).append(true).open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::sync::Mutex::new(file))
                .with_ansi(false)
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::stderr)
                .init();
        }
    }
    Ok(())
}

async fn list_models(client: &GeminiClient) -> anyhow::Result<()> {
    let models = client.list_models().await?;
    if models.is_empty() {
        println!("No models available.");
        return Ok(());
    }

    println!("Models supporting generateContent:\n");
    for model in &models {
        let marker = if model.id() == client.model() { "*" } else { " " };
        println!("{} {:<36} {}", marker, model.id(), model.display_name);
    }
    Ok(())
}

/// One-shot mode: exits non-zero when no reply was produced
async fn run_command(orchestrator: &Orchestrator, text: &str) -> anyhow::Result<()> {
    match orchestrator.send(text).await {
        SendOutcome::Replied(reply) => {
            println!("{}", reply);
            Ok(())
        }
        SendOutcome::Failed(message) => {
            orchestrator.flush().await;
            eprintln!("Error: {}", message);
            std::process::exit(1);
        }
        SendOutcome::Ignored => anyhow::bail!("Nothing to send"),
        other => anyhow::bail!("Message not sent: {:?}", other),
    }
}

fn print_outcome(outcome: SendOutcome) {
    match outcome {
        SendOutcome::Replied(reply) => println!("{}\n", reply),
        SendOutcome::Failed(message) => eprintln!("Error: {}\n", message),
        SendOutcome::Busy => eprintln!("Still waiting for the last reply\n"),
        SendOutcome::Ignored | SendOutcome::Cancelled => {}
    }
}

/// Line mode (simple stdin/stdout)
async fn run_interactive(orchestrator: &Orchestrator, model: &str) -> anyhow::Result<()> {
    println!("chatapt - {}", model);
    println!("Type /help for commands, /quit to exit.\n");

    let templates = orchestrator.state().templates;
    if !templates.is_empty() {
        println!("{}\n", list_templates(&templates));
    }

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            // EOF
            break;
        }

        let input = line.trim_end_matches(['\r', '\n']);
        if input.trim().is_empty() {
            continue;
        }

        let outcome = match execute_command(input, &templates) {
            None => {
                orchestrator.update_input(input);
                orchestrator.send_message().await
            }
            Some(CommandResult::SendTemplate(template)) => {
                println!("> {}", template);
                orchestrator.send_template(template).await
            }
            Some(CommandResult::Exit) => break,
            Some(CommandResult::Clear) => {
                orchestrator.clear_messages().await?;
                println!("Cleared saved messages.\n");
                continue;
            }
            Some(CommandResult::Delete(id)) => {
                if orchestrator.delete_message(id).await? {
                    println!("Deleted message #{}.\n", id);
                } else {
                    println!("No message #{}.\n", id);
                }
                continue;
            }
            Some(CommandResult::ShowTemplates) => {
                println!("{}\n", list_templates(&templates));
                continue;
            }
            Some(CommandResult::Message(msg)) => {
                println!("{}\n", msg);
                continue;
            }
            Some(CommandResult::Unknown(cmd)) => {
                println!("Unknown command: /{}", cmd);
                println!("Type /help for available commands.\n");
                continue;
            }
        };

        println!();
        print_outcome(outcome);
    }

    Ok(())
}
