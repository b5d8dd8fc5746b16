//! # RagDesk — conversational assistant with topic-routed RAG
//!
//! Usage:
//!   ragdesk init                          # Write ~/.ragdesk/config.toml and sample docs
//!   ragdesk chat                          # Interactive session
//!   ragdesk ask "What is RAG?" --role 1   # One question, one answer
//!   ragdesk roles                         # List role presets

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use ragdesk_agent::RagDesk;
use ragdesk_core::RagDeskConfig;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "ragdesk",
    version,
    about = "💬 RagDesk — conversational assistant with topic-routed RAG"
)]
struct Cli {
    /// Config file (default: ~/.ragdesk/config.toml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive chat (/roles, /role <n>, /new, /quit)
    Chat {
        /// Initial role: preset number, preset label or free text
        #[arg(short, long)]
        role: Option<String>,
    },
    /// Ask a single question and exit
    Ask {
        question: String,
        /// Role: preset number, preset label or free text
        #[arg(short, long)]
        role: Option<String>,
        /// Print the turn as JSON
        #[arg(long)]
        json: bool,
    },
    /// List role presets
    Roles,
    /// Write a default config and sample documents
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },
}

const SAMPLE_ML: &str = "Machine learning builds models that learn patterns from data.\n\n\
Fine-tuning continues the training of a pretrained model on a smaller, task-specific dataset \
so that it adapts to a narrower domain. It updates the model weights, usually with a low \
learning rate, and needs labelled examples.\n";

const SAMPLE_RAG: &str = "Retrieval-augmented generation (RAG) answers questions by first \
retrieving relevant passages from a knowledge base, then injecting them into the prompt of \
a language model.\n\n\
Documents are split into overlapping segments, each segment is embedded into a vector, and \
the vectors are searched by cosine similarity at question time. Unlike fine-tuning, RAG \
leaves the model weights untouched.\n";

fn config_path(cli: &Cli) -> PathBuf {
    match &cli.config {
        Some(p) => PathBuf::from(shellexpand::tilde(p).to_string()),
        None => RagDeskConfig::default_path(),
    }
}

fn load_config(cli: &Cli) -> Result<RagDeskConfig> {
    let path = config_path(cli);
    let config = if cli.config.is_some() || path.exists() {
        RagDeskConfig::load_from(&path)?
    } else {
        tracing::info!("No config at {}, using defaults", path.display());
        RagDeskConfig::default()
    };
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "ragdesk=debug,ragdesk_agent=debug,ragdesk_knowledge=debug,ragdesk_providers=debug"
    } else {
        "ragdesk=info,ragdesk_agent=info,ragdesk_knowledge=info,ragdesk_providers=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Command::Init { force } => init(&config_path(&cli), *force),
        Command::Roles => {
            let config = load_config(&cli)?;
            let roles = ragdesk_agent::RoleCatalog::from_config(&config);
            print_roles(&roles);
            Ok(())
        }
        Command::Ask {
            question,
            role,
            json,
        } => {
            let desk = RagDesk::from_config(load_config(&cli)?).await?;
            let role = desk.roles().resolve(role.as_deref().unwrap_or(""));
            match desk.ask(question, &role).await {
                Ok(outcome) if *json => println!("{}", serde_json::to_string_pretty(&outcome)?),
                Ok(outcome) => println!("{}", outcome.answer),
                Err(e) => {
                    tracing::error!("{e}");
                    eprintln!("{}", e.user_message());
                    std::process::exit(1);
                }
            }
            Ok(())
        }
        Command::Chat { role } => {
            let desk = RagDesk::from_config(load_config(&cli)?).await?;
            chat(&desk, role.as_deref()).await
        }
    }
}

fn init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        println!("⚠️  {} already exists (use --force to overwrite).", path.display());
        return Ok(());
    }
    let config = RagDeskConfig::default();
    config.save_to(path)?;
    println!("✅ Config written to {}", path.display());

    for collection in &config.collections {
        for doc in collection.document_paths() {
            if doc.exists() {
                continue;
            }
            if let Some(parent) = doc.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let sample = if collection.name == "ml" { SAMPLE_ML } else { SAMPLE_RAG };
            std::fs::write(&doc, sample)?;
            println!("📄 Sample document: {}", doc.display());
        }
    }
    println!("\nSet GEMINI_KEY (or pick another provider in the config), then run `ragdesk chat`.");
    Ok(())
}

fn print_roles(roles: &ragdesk_agent::RoleCatalog) {
    for (i, preset) in roles.presets().iter().enumerate() {
        let marker = if preset.text == roles.default_role() { "*" } else { " " };
        println!("{marker} {}. {}", i + 1, preset.label);
    }
}

async fn chat(desk: &RagDesk, initial_role: Option<&str>) -> Result<()> {
    let sessions = desk.sessions();
    let id = sessions.create().await;
    let mut role = desk.roles().resolve(initial_role.unwrap_or(""));

    println!("💬 RagDesk — type a question, /roles, /role <n>, /new or /quit.");
    for collection in &desk.config().collections {
        println!("📚 {}", collection.label());
    }
    println!("🎭 Role: {}", role_name(desk, &role));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    loop {
        stdout.write_all(b"\n> ").await?;
        stdout.flush().await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();

        match line.split_once(' ').map_or((line, ""), |(c, rest)| (c, rest.trim())) {
            ("/quit" | "/exit", _) => break,
            ("/roles", _) => print_roles(desk.roles()),
            ("/new", _) => {
                sessions.reset(&id).await?;
                role = desk.roles().default_role().to_string();
                println!("🆕 New chat.");
            }
            ("/role", selection) => {
                if !sessions.role_changeable(&id).await? {
                    println!("ℹ️  Changing the role now starts a fresh memory.");
                }
                role = desk.roles().resolve(selection);
                println!("🎭 Role: {}", role_name(desk, &role));
            }
            ("", _) => continue,
            _ => match sessions.submit(&id, line, &role).await {
                Ok(outcome) => {
                    if !outcome.routed_to.is_empty() {
                        tracing::debug!("📚 context from {}", outcome.routed_to.join(", "));
                    }
                    println!("{}", outcome.answer);
                }
                Err(e) => {
                    tracing::warn!("{e}");
                    println!("⚠️  {}", e.user_message());
                }
            },
        }
    }

    println!("\n{}", sessions.conversation(&id).await.unwrap_or_default());
    sessions.destroy(&id).await;
    Ok(())
}

fn role_name<'a>(desk: &'a RagDesk, role: &'a str) -> &'a str {
    desk.roles().label_for(role).unwrap_or(role)
}
