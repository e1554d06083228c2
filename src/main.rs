use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use kobold::{
    estimate_tokens, Agent, AgentResponse, Config, ContextInfo, Message, OllamaClient,
    ToolRegistry,
};

/// Kobold - chat with a local model that can call tools
#[derive(Parser, Debug)]
#[command(name = "kobold")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Inference server base URL
    #[arg(long, env = "OLLAMA_HOST")]
    host: Option<String>,

    /// Config file (defaults to ~/.config/kobold/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log file path
    #[arg(long, default_value = "/tmp/kobold.log")]
    log_file: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send a single message and print the answer
    Chat {
        message: String,
        #[command(flatten)]
        session: SessionArgs,
    },
    /// Interactive conversation
    Repl {
        #[command(flatten)]
        session: SessionArgs,
    },
    /// List models installed on the server
    Models,
    /// Estimate the token count of a file (or stdin)
    Tokens { file: Option<PathBuf> },
}

#[derive(ClapArgs, Debug)]
struct SessionArgs {
    /// Enable tool calls
    #[arg(short, long)]
    agent: bool,

    /// Model to use
    #[arg(short, long)]
    model: Option<String>,
}

fn build_agent(config: &Config, model: Option<String>) -> Result<Agent> {
    let client = OllamaClient::new(&config.server)?;
    let tools = ToolRegistry::new(config.tools.shell_timeout_secs).retain(&config.tools.enabled);

    let mut runtime = config.agent.clone();
    if let Some(model) = model {
        runtime.model = model;
    }

    Ok(Agent::new(runtime, Arc::new(client), Arc::new(tools)))
}

fn print_trace(response: &AgentResponse) {
    for (i, step) in response.steps.iter().enumerate() {
        eprintln!(
            "[{}] {} {} ({}ms)",
            i + 1,
            step.tool,
            step.args,
            step.duration_ms
        );
    }
    eprintln!("{}", response.context.format_log());
}

async fn run_chat(agent: &Agent, message: &str, agent_mode: bool) -> Result<()> {
    let response = agent.chat(message, &[], agent_mode).await?;
    print_trace(&response);
    println!("{}", response.text);
    Ok(())
}

async fn run_repl(agent: &Agent, mut agent_mode: bool) -> Result<()> {
    let mut history: Vec<Message> = Vec::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    eprintln!(
        "Model: {} (agent mode {}). Commands: /model NAME, /models, /agent, /quit",
        agent.model().await,
        if agent_mode { "on" } else { "off" }
    );

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match line.split_once(' ').unwrap_or((line, "")) {
            ("/quit", _) => break,
            ("/models", _) => {
                for name in agent.available_models().await {
                    println!("{}", name);
                }
            },
            ("/model", name) if !name.trim().is_empty() => {
                agent.set_model(name.trim()).await;
            },
            ("/agent", _) => {
                agent_mode = !agent_mode;
                eprintln!("Agent mode {}", if agent_mode { "on" } else { "off" });
            },
            _ => match agent.chat(line, &history, agent_mode).await {
                Ok(response) => {
                    print_trace(&response);
                    println!("{}", response.text);
                    history.push(Message::user(line));
                    history.push(Message::assistant(response.text));
                },
                Err(e) => eprintln!("Error: {}", e),
            },
        }
    }

    Ok(())
}

async fn run_tokens(config: &Config, file: Option<PathBuf>) -> Result<()> {
    let text = match file {
        Some(path) => tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut text = String::new();
            tokio::io::stdin().read_to_string(&mut text).await?;
            text
        },
    };

    let info = ContextInfo::new(estimate_tokens(&text), 0, config.agent.context_window, true);
    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env files (local first, then home directory)
    // Errors are ignored - files are optional
    let _ = dotenvy::from_filename(".env");
    if let Some(home) = dirs::home_dir() {
        let _ = dotenvy::from_path(home.join(".env"));
    }

    let args = Args::parse();

    // Set up file-based logging
    let log_file = std::fs::File::create(&args.log_file)
        .with_context(|| format!("Failed to create log file {}", args.log_file.display()))?;
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,kobold=debug")))
        .with(fmt::layer().with_writer(log_file).with_ansi(false))
        .init();

    // Load configuration
    let mut config = match args.config {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    // Apply CLI overrides
    // OLLAMA_HOST is often set without a scheme (e.g. "0.0.0.0:11434")
    if let Some(host) = args.host {
        config.server.base_url = if host.contains("://") {
            host
        } else {
            format!("http://{}", host)
        };
    }

    match args.command {
        Command::Chat { message, session } => {
            let agent = build_agent(&config, session.model)?;
            run_chat(&agent, &message, session.agent).await
        },
        Command::Repl { session } => {
            let agent = build_agent(&config, session.model)?;
            run_repl(&agent, session.agent).await
        },
        Command::Models => {
            let agent = build_agent(&config, None)?;
            for name in agent.available_models().await {
                println!("{}", name);
            }
            Ok(())
        },
        Command::Tokens { file } => run_tokens(&config, file).await,
    }
}
