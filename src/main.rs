mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use tgbot_core::config;

#[derive(Parser)]
#[command(name = "tgbot", version, about = "Long-polling Telegram bot client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Bot token; overrides `bot.token` from the config file.
    #[arg(long, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true)]
    token: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Authenticate and poll for updates until Ctrl-C.
    Start {
        /// Reply to every text message with the same text.
        #[arg(long)]
        echo: bool,
    },
    /// Print the bot identity reported by getMe.
    Whoami,
    /// Send a text message.
    Send {
        /// Chat id or @channelusername.
        #[arg(long)]
        chat: String,
        #[arg(trailing_var_arg = true, required = true)]
        text: Vec<String>,
    },
    /// Upload a file from a local path, base64 data, or one or more URLs.
    SendFile {
        #[arg(long)]
        chat: String,
        #[arg(long, value_enum)]
        kind: FileKind,
        /// Treat the source as base64-encoded content.
        #[arg(long)]
        base64: bool,
        #[arg(long)]
        caption: Option<String>,
        /// Several URLs are tried in order until one is accepted.
        #[arg(required = true)]
        sources: Vec<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum FileKind {
    Photo,
    Audio,
    Document,
    Sticker,
    Video,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut cfg = config::load(&cli.config)?;
    if let Some(token) = cli.token {
        cfg.bot.token = token;
    }
    // The CLI decides when polling begins.
    cfg.polling.autostart = false;

    match cli.command {
        Commands::Start { echo } => commands::start(cfg, echo).await?,
        Commands::Whoami => commands::whoami(cfg).await?,
        Commands::Send { chat, text } => {
            if text.is_empty() {
                anyhow::bail!("no text provided. Usage: tgbot send --chat <id> <text>");
            }
            commands::send(cfg, &chat, &text.join(" ")).await?;
        }
        Commands::SendFile {
            chat,
            kind,
            base64,
            caption,
            sources,
        } => commands::send_file(cfg, &chat, kind, base64, caption, sources).await?,
    }

    Ok(())
}
