//! The `mediarelay chat` command: one conversational turn.

use clap::Args;
use mediarelay_core::{ChatMessage, ChatRequest, Config, Relay};
use std::path::{Path, PathBuf};

/// Arguments for the `chat` command.
#[derive(Args, Debug)]
pub struct ChatArgs {
    /// Message to send
    pub message: String,

    /// System prompt
    #[arg(short, long)]
    pub system: Option<String>,

    /// JSON file with prior messages: [{"role": "user", "content": "..."}, ...]
    #[arg(long, value_name = "FILE")]
    pub history: Option<PathBuf>,

    /// Override the configured chat model
    #[arg(short, long)]
    pub model: Option<String>,

    /// Print the full reply (model, tokens, latency) as JSON
    #[arg(long)]
    pub json: bool,
}

/// Execute the chat command.
pub async fn execute(config: Config, args: ChatArgs) -> anyhow::Result<()> {
    let history = match &args.history {
        Some(path) => load_history(path)?,
        None => Vec::new(),
    };

    let relay = Relay::new(config);
    let client = relay.chat_client(args.model.as_deref())?;
    let request = ChatRequest::new(&args.message)
        .with_system(args.system.as_deref())
        .with_history(history);

    let reply = client.send(&request).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reply)?);
    } else {
        println!("{}", reply.text);
    }
    Ok(())
}

fn load_history(path: &Path) -> anyhow::Result<Vec<ChatMessage>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Cannot read history {}: {e}", path.display()))?;
    let history: Vec<ChatMessage> = serde_json::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Invalid history {}: {e}", path.display()))?;

    if let Some(bad) = history
        .iter()
        .find(|m| !matches!(m.role.as_str(), "system" | "user" | "assistant"))
    {
        anyhow::bail!("Unknown role '{}' in history {}", bad.role, path.display());
    }
    Ok(history)
}
