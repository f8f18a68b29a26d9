//! The `mediarelay config` command for configuration management.

use clap::{Args, Subcommand, ValueEnum};
use mediarelay_core::Config;
use std::path::Path;

/// Arguments for the `config` command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Subcommands for configuration management.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Display current configuration
    Show,

    /// Show config file path
    Path,

    /// Initialize a new config file with defaults
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },

    /// Store an API key in the config file, keeping the rest of it intact
    SetKey {
        /// Service the key belongs to
        #[arg(value_enum)]
        service: Service,

        /// The API key
        key: String,
    },
}

/// Vendors with an API key.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Service {
    Kie,
    Groq,
}

impl Service {
    fn section(self) -> &'static str {
        match self {
            Self::Kie => "kie",
            Self::Groq => "groq",
        }
    }
}

/// Execute the config command.
pub async fn execute(args: ConfigArgs) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show => {
            let config = Config::load()?;
            let toml = config.to_toml()?;
            println!("{}", toml);
        }

        ConfigCommand::Path => {
            let path = Config::default_path();
            println!("{}", path.display());
        }

        ConfigCommand::Init { force } => {
            let path = Config::default_path();

            if path.exists() && !force {
                anyhow::bail!(
                    "Config file already exists at: {}\nUse --force to overwrite.",
                    path.display()
                );
            }

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let config = Config::default();
            let toml = config.to_toml()?;
            std::fs::write(&path, toml)?;

            tracing::info!("Config file created at: {}", path.display());
            println!("Configuration initialized at: {}", path.display());
        }

        ConfigCommand::SetKey { service, key } => {
            let key = key.trim();
            if key.is_empty() {
                anyhow::bail!("API key must not be empty");
            }
            let path = Config::default_path();
            save_key(&path, service, key)?;
            println!("{} key saved to {}", service.section(), path.display());
        }
    }

    Ok(())
}

/// Write `[<service>] api_key` into the TOML file at `path`, creating it if
/// needed. Comments and other settings survive the edit.
fn save_key(path: &Path, service: Service, key: &str) -> anyhow::Result<()> {
    let content = if path.exists() {
        std::fs::read_to_string(path)?
    } else {
        String::new()
    };

    let mut doc: toml_edit::DocumentMut = content
        .parse()
        .map_err(|e| anyhow::anyhow!("Cannot edit {}: {e}", path.display()))?;

    let section = service.section();
    if !doc.contains_key(section) {
        doc[section] = toml_edit::Item::Table(toml_edit::Table::new());
    }
    doc[section]["api_key"] = toml_edit::value(key);

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, doc.to_string())?;

    // Make sure the edited file still loads.
    Config::load_from(path)?;
    tracing::debug!("Saved {section} API key to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_key_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        save_key(&path, Service::Kie, "kie-123").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.kie.api_key, "kie-123");
        assert_eq!(config.kie_api_key().unwrap(), "kie-123");
    }

    #[test]
    fn save_key_preserves_comments_and_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "# my settings\n[polling]\ninterval_ms = 250 # fast\n\n[groq]\nmodel = \"llama-3.3-70b-versatile\"\n",
        )
        .unwrap();

        save_key(&path, Service::Groq, "gsk-abc").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("# my settings"));
        assert!(content.contains("interval_ms = 250 # fast"));

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.groq.api_key, "gsk-abc");
        assert_eq!(config.groq.model, "llama-3.3-70b-versatile");
        assert_eq!(config.polling.interval_ms, 250);
    }

    #[test]
    fn save_key_replaces_existing_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[kie]\napi_key = \"${KIE_API_KEY}\"\n").unwrap();

        save_key(&path, Service::Kie, "literal").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.kie.api_key, "literal");
    }
}
