//! Subcommand implementations.

pub mod chat;
pub mod config;
pub mod download;
pub mod run;
pub mod status;

use clap::ValueEnum;
use mediarelay_core::{ArtifactKind, OutputFormat};

/// Output format for job outcomes.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum FormatArg {
    /// Single JSON object, or an array for batches
    #[default]
    Json,
    /// One JSON object per line
    Jsonl,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Jsonl => OutputFormat::JsonLines,
        }
    }
}

/// Pick the CLI format if given, else the `[output]` config format.
pub fn output_format(arg: Option<FormatArg>, configured: &str) -> OutputFormat {
    match arg {
        Some(arg) => arg.into(),
        None => OutputFormat::parse(configured).unwrap_or_else(|| {
            tracing::warn!("Unknown output format '{configured}' in config, using json");
            OutputFormat::Json
        }),
    }
}

/// Artifact kind for commands that aren't tied to a preset.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum KindArg {
    #[default]
    Image,
    Video,
}

impl From<KindArg> for ArtifactKind {
    fn from(arg: KindArg) -> Self {
        match arg {
            KindArg::Image => ArtifactKind::Image,
            KindArg::Video => ArtifactKind::Video,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_format_flag_wins_over_config() {
        assert_eq!(
            output_format(Some(FormatArg::Jsonl), "json"),
            OutputFormat::JsonLines
        );
    }

    #[test]
    fn output_format_falls_back_to_config() {
        assert_eq!(output_format(None, "jsonl"), OutputFormat::JsonLines);
        assert_eq!(output_format(None, "yaml"), OutputFormat::Json);
    }

    #[test]
    fn kind_arg_maps_to_artifact_kind() {
        assert_eq!(ArtifactKind::from(KindArg::Video), ArtifactKind::Video);
        assert_eq!(ArtifactKind::from(KindArg::default()), ArtifactKind::Image);
    }
}
