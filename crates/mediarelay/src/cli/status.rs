//! The `mediarelay status` command: one status check for a submitted job.

use clap::Args;
use mediarelay_core::{Config, OutcomeWriter, Relay};

use super::{output_format, FormatArg, KindArg};

/// Arguments for the `status` command.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Task id returned by `mediarelay submit`
    pub task_id: String,

    /// Kind of artifact the job produces
    #[arg(short, long, value_enum, default_value_t = KindArg::Image)]
    pub kind: KindArg,

    /// Output format (defaults to the `[output]` config)
    #[arg(short, long, value_enum)]
    pub format: Option<FormatArg>,
}

/// Execute the status command.
pub async fn execute(config: Config, args: StatusArgs) -> anyhow::Result<()> {
    let task_id = args.task_id.trim();
    if task_id.is_empty() {
        anyhow::bail!("Task id must not be empty");
    }

    let relay = Relay::new(config);
    let client = relay.job_client()?;
    let outcome = client.status(task_id, args.kind.into()).await;

    let format = output_format(args.format, &relay.config().output.format);
    let mut writer = OutcomeWriter::new(std::io::stdout(), format, relay.config().output.pretty);
    writer.record(outcome)?;
    writer.finish()?;

    Ok(())
}
