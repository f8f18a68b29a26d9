//! The `mediarelay run` and `mediarelay submit` commands.

use clap::Args;
use mediarelay_core::config::PresetConfig;
use mediarelay_core::job::JobStatus;
use mediarelay_core::{
    request_for, BatchJob, BatchRunner, Config, ImageInput, JobInput, JobOutcome, OutcomeWriter,
    OutputFormat, Relay,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::{download, output_format, FormatArg};

/// Arguments shared by `run` and `submit`.
#[derive(Args, Debug, Clone)]
pub struct JobArgs {
    /// Preset to run (e.g. enhance-product, generate-video)
    pub preset: String,

    /// Input image; repeat for a batch, one job per image
    #[arg(short, long = "image", value_name = "PATH")]
    pub images: Vec<PathBuf>,

    /// Prompt sent with the job
    #[arg(short, long)]
    pub prompt: Option<String>,

    /// Extra vendor parameter, overriding preset defaults
    #[arg(long = "param", value_name = "KEY=VALUE")]
    pub params: Vec<String>,

    /// Number of jobs to run at once in a batch
    #[arg(long, default_value = "4")]
    pub parallel: usize,

    /// Save finished artifacts into this directory
    #[arg(short, long, value_name = "DIR")]
    pub download: Option<PathBuf>,

    /// Output format (defaults to the `[output]` config)
    #[arg(short, long, value_enum)]
    pub format: Option<FormatArg>,
}

impl Default for JobArgs {
    fn default() -> Self {
        Self {
            preset: String::new(),
            images: Vec::new(),
            prompt: None,
            params: Vec::new(),
            parallel: 4,
            download: None,
            format: None,
        }
    }
}

/// Submit and poll the preset's jobs until each one finishes.
pub async fn execute_run(config: Config, args: JobArgs) -> anyhow::Result<()> {
    let relay = Relay::new(config);
    let preset = relay.config().preset(&args.preset)?;
    let jobs = build_jobs(&relay, preset, &args).await?;
    let client = relay.job_client()?;
    let format = output_format(args.format, &relay.config().output.format);
    let pretty = relay.config().output.pretty;

    if jobs.len() == 1 {
        run_single(client, preset, jobs, &args, format, pretty).await
    } else {
        run_batch(client, preset, jobs, &args, format, pretty).await
    }
}

/// Submit the preset's jobs and print their handles without polling.
pub async fn execute_submit(config: Config, args: JobArgs) -> anyhow::Result<()> {
    let relay = Relay::new(config);
    let preset = relay.config().preset(&args.preset)?;
    let jobs = build_jobs(&relay, preset, &args).await?;
    let client = relay.job_client()?;
    let format = output_format(args.format, &relay.config().output.format);

    let submissions = jobs.iter().map(|job| {
        let client = client.clone();
        async move {
            client
                .submit(&job.request, preset.kind)
                .await
                .with_source(job.source.clone())
        }
    });
    let outcomes = futures_util::future::join_all(submissions).await;

    let mut writer = OutcomeWriter::new(std::io::stdout(), format, relay.config().output.pretty);
    for outcome in outcomes {
        writer.record(outcome)?;
    }
    writer.finish()?;

    let (_, failed) = writer.tally();
    if failed > 0 {
        anyhow::bail!("{failed} submission(s) failed");
    }
    Ok(())
}

/// One job per image, or a single job when no image is given.
async fn build_jobs(
    relay: &Relay,
    preset: &PresetConfig,
    args: &JobArgs,
) -> anyhow::Result<Vec<BatchJob>> {
    let base = base_input(preset, args)?;
    preset.check_inputs(base.contains("prompt"), !args.images.is_empty())?;

    if args.images.is_empty() {
        let request = request_for(preset, &relay.config().polling, base.into_map())?;
        return Ok(vec![BatchJob {
            source: args.preset.clone(),
            request,
        }]);
    }

    let max_bytes = relay.max_upload_bytes();
    let mut jobs = Vec::with_capacity(args.images.len());
    for path in &args.images {
        let image = ImageInput::from_path(path, max_bytes).await?;
        let input = base.clone().image(&image, &preset.image_fields);
        jobs.push(BatchJob {
            source: path.display().to_string(),
            request: request_for(preset, &relay.config().polling, input.into_map())?,
        });
    }
    Ok(jobs)
}

/// Preset defaults, then `--param` overrides, then the prompt.
fn base_input(preset: &PresetConfig, args: &JobArgs) -> anyhow::Result<JobInput> {
    let mut input = JobInput::from_preset(preset);
    for pair in &args.params {
        input = input.param_str(pair)?;
    }
    Ok(input.prompt(args.prompt.as_deref()))
}

async fn run_single(
    client: mediarelay_core::JobClient,
    preset: &PresetConfig,
    mut jobs: Vec<BatchJob>,
    args: &JobArgs,
    format: OutputFormat,
    pretty: bool,
) -> anyhow::Result<()> {
    let Some(job) = jobs.pop() else {
        return Ok(());
    };
    let max_attempts = job.request.poll_options().max_attempts;

    let spinner = create_spinner(&job.source);
    let outcome = client
        .run_with_progress(&job.request, preset.kind, |attempt, status| {
            spinner.set_message(attempt_message(attempt, max_attempts, status));
        })
        .await;
    spinner.finish_and_clear();

    let outcome = if args.images.is_empty() {
        outcome
    } else {
        outcome.with_source(job.source)
    };

    let mut writer = OutcomeWriter::new(std::io::stdout(), format, pretty);
    emit_single(
        &mut writer,
        &outcome,
        args.download.as_deref(),
        &reqwest::Client::new(),
    )
    .await?;

    if outcome.is_failed() {
        anyhow::bail!(
            "Job failed: {}",
            outcome.error.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}

/// Print the outcome, then save its artifact. A failed download is logged
/// and leaves the printed outcome intact.
async fn emit_single<W: Write>(
    writer: &mut OutcomeWriter<W>,
    outcome: &JobOutcome,
    download_dir: Option<&Path>,
    http: &reqwest::Client,
) -> anyhow::Result<Option<PathBuf>> {
    writer.record(outcome.clone())?;
    writer.finish()?;

    let Some(dir) = download_dir else {
        return Ok(None);
    };
    match download::save_artifact(http, outcome, dir).await {
        Ok(saved) => Ok(saved),
        Err(e) => {
            tracing::warn!("Could not save artifact: {e}");
            Ok(None)
        }
    }
}

async fn run_batch(
    client: mediarelay_core::JobClient,
    preset: &PresetConfig,
    jobs: Vec<BatchJob>,
    args: &JobArgs,
    format: OutputFormat,
    pretty: bool,
) -> anyhow::Result<()> {
    let total = jobs.len();
    tracing::info!(
        "Running {total} {} jobs, {} at a time",
        args.preset,
        args.parallel.max(1)
    );

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<JobOutcome>();
    let progress = create_progress_bar(total as u64);
    let download_dir = args.download.clone();

    // Outcomes are written (and downloaded) as they arrive.
    let sink_progress = progress.clone();
    let sink = tokio::spawn(async move {
        let http = reqwest::Client::new();
        let mut writer = OutcomeWriter::new(std::io::stdout(), format, pretty);
        while let Some(outcome) = rx.recv().await {
            if let Some(dir) = &download_dir {
                if let Err(e) = download::save_artifact(&http, &outcome, dir).await {
                    tracing::warn!(
                        "Could not save artifact for {}: {e}",
                        outcome.source.as_deref().unwrap_or("job")
                    );
                }
            }
            sink_progress.inc(1);
            writer.record(outcome)?;
        }
        writer.finish()?;
        Ok::<_, std::io::Error>(writer.tally())
    });

    let runner = BatchRunner::new(client, preset.kind, args.parallel);
    let (succeeded, failed) = runner
        .run(jobs, move |outcome| {
            // The receiver only goes away if writing failed; that error surfaces below.
            let _ = tx.send(outcome);
        })
        .await;
    progress.finish_and_clear();
    sink.await??;

    tracing::info!("Batch finished: {succeeded} succeeded, {failed} failed");
    if succeeded == 0 && failed > 0 {
        anyhow::bail!("All {failed} jobs failed");
    }
    Ok(())
}

fn attempt_message(attempt: u32, max_attempts: u32, status: Option<&JobStatus>) -> String {
    match status {
        Some(JobStatus::Processing {
            progress: Some(progress),
        }) => format!("poll {attempt}/{max_attempts}: {progress}"),
        Some(JobStatus::Processing { progress: None }) => {
            format!("poll {attempt}/{max_attempts}: processing")
        }
        Some(_) => format!("poll {attempt}/{max_attempts}: finished"),
        None => format!("poll {attempt}/{max_attempts}: retrying"),
    }
}

fn create_spinner(source: &str) -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressStyle};

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {prefix} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    let label = Path::new(source)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(source);
    spinner.set_prefix(label.to_string());
    spinner.set_message("submitting");
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}

fn create_progress_bar(total: u64) -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%)",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-"),
    );
    pb
}
