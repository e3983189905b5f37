//! Long-running telemetry and model logging.

use crate::commands::common::{DeviceArgs, load_config, open_devices};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use spkboost_io::{LoggerSettings, LoggingPipeline, PassiveSupervisor};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Args)]
pub struct LogArgs {
    #[command(flatten)]
    device: DeviceArgs,

    /// Milliseconds between telemetry lines
    #[arg(short, long)]
    interval: Option<u64>,

    /// Number of lines to log (0 = until interrupted)
    #[arg(short = 'n', long)]
    count: Option<u64>,

    /// Lines between speaker-model dumps
    #[arg(short, long)]
    model_interval: Option<u64>,

    /// Directory for the CSV, model logs and RUN.LOG
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// File name prefix
    #[arg(long)]
    prefix: Option<String>,

    /// Hide the progress bar
    #[arg(short, long)]
    quiet: bool,
}

pub fn run(args: LogArgs) -> anyhow::Result<()> {
    let mut config = load_config(&args.device)?;
    if let Some(interval) = args.interval {
        config.interval_ms = interval;
    }
    if let Some(count) = args.count {
        config.count = count;
    }
    if let Some(model_interval) = args.model_interval {
        config.model_interval = model_interval;
    }
    if let Some(dir) = args.output_dir {
        config.output_dir = dir;
    }
    if let Some(prefix) = args.prefix {
        config.file_prefix = prefix;
    }
    config.validate()?;

    let (mut backend, handles) = open_devices(&config)?;
    let mut supervisor = PassiveSupervisor;
    let settings = LoggerSettings {
        interval: Duration::from_millis(config.interval_ms),
        count: config.count,
        model_interval: config.model_interval,
        output_dir: config.output_dir.clone(),
        file_prefix: config.file_prefix.clone(),
    };
    let mut pipeline =
        LoggingPipeline::open(backend.as_mut(), &mut supervisor, &handles, settings)?;

    let pb = if args.quiet {
        ProgressBar::hidden()
    } else if config.count > 0 {
        let pb = ProgressBar::new(config.count);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} lines ({eta})")?
                .progress_chars("##-"),
        );
        pb
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::default_spinner().template("{spinner} [{elapsed_precise}] {pos} lines {msg}")?);
        pb
    };

    let summary = pipeline.run_with(|report| {
        pb.set_position(report.line);
        if report.model_dump {
            pb.set_message(format!("(model dump at line {})", report.line));
        }
    });
    pb.finish_and_clear();
    let summary = summary?;

    println!(
        "Logged {} lines from {} device(s), {} model dumps, {} skipped samples",
        summary.lines,
        handles.len(),
        summary.model_dumps,
        summary.skipped
    );
    for path in pipeline.files() {
        println!("  {}", path.display());
    }
    Ok(())
}
