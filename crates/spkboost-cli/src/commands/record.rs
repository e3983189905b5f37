//! One-shot telemetry recording to stdout or a CSV file.

use crate::commands::common::{DeviceArgs, load_config, open_devices};
use clap::Args;
use spkboost_io::{LiveData, PassiveSupervisor, decode_live_data, format_record_line, print_record_header};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Args)]
pub struct RecordArgs {
    #[command(flatten)]
    device: DeviceArgs,

    /// Number of lines to record
    #[arg(short = 'n', long, default_value = "1")]
    count: u64,

    /// Milliseconds between lines (default: configured interval)
    #[arg(short, long)]
    interval: Option<u64>,

    /// Append to this CSV file instead of printing
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub fn run(args: RecordArgs) -> anyhow::Result<()> {
    let config = load_config(&args.device)?;
    let interval_ms = args.interval.unwrap_or(config.interval_ms);
    let (mut backend, handles) = open_devices(&config)?;
    let mut supervisor = PassiveSupervisor;

    let mut out: Box<dyn Write> = match &args.output {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let empty = file.metadata()?.len() == 0;
            let mut file = std::io::BufWriter::new(file);
            if empty {
                print_record_header(&mut file, interval_ms)?;
            }
            Box::new(file)
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            print_record_header(&mut stdout, interval_ms)?;
            Box::new(stdout)
        }
    };

    for line in 1..=args.count {
        for &handle in &handles {
            match decode_live_data(backend.as_mut(), &mut supervisor, handle)? {
                LiveData::Live(record) => {
                    writeln!(out, "{}", format_record_line(line, handle.address, &record))?;
                }
                LiveData::DspNotRunning => {
                    tracing::warn!(line, address = handle.address, "DSP not running, sample skipped");
                }
                LiveData::ReloadIssued { status_register } => {
                    anyhow::bail!(
                        "device 0x{:02x} faulted (status register 0x{status_register:04x}), reload issued",
                        handle.address
                    );
                }
            }
        }
        out.flush()?;
        if line < args.count {
            std::thread::sleep(Duration::from_millis(interval_ms));
        }
    }

    if let Some(path) = &args.output {
        eprintln!("Recorded {} line(s) to {}", args.count, path.display());
    }
    Ok(())
}
