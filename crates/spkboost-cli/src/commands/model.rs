//! Speaker model commands: show, export and write.

use crate::commands::common::{DeviceArgs, load_config, open_devices};
use clap::{Args, Subcommand};
use serde::Serialize;
use spkboost_analysis::FrequencyResponseCurve;
use spkboost_analysis::export::{export_curve_csv, write_curve_csv, write_parameter_summary};
use spkboost_config::ModelFile;
use spkboost_core::{ModelKind, SpeakerModel};
use spkboost_io::model::{read_speaker_model, write_speaker_model};
use std::path::PathBuf;

#[derive(Args)]
pub struct ModelArgs {
    #[command(flatten)]
    device: DeviceArgs,

    #[command(subcommand)]
    command: ModelCommand,
}

#[derive(Subcommand)]
enum ModelCommand {
    /// Print the model parameters and its frequency response
    Show {
        /// Read the excursion model instead of the impedance model
        #[arg(short = 'x', long)]
        excursion: bool,

        /// Also write the response curve to this CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Save the model to an editable TOML file
    Export {
        /// Read the excursion model instead of the impedance model
        #[arg(short = 'x', long)]
        excursion: bool,

        /// Output TOML file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Write an impedance model from a TOML file to every device
    Write {
        /// Input TOML file, as produced by `model export`
        #[arg(short, long)]
        input: PathBuf,
    },
}

#[derive(Serialize)]
struct ModelReport<'a> {
    address: u8,
    kind: ModelKind,
    model: &'a SpeakerModel,
    peak_hz: Option<f64>,
    frequencies: &'a [f64],
    values: &'a [f64],
}

fn kind(excursion: bool) -> ModelKind {
    if excursion {
        ModelKind::Excursion
    } else {
        ModelKind::Impedance
    }
}

fn print_model(address: u8, model: &SpeakerModel, curve: &FrequencyResponseCurve) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout();
    println!("\n{} model of device 0x{:02x}", curve.kind, address);
    write_parameter_summary(model, &mut stdout)?;
    if let Some((hz, value)) = curve.peak() {
        println!("peak: {value:.4} {} at {hz} Hz", curve.kind.quantity());
    }
    write_curve_csv(curve, &mut stdout)?;
    Ok(())
}

pub fn run(args: ModelArgs) -> anyhow::Result<()> {
    let config = load_config(&args.device)?;
    let (mut backend, handles) = open_devices(&config)?;

    match args.command {
        ModelCommand::Show {
            excursion,
            output,
            json,
        } => {
            let kind = kind(excursion);
            let mut reports = Vec::new();
            for &handle in &handles {
                let (model, curve) = read_speaker_model(backend.as_mut(), handle, kind)?;
                if let Some(path) = &output {
                    let path = if handles.len() > 1 {
                        path.with_extension(format!("{:02x}.csv", handle.address))
                    } else {
                        path.clone()
                    };
                    export_curve_csv(&curve, &path)?;
                    eprintln!("Curve written to {}", path.display());
                }
                reports.push((handle.address, model, curve));
            }

            if json {
                let reports: Vec<ModelReport<'_>> = reports
                    .iter()
                    .map(|(address, model, curve)| ModelReport {
                        address: *address,
                        kind: curve.kind,
                        model,
                        peak_hz: curve.peak().map(|(hz, _)| hz),
                        frequencies: &curve.frequencies,
                        values: &curve.values,
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&reports)?);
            } else {
                for (address, model, curve) in &reports {
                    print_model(*address, model, curve)?;
                }
            }
        }

        ModelCommand::Export { excursion, output } => {
            let kind = kind(excursion);
            let handle = handles[0];
            if handles.len() > 1 {
                tracing::warn!(address = handle.address, "several devices configured, exporting the first");
            }
            let (model, _) = read_speaker_model(backend.as_mut(), handle, kind)?;
            ModelFile::new(kind, model)
                .with_description(format!("{} device 0x{:02x}", config.target, handle.address))
                .save(&output)?;
            println!("Exported {kind} model of 0x{:02x} to {}", handle.address, output.display());
        }

        ModelCommand::Write { input } => {
            let file = ModelFile::load(&input)?;
            if file.kind != ModelKind::Impedance {
                anyhow::bail!(
                    "{} holds a {} model; only impedance models can be written",
                    input.display(),
                    file.kind
                );
            }
            for &handle in &handles {
                write_speaker_model(backend.as_mut(), handle, &file.model)?;
                let (back, _) = read_speaker_model(backend.as_mut(), handle, ModelKind::Impedance)?;
                println!(
                    "Wrote model to 0x{:02x}: fRes {} Hz, Qt {:.2}",
                    handle.address, back.f_res, back.qt
                );
            }
        }
    }

    Ok(())
}
