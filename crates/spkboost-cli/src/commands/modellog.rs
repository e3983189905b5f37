//! Listing of binary model logs.

use clap::Args;
use spkboost_analysis::decode_model;
use spkboost_analysis::export::{PARAMETER_HEADER, parameter_row};
use spkboost_core::ModelKind;
use spkboost_io::modellog::kind_from_file_name;
use spkboost_io::read_model_log;
use std::path::PathBuf;

#[derive(Args)]
pub struct ModellogArgs {
    /// Model log file (`*_ZMDL.BIN` or `*_XMDL.BIN`)
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Treat the records as excursion models whatever the file name says
    #[arg(short = 'x', long)]
    excursion: bool,
}

pub fn run(args: ModellogArgs) -> anyhow::Result<()> {
    let kind = if args.excursion {
        ModelKind::Excursion
    } else {
        kind_from_file_name(&args.file).unwrap_or(ModelKind::Impedance)
    };
    let records = read_model_log(&args.file)?;
    eprintln!("{}: {} {kind} model record(s)", args.file.display(), records.len());

    println!("line,{PARAMETER_HEADER},peakHz,peak");
    for record in &records {
        let (model, curve) = decode_model(&record.raw, kind)?;
        let (peak_hz, peak) = curve.peak().unwrap_or((f64::NAN, f64::NAN));
        println!("{},{},{peak_hz},{peak:.4}", record.line, parameter_row(&model));
    }
    Ok(())
}
