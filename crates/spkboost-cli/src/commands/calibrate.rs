//! Calibration commands.

use crate::commands::common::{DeviceArgs, load_config, open_devices};
use clap::{Args, Subcommand};
use spkboost_core::{BlockLayout, CalibrationSlot};
use spkboost_io::calibration::{get_agc_gain_max, get_vi_calibration, set_scalar};
use spkboost_io::{DeviceBackend, DeviceHandle};

#[derive(Args)]
pub struct CalibrateArgs {
    #[command(flatten)]
    device: DeviceArgs,

    #[command(subcommand)]
    command: CalibrateCommand,
}

#[derive(Subcommand)]
enum CalibrateCommand {
    /// Print the sense calibration and AGC gain limit of every device
    Show,

    /// Change one or more calibration values on every device
    Set {
        /// V/I sense calibration
        #[arg(long, allow_negative_numbers = true)]
        vis_cal: Option<f64>,

        /// Voltage sense calibration
        #[arg(long, allow_negative_numbers = true)]
        vsense: Option<f64>,

        /// Current sense calibration
        #[arg(long, allow_negative_numbers = true)]
        isense: Option<f64>,

        /// Maximum AGC gain in dB
        #[arg(long, allow_negative_numbers = true)]
        agc_gain_max: Option<f64>,
    },
}

fn print_calibration(
    backend: &mut dyn DeviceBackend,
    handle: DeviceHandle,
    layout: &BlockLayout,
) -> anyhow::Result<()> {
    let cal = get_vi_calibration(backend, handle, layout)?;
    let agc = get_agc_gain_max(backend, handle, layout)?;
    println!("device 0x{:02x}:", handle.address);
    println!("  VisCal       {:.6}", cal.vis_cal);
    println!("  Vsense       {:.6}", cal.vsense);
    println!("  Isense       {:.6}", cal.isense);
    println!("  AGC gain max {:.2} dB", agc);
    Ok(())
}

pub fn run(args: CalibrateArgs) -> anyhow::Result<()> {
    let config = load_config(&args.device)?;
    let layout = config.layout;
    let (mut backend, handles) = open_devices(&config)?;

    match args.command {
        CalibrateCommand::Show => {
            for &handle in &handles {
                print_calibration(backend.as_mut(), handle, &layout)?;
            }
        }

        CalibrateCommand::Set {
            vis_cal,
            vsense,
            isense,
            agc_gain_max,
        } => {
            let changes: Vec<(CalibrationSlot, f64)> = [
                (CalibrationSlot::VisCal, vis_cal),
                (CalibrationSlot::Vsense, vsense),
                (CalibrationSlot::Isense, isense),
                (CalibrationSlot::AgcGainMax, agc_gain_max),
            ]
            .into_iter()
            .filter_map(|(slot, value)| value.map(|v| (slot, v)))
            .collect();
            if changes.is_empty() {
                anyhow::bail!("Nothing to set. Use --vis-cal, --vsense, --isense or --agc-gain-max");
            }

            for &handle in &handles {
                for &(slot, value) in &changes {
                    set_scalar(backend.as_mut(), handle, &layout, slot, value)?;
                }
                print_calibration(backend.as_mut(), handle, &layout)?;
            }
        }
    }

    Ok(())
}
