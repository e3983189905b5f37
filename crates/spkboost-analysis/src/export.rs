//! Text export of model parameters and response curves.
//!
//! Both formats are plain CSV so they open directly in a spreadsheet:
//!
//! - parameter summary: one header row with the 12 physical parameters and
//!   one value row;
//! - curve: `Hz,<quantity>` header, then one `hz,value` row per plotted point.

use std::io::Write;
use std::path::Path;

use spkboost_core::{ScalarField, SpeakerModel};

use crate::response::FrequencyResponseCurve;

/// Header row of the parameter summary. `Shift_FIR` is always 0 and left out.
pub const PARAMETER_HEADER: &str =
    "leakageFactor,ReCorrection,xInitMargin,xDamageMargin,xMargin,Bl,fRes,fResInit,Qt,xMax,tMax,tCoefA";

/// Write the parameter summary (header plus one row).
pub fn write_parameter_summary<W: Write>(model: &SpeakerModel, out: &mut W) -> std::io::Result<()> {
    writeln!(out, "{PARAMETER_HEADER}")?;
    writeln!(out, "{}", parameter_row(model))
}

/// The value row of the parameter summary, without a newline.
pub fn parameter_row(model: &SpeakerModel) -> String {
    format!(
        "{:.6},{:.2},{:.2},{:.2},{:.2},{:.2},{},{},{:.2},{:.2},{:.2},{:.4}",
        model.leakage_factor,
        model.re_correction,
        model.x_init_margin,
        model.x_damage_margin,
        model.x_margin,
        model.bl,
        model.f_res,
        model.f_res_init,
        model.qt,
        model.x_max,
        model.t_max,
        model.t_coef_a,
    )
}

/// Write the plotted points of a curve.
pub fn write_curve_csv<W: Write>(curve: &FrequencyResponseCurve, out: &mut W) -> std::io::Result<()> {
    writeln!(out, "Hz,{}", curve.kind.quantity())?;
    for (hz, value) in curve.plot_points() {
        writeln!(out, "{hz},{value:.6}")?;
    }
    Ok(())
}

/// Write a curve to a new file at `path`.
///
/// # Example
///
/// ```rust,ignore
/// use spkboost_analysis::{export::export_curve_csv, response::decode_model};
///
/// let (_, curve) = decode_model(&bytes, ModelKind::Impedance)?;
/// export_curve_csv(&curve, "impedance.csv")?;
/// ```
pub fn export_curve_csv(
    curve: &FrequencyResponseCurve,
    path: impl AsRef<Path>,
) -> std::io::Result<()> {
    let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);
    write_curve_csv(curve, &mut file)?;
    file.flush()
}

/// Column names of the scalar parameters in summary order.
pub fn parameter_names() -> impl Iterator<Item = &'static str> {
    ScalarField::ALL[1..].iter().map(|f| f.name())
}
