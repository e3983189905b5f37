//! Integration tests for spkboost-analysis.
//!
//! The in-place real FFT is checked against rustfft as a reference DFT, then
//! the transcoder is exercised end to end on synthetic model records.

use proptest::prelude::*;
use rustfft::{FftPlanner, num_complex::Complex};
use spkboost_analysis::export::write_curve_csv;
use spkboost_analysis::{decode_model, encode_model, model_response, real_fft_inplace, untangle};
use spkboost_core::fixed::quantum;
use spkboost_core::{MODEL_BYTES, ModelKind, SpeakerModel};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn reference_dft(input: &[f64]) -> Vec<Complex<f64>> {
    let mut buffer: Vec<Complex<f64>> = input.iter().map(|&x| Complex::new(x, 0.0)).collect();
    FftPlanner::new()
        .plan_fft_forward(buffer.len())
        .process(&mut buffer);
    buffer
}

/// Damped resonance, roughly the shape of a real admittance FIR.
fn resonant_taps() -> Vec<f64> {
    (0..128)
        .map(|i| {
            let t = i as f64;
            0.2 * (-t / 18.0).exp() * (2.0 * std::f64::consts::PI * 0.11 * t).cos()
        })
        .collect()
}

fn synthetic_model() -> SpeakerModel {
    SpeakerModel {
        fir: resonant_taps(),
        shift_fir: 0,
        leakage_factor: 0.0078125,
        re_correction: 0.96,
        x_init_margin: 0.5,
        x_damage_margin: 0.75,
        x_margin: 0.25,
        bl: 1.6,
        f_res: 850,
        f_res_init: 800,
        qt: 1.25,
        x_max: 0.35,
        t_max: 120.0,
        t_coef_a: 0.0039,
    }
}

// ===========================================================================
// 1. FFT against reference DFT
// ===========================================================================

#[test]
fn dc_and_nyquist_match_reference() {
    let input: Vec<f64> = (0..128).map(|i| ((i * 37) % 19) as f64 / 7.0 - 1.3).collect();
    let reference = reference_dft(&input);

    let mut data = input.clone();
    real_fft_inplace(&mut data);

    assert!((data[0] - reference[0].re).abs() < 1e-9);
    assert!((data[64] - reference[64].re).abs() < 1e-9);
}

#[test]
fn all_bins_match_reference() {
    let input = resonant_taps();
    let reference = reference_dft(&input);

    let mut data = input;
    real_fft_inplace(&mut data);
    for k in 1..64 {
        assert!((data[k] - reference[k].re).abs() < 1e-9, "re({k})");
        assert!((data[128 - k] - reference[k].im).abs() < 1e-9, "im({k})");
    }
}

#[test]
fn untangled_magnitudes_match_reference_norms() {
    let input = resonant_taps();
    let reference = reference_dft(&input);
    let mut data = input;
    real_fft_inplace(&mut data);
    let mags = untangle(&data);
    for k in 1..64 {
        assert!((mags[k] - reference[k].norm()).abs() < 1e-9);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn fft_matches_reference_for_any_power_of_two(
        log2 in 2u32..9,
        seed in prop::collection::vec(-4.0f64..4.0, 256),
    ) {
        let n = 1usize << log2;
        let input = &seed[..n];
        let reference = reference_dft(input);
        let mut data = input.to_vec();
        real_fft_inplace(&mut data);
        let tol = 1e-9 * n as f64;
        prop_assert!((data[0] - reference[0].re).abs() < tol);
        prop_assert!((data[n / 2] - reference[n / 2].re).abs() < tol);
        for k in 1..n / 2 {
            prop_assert!((data[k] - reference[k].re).abs() < tol);
            prop_assert!((data[n - k] - reference[k].im).abs() < tol);
        }
    }
}

// ===========================================================================
// 2. Model transcoding
// ===========================================================================

#[test]
fn model_round_trip_within_one_step() {
    let model = synthetic_model();
    let wire = encode_model(&model).unwrap();
    assert_eq!(wire.len(), MODEL_BYTES);

    let (back, _) = decode_model(&wire, ModelKind::Impedance).unwrap();
    for (a, b) in model.fir.iter().zip(&back.fir) {
        assert!((a - b).abs() <= quantum(22));
    }
    assert_eq!(back.f_res, 850);
    assert_eq!(back.f_res_init, 800);
    assert!((back.bl - 1.6).abs() <= quantum(21));
    assert!((back.t_max - 120.0).abs() <= quantum(14));
    assert!((back.qt - 1.25).abs() <= quantum(17));
    assert_eq!(back.leakage_factor, 0.0078125);

    // Re-encoding the decoded model is stable.
    assert_eq!(encode_model(&back).unwrap(), wire);
}

#[test]
fn decoded_curve_matches_model_response() {
    let model = synthetic_model();
    let wire = encode_model(&model).unwrap();
    for kind in ModelKind::ALL {
        let (decoded, curve) = decode_model(&wire, kind).unwrap();
        assert_eq!(curve.kind, kind);
        assert_eq!(curve.values.len(), 64);
        assert_eq!(model_response(&decoded, kind).unwrap(), curve);
    }
}

#[test]
fn impedance_peak_sits_at_admittance_dip() {
    let (_, curve) = decode_model(&encode_model(&synthetic_model()).unwrap(), ModelKind::Impedance)
        .unwrap();
    let (peak_hz, peak_ohm) = curve.peak().unwrap();
    // The admittance resonates near 0.11 * 8 kHz = 880 Hz, so the
    // impedance is lowest there and the peak lies far from it.
    assert!(peak_ohm.is_finite());
    assert!((peak_hz - 880.0).abs() > 500.0);
}

#[test]
fn curve_csv_has_one_row_per_plotted_point() {
    let (_, curve) = decode_model(&encode_model(&synthetic_model()).unwrap(), ModelKind::Excursion)
        .unwrap();
    let mut out = Vec::new();
    write_curve_csv(&curve, &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert_eq!(text.lines().count(), 1 + 63);
    assert!(text.lines().nth(1).unwrap().starts_with("62.5,"));
}
