//! Magnitude extraction from a packed real spectrum.
//!
//! [`untangle`] turns the `[re(0) .. re(n/2), im(n/2-1) .. im(1)]` layout of
//! [`real_fft_inplace`](crate::fft::real_fft_inplace) into `n/2` magnitudes.
//! [`untangle_leakage`] additionally removes the response of the leaky
//! integrator the excursion model is built with.

use std::f64::consts::PI;

/// Magnitude response of a leaky integrator with leakage `leakage`, sampled
/// at `n_half` points from DC up to (not including) Nyquist.
///
/// `a[i] = sqrt((1 + l)^2 - 4 l sin^2(pi i / (2 n_half)))`
pub fn leakage_filter(n_half: usize, leakage: f64) -> Vec<f64> {
    let gain = (1.0 + leakage) * (1.0 + leakage);
    (0..n_half)
        .map(|i| {
            let phi = (0.5 * PI * i as f64 / n_half as f64).sin();
            (gain - 4.0 * leakage * phi * phi).sqrt()
        })
        .collect()
}

/// Magnitudes of a packed spectrum of even length `n`.
///
/// Bin 0 folds `re(0)` together with `re(n/2)`; bin `i` combines `re(i)` with
/// `im(i)`, stored at `n - i`.
pub fn untangle(spectrum: &[f64]) -> Vec<f64> {
    let n = spectrum.len();
    let half = n / 2;
    let mut mags = Vec::with_capacity(half);
    if half == 0 {
        return mags;
    }
    mags.push(spectrum[0].hypot(spectrum[half]));
    mags.extend((1..half).map(|i| spectrum[i].hypot(spectrum[n - i])));
    mags
}

/// [`untangle`] with every bin divided by [`leakage_filter`].
pub fn untangle_leakage(spectrum: &[f64], leakage: f64) -> Vec<f64> {
    let mut mags = untangle(spectrum);
    let filter = leakage_filter(mags.len(), leakage);
    for (m, a) in mags.iter_mut().zip(&filter) {
        *m /= a;
    }
    mags
}
