//! In-place split-radix real FFT.
//!
//! Sorensen, Jones, Heideman and Burrus, "Real-Valued Fast Fourier Transform
//! Algorithms", IEEE Trans. ASSP-35 No. 6, June 1987.
//!
//! The transform works on the buffer it is given and leaves the spectrum in
//! packed form:
//!
//! ```text
//! [re(0), re(1), ..., re(n/2), im(n/2 - 1), ..., im(1)]
//! ```
//!
//! The output is not normalized. `re(0)` is the plain sum of the input and
//! `re(n/2)` the alternating sum.

use std::f64::consts::{PI, SQRT_2};

/// Transform `data` in place.
///
/// `data.len()` must be a power of two and at least 4. Other lengths are
/// caught by a debug assertion only; release builds produce garbage.
///
/// # Example
///
/// ```rust
/// use spkboost_analysis::fft::real_fft_inplace;
///
/// let mut data = [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0];
/// real_fft_inplace(&mut data);
/// assert_eq!(data[0], 8.0);
/// assert!(data[1..].iter().all(|v| v.abs() < 1e-12));
/// ```
pub fn real_fft_inplace(data: &mut [f64]) {
    let n = data.len();
    debug_assert!(
        n >= 4 && n.is_power_of_two(),
        "real FFT length must be a power of two >= 4, got {n}"
    );

    bit_reverse(data);
    length_two_butterflies(data);

    let mut span = 2;
    let mut k = n;
    while k > 2 {
        span <<= 1;
        l_shaped_stage(data, span);
        k >>= 1;
    }
}

fn bit_reverse(data: &mut [f64]) {
    let n = data.len();
    let mut j = 0;
    for i in 0..n - 1 {
        if i < j {
            data.swap(i, j);
        }
        let mut k = n / 2;
        while k <= j {
            j -= k;
            k >>= 1;
        }
        j += k;
    }
}

fn length_two_butterflies(data: &mut [f64]) {
    let last = data.len() - 1;
    let mut i0 = 0;
    let mut id = 4;
    loop {
        while i0 < last {
            let t = data[i0];
            data[i0] = t + data[i0 + 1];
            data[i0 + 1] = t - data[i0 + 1];
            i0 += id;
        }
        id <<= 1;
        i0 = id - 2;
        id <<= 1;
        if i0 >= last {
            break;
        }
    }
}

/// One combine stage of width `span` (4, 8, ..., n).
fn l_shaped_stage(data: &mut [f64], span: usize) {
    let n = data.len();
    let n4 = span >> 2;
    let n8 = span >> 3;
    let e = 2.0 * PI / span as f64;

    // Twiddle-free butterflies at j = 1 and j = n8 + 1.
    let mut i1 = 0;
    let mut id = span << 1;
    loop {
        while i1 < n {
            let mut i2 = i1 + n4;
            let mut i3 = i2 + n4;
            let mut i4 = i3 + n4;
            let t1 = data[i4] + data[i3];
            data[i4] -= data[i3];
            data[i3] = data[i1] - t1;
            data[i1] += t1;
            if n4 != 1 {
                let i0 = i1 + n8;
                i2 += n8;
                i3 += n8;
                i4 += n8;
                let t1 = (data[i3] + data[i4]) / SQRT_2;
                let t2 = (data[i3] - data[i4]) / SQRT_2;
                data[i4] = data[i2] - t1;
                data[i3] = -data[i2] - t1;
                data[i2] = data[i0] - t2;
                data[i0] += t2;
            }
            i1 += id;
        }
        id <<= 1;
        i1 = id - span;
        id <<= 1;
        if i1 >= n {
            break;
        }
    }

    let mut a = e;
    for j in 2..=n8 {
        let (ss1, cc1) = a.sin_cos();
        let (ss3, cc3) = (3.0 * a).sin_cos();
        a = j as f64 * e;

        let mut i = 0;
        let mut id = span << 1;
        loop {
            while i < n {
                let i1 = i + j - 1;
                let i2 = i1 + n4;
                let i3 = i2 + n4;
                let i4 = i3 + n4;
                let i5 = i + n4 - j + 1;
                let i6 = i5 + n4;
                let i7 = i6 + n4;
                let i8 = i7 + n4;

                let t1 = data[i3] * cc1 + data[i7] * ss1;
                let t2 = data[i7] * cc1 - data[i3] * ss1;
                let t3 = data[i4] * cc3 + data[i8] * ss3;
                let t4 = data[i8] * cc3 - data[i4] * ss3;
                let t5 = t1 + t3;
                let t6 = t2 + t4;
                let t3 = t1 - t3;
                let t4 = t2 - t4;

                let t2 = data[i6] + t6;
                data[i3] = t6 - data[i6];
                data[i8] = t2;
                let t2 = data[i2] - t3;
                data[i7] = -data[i2] - t3;
                data[i4] = t2;
                let t1 = data[i1] + t5;
                data[i6] = data[i1] - t5;
                data[i1] = t1;
                let t1 = data[i5] + t4;
                data[i5] -= t4;
                data[i2] = t1;

                i += id;
            }
            id <<= 1;
            i = id - span;
            id <<= 1;
            if i >= n {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Naive DFT in the same packed layout.
    fn packed_dft(input: &[f64]) -> Vec<f64> {
        let n = input.len();
        let mut out = vec![0.0; n];
        for k in 0..=n / 2 {
            let (mut re, mut im) = (0.0, 0.0);
            for (t, &x) in input.iter().enumerate() {
                let phi = -2.0 * PI * (k * t) as f64 / n as f64;
                re += x * phi.cos();
                im += x * phi.sin();
            }
            out[k] = re;
            if k != 0 && k != n / 2 {
                out[n - k] = im;
            }
        }
        out
    }

    #[test]
    fn impulse_is_flat() {
        let mut data = [0.0; 16];
        data[0] = 1.0;
        real_fft_inplace(&mut data);
        for k in 0..=8 {
            assert!((data[k] - 1.0).abs() < 1e-12, "re({k}) = {}", data[k]);
        }
        for k in 9..16 {
            assert!(data[k].abs() < 1e-12);
        }
    }

    #[test]
    fn alternating_signal_lands_at_nyquist() {
        let mut data: Vec<f64> = (0..32).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        real_fft_inplace(&mut data);
        assert!((data[16] - 32.0).abs() < 1e-9);
        assert!(data[0].abs() < 1e-9);
    }

    #[test]
    fn matches_naive_dft_magnitudes() {
        for n in [4usize, 8, 16, 64, 128] {
            let input: Vec<f64> = (0..n).map(|i| ((i * 7 + 3) % 11) as f64 - 5.0).collect();
            let expected = packed_dft(&input);
            let mut data = input.clone();
            real_fft_inplace(&mut data);

            assert!((data[0] - expected[0]).abs() < 1e-9);
            assert!((data[n / 2] - expected[n / 2]).abs() < 1e-9);
            for k in 1..n / 2 {
                let got = data[k].hypot(data[n - k]);
                let want = expected[k].hypot(expected[n - k]);
                assert!((got - want).abs() < 1e-9, "n={n} bin {k}: {got} vs {want}");
                assert!((data[k] - expected[k]).abs() < 1e-9, "n={n} re({k})");
                assert!((data[n - k] - expected[n - k]).abs() < 1e-9, "n={n} im({k})");
            }
        }
    }
}
