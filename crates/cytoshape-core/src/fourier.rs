//! Real-input discrete Fourier transform with packed output.
//!
//! The spectrum of a real signal is conjugate-symmetric, so only the first
//! `N/2 + 1` bins carry information. [`real_dft_packed`] lays them out in
//! CCS order, the same length as the input:
//!
//! ```text
//! [Re0, Re1, Im1, Re2, Im2, ..., Re(N/2)]   N even
//! [Re0, Re1, Im1, Re2, Im2, ..., Im((N-1)/2)]   N odd
//! ```
//!
//! `Im0` (and `Im(N/2)` for even `N`) are always zero and are dropped.

use rustfft::FftPlanner;
use rustfft::num_complex::Complex;

/// Forward DFT of `signal`, unnormalised, packed as described above.
#[must_use]
pub fn real_dft_packed(signal: &[f64]) -> Vec<f64> {
    let n = signal.len();
    if n == 0 {
        return Vec::new();
    }

    let mut buffer: Vec<Complex<f64>> = signal.iter().map(|&s| Complex::new(s, 0.0)).collect();
    let mut planner = FftPlanner::<f64>::new();
    planner.plan_fft_forward(n).process(&mut buffer);

    let mut packed = Vec::with_capacity(n);
    packed.push(buffer[0].re);
    for bin in &buffer[1..=n / 2] {
        packed.push(bin.re);
        if packed.len() < n {
            packed.push(bin.im);
        }
    }
    packed
}
