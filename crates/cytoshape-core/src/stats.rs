//! Order statistics and moments over `f64` sequences.
//!
//! Pure functions used by the descriptor stage and exposed for hosts that
//! format descriptor vectors themselves. None of them mutate their input
//! except [`normalize`], which scales in place.

use crate::types::AnalysisError;

/// Scale `values` in place so that their maximum equals `target_max`.
///
/// # Errors
///
/// Returns [`AnalysisError::DivideByZero`] if `values` is empty or its
/// maximum is exactly zero.
pub fn normalize(values: &mut [f64], target_max: f64) -> Result<(), AnalysisError> {
    let max = values
        .iter()
        .copied()
        .reduce(f64::max)
        .ok_or(AnalysisError::DivideByZero)?;
    if max == 0.0 {
        return Err(AnalysisError::DivideByZero);
    }

    let scale = target_max / max;
    for v in values.iter_mut() {
        *v *= scale;
    }
    Ok(())
}

/// Arithmetic mean.
///
/// # Errors
///
/// Returns [`AnalysisError::EmptyInput`] if `values` is empty.
#[allow(clippy::cast_precision_loss)]
pub fn mean(values: &[f64]) -> Result<f64, AnalysisError> {
    if values.is_empty() {
        return Err(AnalysisError::EmptyInput);
    }
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population variance: mean squared deviation from the mean.
///
/// # Errors
///
/// Returns [`AnalysisError::EmptyInput`] if `values` is empty.
#[allow(clippy::cast_precision_loss)]
pub fn variance(values: &[f64]) -> Result<f64, AnalysisError> {
    let m = mean(values)?;
    let sum: f64 = values.iter().map(|v| (m - v) * (m - v)).sum();
    Ok(sum / values.len() as f64)
}

/// Lower median: the element of rank `(n - 1) / 2`.
///
/// For even `n` this is the lower of the two middle elements, not their
/// average.
///
/// # Errors
///
/// Returns [`AnalysisError::EmptyInput`] if `values` is empty.
pub fn median(values: &[f64]) -> Result<f64, AnalysisError> {
    if values.is_empty() {
        return Err(AnalysisError::EmptyInput);
    }
    kth_smallest(values, (values.len() - 1) / 2)
}

/// The `k`-th smallest element (0-based) by Wirth's selection algorithm.
///
/// Repeatedly runs a Hoare partition of the active range around the value
/// currently stored at index `k`, narrowing the range to the side that
/// contains `k` until it collapses. Works on a private copy; the caller's
/// slice is left untouched. Expected O(n).
///
/// Reference: N. Wirth, *Algorithms + Data Structures = Programs*, 1976.
///
/// # Errors
///
/// Returns [`AnalysisError::EmptyInput`] if `values` is empty and
/// [`AnalysisError::RankOutOfRange`] if `k >= values.len()`.
pub fn kth_smallest(values: &[f64], k: usize) -> Result<f64, AnalysisError> {
    if values.is_empty() {
        return Err(AnalysisError::EmptyInput);
    }
    if k >= values.len() {
        return Err(AnalysisError::RankOutOfRange {
            k,
            len: values.len(),
        });
    }

    let mut a = values.to_vec();
    let n = a.len();

    // `j` can step one below `l` (to -1 when l == 0), so the partition
    // bounds are tracked as `isize`.
    let ki = to_isize(k);
    let mut l: isize = 0;
    let mut m: isize = to_isize(n - 1);

    while l < m {
        let x = a[k];
        let mut i = l;
        let mut j = m;
        loop {
            while i < to_isize(n) && a[to_usize(i)] < x {
                i += 1;
            }
            while j >= 0 && x < a[to_usize(j)] {
                j -= 1;
            }
            if i <= j {
                a.swap(to_usize(i), to_usize(j));
                i += 1;
                j -= 1;
            }
            if i > j {
                break;
            }
        }
        if j < ki {
            l = i;
        }
        if ki < i {
            m = j;
        }
    }

    Ok(a[k])
}

#[allow(clippy::cast_possible_wrap)]
const fn to_isize(v: usize) -> isize {
    v as isize
}

#[allow(clippy::cast_sign_loss)]
const fn to_usize(v: isize) -> usize {
    v as usize
}
