//! Property tests for the order statistics and moments.

#![allow(clippy::unwrap_used)]

use cytoshape_core::AnalysisError;
use cytoshape_core::stats::{kth_smallest, mean, median, normalize, variance};
use proptest::prelude::*;

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut copy = values.to_vec();
    copy.sort_by(f64::total_cmp);
    copy
}

/// Small integers as floats, so duplicates are common.
fn samples(max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec((-40_i32..40).prop_map(f64::from), 1..max_len)
}

proptest! {
    #[test]
    fn kth_smallest_matches_sorted_copy(data in samples(64)) {
        let expected = sorted(&data);
        for (k, want) in expected.iter().enumerate() {
            prop_assert_eq!(kth_smallest(&data, k).unwrap(), *want);
        }
    }

    #[test]
    fn kth_smallest_rejects_rank_past_end(data in samples(16)) {
        let len = data.len();
        let result = kth_smallest(&data, len);
        let rejected =
            matches!(result, Err(AnalysisError::RankOutOfRange { k, len: l }) if k == len && l == len);
        prop_assert!(rejected);
    }

    #[test]
    fn median_is_lower_middle_element(data in samples(20)) {
        let expected = sorted(&data)[(data.len() - 1) / 2];
        prop_assert_eq!(median(&data).unwrap(), expected);
    }

    #[test]
    fn normalize_hits_target_max(
        data in prop::collection::vec(0.0_f64..1000.0, 1..50),
        target in 0.5_f64..10.0,
    ) {
        prop_assume!(data.iter().any(|&v| v > 0.0));
        let mut scaled = data.clone();
        normalize(&mut scaled, target).unwrap();
        let max = scaled.iter().copied().fold(f64::MIN, f64::max);
        prop_assert!((max - target).abs() < 1e-9 * target.max(1.0));
        prop_assert_eq!(scaled.len(), data.len());
    }

    #[test]
    fn variance_is_non_negative_and_shift_invariant(data in samples(40), shift in -100_i32..100) {
        let base = variance(&data).unwrap();
        prop_assert!(base >= 0.0);
        let shifted: Vec<f64> = data.iter().map(|v| v + f64::from(shift)).collect();
        prop_assert!((variance(&shifted).unwrap() - base).abs() < 1e-6);
        let m = mean(&data).unwrap();
        prop_assert!(m >= -40.0 && m < 40.0);
    }
}

#[test]
fn median_for_every_length_up_to_twenty() {
    for n in 1..=20_u32 {
        // Descending so the selection has to do real work.
        let data: Vec<f64> = (0..n).rev().map(f64::from).collect();
        let rank = (data.len() - 1) / 2;
        assert_eq!(median(&data).unwrap(), kth_smallest(&data, rank).unwrap(), "n={n}");
        assert_eq!(median(&data).unwrap(), f64::from((n - 1) / 2), "n={n}");
    }
}

#[test]
fn empty_inputs_are_errors() {
    assert!(matches!(median(&[]), Err(AnalysisError::EmptyInput)));
    assert!(matches!(kth_smallest(&[], 0), Err(AnalysisError::EmptyInput)));
    assert!(matches!(normalize(&mut [], 1.0), Err(AnalysisError::DivideByZero)));
    assert!(matches!(normalize(&mut [0.0, 0.0], 1.0), Err(AnalysisError::DivideByZero)));
}
