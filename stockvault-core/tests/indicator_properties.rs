//! Property tests for the indicator pipeline.
//!
//! Uses proptest to verify:
//! 1. Row preservation: every input point comes back, in order, unchanged
//! 2. Moving average definition: each value is the mean of its window
//! 3. RSI bounds: always within [0, 100]
//! 4. MACD on a constant series: MACD and Signal are zero once present
//! 5. Bollinger symmetry: bands sit equally far from the middle
//! 6. Stage independence: the fixed pipeline equals each stage run alone

mod common;

use common::points_from;
use proptest::prelude::*;
use stockvault_core::indicators::{
    compute_all, Bollinger, Indicator, IndicatorError, IndicatorOptions, IndicatorSeries, Macd,
    MovingAverage, Rsi, BB_LOWER_COLUMN, BB_MIDDLE_COLUMN, BB_UPPER_COLUMN, MACD_COLUMN,
    RSI_COLUMN, SIGNAL_COLUMN,
};

const EPS: f64 = 1e-9;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_closes(max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(1.0..1000.0_f64, 0..max_len)
        .prop_map(|v| v.into_iter().map(|c| (c * 100.0).round() / 100.0).collect())
}

fn arb_volumes(len: usize) -> impl Strategy<Value = Vec<u64>> {
    prop::collection::vec(0..5_000_000_u64, len)
}

// ── Fixed examples ───────────────────────────────────────────────────

#[test]
fn moving_average_worked_example() {
    let points = points_from(&[10.0, 20.0, 30.0, 40.0, 50.0], &[]);
    let series = IndicatorSeries::new(points)
        .unwrap()
        .with(&MovingAverage::close(3));

    assert_eq!(
        series.column("ma_3").unwrap(),
        &[None, None, Some(20.0), Some(30.0), Some(40.0)]
    );
}

#[test]
fn unsorted_input_is_rejected() {
    let mut points = points_from(&[1.0, 2.0, 3.0], &[]);
    points.swap(0, 2);
    assert!(matches!(
        compute_all(&points),
        Err(IndicatorError::InvalidSeries(_))
    ));
}

#[test]
fn duplicate_dates_are_rejected() {
    let mut points = points_from(&[1.0, 2.0], &[]);
    points[1].trade_date = points[0].trade_date;
    assert!(compute_all(&points).is_err());
}

#[test]
fn mixed_symbols_are_rejected() {
    let mut points = points_from(&[1.0, 2.0], &[]);
    points[1].symbol = "OTHER".into();
    assert!(compute_all(&points).is_err());
}

// ── 1. Row preservation ──────────────────────────────────────────────

proptest! {
    #[test]
    fn compute_all_preserves_rows(closes in arb_closes(80)) {
        let points = points_from(&closes, &[]);
        let series = compute_all(&points).unwrap();

        prop_assert_eq!(series.len(), points.len());
        prop_assert_eq!(series.points(), points.as_slice());
        for name in series.column_names() {
            prop_assert_eq!(series.column(name).unwrap().len(), points.len());
        }
    }
}

// ── 2. Moving average definition ─────────────────────────────────────

proptest! {
    #[test]
    fn moving_average_is_window_mean(closes in arb_closes(60), window in 1..10_usize) {
        let points = points_from(&closes, &[]);
        let series = IndicatorSeries::new(points)
            .unwrap()
            .with(&MovingAverage::close(window));
        let name = format!("ma_{window}");

        for i in 0..closes.len() {
            let value = series.value(&name, i);
            if i + 1 < window {
                prop_assert!(value.is_none());
            } else {
                let expected = closes[i + 1 - window..=i].iter().sum::<f64>() / window as f64;
                let actual = value.unwrap();
                prop_assert!((actual - expected).abs() < EPS * expected.abs().max(1.0));
            }
        }
    }

    #[test]
    fn volume_average_uses_volume(
        (closes, volumes) in (1..40_usize).prop_flat_map(|n| {
            (prop::collection::vec(1.0..100.0_f64, n), arb_volumes(n))
        }),
    ) {
        let points = points_from(&closes, &volumes);
        let series = IndicatorSeries::new(points)
            .unwrap()
            .with(&MovingAverage::volume(5));

        for i in 4..closes.len() {
            let expected = volumes[i - 4..=i].iter().map(|&v| v as f64).sum::<f64>() / 5.0;
            let actual = series.value("volume_ma_5", i).unwrap();
            prop_assert!((actual - expected).abs() < 1e-6);
        }
    }
}

// ── 3. RSI bounds ────────────────────────────────────────────────────

proptest! {
    #[test]
    fn rsi_stays_in_range(closes in arb_closes(80), period in 2..20_usize) {
        let points = points_from(&closes, &[]);
        let series = IndicatorSeries::new(points)
            .unwrap()
            .with(&Rsi::new(period));

        for i in 0..closes.len() {
            match series.value(RSI_COLUMN, i) {
                Some(v) => {
                    prop_assert!(i >= period);
                    prop_assert!((0.0..=100.0).contains(&v), "rsi {} at {}", v, i);
                }
                None => prop_assert!(i < period),
            }
        }
    }

    #[test]
    fn rsi_saturates_without_losses(start in 1.0..100.0_f64, step in 0.0..5.0_f64) {
        let closes: Vec<f64> = (0..30).map(|i| start + step * i as f64).collect();
        let points = points_from(&closes, &[]);
        let series = IndicatorSeries::new(points).unwrap().with(&Rsi::new(14));

        for i in 14..30 {
            prop_assert_eq!(series.value(RSI_COLUMN, i), Some(100.0));
        }
    }
}

// ── 4. MACD on a constant series ─────────────────────────────────────

proptest! {
    #[test]
    fn macd_is_zero_for_constant_prices(price in 1.0..1000.0_f64, len in 1..80_usize) {
        let points = points_from(&vec![price; len], &[]);
        let series = IndicatorSeries::new(points)
            .unwrap()
            .with(&Macd::new(12, 26, 9));

        for i in 0..len {
            let macd = series.value(MACD_COLUMN, i);
            let signal = series.value(SIGNAL_COLUMN, i);
            if i < 33 {
                prop_assert!(macd.is_none() && signal.is_none());
            } else {
                prop_assert!(macd.unwrap().abs() < EPS);
                prop_assert!(signal.unwrap().abs() < EPS);
            }
        }
    }
}

// ── 5. Bollinger symmetry ────────────────────────────────────────────

proptest! {
    #[test]
    fn bollinger_bands_are_symmetric(
        closes in arb_closes(60),
        window in 2..25_usize,
        k in 0.5..3.0_f64,
    ) {
        let points = points_from(&closes, &[]);
        let series = IndicatorSeries::new(points)
            .unwrap()
            .with(&Bollinger::new(window, k));

        for i in 0..closes.len() {
            let (Some(mid), Some(up), Some(lo)) = (
                series.value(BB_MIDDLE_COLUMN, i),
                series.value(BB_UPPER_COLUMN, i),
                series.value(BB_LOWER_COLUMN, i),
            ) else {
                prop_assert!(i + 1 < window);
                continue;
            };
            prop_assert!(up >= lo);
            prop_assert!(((up - mid) - (mid - lo)).abs() < 1e-6);
        }
    }
}

// ── 6. Stage independence ────────────────────────────────────────────

proptest! {
    #[test]
    fn pipeline_matches_stages_run_alone(closes in arb_closes(70)) {
        let points = points_from(&closes, &[]);
        let combined = compute_all(&points).unwrap();

        for stage in IndicatorOptions::default().indicators() {
            let alone = IndicatorSeries::new(points.clone())
                .unwrap()
                .with(stage.as_ref());
            for name in alone.column_names() {
                prop_assert_eq!(
                    combined.column(name),
                    alone.column(name),
                    "column {} differs for stage {}",
                    name,
                    stage.name()
                );
            }
        }
    }
}
