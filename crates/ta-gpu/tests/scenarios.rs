//! Hand-computed scenarios run through the batch engine.

use ta_core::candle::{Bar, PriceField, Series};
use ta_gpu::buffers::{LengthParams, ResultRecord, SourceParams};
use ta_gpu::kernels::{Adx, Aroon, Dmi, Smma, Tema, Trix};
use ta_gpu::Calculator;

fn highs_lows(highs: &[f32], lows: &[f32]) -> Series {
    highs
        .iter()
        .zip(lows)
        .enumerate()
        .map(|(i, (&h, &l))| Bar::new(i as i64, l, h, l, l, 1.0))
        .collect()
}

/// h = 10 + 2i, l = h - 1, close at the high: every true range is the up-move.
fn uptrend(n: usize) -> Series {
    (0..n)
        .map(|i| {
            let h = 10.0 + 2.0 * i as f32;
            Bar::new(i as i64, h - 0.5, h, h - 1.0, h, 100.0)
        })
        .collect()
}

fn ramp(n: usize) -> Series {
    (0..n)
        .map(|i| {
            let c = 100.0 + i as f32;
            Bar::new(i as i64, c, c, c, c, 1.0)
        })
        .collect()
}

#[test]
fn aroon_extrema_and_ages_by_hand() {
    let series = highs_lows(&[10.0, 11.0, 9.0, 12.0, 8.0], &[8.0, 9.0, 7.0, 10.0, 6.0]);
    let cube = Calculator::default()
        .calculate::<Aroon, _>(&[series], &[LengthParams::new(3)])
        .unwrap();
    let recs = &cube[0][0];

    assert!(!recs[0].formed());
    assert!(!recs[1].formed());
    assert!(recs[0].up.is_nan());
    let got: Vec<_> = recs[2..]
        .iter()
        .map(|r| (r.formed(), r.highest, r.high_age, r.lowest, r.low_age))
        .collect();
    assert_eq!(
        got,
        vec![
            (true, 11.0, 1, 7.0, 0),
            (true, 12.0, 0, 7.0, 1),
            (true, 12.0, 1, 6.0, 0),
        ]
    );
    assert_eq!(recs[3].up, 100.0);
    assert_eq!(recs[2].down, 100.0);
}

#[test]
fn aroon_rescans_when_extremum_leaves_window() {
    let series = highs_lows(&[20.0, 10.0, 11.0, 12.0, 9.0], &[19.0, 9.0, 10.0, 11.0, 8.0]);
    let cube = Calculator::default()
        .calculate::<Aroon, _>(&[series], &[LengthParams::new(3)])
        .unwrap();
    let recs = &cube[0][0];
    assert_eq!((recs[2].highest, recs[2].high_age), (20.0, 2));
    assert_eq!((recs[3].highest, recs[3].high_age), (12.0, 0));
    assert_eq!((recs[4].highest, recs[4].high_age), (12.0, 1));
}

#[test]
fn dmi_on_a_pure_uptrend() {
    let cube = Calculator::default()
        .calculate::<Dmi, _>(&[uptrend(6)], &[LengthParams::new(2)])
        .unwrap();
    let recs = &cube[0][0];
    assert!(!recs[0].formed());
    assert!(!recs[1].formed());
    for r in &recs[2..] {
        assert!(r.formed());
        assert_eq!(r.values[0], 100.0);
        assert_eq!(r.values[1], 0.0);
    }
}

#[test]
fn adx_forms_at_twice_the_length_minus_one() {
    let cube = Calculator::default()
        .calculate::<Adx, _>(&[uptrend(8)], &[LengthParams::new(2)])
        .unwrap();
    let recs = &cube[0][0];
    assert!(recs[..3].iter().all(|r| !r.formed()));
    assert!(recs[2].values[0].is_nan());
    for r in &recs[3..] {
        assert!(r.formed());
        assert_eq!(r.values, [100.0, 100.0, 0.0]);
    }
}

#[test]
fn smma_formed_flag_lags_first_value() {
    let cube = Calculator::default()
        .calculate::<Smma, _>(&[ramp(6)], &[SourceParams::new(3, PriceField::Close)])
        .unwrap();
    let recs = &cube[0][0];
    assert!(recs[1].value.is_nan());
    assert_eq!(recs[2].value, 101.0);
    assert!(!recs[2].formed());
    assert!(recs[3..].iter().all(|r| r.formed()));
}

#[test]
fn trix_formed_flag_lags_first_value() {
    let length = 2;
    let cube = Calculator::default()
        .calculate::<Trix, _>(&[ramp(12)], &[SourceParams::new(length, PriceField::Close)])
        .unwrap();
    let recs = &cube[0][0];
    let first_value = 3 * length as usize;
    assert!(recs[..first_value].iter().all(|r| r.value.is_nan() && !r.formed()));
    assert!(recs[first_value].value.is_finite());
    assert!(!recs[first_value].formed());
    assert!(recs[first_value + 1..].iter().all(|r| r.formed()));
}

#[test]
fn tema_is_formed_with_its_first_value() {
    let length = 3;
    let cube = Calculator::default()
        .calculate::<Tema, _>(&[ramp(15)], &[SourceParams::new(length, PriceField::Close)])
        .unwrap();
    let recs = &cube[0][0];
    let first = recs.iter().position(|r| !r.value.is_nan()).unwrap();
    assert_eq!(first, 3 * length as usize - 1);
    assert!(recs[first..].iter().all(|r| r.formed()));
}

/// Extremum of `values[i + 1 - length..=i]` (or from 0 while the window fills)
/// and its age, with ties going to the newest bar.
fn window_extremum(
    values: &[f32],
    i: usize,
    length: usize,
    better: fn(f32, f32) -> bool,
) -> (f32, u32) {
    let start = (i + 1).saturating_sub(length);
    let mut best = values[start];
    let mut best_idx = start;
    for (k, &v) in values.iter().enumerate().take(i + 1).skip(start + 1) {
        if better(v, best) {
            best = v;
            best_idx = k;
        }
    }
    (best, (i - best_idx) as u32)
}

#[test]
fn aroon_extrema_match_a_full_window_fold() {
    let batch = ta_gpu::synthetic::synthetic_batch(31, 20, 40, 200);
    let lengths: Vec<LengthParams> = [2, 3, 7, 25].iter().map(|&l| LengthParams::new(l)).collect();
    let cube = Calculator::default().calculate::<Aroon, _>(&batch, &lengths).unwrap();

    for (s, series) in batch.iter().enumerate() {
        let highs: Vec<f32> = series.iter().map(|b| b.h).collect();
        let lows: Vec<f32> = series.iter().map(|b| b.l).collect();
        for (p, params) in lengths.iter().enumerate() {
            let length = params.length as usize;
            for (i, rec) in cube[s][p].iter().enumerate() {
                let high = window_extremum(&highs, i, length, |v, best| v >= best);
                let low = window_extremum(&lows, i, length, |v, best| v <= best);
                assert_eq!((rec.highest, rec.high_age), high, "series {s} L={length} bar {i}");
                assert_eq!((rec.lowest, rec.low_age), low, "series {s} L={length} bar {i}");
            }
        }
    }
}
