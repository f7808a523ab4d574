//! Range and monotonicity invariants of the reference indicators on random walks.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use ta_core::candle::{Bar, PriceField};
use ta_core::indicators::aroon::Aroon;
use ta_core::indicators::atr::AverageTrueRange;
use ta_core::indicators::directional::{AverageDirectionalIndex, DirectionalIndex};
use ta_core::indicators::rsi::RelativeStrength;
use ta_core::indicators::window::{Bollinger, Donchian, WilliamsR};
use ta_core::indicators::Indicator;
use ta_core::reference::run;

const EPS: f32 = 1e-3;

fn walk(seed: u64, len: usize) -> Vec<Bar> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut close = 50.0f32;
    (0..len)
        .map(|i| {
            let open = close;
            close = (close + rng.gen_range(-1.5f32..1.5)).max(1.0);
            let h = open.max(close) + rng.gen_range(0.0f32..0.8);
            let l = (open.min(close) - rng.gen_range(0.0f32..0.8)).max(0.5);
            Bar::new(i as i64 * 60_000, open, h, l, close, rng.gen_range(1.0f32..10.0))
        })
        .collect()
}

fn assert_monotonic(formed: impl Iterator<Item = bool>) {
    let flags: Vec<bool> = formed.collect();
    let first = flags.iter().position(|&f| f).unwrap_or(flags.len());
    assert!(flags[first..].iter().all(|&f| f), "formed flag dropped back");
}

#[test]
fn oscillators_stay_in_range() {
    for seed in 0..8 {
        let bars = walk(seed, 400);
        for length in [2, 9, 21] {
            let rsi = run(RelativeStrength::new(length, PriceField::Close), &bars);
            assert_monotonic(rsi.iter().map(|r| r.formed));
            for r in rsi.iter().filter(|r| r.formed) {
                assert!((-EPS..=100.0 + EPS).contains(&r.value), "rsi {}", r.value);
            }

            let wr = run(WilliamsR::new(length), &bars);
            assert_monotonic(wr.iter().map(|r| r.formed));
            for r in wr.iter().filter(|r| r.formed) {
                assert!((-100.0 - EPS..=EPS).contains(&r.value), "%R {}", r.value);
            }
        }
    }
}

#[test]
fn directional_lines_stay_in_range() {
    for seed in 10..14 {
        let bars = walk(seed, 500);
        for length in [3, 14] {
            let dmi = run(DirectionalIndex::new(length), &bars);
            assert_monotonic(dmi.iter().map(|r| r.formed));
            for r in dmi.iter().filter(|r| r.formed) {
                for v in r.values {
                    assert!((-EPS..=100.0 + EPS).contains(&v), "dmi {v}");
                }
            }

            let adx = run(AverageDirectionalIndex::new(length), &bars);
            assert_monotonic(adx.iter().map(|r| r.formed));
            let first = adx.iter().position(|r| r.formed).unwrap();
            assert_eq!(first, 2 * length as usize - 1);

            let atr = run(AverageTrueRange::new(length), &bars);
            assert!(atr.iter().filter(|r| r.formed).all(|r| r.value >= 0.0));
        }
    }
}

#[test]
fn channels_are_ordered() {
    for seed in 20..24 {
        let bars = walk(seed, 300);
        for length in [1, 5, 20] {
            for r in run(Donchian::new(length), &bars).iter().filter(|r| r.formed) {
                let [upper, middle, lower] = r.values;
                assert!(upper >= middle && middle >= lower);
            }
            let bb = run(Bollinger::new(length, PriceField::Typical, 2.0), &bars);
            assert_monotonic(bb.iter().map(|r| r.formed));
            for r in bb.iter().filter(|r| r.formed) {
                let [upper, middle, lower] = r.values;
                assert!(upper >= middle && middle >= lower);
            }
        }
    }
}

#[test]
fn aroon_ages_stay_inside_the_window() {
    for seed in 30..34 {
        let bars = walk(seed, 300);
        for length in [2, 7, 25] {
            let mut aroon = Aroon::new(length);
            for (i, bar) in bars.iter().enumerate() {
                let r = aroon.update(bar);
                assert!((r.high_age as usize) < length as usize);
                assert!((r.low_age as usize) < length as usize);
                assert_eq!(r.formed, i + 1 >= length as usize);
                if r.formed {
                    assert!((0.0..=100.0).contains(&r.up));
                    assert!((0.0..=100.0).contains(&r.down));
                }
            }
        }
    }
}

#[test]
fn aroon_extrema_match_a_full_window_fold() {
    for seed in 40..48 {
        let bars = walk(seed, 250);
        for length in [2usize, 3, 7, 25] {
            let out = run(Aroon::new(length as i32), &bars);
            for (i, r) in out.iter().enumerate() {
                let start = (i + 1).saturating_sub(length);
                let window = &bars[start..=i];
                // newest bar wins ties
                let (hi_idx, hi) = window.iter().enumerate().fold(
                    (0, f32::NEG_INFINITY),
                    |acc, (k, b)| if b.h >= acc.1 { (k, b.h) } else { acc },
                );
                let (lo_idx, lo) = window.iter().enumerate().fold(
                    (0, f32::INFINITY),
                    |acc, (k, b)| if b.l <= acc.1 { (k, b.l) } else { acc },
                );
                let last = window.len() - 1;
                assert_eq!((r.highest, r.high_age as usize), (hi, last - hi_idx));
                assert_eq!((r.lowest, r.low_age as usize), (lo, last - lo_idx));
            }
        }
    }
}
