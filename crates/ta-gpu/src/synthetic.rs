//! Seeded synthetic OHLCV series for parity runs.
//!
//! Random walks with occasional repeated bars, so ties in the extremum
//! trackers and zero-range windows show up regularly.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use ta_core::candle::{Bar, Series};

const BAR_MS: i64 = 60_000;

/// One random-walk series of `len` bars starting near `base_price`.
pub fn random_walk(rng: &mut StdRng, len: usize, base_price: f64) -> Series {
    let mut bars = Vec::with_capacity(len);
    let mut price = base_price;
    let start_t = rng.gen_range(0..1_000i64) * BAR_MS;

    for i in 0..len {
        let t = start_t + i as i64 * BAR_MS;
        // repeat the previous bar now and then (ties, flat windows)
        if i > 0 && rng.gen_bool(0.05) {
            let prev: Bar = bars[i - 1];
            bars.push(Bar { t, ..prev });
            continue;
        }
        let open = price;
        price *= 1.0 + rng.gen_range(-0.03_f64..0.03);
        let close = price;
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.02));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.02));
        let volume = rng.gen_range(500.0..3000.0);
        bars.push(Bar::new(
            t,
            open as f32,
            high as f32,
            low as f32,
            close as f32,
            volume as f32,
        ));
    }
    bars
}

/// `count` series with lengths in `min_len..=max_len`, fully determined by `seed`.
pub fn synthetic_batch(seed: u64, count: usize, min_len: usize, max_len: usize) -> Vec<Series> {
    let mut rng = StdRng::seed_from_u64(seed);
    let hi = max_len.max(min_len);
    (0..count)
        .map(|_| {
            let len = rng.gen_range(min_len..=hi);
            let base = rng.gen_range(1.0..50_000.0);
            random_walk(&mut rng, len, base)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_batch() {
        let a = synthetic_batch(7, 4, 10, 40);
        let b = synthetic_batch(7, 4, 10, 40);
        assert_eq!(a, b);
        assert!(a.iter().all(|s| (10..=40).contains(&s.len())));
    }

    #[test]
    fn bars_are_well_formed() {
        let batch = synthetic_batch(11, 3, 50, 50);
        for series in &batch {
            for w in series.windows(2) {
                assert!(w[1].t > w[0].t);
            }
            for b in series {
                assert!(b.h >= b.l);
                assert!(b.h >= b.o.min(b.c));
            }
        }
    }
}
