//! Every kernel must match its sequential reference bit for bit, over a sweep
//! of parameter sets and a batch of ragged synthetic series.

use ta_core::indicators::IndicatorKind;
use ta_gpu::buffers::{BandParams, LengthParams, SourceParams};
use ta_gpu::kernels;
use ta_gpu::parity::{check, check_kind, default_combinations};
use ta_gpu::precision::TIER_T0_TOLERANCE;
use ta_gpu::synthetic::synthetic_batch;
use ta_gpu::{Calculator, HostDevice};
use ta_core::candle::PriceField;

#[test]
fn all_kernels_match_reference_bitwise() {
    let calc = Calculator::default();
    let batch = synthetic_batch(20240601, 6, 0, 300);

    for kind in IndicatorKind::ALL {
        let combos = default_combinations(kind);
        let report = check_kind(kind, &calc, &batch, &combos, TIER_T0_TOLERANCE).unwrap();
        assert!(
            report.passed(),
            "{kind} diverged: {:?}",
            report.first_divergence
        );
        assert_eq!(report.series, 6);
        assert_eq!(report.params, combos.len());
        assert_eq!(report.max_ulps, 0, "{kind}");
    }
}

#[test]
fn parity_holds_across_thread_counts_and_block_sizes() {
    let batch = synthetic_batch(99, 5, 20, 120);
    let params: Vec<SourceParams> = [1, 3, 7, 20]
        .iter()
        .map(|&l| SourceParams::new(l, PriceField::Weighted))
        .collect();

    for threads in [1, 3] {
        for block in [1, 32, 256] {
            let dev = HostDevice::new().with_threads(threads).unwrap();
            let calc = Calculator::new(dev).with_block_size(block);
            let report =
                check::<kernels::Trix, _, _>(&calc, &batch, &params, TIER_T0_TOLERANCE).unwrap();
            assert!(report.passed(), "threads={threads} block={block}");
        }
    }
}

#[test]
fn long_series_parity_for_stateful_families() {
    let batch = synthetic_batch(7, 2, 2000, 3000);
    let calc = Calculator::default();
    let lengths: Vec<LengthParams> = [2, 14, 50].iter().map(|&l| LengthParams::new(l)).collect();

    let adx = check::<kernels::Adx, _, _>(&calc, &batch, &lengths, TIER_T0_TOLERANCE).unwrap();
    assert!(adx.passed(), "{:?}", adx.first_divergence);
    let aroon = check::<kernels::Aroon, _, _>(&calc, &batch, &lengths, TIER_T0_TOLERANCE).unwrap();
    assert!(aroon.passed(), "{:?}", aroon.first_divergence);

    let bands = vec![
        BandParams::new(20, PriceField::Close, 2.0),
        BandParams::new(5, PriceField::Typical, 0.5),
    ];
    let bb = check::<kernels::Bollinger, _, _>(&calc, &batch, &bands, TIER_T0_TOLERANCE).unwrap();
    assert!(bb.passed(), "{:?}", bb.first_divergence);
}
