//! Sequential reference evaluation.
//!
//! One indicator instance per (series, parameter set), fed bar by bar. This is
//! the ground truth the device kernels are compared against.

use rayon::prelude::*;

use crate::candle::{Bar, BarSource};
use crate::indicators::Indicator;

/// Run a fresh indicator over one series.
pub fn run<I: Indicator>(mut indicator: I, bars: &[Bar]) -> Vec<I::Output> {
    bars.iter().map(|bar| indicator.update(bar)).collect()
}

/// Evaluate every (series, parameter set) pair, indexed `[series][param][bar]`.
///
/// Pairs are independent, so series are evaluated in parallel; each pair is
/// still strictly sequential over its bars.
pub fn evaluate_batch<S, P, I, F>(series: &[S], params: &[P], make: F) -> Vec<Vec<Vec<I::Output>>>
where
    S: BarSource + Sync,
    P: Sync,
    I: Indicator,
    I::Output: Send,
    F: Fn(&P) -> I + Sync,
{
    series
        .par_iter()
        .map(|s| params.iter().map(|p| run(make(p), s.bars())).collect())
        .collect()
}
