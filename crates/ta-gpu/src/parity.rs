//! Device vs reference parity checking.
//!
//! Every kernel names the sequential reference indicator it must reproduce.
//! `check` runs both over the same batch and compares each record line by
//! line, formed flag included.

use serde::Serialize;

use ta_core::candle::{BarSource, PriceField};
use ta_core::indicators::{
    aroon, atr, cascade, directional, moving, rsi, window, AroonReading, Indicator,
    IndicatorKind, ScalarReading, TripleReading,
};
use ta_core::reference;
use ta_core::sweep::generate_combinations;

use crate::buffers::{AroonRecord, ScalarRecord, TripleRecord};
use crate::calculator::Calculator;
use crate::device::DeviceRuntime;
use crate::error::CalcError;
use crate::grid::Kernel;
use crate::kernels;
use crate::layout::ResultCube;
use crate::params::ParameterSet;
use crate::precision::{relative_error, ulp_distance, within_tolerance};

/// Uniform line view over device records and reference readings.
pub trait RecordLines {
    const LINES: usize;
    fn line(&self, idx: usize) -> f32;
    fn is_formed(&self) -> bool;
}

impl RecordLines for ScalarRecord {
    const LINES: usize = 1;
    fn line(&self, _idx: usize) -> f32 {
        self.value
    }
    fn is_formed(&self) -> bool {
        self.formed != 0
    }
}

impl RecordLines for ScalarReading {
    const LINES: usize = 1;
    fn line(&self, _idx: usize) -> f32 {
        self.value
    }
    fn is_formed(&self) -> bool {
        self.formed
    }
}

impl RecordLines for TripleRecord {
    const LINES: usize = 3;
    fn line(&self, idx: usize) -> f32 {
        self.values[idx]
    }
    fn is_formed(&self) -> bool {
        self.formed != 0
    }
}

impl RecordLines for TripleReading {
    const LINES: usize = 3;
    fn line(&self, idx: usize) -> f32 {
        self.values[idx]
    }
    fn is_formed(&self) -> bool {
        self.formed
    }
}

// up, down, highest, lowest, high_age, low_age
impl RecordLines for AroonRecord {
    const LINES: usize = 6;
    fn line(&self, idx: usize) -> f32 {
        match idx {
            0 => self.up,
            1 => self.down,
            2 => self.highest,
            3 => self.lowest,
            4 => self.high_age as f32,
            _ => self.low_age as f32,
        }
    }
    fn is_formed(&self) -> bool {
        self.formed != 0
    }
}

impl RecordLines for AroonReading {
    const LINES: usize = 6;
    fn line(&self, idx: usize) -> f32 {
        match idx {
            0 => self.up,
            1 => self.down,
            2 => self.highest,
            3 => self.lowest,
            4 => self.high_age as f32,
            _ => self.low_age as f32,
        }
    }
    fn is_formed(&self) -> bool {
        self.formed
    }
}

/// A kernel paired with the reference indicator it reproduces.
pub trait Referenced: Kernel {
    type Reference: Indicator;

    fn reference(params: &Self::Params) -> Self::Reference;
}

macro_rules! referenced {
    ($kernel:ty, $reference:ty, |$p:ident| $make:expr) => {
        impl Referenced for $kernel {
            type Reference = $reference;
            fn reference($p: &Self::Params) -> $reference {
                $make
            }
        }
    };
}

referenced!(kernels::Dmi, directional::DirectionalIndex, |p| {
    directional::DirectionalIndex::new(p.length)
});
referenced!(kernels::Adx, directional::AverageDirectionalIndex, |p| {
    directional::AverageDirectionalIndex::new(p.length)
});
referenced!(kernels::Atr, atr::AverageTrueRange, |p| {
    atr::AverageTrueRange::new(p.length)
});
referenced!(kernels::Rsi, rsi::RelativeStrength, |p| {
    rsi::RelativeStrength::new(p.length, PriceField::from_code(p.source))
});
referenced!(kernels::Aroon, aroon::Aroon, |p| aroon::Aroon::new(p.length));
referenced!(kernels::Sma, moving::SimpleMovingAverage, |p| {
    moving::SimpleMovingAverage::new(p.length, PriceField::from_code(p.source))
});
referenced!(kernels::Smma, moving::SmoothedMovingAverage, |p| {
    moving::SmoothedMovingAverage::new(p.length, PriceField::from_code(p.source))
});
referenced!(kernels::Tema, cascade::TripleEma, |p| {
    cascade::TripleEma::new(p.length, PriceField::from_code(p.source))
});
referenced!(kernels::Trix, cascade::Trix, |p| {
    cascade::Trix::new(p.length, PriceField::from_code(p.source))
});
referenced!(kernels::Donchian, window::Donchian, |p| window::Donchian::new(p.length));
referenced!(kernels::WilliamsR, window::WilliamsR, |p| window::WilliamsR::new(p.length));
referenced!(kernels::Bollinger, window::Bollinger, |p| {
    window::Bollinger::new(p.length, PriceField::from_code(p.source), p.width)
});

/// First record where device and reference disagree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Divergence {
    pub series: usize,
    pub param: usize,
    pub bar: usize,
    /// `None` for a formed-flag mismatch.
    pub line: Option<usize>,
    pub expected: f32,
    pub actual: f32,
}

/// Parity summary for one kernel over one batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParityReport {
    pub kernel: &'static str,
    pub series: usize,
    pub params: usize,
    pub records: usize,
    pub tolerance: f64,
    pub formed_mismatches: usize,
    pub value_mismatches: usize,
    pub max_rel_error: f64,
    pub max_ulps: u32,
    pub first_divergence: Option<Divergence>,
}

impl ParityReport {
    pub fn passed(&self) -> bool {
        self.formed_mismatches == 0 && self.value_mismatches == 0
    }
}

/// Compare a device cube against reference output indexed `[series][param][bar]`.
pub fn compare<R, E>(
    kernel: &'static str,
    cube: &ResultCube<R>,
    expected: &[Vec<Vec<E>>],
    tolerance: f64,
) -> Result<ParityReport, CalcError>
where
    R: RecordLines,
    E: RecordLines,
{
    if cube.series_count() != expected.len() {
        return Err(CalcError::Layout(format!(
            "{kernel}: cube has {} series, reference has {}",
            cube.series_count(),
            expected.len()
        )));
    }

    let mut report = ParityReport {
        kernel,
        series: cube.series_count(),
        params: cube.param_count(),
        records: 0,
        tolerance,
        formed_mismatches: 0,
        value_mismatches: 0,
        max_rel_error: 0.0,
        max_ulps: 0,
        first_divergence: None,
    };
    let lines = R::LINES.min(E::LINES);

    for (s, p, actual) in cube.iter() {
        let want = expected
            .get(s)
            .and_then(|per_series| per_series.get(p))
            .ok_or_else(|| CalcError::Layout(format!("{kernel}: no reference for ({s}, {p})")))?;
        if want.len() != actual.len() {
            return Err(CalcError::Layout(format!(
                "{kernel}: ({s}, {p}) has {} records, reference has {}",
                actual.len(),
                want.len()
            )));
        }
        for (bar, (a, e)) in actual.iter().zip(want).enumerate() {
            report.records += 1;
            if a.is_formed() != e.is_formed() {
                report.formed_mismatches += 1;
                report.first_divergence.get_or_insert(Divergence {
                    series: s,
                    param: p,
                    bar,
                    line: None,
                    expected: e.is_formed() as u8 as f32,
                    actual: a.is_formed() as u8 as f32,
                });
            }
            for line in 0..lines {
                let (ev, av) = (e.line(line), a.line(line));
                let rel = relative_error(ev, av);
                if rel.is_finite() {
                    report.max_rel_error = report.max_rel_error.max(rel);
                }
                report.max_ulps = report.max_ulps.max(ulp_distance(ev, av));
                if !within_tolerance(ev, av, tolerance) {
                    report.value_mismatches += 1;
                    report.first_divergence.get_or_insert(Divergence {
                        series: s,
                        param: p,
                        bar,
                        line: Some(line),
                        expected: ev,
                        actual: av,
                    });
                }
            }
        }
    }
    Ok(report)
}

/// Run kernel `K` and its reference over the same batch and compare.
pub fn check<K, D, S>(
    calc: &Calculator<D>,
    series: &[S],
    params: &[K::Params],
    tolerance: f64,
) -> Result<ParityReport, CalcError>
where
    K: Referenced,
    K::Output: RecordLines,
    <K::Reference as Indicator>::Output: RecordLines + Send,
    D: DeviceRuntime,
    S: BarSource + Sync,
{
    let cube = calc.calculate::<K, S>(series, params)?;
    let expected = reference::evaluate_batch(series, params, K::reference);
    let report = compare(K::NAME, &cube, &expected, tolerance)?;
    if !report.passed() {
        tracing::warn!(
            kernel = K::NAME,
            formed_mismatches = report.formed_mismatches,
            value_mismatches = report.value_mismatches,
            "device output diverges from reference"
        );
    }
    Ok(report)
}

fn check_sweep<K, D, S>(
    calc: &Calculator<D>,
    series: &[S],
    combos: &[Vec<(String, f64)>],
    tolerance: f64,
) -> Result<ParityReport, CalcError>
where
    K: Referenced,
    K::Output: RecordLines,
    <K::Reference as Indicator>::Output: RecordLines + Send,
    D: DeviceRuntime,
    S: BarSource + Sync,
{
    let params = combos
        .iter()
        .map(|c| K::Params::from_overrides(c))
        .collect::<Result<Vec<_>, _>>()?;
    check::<K, D, S>(calc, series, &params, tolerance)
}

/// Default sweep used when no sweep spec is given: a spread of lengths,
/// including a degenerate one, and two band widths for Bollinger.
pub fn default_combinations(kind: IndicatorKind) -> Vec<Vec<(String, f64)>> {
    use ta_core::sweep::SweepAxis;

    let mut axes = vec![SweepAxis {
        path: "length".to_string(),
        values: vec![0.0, 2.0, 5.0, 14.0, 30.0],
    }];
    match kind {
        IndicatorKind::Bollinger => axes.push(SweepAxis {
            path: "width".to_string(),
            values: vec![1.5, 2.0],
        }),
        IndicatorKind::Rsi
        | IndicatorKind::Sma
        | IndicatorKind::Smma
        | IndicatorKind::Tema
        | IndicatorKind::Trix => axes.push(SweepAxis {
            path: "source".to_string(),
            values: vec![
                PriceField::Close.code() as f64,
                PriceField::Typical.code() as f64,
            ],
        }),
        _ => {}
    }
    generate_combinations(&axes)
}

/// Dispatch a parity check by indicator kind.
pub fn check_kind<D, S>(
    kind: IndicatorKind,
    calc: &Calculator<D>,
    series: &[S],
    combos: &[Vec<(String, f64)>],
    tolerance: f64,
) -> Result<ParityReport, CalcError>
where
    D: DeviceRuntime,
    S: BarSource + Sync,
{
    match kind {
        IndicatorKind::Dmi => check_sweep::<kernels::Dmi, D, S>(calc, series, combos, tolerance),
        IndicatorKind::Adx => check_sweep::<kernels::Adx, D, S>(calc, series, combos, tolerance),
        IndicatorKind::Atr => check_sweep::<kernels::Atr, D, S>(calc, series, combos, tolerance),
        IndicatorKind::Rsi => check_sweep::<kernels::Rsi, D, S>(calc, series, combos, tolerance),
        IndicatorKind::Aroon => {
            check_sweep::<kernels::Aroon, D, S>(calc, series, combos, tolerance)
        }
        IndicatorKind::Sma => check_sweep::<kernels::Sma, D, S>(calc, series, combos, tolerance),
        IndicatorKind::Smma => check_sweep::<kernels::Smma, D, S>(calc, series, combos, tolerance),
        IndicatorKind::Tema => check_sweep::<kernels::Tema, D, S>(calc, series, combos, tolerance),
        IndicatorKind::Trix => check_sweep::<kernels::Trix, D, S>(calc, series, combos, tolerance),
        IndicatorKind::Donchian => {
            check_sweep::<kernels::Donchian, D, S>(calc, series, combos, tolerance)
        }
        IndicatorKind::WilliamsR => {
            check_sweep::<kernels::WilliamsR, D, S>(calc, series, combos, tolerance)
        }
        IndicatorKind::Bollinger => {
            check_sweep::<kernels::Bollinger, D, S>(calc, series, combos, tolerance)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::precision::TIER_T0_TOLERANCE;

    #[test]
    fn default_sweeps_have_expected_sizes() {
        assert_eq!(default_combinations(IndicatorKind::Adx).len(), 5);
        assert_eq!(default_combinations(IndicatorKind::Bollinger).len(), 10);
        assert_eq!(default_combinations(IndicatorKind::Trix).len(), 10);
    }

    #[test]
    fn compare_flags_formed_and_value_mismatches() {
        let flat = crate::flatten::flatten(&[vec![
            ta_core::candle::Bar::new(0, 1.0, 1.0, 1.0, 1.0, 1.0),
            ta_core::candle::Bar::new(1, 1.0, 1.0, 1.0, 1.0, 1.0),
        ]])
        .unwrap();
        let device = [ScalarRecord::new(0, f32::NAN, false), ScalarRecord::new(1, 2.0, true)];
        let cube = crate::layout::unflatten(&device, &flat, 1).unwrap();

        let same = vec![vec![vec![
            ScalarReading::EMPTY,
            ScalarReading {
                value: 2.0,
                formed: true,
            },
        ]]];
        let report = compare("sma", &cube, &same, TIER_T0_TOLERANCE).unwrap();
        assert!(report.passed());
        assert_eq!(report.records, 2);

        let off = vec![vec![vec![
            ScalarReading::EMPTY,
            ScalarReading {
                value: 2.5,
                formed: false,
            },
        ]]];
        let report = compare("sma", &cube, &off, TIER_T0_TOLERANCE).unwrap();
        assert_eq!(report.formed_mismatches, 1);
        assert_eq!(report.value_mismatches, 1);
        let first = report.first_divergence.unwrap();
        assert_eq!((first.bar, first.line), (1, None));
    }
}
