//! Cascaded EMA pipelines: TEMA and TRIX.
//!
//! Three `EmaStage`s run in series; a stage only feeds the next once it has
//! formed. The recombined output is held back for `SETTLE_SAMPLES` samples
//! after the last stage forms.

use super::math::{clamp_length, ema_alpha, ema_step, percent_of};
use super::{Indicator, ScalarReading};
use crate::candle::{Bar, PriceField};

/// Recombined samples discarded after the third stage forms.
pub const SETTLE_SAMPLES: usize = 2;

/// One EMA stage seeded by the simple average of its first `L` inputs.
#[derive(Debug, Clone)]
pub struct EmaStage {
    length: usize,
    k: f32,
    sum: f32,
    count: usize,
    value: f32,
}

impl EmaStage {
    pub fn new(length: usize) -> Self {
        let length = length.max(1);
        Self {
            length,
            k: ema_alpha(length as f32),
            sum: 0.0,
            count: 0,
            value: 0.0,
        }
    }

    /// Feed one input; `Some(ema)` once the stage is formed.
    pub fn push(&mut self, x: f32) -> Option<f32> {
        if self.count < self.length {
            self.sum += x;
            self.count += 1;
            if self.count < self.length {
                return None;
            }
            self.value = self.sum / self.length as f32;
        } else {
            self.value = ema_step(self.value, x, self.k);
        }
        Some(self.value)
    }

    pub fn is_formed(&self) -> bool {
        self.count >= self.length
    }
}

#[derive(Debug, Clone)]
struct Cascade {
    e1: EmaStage,
    e2: EmaStage,
    e3: EmaStage,
}

impl Cascade {
    fn new(length: i32) -> Self {
        let length = clamp_length(length);
        Self {
            e1: EmaStage::new(length),
            e2: EmaStage::new(length),
            e3: EmaStage::new(length),
        }
    }

    fn push(&mut self, x: f32) -> Option<(f32, f32, f32)> {
        let v1 = self.e1.push(x)?;
        let v2 = self.e2.push(v1)?;
        let v3 = self.e3.push(v2)?;
        Some((v1, v2, v3))
    }
}

/// Triple exponential moving average `3*e1 - 3*e2 + e3`.
#[derive(Debug, Clone)]
pub struct TripleEma {
    source: PriceField,
    cascade: Cascade,
    samples: usize,
}

impl TripleEma {
    pub fn new(length: i32, source: PriceField) -> Self {
        Self {
            source,
            cascade: Cascade::new(length),
            samples: 0,
        }
    }
}

impl Indicator for TripleEma {
    type Output = ScalarReading;

    fn update(&mut self, bar: &Bar) -> ScalarReading {
        let Some((v1, v2, v3)) = self.cascade.push(self.source.of(bar)) else {
            return ScalarReading::EMPTY;
        };
        let value = 3.0 * v1 - 3.0 * v2 + v3;
        self.samples += 1;
        if self.samples <= SETTLE_SAMPLES {
            return ScalarReading::EMPTY;
        }
        ScalarReading {
            value,
            formed: true,
        }
    }

    fn is_formed(&self) -> bool {
        self.samples > SETTLE_SAMPLES
    }
}

/// TRIX: one-bar rate of change of the triple-smoothed EMA, in percent.
///
/// The formed flag lags the first emitted value by one bar: the first value
/// after settling is reported with `formed == false`.
#[derive(Debug, Clone)]
pub struct Trix {
    source: PriceField,
    cascade: Cascade,
    prev: Option<f32>,
    samples: usize,
    ready: bool,
}

impl Trix {
    pub fn new(length: i32, source: PriceField) -> Self {
        Self {
            source,
            cascade: Cascade::new(length),
            prev: None,
            samples: 0,
            ready: false,
        }
    }
}

impl Indicator for Trix {
    type Output = ScalarReading;

    fn update(&mut self, bar: &Bar) -> ScalarReading {
        let Some((_, _, v3)) = self.cascade.push(self.source.of(bar)) else {
            return ScalarReading::EMPTY;
        };
        let Some(prev) = self.prev.replace(v3) else {
            return ScalarReading::EMPTY;
        };
        let value = if prev != 0.0 {
            percent_of(v3 - prev, prev)
        } else {
            0.0
        };
        self.samples += 1;
        if self.samples <= SETTLE_SAMPLES {
            return ScalarReading::EMPTY;
        }
        let formed = self.ready;
        self.ready = true;
        ScalarReading { value, formed }
    }

    fn is_formed(&self) -> bool {
        self.ready
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(n: usize) -> Vec<Bar> {
        (0..n)
            .map(|i| {
                let c = 100.0 + i as f32;
                Bar::new(i as i64, c, c, c, c, 1.0)
            })
            .collect()
    }

    #[test]
    fn ema_stage_seeds_with_sma() {
        let mut stage = EmaStage::new(3);
        assert_eq!(stage.push(1.0), None);
        assert_eq!(stage.push(2.0), None);
        assert_eq!(stage.push(3.0), Some(2.0));
        assert!(stage.is_formed());
        assert_eq!(stage.push(4.0), Some(ema_step(2.0, 4.0, 0.5)));
    }

    #[test]
    fn tema_first_value_after_settle() {
        let length = 3;
        let mut tema = TripleEma::new(length, PriceField::Close);
        let out: Vec<_> = ramp(20).iter().map(|b| tema.update(b)).collect();
        let first = out.iter().position(|r| r.formed).unwrap();
        // last stage forms at 3L-3, then SETTLE_SAMPLES are dropped
        assert_eq!(first, 3 * length as usize - 3 + SETTLE_SAMPLES);
        assert!(out[..first].iter().all(|r| r.value.is_nan()));
        assert!(out[first..].iter().all(|r| r.formed && r.value.is_finite()));
    }

    #[test]
    fn trix_formed_flag_lags_first_value_by_one_bar() {
        let length = 3;
        let mut trix = Trix::new(length, PriceField::Close);
        let out: Vec<_> = ramp(20).iter().map(|b| trix.update(b)).collect();
        let first_value = out.iter().position(|r| !r.value.is_nan()).unwrap();
        let first_formed = out.iter().position(|r| r.formed).unwrap();
        assert_eq!(first_value, 3 * length as usize);
        assert!(!out[first_value].formed);
        assert_eq!(first_formed, first_value + 1);
        assert!(out[first_formed..].iter().all(|r| r.formed));
    }

    #[test]
    fn trix_zero_base_reads_zero() {
        let bars: Vec<Bar> = (0..12).map(|i| Bar::new(i, 0.0, 0.0, 0.0, 0.0, 0.0)).collect();
        let mut trix = Trix::new(2, PriceField::Close);
        let last = bars.iter().map(|b| trix.update(b)).last().unwrap();
        assert!(last.formed);
        assert_eq!(last.value, 0.0);
    }
}
