/// Directional Movement System: Wilder smoothing of +DM, -DM and True Range.
///
/// Algorithm:
/// 1. Bar 0 only primes the previous high/low/close.
/// 2. From bar 1 on, compute +DM, -DM and TR against the previous bar (delta `j = bar - 1`).
/// 3. Accumulate the first `L` deltas, seed the averages as `sum / L` at `j == L - 1`,
///    then Wilder-smooth: `avg = avg - avg / L + new`.
/// 4. +DI = smoothed +DM / smoothed TR * 100, -DI likewise. DI is formed from the
///    first bar with `j >= L - 1` whose smoothed TR is positive.
/// 5. DX = |+DI - -DI| / (+DI + -DI) * 100.
/// 6. ADX = running average of the first `L` DX values, then SMMA-blended.
use super::math::{
    clamp_length, directional_movement, dx_from_di, percent_of, smma_step, true_range,
    wilder_step,
};
use super::{Indicator, TripleReading};
use crate::candle::Bar;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for the first bar to set prev high/low/close.
    Priming,
    /// Summing the first `L` deltas.
    Accumulating,
    /// The bar that turned the sums into averages.
    Seeded,
    /// Wilder smoothing active.
    Smoothing,
}

/// Wilder-smoothed +DM/-DM/TR state shared by DMI and ADX.
#[derive(Debug, Clone)]
pub struct WilderDirectional {
    length: usize,
    prev_high: f32,
    prev_low: f32,
    prev_close: f32,
    deltas: usize,
    plus: f32,
    minus: f32,
    tr: f32,
    di_formed: bool,
    phase: Phase,
}

impl WilderDirectional {
    pub fn new(length: i32) -> Self {
        Self {
            length: clamp_length(length),
            prev_high: 0.0,
            prev_low: 0.0,
            prev_close: 0.0,
            deltas: 0,
            plus: 0.0,
            minus: 0.0,
            tr: 0.0,
            di_formed: false,
            phase: Phase::Priming,
        }
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_formed(&self) -> bool {
        self.di_formed
    }

    /// Feed one bar; returns `(+DI, -DI)` once the DI lines are formed.
    pub fn step(&mut self, high: f32, low: f32, close: f32) -> Option<(f32, f32)> {
        if self.phase == Phase::Priming {
            self.prev_high = high;
            self.prev_low = low;
            self.prev_close = close;
            self.phase = Phase::Accumulating;
            return None;
        }

        let (plus_dm, minus_dm) = directional_movement(high, low, self.prev_high, self.prev_low);
        let tr = true_range(high, low, Some(self.prev_close));
        self.prev_high = high;
        self.prev_low = low;
        self.prev_close = close;

        let lf = self.length as f32;
        if self.deltas < self.length {
            self.plus += plus_dm;
            self.minus += minus_dm;
            self.tr += tr;
            self.deltas += 1;
            if self.deltas == self.length {
                self.plus = self.plus / lf;
                self.minus = self.minus / lf;
                self.tr = self.tr / lf;
                self.phase = Phase::Seeded;
            }
        } else {
            self.plus = wilder_step(self.plus, plus_dm, lf);
            self.minus = wilder_step(self.minus, minus_dm, lf);
            self.tr = wilder_step(self.tr, tr, lf);
            self.phase = Phase::Smoothing;
        }

        if self.phase == Phase::Accumulating {
            return None;
        }
        if !self.di_formed && self.tr > 0.0 {
            self.di_formed = true;
        }
        if !self.di_formed {
            return None;
        }
        if self.tr > 0.0 {
            Some((percent_of(self.plus, self.tr), percent_of(self.minus, self.tr)))
        } else {
            Some((0.0, 0.0))
        }
    }
}

/// DMI: `[+DI, -DI, DX]`, formed with the DI lines.
#[derive(Debug, Clone)]
pub struct DirectionalIndex {
    inner: WilderDirectional,
}

impl DirectionalIndex {
    pub fn new(length: i32) -> Self {
        Self {
            inner: WilderDirectional::new(length),
        }
    }

    pub fn phase(&self) -> Phase {
        self.inner.phase()
    }
}

impl Indicator for DirectionalIndex {
    type Output = TripleReading;

    fn update(&mut self, bar: &Bar) -> TripleReading {
        match self.inner.step(bar.h, bar.l, bar.c) {
            Some((plus_di, minus_di)) => TripleReading {
                values: [plus_di, minus_di, dx_from_di(plus_di, minus_di)],
                formed: true,
            },
            None => TripleReading::EMPTY,
        }
    }

    fn is_formed(&self) -> bool {
        self.inner.is_formed()
    }
}

/// ADX: `[ADX, +DI, -DI]`, formed once `L` DX values have been averaged.
#[derive(Debug, Clone)]
pub struct AverageDirectionalIndex {
    inner: WilderDirectional,
    adx_sum: f32,
    adx_count: usize,
    adx_value: f32,
    adx_formed: bool,
}

impl AverageDirectionalIndex {
    pub fn new(length: i32) -> Self {
        Self {
            inner: WilderDirectional::new(length),
            adx_sum: 0.0,
            adx_count: 0,
            adx_value: 0.0,
            adx_formed: false,
        }
    }
}

impl Indicator for AverageDirectionalIndex {
    type Output = TripleReading;

    fn update(&mut self, bar: &Bar) -> TripleReading {
        let Some((plus_di, minus_di)) = self.inner.step(bar.h, bar.l, bar.c) else {
            return TripleReading::EMPTY;
        };
        let dx = dx_from_di(plus_di, minus_di);
        let length = self.inner.length();
        if self.adx_count < length {
            self.adx_sum += dx;
            self.adx_count += 1;
            self.adx_value = self.adx_sum / self.adx_count as f32;
            if self.adx_count == length {
                self.adx_formed = true;
            }
        } else {
            self.adx_value = smma_step(self.adx_value, dx, length as f32);
        }

        TripleReading {
            values: [
                if self.adx_formed {
                    self.adx_value
                } else {
                    f32::NAN
                },
                plus_di,
                minus_di,
            ],
            formed: self.adx_formed,
        }
    }

    fn is_formed(&self) -> bool {
        self.adx_formed
    }
}
