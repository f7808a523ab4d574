//! Wilder-smoothed kernels: DMI, ADX, ATR and RSI.
//!
//! One thread per (param, series). State lives in loop-local scalars; bar 0
//! only primes the previous values.

use ta_core::indicators::math::{
    clamp_length, directional_movement, dx_from_di, percent_of, rsi_from_averages, smma_step,
    true_range, wilder_step,
};

use crate::buffers::{GpuBar, LengthParams, ScalarRecord, SourceParams, TripleRecord};
use crate::grid::{Kernel, KernelBody};

/// Per-thread +DM/-DM/TR smoothing state.
struct DirectionalState {
    length: usize,
    lf: f32,
    prev_high: f32,
    prev_low: f32,
    prev_close: f32,
    plus: f32,
    minus: f32,
    tr: f32,
    di_formed: bool,
}

impl DirectionalState {
    fn new(length: i32) -> Self {
        let length = clamp_length(length);
        Self {
            length,
            lf: length as f32,
            prev_high: 0.0,
            prev_low: 0.0,
            prev_close: 0.0,
            plus: 0.0,
            minus: 0.0,
            tr: 0.0,
            di_formed: false,
        }
    }

    /// Advance to bar `i`; `(+DI, -DI)` once formed.
    #[inline]
    fn advance(&mut self, i: usize, bar: &GpuBar) -> Option<(f32, f32)> {
        if i == 0 {
            self.prev_high = bar.high;
            self.prev_low = bar.low;
            self.prev_close = bar.close;
            return None;
        }
        let j = i - 1;
        let (plus_dm, minus_dm) =
            directional_movement(bar.high, bar.low, self.prev_high, self.prev_low);
        let tr = true_range(bar.high, bar.low, Some(self.prev_close));
        self.prev_high = bar.high;
        self.prev_low = bar.low;
        self.prev_close = bar.close;

        if j < self.length {
            self.plus += plus_dm;
            self.minus += minus_dm;
            self.tr += tr;
            if j + 1 < self.length {
                return None;
            }
            self.plus = self.plus / self.lf;
            self.minus = self.minus / self.lf;
            self.tr = self.tr / self.lf;
        } else {
            self.plus = wilder_step(self.plus, plus_dm, self.lf);
            self.minus = wilder_step(self.minus, minus_dm, self.lf);
            self.tr = wilder_step(self.tr, tr, self.lf);
        }

        if self.tr > 0.0 {
            self.di_formed = true;
            Some((percent_of(self.plus, self.tr), percent_of(self.minus, self.tr)))
        } else if self.di_formed {
            Some((0.0, 0.0))
        } else {
            None
        }
    }
}

fn dmi_body(p: &LengthParams, bars: &[GpuBar], _scratch: &mut [f32], out: &mut [TripleRecord]) {
    let mut st = DirectionalState::new(p.length);
    for (i, (bar, rec)) in bars.iter().zip(out.iter_mut()).enumerate() {
        *rec = match st.advance(i, bar) {
            Some((plus_di, minus_di)) => {
                TripleRecord::new(bar.t, [plus_di, minus_di, dx_from_di(plus_di, minus_di)], true)
            }
            None => TripleRecord::new(bar.t, [f32::NAN; 3], false),
        };
    }
}

fn adx_body(p: &LengthParams, bars: &[GpuBar], _scratch: &mut [f32], out: &mut [TripleRecord]) {
    let mut st = DirectionalState::new(p.length);
    let mut adx_sum = 0.0f32;
    let mut dx_count = 0usize;
    let mut adx = 0.0f32;
    for (i, (bar, rec)) in bars.iter().zip(out.iter_mut()).enumerate() {
        let Some((plus_di, minus_di)) = st.advance(i, bar) else {
            *rec = TripleRecord::new(bar.t, [f32::NAN; 3], false);
            continue;
        };
        let dx = dx_from_di(plus_di, minus_di);
        if dx_count < st.length {
            adx_sum += dx;
            dx_count += 1;
            adx = adx_sum / dx_count as f32;
        } else {
            adx = smma_step(adx, dx, st.lf);
        }
        let formed = dx_count >= st.length;
        let line = if formed { adx } else { f32::NAN };
        *rec = TripleRecord::new(bar.t, [line, plus_di, minus_di], formed);
    }
}

fn atr_body(p: &LengthParams, bars: &[GpuBar], _scratch: &mut [f32], out: &mut [ScalarRecord]) {
    let length = clamp_length(p.length);
    let lf = length as f32;
    let mut prev_close = 0.0f32;
    let mut sum = 0.0f32;
    let mut atr = 0.0f32;
    for (i, (bar, rec)) in bars.iter().zip(out.iter_mut()).enumerate() {
        let tr = true_range(bar.high, bar.low, (i > 0).then_some(prev_close));
        prev_close = bar.close;
        if i < length {
            sum += tr;
            if i + 1 < length {
                *rec = ScalarRecord::new(bar.t, f32::NAN, false);
                continue;
            }
            atr = sum / lf;
        } else {
            atr = smma_step(atr, tr, lf);
        }
        *rec = ScalarRecord::new(bar.t, atr, true);
    }
}

fn rsi_body(p: &SourceParams, bars: &[GpuBar], _scratch: &mut [f32], out: &mut [ScalarRecord]) {
    let length = clamp_length(p.length);
    let lf = length as f32;
    let mut prev = 0.0f32;
    let mut gain = 0.0f32;
    let mut loss = 0.0f32;
    for (i, (bar, rec)) in bars.iter().zip(out.iter_mut()).enumerate() {
        let price = bar.price(p.source);
        if i == 0 {
            prev = price;
            *rec = ScalarRecord::new(bar.t, f32::NAN, false);
            continue;
        }
        let change = price - prev;
        prev = price;
        let up = if change > 0.0 { change } else { 0.0 };
        let down = if change < 0.0 { -change } else { 0.0 };
        // i counts changes seen so far
        if i <= length {
            gain += up;
            loss += down;
            if i < length {
                *rec = ScalarRecord::new(bar.t, f32::NAN, false);
                continue;
            }
            gain = gain / lf;
            loss = loss / lf;
        } else {
            gain = smma_step(gain, up, lf);
            loss = smma_step(loss, down, lf);
        }
        *rec = ScalarRecord::new(bar.t, rsi_from_averages(gain, loss), true);
    }
}

/// Directional Movement Index: `[+DI, -DI, DX]`.
pub struct Dmi;

impl Kernel for Dmi {
    type Params = LengthParams;
    type Output = TripleRecord;
    const NAME: &'static str = "dmi";
    const BODY: KernelBody<LengthParams, TripleRecord> = KernelBody::Sequential(dmi_body);
}

/// Average Directional Index: `[ADX, +DI, -DI]`.
pub struct Adx;

impl Kernel for Adx {
    type Params = LengthParams;
    type Output = TripleRecord;
    const NAME: &'static str = "adx";
    const BODY: KernelBody<LengthParams, TripleRecord> = KernelBody::Sequential(adx_body);
}

pub struct Atr;

impl Kernel for Atr {
    type Params = LengthParams;
    type Output = ScalarRecord;
    const NAME: &'static str = "atr";
    const BODY: KernelBody<LengthParams, ScalarRecord> = KernelBody::Sequential(atr_body);
}

pub struct Rsi;

impl Kernel for Rsi {
    type Params = SourceParams;
    type Output = ScalarRecord;
    const NAME: &'static str = "rsi";
    const BODY: KernelBody<SourceParams, ScalarRecord> = KernelBody::Sequential(rsi_body);
}
