//! Cascaded EMA kernels: TEMA and TRIX.
//!
//! Three EMA stages in per-thread scalars. A stage feeds the next only once
//! formed, and the recombined output is discarded for `SETTLE_SAMPLES`
//! samples after the third stage forms.

use ta_core::indicators::cascade::SETTLE_SAMPLES;
use ta_core::indicators::math::{clamp_length, ema_alpha, ema_step, percent_of};

use crate::buffers::{GpuBar, ScalarRecord, SourceParams};
use crate::grid::{Kernel, KernelBody};

#[derive(Clone, Copy)]
struct Stage {
    length: usize,
    k: f32,
    sum: f32,
    count: usize,
    value: f32,
}

impl Stage {
    fn new(length: usize) -> Self {
        Self {
            length,
            k: ema_alpha(length as f32),
            sum: 0.0,
            count: 0,
            value: 0.0,
        }
    }

    #[inline]
    fn push(&mut self, x: f32) -> Option<f32> {
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
}

struct Pipeline([Stage; 3]);

impl Pipeline {
    fn new(length: i32) -> Self {
        Self([Stage::new(clamp_length(length)); 3])
    }

    #[inline]
    fn push(&mut self, x: f32) -> Option<(f32, f32, f32)> {
        let v1 = self.0[0].push(x)?;
        let v2 = self.0[1].push(v1)?;
        let v3 = self.0[2].push(v2)?;
        Some((v1, v2, v3))
    }
}

fn tema_body(p: &SourceParams, bars: &[GpuBar], _scratch: &mut [f32], out: &mut [ScalarRecord]) {
    let mut pipe = Pipeline::new(p.length);
    let mut samples = 0usize;
    for (bar, rec) in bars.iter().zip(out.iter_mut()) {
        *rec = ScalarRecord::new(bar.t, f32::NAN, false);
        let Some((v1, v2, v3)) = pipe.push(bar.price(p.source)) else {
            continue;
        };
        let value = 3.0 * v1 - 3.0 * v2 + v3;
        samples += 1;
        if samples > SETTLE_SAMPLES {
            *rec = ScalarRecord::new(bar.t, value, true);
        }
    }
}

fn trix_body(p: &SourceParams, bars: &[GpuBar], _scratch: &mut [f32], out: &mut [ScalarRecord]) {
    let mut pipe = Pipeline::new(p.length);
    let mut prev = 0.0f32;
    let mut have_prev = false;
    let mut samples = 0usize;
    // formed lags the first emitted value by one bar
    let mut ready = false;
    for (bar, rec) in bars.iter().zip(out.iter_mut()) {
        *rec = ScalarRecord::new(bar.t, f32::NAN, false);
        let Some((_, _, v3)) = pipe.push(bar.price(p.source)) else {
            continue;
        };
        let base = prev;
        prev = v3;
        if !have_prev {
            have_prev = true;
            continue;
        }
        let value = if base != 0.0 {
            percent_of(v3 - base, base)
        } else {
            0.0
        };
        samples += 1;
        if samples > SETTLE_SAMPLES {
            *rec = ScalarRecord::new(bar.t, value, ready);
            ready = true;
        }
    }
}

/// Triple exponential moving average.
pub struct Tema;

impl Kernel for Tema {
    type Params = SourceParams;
    type Output = ScalarRecord;
    const NAME: &'static str = "tema";
    const BODY: KernelBody<SourceParams, ScalarRecord> = KernelBody::Sequential(tema_body);
}

/// Rate of change of the triple-smoothed EMA, in percent.
pub struct Trix;

impl Kernel for Trix {
    type Params = SourceParams;
    type Output = ScalarRecord;
    const NAME: &'static str = "trix";
    const BODY: KernelBody<SourceParams, ScalarRecord> = KernelBody::Sequential(trix_body);
}
