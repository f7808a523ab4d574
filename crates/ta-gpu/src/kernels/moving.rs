//! SMA and SMMA kernels.

use ta_core::indicators::math::{clamp_length, rolling_sum_step, smma_step};

use super::common::fill_empty;
use crate::buffers::{GpuBar, ScalarRecord, SourceParams};
use crate::grid::{Kernel, KernelBody};

/// Running-sum SMA. The window lives in this thread's slice of the shared
/// scratch allocation, used as a circular buffer.
fn sma_body(p: &SourceParams, bars: &[GpuBar], scratch: &mut [f32], out: &mut [ScalarRecord]) {
    let length = clamp_length(p.length);
    if length > bars.len() {
        fill_empty(bars, out);
        return;
    }
    let Some(ring) = scratch.get_mut(..length) else {
        fill_empty(bars, out);
        return;
    };
    let lf = length as f32;
    let mut sum = 0.0f32;
    let mut pos = 0usize;
    let mut filled = 0usize;
    for (bar, rec) in bars.iter().zip(out.iter_mut()) {
        let x = bar.price(p.source);
        if filled == length {
            sum = rolling_sum_step(sum, ring[pos], x);
        } else {
            sum = sum + x;
            filled += 1;
        }
        ring[pos] = x;
        pos = (pos + 1) % length;
        *rec = if filled == length {
            ScalarRecord::new(bar.t, sum / lf, true)
        } else {
            ScalarRecord::new(bar.t, f32::NAN, false)
        };
    }
}

/// SMMA seeded with the SMA of the first `L` prices. The formed flag is
/// reported one bar after the first value.
fn smma_body(p: &SourceParams, bars: &[GpuBar], _scratch: &mut [f32], out: &mut [ScalarRecord]) {
    let length = clamp_length(p.length);
    let lf = length as f32;
    let mut sum = 0.0f32;
    let mut value = 0.0f32;
    for (i, (bar, rec)) in bars.iter().zip(out.iter_mut()).enumerate() {
        let x = bar.price(p.source);
        if i < length {
            sum += x;
            if i + 1 < length {
                *rec = ScalarRecord::new(bar.t, f32::NAN, false);
                continue;
            }
            value = sum / lf;
        } else {
            value = smma_step(value, x, lf);
        }
        *rec = ScalarRecord::new(bar.t, value, i >= length);
    }
}

pub struct Sma;

impl Kernel for Sma {
    type Params = SourceParams;
    type Output = ScalarRecord;
    const NAME: &'static str = "sma";
    const BODY: KernelBody<SourceParams, ScalarRecord> = KernelBody::Sequential(sma_body);

    fn scratch_len(params: &SourceParams, max_len: usize) -> usize {
        clamp_length(params.length).min(max_len)
    }
}

pub struct Smma;

impl Kernel for Smma {
    type Params = SourceParams;
    type Output = ScalarRecord;
    const NAME: &'static str = "smma";
    const BODY: KernelBody<SourceParams, ScalarRecord> = KernelBody::Sequential(smma_body);
}
