//! Window-local kernels: Donchian, Williams %R and Bollinger Bands.
//!
//! One thread per (param, series, bar). Each thread folds its own window
//! oldest to newest and keeps no state between bars.

use ta_core::indicators::math::{clamp_length, clamp_width};
use ta_core::indicators::window::williams_r;

use super::common::window;
use crate::buffers::{BandParams, GpuBar, LengthParams, ScalarRecord, TripleRecord};
use crate::grid::{Kernel, KernelBody};

#[inline]
fn extremes(win: &[GpuBar]) -> (f32, f32) {
    let mut highest = win[0].high;
    let mut lowest = win[0].low;
    for bar in &win[1..] {
        if bar.high > highest {
            highest = bar.high;
        }
        if bar.low < lowest {
            lowest = bar.low;
        }
    }
    (highest, lowest)
}

fn donchian_body(p: &LengthParams, bars: &[GpuBar], i: usize) -> TripleRecord {
    let t = bars[i].t;
    let Some(win) = window(bars, i, clamp_length(p.length)) else {
        return TripleRecord::new(t, [f32::NAN; 3], false);
    };
    let (upper, lower) = extremes(win);
    TripleRecord::new(t, [upper, (upper + lower) / 2.0, lower], true)
}

fn williams_r_body(p: &LengthParams, bars: &[GpuBar], i: usize) -> ScalarRecord {
    let t = bars[i].t;
    let Some(win) = window(bars, i, clamp_length(p.length)) else {
        return ScalarRecord::new(t, f32::NAN, false);
    };
    let (highest, lowest) = extremes(win);
    ScalarRecord::new(t, williams_r(highest, lowest, bars[i].close), true)
}

fn bollinger_body(p: &BandParams, bars: &[GpuBar], i: usize) -> TripleRecord {
    let t = bars[i].t;
    let length = clamp_length(p.length);
    let Some(win) = window(bars, i, length) else {
        return TripleRecord::new(t, [f32::NAN; 3], false);
    };
    let lf = length as f32;
    let mut sum = 0.0f32;
    for bar in win {
        sum += bar.price(p.source);
    }
    let mean = sum / lf;
    let mut sq = 0.0f32;
    for bar in win {
        let d = bar.price(p.source) - mean;
        sq += d * d;
    }
    let sd = (sq / lf).sqrt();
    let width = clamp_width(p.width);
    TripleRecord::new(t, [mean + width * sd, mean, mean - width * sd], true)
}

/// Donchian channel `[upper, middle, lower]`.
pub struct Donchian;

impl Kernel for Donchian {
    type Params = LengthParams;
    type Output = TripleRecord;
    const NAME: &'static str = "donchian";
    const BODY: KernelBody<LengthParams, TripleRecord> = KernelBody::WindowLocal(donchian_body);
}

pub struct WilliamsR;

impl Kernel for WilliamsR {
    type Params = LengthParams;
    type Output = ScalarRecord;
    const NAME: &'static str = "williams_r";
    const BODY: KernelBody<LengthParams, ScalarRecord> = KernelBody::WindowLocal(williams_r_body);
}

/// Bollinger Bands `[upper, middle, lower]`.
pub struct Bollinger;

impl Kernel for Bollinger {
    type Params = BandParams;
    type Output = TripleRecord;
    const NAME: &'static str = "bollinger";
    const BODY: KernelBody<BandParams, TripleRecord> = KernelBody::WindowLocal(bollinger_body);
}
