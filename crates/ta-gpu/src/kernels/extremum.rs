//! Aroon: rolling extremum with bounded rescan.
//!
//! The running highest high / lowest low and their ages are carried across
//! bars. When an extremum ages out of the window the thread rescans the last
//! `L` bars of the flat buffer directly; no per-thread history is kept.

use ta_core::indicators::math::{aroon_line, clamp_length};

use crate::buffers::{AroonRecord, GpuBar, LengthParams};
use crate::grid::{Kernel, KernelBody};

/// Rescan `bars[start..=end]` oldest to newest; ties go to the newest bar.
#[inline]
fn rescan(
    bars: &[GpuBar],
    start: usize,
    end: usize,
    pick: impl Fn(&GpuBar) -> f32,
    better: impl Fn(f32, f32) -> bool,
) -> (f32, u32) {
    let mut best = pick(&bars[start]);
    let mut best_idx = start;
    for (k, bar) in bars.iter().enumerate().take(end + 1).skip(start + 1) {
        let v = pick(bar);
        if better(v, best) {
            best = v;
            best_idx = k;
        }
    }
    (best, (end - best_idx) as u32)
}

fn aroon_body(p: &LengthParams, bars: &[GpuBar], _scratch: &mut [f32], out: &mut [AroonRecord]) {
    let length = clamp_length(p.length);
    let lf = length as f32;
    let mut highest = f32::NAN;
    let mut lowest = f32::NAN;
    let mut high_age = 0u32;
    let mut low_age = 0u32;

    for (i, (bar, rec)) in bars.iter().zip(out.iter_mut()).enumerate() {
        if i == 0 {
            highest = bar.high;
            lowest = bar.low;
        } else {
            high_age += 1;
            low_age += 1;
            if bar.high >= highest {
                highest = bar.high;
                high_age = 0;
            }
            if bar.low <= lowest {
                lowest = bar.low;
                low_age = 0;
            }
            let start = (i + 1).saturating_sub(length);
            if high_age as usize >= length {
                (highest, high_age) = rescan(bars, start, i, |b| b.high, |v, best| v >= best);
            }
            if low_age as usize >= length {
                (lowest, low_age) = rescan(bars, start, i, |b| b.low, |v, best| v <= best);
            }
        }

        let formed = i + 1 >= length;
        *rec = AroonRecord {
            up: if formed { aroon_line(lf, high_age) } else { f32::NAN },
            down: if formed { aroon_line(lf, low_age) } else { f32::NAN },
            highest,
            lowest,
            high_age,
            low_age,
            formed: formed as u32,
            _pad: 0,
            t: bar.t,
        };
    }
}

/// Aroon Up/Down with the tracked extremum state.
pub struct Aroon;

impl Kernel for Aroon {
    type Params = LengthParams;
    type Output = AroonRecord;
    const NAME: &'static str = "aroon";
    const BODY: KernelBody<LengthParams, AroonRecord> = KernelBody::Sequential(aroon_body);
}
