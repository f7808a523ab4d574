use crate::buffers::{GpuBar, ResultRecord};

/// Fill every record with the unformed placeholder for its bar.
#[inline]
pub(crate) fn fill_empty<O: ResultRecord>(bars: &[GpuBar], out: &mut [O]) {
    for (bar, rec) in bars.iter().zip(out.iter_mut()) {
        *rec = O::empty(bar.t);
    }
}

/// Window `[i + 1 - length, i]` of a series, or `None` while fewer than
/// `length` bars are available.
#[inline]
pub(crate) fn window(bars: &[GpuBar], i: usize, length: usize) -> Option<&[GpuBar]> {
    if i + 1 < length || i >= bars.len() {
        return None;
    }
    Some(&bars[i + 1 - length..=i])
}
