//! Series flattening for device upload.
//!
//! Builds one contiguous `Vec<GpuBar>` with an offset/length index so the
//! device never sees a jagged array. Series are laid out back to back in input
//! order; `bars[offsets[s] + i]` is bar `i` of series `s`.

use ta_core::candle::BarSource;

use crate::buffers::GpuBar;
use crate::error::CalcError;

/// Flattened series batch.
#[derive(Debug, Clone, Default)]
pub struct FlatSeries {
    pub bars: Vec<GpuBar>,
    pub offsets: Vec<u32>,
    pub lengths: Vec<u32>,
    pub max_len: u32,
    pub total_bars: u32,
}

impl FlatSeries {
    pub fn series_count(&self) -> usize {
        self.lengths.len()
    }

    /// Bars of series `s`.
    pub fn series(&self, s: usize) -> &[GpuBar] {
        let start = self.offsets[s] as usize;
        &self.bars[start..start + self.lengths[s] as usize]
    }
}

pub(crate) fn checked_u32(value: usize, label: &'static str) -> Result<u32, CalcError> {
    u32::try_from(value).map_err(|_| CalcError::Overflow { label, value })
}

/// Flatten a batch of series. Null or empty series become zero-length entries.
pub fn flatten<S: BarSource>(series: &[S]) -> Result<FlatSeries, CalcError> {
    if series.is_empty() {
        return Err(CalcError::EmptySeries);
    }
    checked_u32(series.len(), "series_count")?;

    let total: usize = series.iter().map(|s| s.bars().len()).sum();
    let total_bars = checked_u32(total, "total_bars")?;

    let mut bars = Vec::with_capacity(total);
    let mut offsets = Vec::with_capacity(series.len());
    let mut lengths = Vec::with_capacity(series.len());
    let mut max_len = 0u32;

    for s in series {
        let src = s.bars();
        let len = checked_u32(src.len(), "series_len")?;
        offsets.push(checked_u32(bars.len(), "series_offset")?);
        lengths.push(len);
        max_len = max_len.max(len);
        bars.extend(src.iter().map(GpuBar::from));
    }

    tracing::debug!(
        series = series.len(),
        total_bars,
        max_len,
        bytes = bars.len() * std::mem::size_of::<GpuBar>(),
        "flattened series batch"
    );

    Ok(FlatSeries {
        bars,
        offsets,
        lengths,
        max_len,
        total_bars,
    })
}
