//! Work-grid dispatch.
//!
//! Stateful families run one thread per (parameter, series) pair and walk the
//! series bar by bar. Window-local families run one thread per
//! (parameter, series, bar) triple. The grid shape is a property of the kernel
//! body, so a kernel cannot be launched on the wrong grid.

use crate::buffers::{GpuBar, ResultRecord};
use crate::error::CalcError;
use crate::params::ParameterSet;

/// Default threads per block, as used by the indicator kernels.
pub const DEFAULT_BLOCK_SIZE: u32 = 64;

/// Kernel entry point.
pub enum KernelBody<P, O> {
    /// One thread per (param, series): `(params, bars, scratch, out)` with
    /// `out.len() == bars.len()`.
    Sequential(fn(&P, &[GpuBar], &mut [f32], &mut [O])),
    /// One thread per (param, series, bar): `(params, bars, bar_index) -> record`.
    WindowLocal(fn(&P, &[GpuBar], usize) -> O),
}

impl<P, O> Clone for KernelBody<P, O> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P, O> Copy for KernelBody<P, O> {}

impl<P, O> KernelBody<P, O> {
    pub fn shape(&self) -> GridShape {
        match self {
            Self::Sequential(_) => GridShape::PerSeries,
            Self::WindowLocal(_) => GridShape::PerBar,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridShape {
    /// 2-D: (param, series).
    PerSeries,
    /// 3-D: (param, series, bar).
    PerBar,
}

/// A device kernel: parameter/record types plus its body.
pub trait Kernel: Send + Sync + 'static {
    type Params: ParameterSet;
    type Output: ResultRecord;

    const NAME: &'static str;
    const BODY: KernelBody<Self::Params, Self::Output>;

    /// Per-thread f32 scratch the body needs for this parameter set when the
    /// longest series has `max_len` bars. Never exceeds `max_len`.
    fn scratch_len(_params: &Self::Params, _max_len: usize) -> usize {
        0
    }
}

/// 1-D launch configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchConfig {
    pub grid_dim: u32,
    pub block_dim: u32,
    /// Logical threads; the tail of the last block is idle.
    pub threads: u32,
}

/// Decoded thread coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkUnit {
    pub param: u32,
    pub series: u32,
    /// Bar index for window-local grids.
    pub bar: Option<u32>,
}

/// Logical grid over (params, series[, bars]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkGrid {
    pub params: u32,
    pub series: u32,
    /// Bar axis (the longest series) for window-local grids.
    pub bars: Option<u32>,
    threads: u32,
}

impl WorkGrid {
    pub fn new(
        shape: GridShape,
        params: u32,
        series: u32,
        max_len: u32,
    ) -> Result<Self, CalcError> {
        let pairs = params
            .checked_mul(series)
            .ok_or(CalcError::Overflow {
                label: "grid_pairs",
                value: params as usize * series as usize,
            })?;
        let (bars, threads) = match shape {
            GridShape::PerSeries => (None, pairs),
            GridShape::PerBar => {
                let threads = pairs.checked_mul(max_len).ok_or(CalcError::Overflow {
                    label: "grid_threads",
                    value: pairs as usize * max_len as usize,
                })?;
                (Some(max_len), threads)
            }
        };
        Ok(Self {
            params,
            series,
            bars,
            threads,
        })
    }

    pub fn for_kernel<K: Kernel>(
        params: u32,
        series: u32,
        max_len: u32,
    ) -> Result<Self, CalcError> {
        Self::new(K::BODY.shape(), params, series, max_len)
    }

    pub fn shape(&self) -> GridShape {
        if self.bars.is_some() {
            GridShape::PerBar
        } else {
            GridShape::PerSeries
        }
    }

    pub fn thread_count(&self) -> u32 {
        self.threads
    }

    /// `grid = ceil(threads / block)`. A zero block size falls back to the default.
    pub fn launch_config(&self, block_size: u32) -> LaunchConfig {
        let block_dim = if block_size == 0 {
            DEFAULT_BLOCK_SIZE
        } else {
            block_size
        };
        LaunchConfig {
            grid_dim: self.threads.div_ceil(block_dim),
            block_dim,
            threads: self.threads,
        }
    }

    /// Decode a linear thread id. Ids past the logical thread count are idle.
    pub fn unit(&self, tid: u32) -> Option<WorkUnit> {
        if tid >= self.threads {
            return None;
        }
        match self.bars {
            None => Some(WorkUnit {
                param: tid / self.series,
                series: tid % self.series,
                bar: None,
            }),
            Some(bars) => {
                let pair = tid / bars;
                Some(WorkUnit {
                    param: pair / self.series,
                    series: pair % self.series,
                    bar: Some(tid % bars),
                })
            }
        }
    }
}
