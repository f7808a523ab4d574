//! Batch entry point: flatten, dispatch, read back, unflatten.

use std::marker::PhantomData;

use ta_core::candle::BarSource;
use ta_core::config::EngineConfig;

use crate::device::{DeviceRuntime, HostDevice, KernelArgs};
use crate::error::{CalcError, DeviceError};
use crate::flatten::{checked_u32, flatten};
use crate::grid::{Kernel, WorkGrid, DEFAULT_BLOCK_SIZE};
use crate::layout::{unflatten, ResultCube};
use crate::params::ParameterSet;

/// Evaluates every (series, parameter set) pair of a batch in one launch.
pub struct Calculator<D: DeviceRuntime = HostDevice> {
    device: D,
    block_size: u32,
}

impl Calculator<HostDevice> {
    /// Host runtime configured from `EngineConfig`.
    pub fn from_config(cfg: &EngineConfig) -> Result<Self, DeviceError> {
        let mut device = HostDevice::new();
        if let Some(threads) = cfg.threads {
            device = device.with_threads(threads)?;
        }
        if let Some(limit) = cfg.memory_limit_bytes {
            device = device.with_memory_limit(usize::try_from(limit).unwrap_or(usize::MAX));
        }
        Ok(Self::new(device).with_block_size(cfg.block_size))
    }
}

impl Default for Calculator<HostDevice> {
    fn default() -> Self {
        Self::new(HostDevice::new())
    }
}

impl<D: DeviceRuntime> Calculator<D> {
    pub fn new(device: D) -> Self {
        Self {
            device,
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }

    pub fn with_block_size(mut self, block_size: u32) -> Self {
        self.block_size = if block_size == 0 {
            DEFAULT_BLOCK_SIZE
        } else {
            block_size
        };
        self
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    /// Run kernel `K` over every series and parameter set.
    ///
    /// Returns `cube[series][param]` with one record per input bar. Null or
    /// empty series yield empty record lists. Degenerate parameters are clamped
    /// in-kernel and never error.
    pub fn calculate<K, S>(
        &self,
        series: &[S],
        params: &[K::Params],
    ) -> Result<ResultCube<K::Output>, CalcError>
    where
        K: Kernel,
        S: BarSource,
    {
        if series.is_empty() {
            return Err(CalcError::EmptySeries);
        }
        if params.is_empty() {
            return Err(CalcError::EmptyParameters);
        }

        let degenerate = params.iter().filter(|p| p.is_degenerate()).count();
        if degenerate > 0 {
            tracing::warn!(
                kernel = K::NAME,
                degenerate,
                "parameter sets with length < 1 will be clamped to 1"
            );
        }

        let flat = flatten(series)?;
        let param_count = checked_u32(params.len(), "param_count")?;
        let series_count = checked_u32(series.len(), "series_count")?;
        let grid = WorkGrid::for_kernel::<K>(param_count, series_count, flat.max_len)?;
        let config = grid.launch_config(self.block_size);

        let max_len = flat.max_len as usize;
        let stride = params
            .iter()
            .map(|p| K::scratch_len(p, max_len).min(max_len))
            .max()
            .unwrap_or(0);
        checked_u32(stride, "scratch_stride")?;
        let scratch_len = stride
            .checked_mul(params.len() * series.len())
            .ok_or(CalcError::Overflow {
                label: "scratch_len",
                value: usize::MAX,
            })?;
        let out_len = params
            .len()
            .checked_mul(flat.total_bars as usize)
            .ok_or(CalcError::Overflow {
                label: "output_len",
                value: usize::MAX,
            })?;
        checked_u32(out_len, "output_len")?;

        tracing::debug!(
            kernel = K::NAME,
            series = series.len(),
            params = params.len(),
            total_bars = flat.total_bars,
            threads = grid.thread_count(),
            grid_dim = config.grid_dim,
            block_dim = config.block_dim,
            "dispatching batch"
        );

        // Every buffer below is released on drop, including on early return.
        let dev = &self.device;
        let bars = dev.allocate(&flat.bars)?;
        let offsets = dev.allocate(&flat.offsets)?;
        let lengths = dev.allocate(&flat.lengths)?;
        let params_buf = dev.allocate(params)?;
        let mut scratch = dev.allocate_zeroed::<f32>(scratch_len)?;
        let mut out = dev.allocate_zeroed::<K::Output>(out_len)?;

        dev.launch::<K>(
            &grid,
            &config,
            KernelArgs {
                bars: &bars,
                offsets: &offsets,
                lengths: &lengths,
                params: &params_buf,
                scratch: &mut scratch,
                scratch_stride: stride as u32,
                total_bars: flat.total_bars,
                out: &mut out,
                kernel: PhantomData,
            },
        )?;
        dev.synchronize()?;
        let records = dev.readback(&out)?;

        dev.dispose(out);
        dev.dispose(scratch);
        dev.dispose(params_buf);
        dev.dispose(lengths);
        dev.dispose(offsets);
        dev.dispose(bars);

        tracing::debug!(kernel = K::NAME, records = records.len(), "batch read back");
        unflatten(&records, &flat, params.len())
    }
}
