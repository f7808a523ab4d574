//! Device runtime seam and the host (rayon) runtime.
//!
//! `DeviceRuntime` is the five primitives the engine needs from a device:
//! allocate, launch, synchronize, read back and dispose. `HostDevice` runs
//! kernel bodies on a rayon pool with the same per-thread disjointness a GPU
//! launch has: every (param, series) pair owns its output and scratch slices.

use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use rayon::prelude::*;

use crate::buffers::GpuBar;
use crate::error::DeviceError;
use crate::grid::{Kernel, KernelBody, LaunchConfig, WorkGrid};

/// Types that may live in a device buffer.
pub trait DeviceRepr: Pod + Send + Sync {}

impl<T: Pod + Send + Sync> DeviceRepr for T {}

/// Buffers handed to a kernel launch.
pub struct KernelArgs<'a, D: DeviceRuntime + ?Sized, K: Kernel> {
    pub bars: &'a D::Buffer<GpuBar>,
    pub offsets: &'a D::Buffer<u32>,
    pub lengths: &'a D::Buffer<u32>,
    pub params: &'a D::Buffer<K::Params>,
    pub scratch: &'a mut D::Buffer<f32>,
    /// f32 slots per (param, series) pair.
    pub scratch_stride: u32,
    pub total_bars: u32,
    pub out: &'a mut D::Buffer<K::Output>,
    pub kernel: PhantomData<K>,
}

pub trait DeviceRuntime {
    type Buffer<T: DeviceRepr>;

    /// Copy host data into a new device buffer.
    fn allocate<T: DeviceRepr>(&self, host: &[T]) -> Result<Self::Buffer<T>, DeviceError>;

    /// Allocate a zero-filled device buffer of `len` elements.
    fn allocate_zeroed<T: DeviceRepr>(&self, len: usize) -> Result<Self::Buffer<T>, DeviceError>;

    fn launch<K: Kernel>(
        &self,
        grid: &WorkGrid,
        config: &LaunchConfig,
        args: KernelArgs<'_, Self, K>,
    ) -> Result<(), DeviceError>;

    /// Block until every launched kernel has completed.
    fn synchronize(&self) -> Result<(), DeviceError>;

    fn readback<T: DeviceRepr>(&self, buffer: &Self::Buffer<T>) -> Result<Vec<T>, DeviceError>;

    fn dispose<T: DeviceRepr>(&self, buffer: Self::Buffer<T>);

    /// Bytes currently held by live buffers.
    fn allocated_bytes(&self) -> usize;
}

// ═══════════════════════════════════════════════════════════════════════════
// HostDevice
// ═══════════════════════════════════════════════════════════════════════════

/// Byte reservation against the device ledger, released on drop.
#[derive(Debug)]
struct Lease {
    ledger: Arc<AtomicUsize>,
    bytes: usize,
}

impl Drop for Lease {
    fn drop(&mut self) {
        self.ledger.fetch_sub(self.bytes, Ordering::AcqRel);
    }
}

/// Host-resident "device" buffer.
#[derive(Debug)]
pub struct HostBuffer<T> {
    data: Vec<T>,
    _lease: Lease,
}

impl<T> HostBuffer<T> {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }
}

/// Reference runtime: kernels execute on a rayon pool.
pub struct HostDevice {
    pool: Option<rayon::ThreadPool>,
    memory_limit: Option<usize>,
    ledger: Arc<AtomicUsize>,
}

impl Default for HostDevice {
    fn default() -> Self {
        Self {
            pool: None,
            memory_limit: None,
            ledger: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl HostDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dedicated pool with `threads` workers instead of the global pool.
    pub fn with_threads(mut self, threads: usize) -> Result<Self, DeviceError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("ta-host-{i}"))
            .build()
            .map_err(|e| DeviceError::Init(e.to_string()))?;
        self.pool = Some(pool);
        Ok(self)
    }

    /// Cap the bytes live buffers may hold; allocations past it fail.
    pub fn with_memory_limit(mut self, bytes: usize) -> Self {
        self.memory_limit = Some(bytes);
        self
    }

    pub fn memory_limit(&self) -> Option<usize> {
        self.memory_limit
    }

    fn reserve(&self, bytes: usize) -> Result<Lease, DeviceError> {
        let limit = self.memory_limit.unwrap_or(usize::MAX);
        self.ledger
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |in_use| {
                in_use.checked_add(bytes).filter(|&next| next <= limit)
            })
            .map_err(|in_use| DeviceError::OutOfMemory {
                requested: bytes,
                in_use,
                limit,
            })?;
        Ok(Lease {
            ledger: Arc::clone(&self.ledger),
            bytes,
        })
    }

    fn install<R: Send>(&self, op: impl FnOnce() -> R + Send) -> R {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }
}

fn byte_len<T>(len: usize) -> Result<usize, DeviceError> {
    len.checked_mul(std::mem::size_of::<T>())
        .ok_or_else(|| DeviceError::InvalidLaunch(format!("buffer of {len} elements overflows")))
}

fn series_slice<'a>(
    bars: &'a [GpuBar],
    offsets: &[u32],
    lengths: &[u32],
    s: usize,
) -> &'a [GpuBar] {
    let start = offsets[s] as usize;
    &bars[start..start + lengths[s] as usize]
}

/// Split `out` into one slice per (param, series) pair, in thread-id order.
fn split_pairs<'a, O>(
    out: &'a mut [O],
    offsets: &[u32],
    lengths: &[u32],
    total_bars: usize,
) -> Result<Vec<&'a mut [O]>, DeviceError> {
    let mut pairs = Vec::new();
    if total_bars == 0 {
        return Ok(pairs);
    }
    for block in out.chunks_mut(total_bars) {
        let mut rest = block;
        let mut cursor = 0usize;
        for (&offset, &len) in offsets.iter().zip(lengths) {
            if offset as usize != cursor {
                return Err(DeviceError::InvalidLaunch(format!(
                    "series offset {offset} does not follow previous series end {cursor}"
                )));
            }
            if len as usize > rest.len() {
                return Err(DeviceError::InvalidLaunch(format!(
                    "series of {len} bars overruns the flat buffer"
                )));
            }
            let (head, tail) = std::mem::take(&mut rest).split_at_mut(len as usize);
            pairs.push(head);
            rest = tail;
            cursor += len as usize;
        }
    }
    Ok(pairs)
}

impl DeviceRuntime for HostDevice {
    type Buffer<T: DeviceRepr> = HostBuffer<T>;

    fn allocate<T: DeviceRepr>(&self, host: &[T]) -> Result<HostBuffer<T>, DeviceError> {
        let lease = self.reserve(byte_len::<T>(host.len())?)?;
        Ok(HostBuffer {
            data: host.to_vec(),
            _lease: lease,
        })
    }

    fn allocate_zeroed<T: DeviceRepr>(&self, len: usize) -> Result<HostBuffer<T>, DeviceError> {
        let lease = self.reserve(byte_len::<T>(len)?)?;
        Ok(HostBuffer {
            data: vec![T::zeroed(); len],
            _lease: lease,
        })
    }

    fn launch<K: Kernel>(
        &self,
        grid: &WorkGrid,
        config: &LaunchConfig,
        args: KernelArgs<'_, Self, K>,
    ) -> Result<(), DeviceError> {
        if config.block_dim == 0 {
            return Err(DeviceError::InvalidLaunch("block_dim is 0".into()));
        }
        let capacity = config.grid_dim as u64 * config.block_dim as u64;
        if capacity < grid.thread_count() as u64 {
            return Err(DeviceError::InvalidLaunch(format!(
                "{} threads do not fit {}x{}",
                grid.thread_count(),
                config.grid_dim,
                config.block_dim
            )));
        }
        if grid.shape() != K::BODY.shape() {
            return Err(DeviceError::InvalidLaunch(format!(
                "{} launched on a {:?} grid",
                K::NAME,
                grid.shape()
            )));
        }

        let bars = args.bars.as_slice();
        let offsets = args.offsets.as_slice();
        let lengths = args.lengths.as_slice();
        let params = args.params.as_slice();
        let total_bars = args.total_bars as usize;
        let series = grid.series as usize;
        let pair_count = params.len() * series;

        if bars.len() != total_bars
            || offsets.len() != series
            || lengths.len() != series
            || params.len() != grid.params as usize
        {
            return Err(DeviceError::InvalidLaunch(format!(
                "{}: input buffers do not match the grid",
                K::NAME
            )));
        }
        if args.out.len() != params.len() * total_bars {
            return Err(DeviceError::InvalidLaunch(format!(
                "{}: output holds {} records, grid needs {}",
                K::NAME,
                args.out.len(),
                params.len() * total_bars
            )));
        }
        let stride = args.scratch_stride as usize;
        if args.scratch.len() < pair_count * stride {
            return Err(DeviceError::InvalidLaunch(format!(
                "{}: scratch holds {} slots, grid needs {}",
                K::NAME,
                args.scratch.len(),
                pair_count * stride
            )));
        }

        let outputs = split_pairs(args.out.as_mut_slice(), offsets, lengths, total_bars)?;

        match K::BODY {
            KernelBody::Sequential(body) => {
                let scratches: Vec<&mut [f32]> = if stride == 0 {
                    (0..pair_count).map(|_| <&mut [f32]>::default()).collect()
                } else {
                    args.scratch.as_mut_slice()[..pair_count * stride]
                        .chunks_mut(stride)
                        .collect()
                };
                self.install(|| {
                    outputs
                        .into_par_iter()
                        .zip(scratches)
                        .enumerate()
                        .for_each(|(pair, (out, scratch))| {
                            let Some(unit) = grid.unit(pair as u32) else {
                                return;
                            };
                            let src = series_slice(bars, offsets, lengths, unit.series as usize);
                            body(&params[unit.param as usize], src, scratch, out);
                        });
                });
            }
            KernelBody::WindowLocal(body) => {
                let bar_axis = grid.bars.unwrap_or(0) as usize;
                self.install(|| {
                    outputs.into_par_iter().enumerate().for_each(|(pair, out)| {
                        let src = series_slice(bars, offsets, lengths, pair % series);
                        out.par_iter_mut().enumerate().for_each(|(i, rec)| {
                            let tid = pair * bar_axis + i;
                            let Some(unit) = grid.unit(tid as u32) else {
                                return;
                            };
                            *rec = body(&params[unit.param as usize], src, i);
                        });
                    });
                });
            }
        }

        tracing::debug!(
            kernel = K::NAME,
            threads = grid.thread_count(),
            grid_dim = config.grid_dim,
            block_dim = config.block_dim,
            "kernel launched"
        );
        Ok(())
    }

    fn synchronize(&self) -> Result<(), DeviceError> {
        // Launches run to completion before returning.
        Ok(())
    }

    fn readback<T: DeviceRepr>(&self, buffer: &HostBuffer<T>) -> Result<Vec<T>, DeviceError> {
        Ok(buffer.data.clone())
    }

    fn dispose<T: DeviceRepr>(&self, buffer: HostBuffer<T>) {
        drop(buffer);
    }

    fn allocated_bytes(&self) -> usize {
        self.ledger.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_tracks_live_buffers() {
        let dev = HostDevice::new();
        let a = dev.allocate(&[1u32, 2, 3]).unwrap();
        let b = dev.allocate_zeroed::<f32>(5).unwrap();
        assert_eq!(dev.allocated_bytes(), 12 + 20);
        assert_eq!(b.as_slice(), &[0.0; 5]);
        dev.dispose(a);
        assert_eq!(dev.allocated_bytes(), 20);
        drop(b);
        assert_eq!(dev.allocated_bytes(), 0);
    }

    #[test]
    fn memory_limit_rejects_and_leaves_ledger_untouched() {
        let dev = HostDevice::new().with_memory_limit(16);
        let a = dev.allocate_zeroed::<u32>(3).unwrap();
        let err = dev.allocate_zeroed::<u32>(2).unwrap_err();
        assert_eq!(
            err,
            DeviceError::OutOfMemory {
                requested: 8,
                in_use: 12,
                limit: 16
            }
        );
        assert_eq!(dev.allocated_bytes(), 12);
        drop(a);
        assert_eq!(dev.allocated_bytes(), 0);
    }

    #[test]
    fn split_pairs_follows_offsets_per_param_block() {
        let mut out: Vec<u32> = (0..10).collect();
        let pairs = split_pairs(&mut out, &[0, 3, 3], &[3, 0, 2], 5).unwrap();
        let lens: Vec<usize> = pairs.iter().map(|p| p.len()).collect();
        assert_eq!(lens, vec![3, 0, 2, 3, 0, 2]);
        assert_eq!(pairs[3][0], 5);
        assert_eq!(pairs[5][1], 9);
    }

    #[test]
    fn split_pairs_rejects_gapped_offsets() {
        let mut out = vec![0u32; 4];
        assert!(split_pairs(&mut out, &[0, 3], &[2, 2], 4).is_err());
    }

    #[test]
    fn dedicated_pool_builds() {
        assert!(HostDevice::new().with_threads(2).is_ok());
    }
}
