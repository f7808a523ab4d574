//! Device-transferable records with bytemuck Pod/Zeroable.
//!
//! Every struct is `#[repr(C)]` with explicit padding so the host image is
//! the device image. Sizes are pinned by const asserts.

use bytemuck::{Pod, Zeroable};
use ta_core::candle::{Bar, PriceField};

// ═══════════════════════════════════════════════════════════════════════════
// GpuBar: one flattened OHLCV sample
// ═══════════════════════════════════════════════════════════════════════════

/// Flattened bar. Layout: `bars[offsets[s] + i]`.
///
/// 32 bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuBar {
    pub t: i64,
    pub open: f32,
    pub high: f32,
    pub low: f32,
    pub close: f32,
    pub volume: f32,
    pub _pad: u32,
}

const _: () = assert!(std::mem::size_of::<GpuBar>() == 32);

impl GpuBar {
    /// Source price by device code; unknown codes read the close.
    #[inline]
    pub fn price(&self, source: u32) -> f32 {
        PriceField::from_code(source).select(
            self.open,
            self.high,
            self.low,
            self.close,
            self.volume,
        )
    }
}

impl From<&Bar> for GpuBar {
    fn from(b: &Bar) -> Self {
        Self {
            t: b.t,
            open: b.o,
            high: b.h,
            low: b.l,
            close: b.c,
            volume: b.v,
            _pad: 0,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Parameter sets: 16 bytes each, lengths signed so degenerate values survive
// ═══════════════════════════════════════════════════════════════════════════

/// Window length only (DMI, ADX, ATR, Aroon, Donchian, Williams %R).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LengthParams {
    pub length: i32,
    pub _pad: [u32; 3],
}

const _: () = assert!(std::mem::size_of::<LengthParams>() == 16);

/// Window length plus source price code (SMA, SMMA, RSI, TEMA, TRIX).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SourceParams {
    pub length: i32,
    pub source: u32,
    pub _pad: [u32; 2],
}

const _: () = assert!(std::mem::size_of::<SourceParams>() == 16);

/// Length, source and band multiplier (Bollinger Bands).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct BandParams {
    pub length: i32,
    pub source: u32,
    pub width: f32,
    pub _pad: u32,
}

const _: () = assert!(std::mem::size_of::<BandParams>() == 16);

// ═══════════════════════════════════════════════════════════════════════════
// Result records: every record carries `formed` and the bar time
// ═══════════════════════════════════════════════════════════════════════════

/// Common view over result records.
pub trait ResultRecord: Pod + Send + Sync {
    /// Unformed placeholder stamped with the bar time.
    fn empty(t: i64) -> Self;
    fn formed(&self) -> bool;
    fn time(&self) -> i64;
}

/// Single-line record. 16 bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ScalarRecord {
    pub value: f32,
    pub formed: u32,
    pub t: i64,
}

const _: () = assert!(std::mem::size_of::<ScalarRecord>() == 16);

impl ScalarRecord {
    #[inline]
    pub fn new(t: i64, value: f32, formed: bool) -> Self {
        Self {
            value,
            formed: formed as u32,
            t,
        }
    }
}

impl ResultRecord for ScalarRecord {
    fn empty(t: i64) -> Self {
        Self::new(t, f32::NAN, false)
    }
    fn formed(&self) -> bool {
        self.formed != 0
    }
    fn time(&self) -> i64 {
        self.t
    }
}

/// Three-line record. 24 bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct TripleRecord {
    pub values: [f32; 3],
    pub formed: u32,
    pub t: i64,
}

const _: () = assert!(std::mem::size_of::<TripleRecord>() == 24);

impl TripleRecord {
    #[inline]
    pub fn new(t: i64, values: [f32; 3], formed: bool) -> Self {
        Self {
            values,
            formed: formed as u32,
            t,
        }
    }
}

impl ResultRecord for TripleRecord {
    fn empty(t: i64) -> Self {
        Self::new(t, [f32::NAN; 3], false)
    }
    fn formed(&self) -> bool {
        self.formed != 0
    }
    fn time(&self) -> i64 {
        self.t
    }
}

/// Aroon lines plus the tracked extremum state. 40 bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct AroonRecord {
    pub up: f32,
    pub down: f32,
    pub highest: f32,
    pub lowest: f32,
    pub high_age: u32,
    pub low_age: u32,
    pub formed: u32,
    pub _pad: u32,
    pub t: i64,
}

const _: () = assert!(std::mem::size_of::<AroonRecord>() == 40);

impl ResultRecord for AroonRecord {
    fn empty(t: i64) -> Self {
        Self {
            up: f32::NAN,
            down: f32::NAN,
            highest: f32::NAN,
            lowest: f32::NAN,
            high_age: 0,
            low_age: 0,
            formed: 0,
            _pad: 0,
            t,
        }
    }
    fn formed(&self) -> bool {
        self.formed != 0
    }
    fn time(&self) -> i64 {
        self.t
    }
}
