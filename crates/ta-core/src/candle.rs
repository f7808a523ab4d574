use serde::{Deserialize, Serialize};

/// OHLCV bar representation. Prices are f32 end to end; the engine never widens them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[repr(C)]
pub struct Bar {
    pub t: i64, // open time (ms since epoch)
    pub o: f32, // open
    pub h: f32, // high
    pub l: f32, // low
    pub c: f32, // close
    pub v: f32, // volume
}

impl Bar {
    pub fn new(t: i64, o: f32, h: f32, l: f32, c: f32, v: f32) -> Self {
        Self { t, o, h, l, c, v }
    }
}

/// An ordered sequence of bars for one instrument/timeframe.
pub type Series = Vec<Bar>;

/// Anything that can be viewed as one series of bars.
///
/// `Option<T>` models a null series: `None` yields an empty slice and flows
/// through the engine as a zero-length series.
pub trait BarSource {
    fn bars(&self) -> &[Bar];
}

impl BarSource for [Bar] {
    fn bars(&self) -> &[Bar] {
        self
    }
}

impl BarSource for Vec<Bar> {
    fn bars(&self) -> &[Bar] {
        self.as_slice()
    }
}

impl<T: BarSource + ?Sized> BarSource for &T {
    fn bars(&self) -> &[Bar] {
        (**self).bars()
    }
}

impl<T: BarSource> BarSource for Option<T> {
    fn bars(&self) -> &[Bar] {
        match self {
            Some(inner) => inner.bars(),
            None => &[],
        }
    }
}

/// Price field an indicator reads from each bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceField {
    Open,
    High,
    Low,
    #[default]
    Close,
    Volume,
    /// (h + l) / 2
    Median,
    /// (h + l + c) / 3
    Typical,
    /// (h + l + 2c) / 4
    Weighted,
}

impl PriceField {
    /// Device encoding. Stable: parameter buffers persist these codes.
    pub fn code(self) -> u32 {
        match self {
            Self::Open => 0,
            Self::High => 1,
            Self::Low => 2,
            Self::Close => 3,
            Self::Volume => 4,
            Self::Median => 5,
            Self::Typical => 6,
            Self::Weighted => 7,
        }
    }

    /// Decode a device code. Unknown codes fall back to `Close`.
    pub fn from_code(code: u32) -> Self {
        match code {
            0 => Self::Open,
            1 => Self::High,
            2 => Self::Low,
            4 => Self::Volume,
            5 => Self::Median,
            6 => Self::Typical,
            7 => Self::Weighted,
            _ => Self::Close,
        }
    }

    /// Select the price from raw bar fields.
    #[inline]
    pub fn select(self, o: f32, h: f32, l: f32, c: f32, v: f32) -> f32 {
        match self {
            Self::Open => o,
            Self::High => h,
            Self::Low => l,
            Self::Close => c,
            Self::Volume => v,
            Self::Median => (h + l) / 2.0,
            Self::Typical => (h + l + c) / 3.0,
            Self::Weighted => (h + l + c * 2.0) / 4.0,
        }
    }

    #[inline]
    pub fn of(self, bar: &Bar) -> f32 {
        self.select(bar.o, bar.h, bar.l, bar.c, bar.v)
    }
}
