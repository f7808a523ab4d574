pub mod aroon;
pub mod atr;
pub mod cascade;
pub mod directional;
pub mod math;
pub mod moving;
pub mod rsi;
pub mod window;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::candle::Bar;

/// Sequential reference indicator: fed one bar at a time, strictly in order.
///
/// The device kernels must reproduce `update` bit for bit, including the
/// point at which `formed` flips.
pub trait Indicator {
    type Output: Copy;

    fn update(&mut self, bar: &Bar) -> Self::Output;

    fn is_formed(&self) -> bool;
}

/// Single-line reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalarReading {
    pub value: f32,
    pub formed: bool,
}

impl ScalarReading {
    pub const EMPTY: Self = Self {
        value: f32::NAN,
        formed: false,
    };
}

/// Three-line reading (DMI, ADX, channel and band indicators).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TripleReading {
    pub values: [f32; 3],
    pub formed: bool,
}

impl TripleReading {
    pub const EMPTY: Self = Self {
        values: [f32::NAN; 3],
        formed: false,
    };
}

/// Aroon reading: both lines plus the tracked extremum state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AroonReading {
    pub up: f32,
    pub down: f32,
    pub highest: f32,
    pub lowest: f32,
    pub high_age: u32,
    pub low_age: u32,
    pub formed: bool,
}

/// Every indicator the engine can dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorKind {
    Dmi,
    Adx,
    Atr,
    Rsi,
    Aroon,
    Sma,
    Smma,
    Tema,
    Trix,
    Donchian,
    WilliamsR,
    Bollinger,
}

impl IndicatorKind {
    pub const ALL: [IndicatorKind; 12] = [
        Self::Dmi,
        Self::Adx,
        Self::Atr,
        Self::Rsi,
        Self::Aroon,
        Self::Sma,
        Self::Smma,
        Self::Tema,
        Self::Trix,
        Self::Donchian,
        Self::WilliamsR,
        Self::Bollinger,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dmi => "dmi",
            Self::Adx => "adx",
            Self::Atr => "atr",
            Self::Rsi => "rsi",
            Self::Aroon => "aroon",
            Self::Sma => "sma",
            Self::Smma => "smma",
            Self::Tema => "tema",
            Self::Trix => "trix",
            Self::Donchian => "donchian",
            Self::WilliamsR => "williams_r",
            Self::Bollinger => "bollinger",
        }
    }
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IndicatorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == wanted)
            .ok_or_else(|| format!("unknown indicator '{s}'"))
    }
}

/// Fixed-capacity ring buffer for rolling-window reference computations.
#[derive(Debug, Clone)]
pub struct RingBuf {
    buf: Vec<f32>,
    pos: usize,
    len: usize,
    cap: usize,
}

impl RingBuf {
    /// Capacity is floored at 1.
    pub fn new(capacity: usize) -> Self {
        let cap = capacity.max(1);
        Self {
            buf: vec![0.0; cap],
            pos: 0,
            len: 0,
            cap,
        }
    }

    pub fn push(&mut self, val: f32) {
        let _ = self.push_evict(val);
    }

    /// Push a value, returning the one it displaced once the buffer is full.
    pub fn push_evict(&mut self, val: f32) -> Option<f32> {
        let evicted = if self.len == self.cap {
            Some(self.buf[self.pos])
        } else {
            None
        };
        self.buf[self.pos] = val;
        self.pos = (self.pos + 1) % self.cap;
        if self.len < self.cap {
            self.len += 1;
        }
        evicted
    }

    pub fn full(&self) -> bool {
        self.len == self.cap
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.cap
    }

    /// Iterate over values in insertion order (oldest first).
    pub fn iter(&self) -> RingBufIter<'_> {
        RingBufIter {
            buf: &self.buf,
            start: if self.len < self.cap { 0 } else { self.pos },
            count: 0,
            total: self.len,
            cap: self.cap,
        }
    }

    /// Sum accumulated oldest to newest.
    pub fn sum(&self) -> f32 {
        let mut acc = 0.0f32;
        for v in self.iter() {
            acc += v;
        }
        acc
    }

    pub fn mean(&self) -> f32 {
        if self.len == 0 {
            return 0.0;
        }
        self.sum() / self.len as f32
    }

    /// Population standard deviation around `mean`, accumulated oldest to newest.
    pub fn std_pop(&self, mean: f32) -> f32 {
        if self.len == 0 {
            return 0.0;
        }
        let mut acc = 0.0f32;
        for v in self.iter() {
            let d = v - mean;
            acc += d * d;
        }
        (acc / self.len as f32).sqrt()
    }

    /// Max value in the buffer; NaN when empty.
    pub fn max(&self) -> f32 {
        let mut it = self.iter();
        let Some(mut best) = it.next() else {
            return f32::NAN;
        };
        for v in it {
            if v > best {
                best = v;
            }
        }
        best
    }

    /// Min value in the buffer; NaN when empty.
    pub fn min(&self) -> f32 {
        let mut it = self.iter();
        let Some(mut best) = it.next() else {
            return f32::NAN;
        };
        for v in it {
            if v < best {
                best = v;
            }
        }
        best
    }
}

pub struct RingBufIter<'a> {
    buf: &'a [f32],
    start: usize,
    count: usize,
    total: usize,
    cap: usize,
}

impl<'a> Iterator for RingBufIter<'a> {
    type Item = f32;
    fn next(&mut self) -> Option<f32> {
        if self.count >= self.total {
            return None;
        }
        let idx = (self.start + self.count) % self.cap;
        self.count += 1;
        Some(self.buf[idx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_buf_evicts_oldest_and_iterates_in_order() {
        let mut rb = RingBuf::new(3);
        assert_eq!(rb.push_evict(1.0), None);
        assert_eq!(rb.push_evict(2.0), None);
        assert_eq!(rb.push_evict(3.0), None);
        assert!(rb.full());
        assert_eq!(rb.push_evict(4.0), Some(1.0));
        assert_eq!(rb.iter().collect::<Vec<_>>(), vec![2.0, 3.0, 4.0]);
        assert_eq!(rb.max(), 4.0);
        assert_eq!(rb.min(), 2.0);
        assert_eq!(rb.mean(), 3.0);
    }

    #[test]
    fn zero_capacity_is_floored() {
        let mut rb = RingBuf::new(0);
        rb.push(5.0);
        assert!(rb.full());
        assert_eq!(rb.capacity(), 1);
        assert_eq!(rb.push_evict(6.0), Some(5.0));
    }

    #[test]
    fn indicator_kind_parses_names() {
        for kind in IndicatorKind::ALL {
            assert_eq!(kind.as_str().parse::<IndicatorKind>(), Ok(kind));
        }
        assert_eq!("  ADX ".parse::<IndicatorKind>(), Ok(IndicatorKind::Adx));
        assert!("macd".parse::<IndicatorKind>().is_err());
    }
}
