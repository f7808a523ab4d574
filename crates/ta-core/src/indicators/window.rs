//! Stateless lookback-window indicators.
//!
//! Each output depends only on the last `L` bars, so the device evaluates every
//! bar independently. The reference keeps the window in ring buffers and folds
//! it oldest to newest, matching the kernel's scan order.

use super::math::{clamp_length, clamp_width};
use super::{Indicator, RingBuf, ScalarReading, TripleReading};
use crate::candle::{Bar, PriceField};

/// Williams %R of a close against its window extremes. A flat window reads 0.
#[inline]
pub fn williams_r(highest: f32, lowest: f32, close: f32) -> f32 {
    let range = highest - lowest;
    if range == 0.0 {
        0.0
    } else {
        (highest - close) / range * -100.0
    }
}

/// Donchian channel `[upper, middle, lower]`.
#[derive(Debug, Clone)]
pub struct Donchian {
    highs: RingBuf,
    lows: RingBuf,
}

impl Donchian {
    pub fn new(length: i32) -> Self {
        let length = clamp_length(length);
        Self {
            highs: RingBuf::new(length),
            lows: RingBuf::new(length),
        }
    }
}

impl Indicator for Donchian {
    type Output = TripleReading;

    fn update(&mut self, bar: &Bar) -> TripleReading {
        self.highs.push(bar.h);
        self.lows.push(bar.l);
        if !self.highs.full() {
            return TripleReading::EMPTY;
        }
        let upper = self.highs.max();
        let lower = self.lows.min();
        TripleReading {
            values: [upper, (upper + lower) / 2.0, lower],
            formed: true,
        }
    }

    fn is_formed(&self) -> bool {
        self.highs.full()
    }
}

/// Williams %R, in `[-100, 0]`.
#[derive(Debug, Clone)]
pub struct WilliamsR {
    highs: RingBuf,
    lows: RingBuf,
}

impl WilliamsR {
    pub fn new(length: i32) -> Self {
        let length = clamp_length(length);
        Self {
            highs: RingBuf::new(length),
            lows: RingBuf::new(length),
        }
    }
}

impl Indicator for WilliamsR {
    type Output = ScalarReading;

    fn update(&mut self, bar: &Bar) -> ScalarReading {
        self.highs.push(bar.h);
        self.lows.push(bar.l);
        if !self.highs.full() {
            return ScalarReading::EMPTY;
        }
        ScalarReading {
            value: williams_r(self.highs.max(), self.lows.min(), bar.c),
            formed: true,
        }
    }

    fn is_formed(&self) -> bool {
        self.highs.full()
    }
}

/// Bollinger Bands `[upper, middle, lower]` with population deviation.
#[derive(Debug, Clone)]
pub struct Bollinger {
    source: PriceField,
    width: f32,
    window: RingBuf,
}

impl Bollinger {
    pub fn new(length: i32, source: PriceField, width: f32) -> Self {
        Self {
            source,
            width: clamp_width(width),
            window: RingBuf::new(clamp_length(length)),
        }
    }
}

impl Indicator for Bollinger {
    type Output = TripleReading;

    fn update(&mut self, bar: &Bar) -> TripleReading {
        self.window.push(self.source.of(bar));
        if !self.window.full() {
            return TripleReading::EMPTY;
        }
        let mean = self.window.mean();
        let sd = self.window.std_pop(mean);
        TripleReading {
            values: [mean + self.width * sd, mean, mean - self.width * sd],
            formed: true,
        }
    }

    fn is_formed(&self) -> bool {
        self.window.full()
    }
}
