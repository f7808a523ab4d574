use super::math::{clamp_length, rolling_sum_step, smma_step};
use super::{Indicator, RingBuf, ScalarReading};
use crate::candle::{Bar, PriceField};

/// Simple moving average over a running sum.
#[derive(Debug, Clone)]
pub struct SimpleMovingAverage {
    length: usize,
    source: PriceField,
    window: RingBuf,
    sum: f32,
}

impl SimpleMovingAverage {
    pub fn new(length: i32, source: PriceField) -> Self {
        let length = clamp_length(length);
        Self {
            length,
            source,
            window: RingBuf::new(length),
            sum: 0.0,
        }
    }
}

impl Indicator for SimpleMovingAverage {
    type Output = ScalarReading;

    fn update(&mut self, bar: &Bar) -> ScalarReading {
        let x = self.source.of(bar);
        self.sum = match self.window.push_evict(x) {
            Some(old) => rolling_sum_step(self.sum, old, x),
            None => self.sum + x,
        };
        if !self.window.full() {
            return ScalarReading::EMPTY;
        }
        ScalarReading {
            value: self.sum / self.length as f32,
            formed: true,
        }
    }

    fn is_formed(&self) -> bool {
        self.window.full()
    }
}

/// Smoothed moving average (SMMA / RMA), seeded with the SMA of the first `L` prices.
///
/// The first value appears at bar `L - 1` but is only reported formed from bar `L`.
#[derive(Debug, Clone)]
pub struct SmoothedMovingAverage {
    length: usize,
    source: PriceField,
    sum: f32,
    count: usize,
    value: f32,
    ready: bool,
}

impl SmoothedMovingAverage {
    pub fn new(length: i32, source: PriceField) -> Self {
        Self {
            length: clamp_length(length),
            source,
            sum: 0.0,
            count: 0,
            value: 0.0,
            ready: false,
        }
    }
}

impl Indicator for SmoothedMovingAverage {
    type Output = ScalarReading;

    fn update(&mut self, bar: &Bar) -> ScalarReading {
        let x = self.source.of(bar);
        let lf = self.length as f32;
        if self.count < self.length {
            self.sum += x;
            self.count += 1;
            if self.count < self.length {
                return ScalarReading::EMPTY;
            }
            self.value = self.sum / lf;
        } else {
            self.value = smma_step(self.value, x, lf);
        }
        let formed = self.ready;
        self.ready = true;
        ScalarReading {
            value: self.value,
            formed,
        }
    }

    fn is_formed(&self) -> bool {
        self.ready
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn closes(values: &[f32]) -> Vec<Bar> {
        values
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar::new(i as i64, c, c, c, c, 1.0))
            .collect()
    }

    #[test]
    fn sma_rolls_the_window() {
        let mut sma = SimpleMovingAverage::new(3, PriceField::Close);
        let out: Vec<_> = closes(&[1.0, 2.0, 3.0, 4.0, 8.0])
            .iter()
            .map(|b| sma.update(b))
            .collect();
        assert!(!out[1].formed);
        assert_eq!(out[2].value, 2.0);
        assert_eq!(out[3].value, 3.0);
        assert_eq!(out[4].value, 5.0);
    }

    #[test]
    fn smma_reports_formed_one_bar_after_first_value() {
        let mut smma = SmoothedMovingAverage::new(2, PriceField::Close);
        let out: Vec<_> = closes(&[2.0, 4.0, 6.0, 6.0])
            .iter()
            .map(|b| smma.update(b))
            .collect();
        assert!(out[0].value.is_nan());
        assert_eq!(out[1].value, 3.0);
        assert!(!out[1].formed);
        assert_eq!(out[2].value, 4.5);
        assert!(out[2].formed);
        assert!(out[3].formed);
    }

    #[test]
    fn length_one_sma_is_the_price() {
        let mut sma = SimpleMovingAverage::new(0, PriceField::Close);
        let out: Vec<_> = closes(&[7.0, 9.0]).iter().map(|b| sma.update(b)).collect();
        assert_eq!(out[0].value, 7.0);
        assert_eq!(out[1].value, 9.0);
    }
}
