use super::math::{clamp_length, smma_step, true_range};
use super::{Indicator, ScalarReading};
use crate::candle::Bar;

/// Average True Range, Wilder-seeded.
///
/// Bar 0 contributes its own range; later bars use the gap to the previous close.
/// The first `L` true ranges are averaged, then SMMA-blended.
#[derive(Debug, Clone)]
pub struct AverageTrueRange {
    length: usize,
    prev_close: Option<f32>,
    sum: f32,
    count: usize,
    value: f32,
    formed: bool,
}

impl AverageTrueRange {
    pub fn new(length: i32) -> Self {
        Self {
            length: clamp_length(length),
            prev_close: None,
            sum: 0.0,
            count: 0,
            value: 0.0,
            formed: false,
        }
    }
}

impl Indicator for AverageTrueRange {
    type Output = ScalarReading;

    fn update(&mut self, bar: &Bar) -> ScalarReading {
        let tr = true_range(bar.h, bar.l, self.prev_close);
        self.prev_close = Some(bar.c);

        if self.count < self.length {
            self.sum += tr;
            self.count += 1;
            if self.count == self.length {
                self.value = self.sum / self.length as f32;
                self.formed = true;
            }
        } else {
            self.value = smma_step(self.value, tr, self.length as f32);
        }

        if self.formed {
            ScalarReading {
                value: self.value,
                formed: true,
            }
        } else {
            ScalarReading::EMPTY
        }
    }

    fn is_formed(&self) -> bool {
        self.formed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeds_with_mean_of_first_l_ranges() {
        let bars = vec![
            Bar::new(0, 10.0, 11.0, 9.0, 10.0, 1.0),  // tr 2 (own range)
            Bar::new(1, 10.0, 12.0, 10.0, 11.0, 1.0), // tr 2
            Bar::new(2, 11.0, 15.0, 11.0, 14.0, 1.0), // tr 4
            Bar::new(3, 14.0, 14.0, 13.0, 13.0, 1.0), // tr 1
        ];
        let mut atr = AverageTrueRange::new(2);
        let out: Vec<_> = bars.iter().map(|b| atr.update(b)).collect();
        assert!(!out[0].formed);
        assert!(out[0].value.is_nan());
        assert_eq!(out[1].value, 2.0);
        assert!(out[1].formed);
        assert_eq!(out[2].value, 3.0);
        assert_eq!(out[3].value, 2.0);
    }
}
