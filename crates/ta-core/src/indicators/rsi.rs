use super::math::{clamp_length, rsi_from_averages, smma_step};
use super::{Indicator, ScalarReading};
use crate::candle::{Bar, PriceField};

/// Wilder RSI over a selectable price field.
///
/// Bar 0 primes the previous price. The first `L` gains and losses are averaged,
/// then SMMA-blended. Formed at bar `L`.
#[derive(Debug, Clone)]
pub struct RelativeStrength {
    length: usize,
    source: PriceField,
    prev: Option<f32>,
    gain: f32,
    loss: f32,
    count: usize,
    formed: bool,
}

impl RelativeStrength {
    pub fn new(length: i32, source: PriceField) -> Self {
        Self {
            length: clamp_length(length),
            source,
            prev: None,
            gain: 0.0,
            loss: 0.0,
            count: 0,
            formed: false,
        }
    }
}

impl Indicator for RelativeStrength {
    type Output = ScalarReading;

    fn update(&mut self, bar: &Bar) -> ScalarReading {
        let price = self.source.of(bar);
        let Some(prev) = self.prev.replace(price) else {
            return ScalarReading::EMPTY;
        };

        let change = price - prev;
        let up = if change > 0.0 { change } else { 0.0 };
        let down = if change < 0.0 { -change } else { 0.0 };
        let lf = self.length as f32;

        if self.count < self.length {
            self.gain += up;
            self.loss += down;
            self.count += 1;
            if self.count == self.length {
                self.gain = self.gain / lf;
                self.loss = self.loss / lf;
                self.formed = true;
            }
        } else {
            self.gain = smma_step(self.gain, up, lf);
            self.loss = smma_step(self.loss, down, lf);
        }

        if self.formed {
            ScalarReading {
                value: rsi_from_averages(self.gain, self.loss),
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

    fn closes(values: &[f32]) -> Vec<Bar> {
        values
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar::new(i as i64, c, c, c, c, 1.0))
            .collect()
    }

    #[test]
    fn formed_at_bar_l() {
        let mut rsi = RelativeStrength::new(3, PriceField::Close);
        let out: Vec<_> = closes(&[1.0, 2.0, 3.0, 2.0, 3.0])
            .iter()
            .map(|b| rsi.update(b))
            .collect();
        assert!(!out[2].formed);
        assert!(out[3].formed);
        // gains 1+1, losses 1 over 3 bars
        let expected = rsi_from_averages(2.0 / 3.0, 1.0 / 3.0);
        assert_eq!(out[3].value, expected);
    }

    #[test]
    fn flat_reads_fifty_and_rally_reads_hundred() {
        let mut flat = RelativeStrength::new(2, PriceField::Close);
        let out: Vec<_> = closes(&[5.0; 5]).iter().map(|b| flat.update(b)).collect();
        assert_eq!(out[4].value, 50.0);

        let mut rally = RelativeStrength::new(2, PriceField::Close);
        let out: Vec<_> = closes(&[1.0, 2.0, 3.0, 4.0])
            .iter()
            .map(|b| rally.update(b))
            .collect();
        assert_eq!(out[3].value, 100.0);
    }
}
