use super::math::{aroon_line, clamp_length};
use super::{AroonReading, Indicator, RingBuf};
use crate::candle::Bar;

/// Aroon Up/Down with incremental extremum tracking.
///
/// The running highest high and lowest low are carried with their age in bars.
/// A new bar that ties or beats the extremum replaces it (newest wins). Once the
/// extremum ages out of the `L`-bar window the window is rescanned, again letting
/// the newest tie win. Formed from bar `L - 1`.
#[derive(Debug, Clone)]
pub struct Aroon {
    length: usize,
    highs: RingBuf,
    lows: RingBuf,
    highest: f32,
    lowest: f32,
    high_age: u32,
    low_age: u32,
    seen: usize,
}

impl Aroon {
    pub fn new(length: i32) -> Self {
        let length = clamp_length(length);
        Self {
            length,
            highs: RingBuf::new(length),
            lows: RingBuf::new(length),
            highest: f32::NAN,
            lowest: f32::NAN,
            high_age: 0,
            low_age: 0,
            seen: 0,
        }
    }

    /// Rescan the window oldest to newest; returns (extremum, age).
    fn rescan(window: &RingBuf, better: impl Fn(f32, f32) -> bool) -> (f32, u32) {
        let last = window.len().saturating_sub(1);
        let mut best = f32::NAN;
        let mut best_idx = 0usize;
        for (idx, v) in window.iter().enumerate() {
            if idx == 0 || better(v, best) {
                best = v;
                best_idx = idx;
            }
        }
        (best, (last - best_idx) as u32)
    }
}

impl Indicator for Aroon {
    type Output = AroonReading;

    fn update(&mut self, bar: &Bar) -> AroonReading {
        self.highs.push(bar.h);
        self.lows.push(bar.l);

        if self.seen == 0 {
            self.highest = bar.h;
            self.lowest = bar.l;
            self.high_age = 0;
            self.low_age = 0;
        } else {
            self.high_age += 1;
            self.low_age += 1;
            if bar.h >= self.highest {
                self.highest = bar.h;
                self.high_age = 0;
            }
            if bar.l <= self.lowest {
                self.lowest = bar.l;
                self.low_age = 0;
            }
            if self.high_age as usize >= self.length {
                (self.highest, self.high_age) = Self::rescan(&self.highs, |v, best| v >= best);
            }
            if self.low_age as usize >= self.length {
                (self.lowest, self.low_age) = Self::rescan(&self.lows, |v, best| v <= best);
            }
        }
        self.seen += 1;

        let formed = self.is_formed();
        let lf = self.length as f32;
        AroonReading {
            up: if formed {
                aroon_line(lf, self.high_age)
            } else {
                f32::NAN
            },
            down: if formed {
                aroon_line(lf, self.low_age)
            } else {
                f32::NAN
            },
            highest: self.highest,
            lowest: self.lowest,
            high_age: self.high_age,
            low_age: self.low_age,
            formed,
        }
    }

    fn is_formed(&self) -> bool {
        self.seen >= self.length
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bars(highs: &[f32], lows: &[f32]) -> Vec<Bar> {
        highs
            .iter()
            .zip(lows)
            .enumerate()
            .map(|(i, (&h, &l))| Bar::new(i as i64, l, h, l, l, 1.0))
            .collect()
    }

    #[test]
    fn hand_computed_extrema_and_ages() {
        let series = bars(&[10.0, 11.0, 9.0, 12.0, 8.0], &[8.0, 9.0, 7.0, 10.0, 6.0]);
        let mut aroon = Aroon::new(3);
        let out: Vec<_> = series.iter().map(|b| aroon.update(b)).collect();

        assert!(!out[0].formed);
        assert!(!out[1].formed);
        assert!(out[2].formed);

        let got: Vec<_> = out[2..]
            .iter()
            .map(|r| (r.highest, r.high_age, r.lowest, r.low_age))
            .collect();
        assert_eq!(
            got,
            vec![(11.0, 1, 7.0, 0), (12.0, 0, 7.0, 1), (12.0, 1, 6.0, 0)]
        );
        assert_eq!(out[2].up, aroon_line(3.0, 1));
        assert_eq!(out[2].down, 100.0);
        assert_eq!(out[3].up, 100.0);
    }

    #[test]
    fn stale_extremum_triggers_rescan() {
        let series = bars(&[20.0, 10.0, 11.0, 12.0, 9.0], &[19.0, 9.0, 10.0, 11.0, 8.0]);
        let mut aroon = Aroon::new(3);
        let out: Vec<_> = series.iter().map(|b| aroon.update(b)).collect();
        assert_eq!((out[2].highest, out[2].high_age), (20.0, 2));
        assert_eq!((out[3].highest, out[3].high_age), (12.0, 0));
        assert_eq!((out[4].highest, out[4].high_age), (12.0, 1));
    }

    #[test]
    fn rescan_prefers_newest_tie() {
        let series = bars(&[9.0, 5.0, 5.0, 4.0], &[1.0, 2.0, 2.0, 3.0]);
        let mut aroon = Aroon::new(3);
        let out: Vec<_> = series.iter().map(|b| aroon.update(b)).collect();
        // window at bar 3 is [5, 5, 4]; the later 5 wins
        assert_eq!((out[3].highest, out[3].high_age), (5.0, 1));
    }
}
