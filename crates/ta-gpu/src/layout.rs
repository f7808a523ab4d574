//! Result unflattening.
//!
//! The device writes records at `p * total_bars + offsets[s] + i`. The cube
//! rebuilds the `[series][param][bar]` view from that index alone.

use std::ops::Index;

use crate::error::CalcError;
use crate::flatten::FlatSeries;

/// Batch result indexed `cube[series][param][bar]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultCube<R> {
    cells: Vec<Vec<Vec<R>>>,
    params: usize,
}

impl<R> ResultCube<R> {
    pub fn series_count(&self) -> usize {
        self.cells.len()
    }

    pub fn param_count(&self) -> usize {
        self.params
    }

    pub fn get(&self, series: usize, param: usize) -> Option<&[R]> {
        self.cells.get(series)?.get(param).map(Vec::as_slice)
    }

    /// Iterate `(series, param, records)`.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &[R])> + '_ {
        self.cells.iter().enumerate().flat_map(|(s, per_series)| {
            per_series
                .iter()
                .enumerate()
                .map(move |(p, recs)| (s, p, recs.as_slice()))
        })
    }

    pub fn into_inner(self) -> Vec<Vec<Vec<R>>> {
        self.cells
    }
}

impl<R> Index<usize> for ResultCube<R> {
    type Output = [Vec<R>];

    fn index(&self, series: usize) -> &[Vec<R>] {
        &self.cells[series]
    }
}

/// Rebuild the cube from the flat record buffer.
pub fn unflatten<R: Copy>(
    records: &[R],
    flat: &FlatSeries,
    param_count: usize,
) -> Result<ResultCube<R>, CalcError> {
    let total = flat.total_bars as usize;
    let expected = param_count
        .checked_mul(total)
        .ok_or(CalcError::Overflow {
            label: "result_records",
            value: usize::MAX,
        })?;
    if records.len() != expected {
        return Err(CalcError::Layout(format!(
            "expected {expected} records ({param_count} params x {total} bars), got {}",
            records.len()
        )));
    }

    let cells = flat
        .offsets
        .iter()
        .zip(&flat.lengths)
        .map(|(&offset, &len)| {
            (0..param_count)
                .map(|p| {
                    let start = p * total + offset as usize;
                    records[start..start + len as usize].to_vec()
                })
                .collect()
        })
        .collect();

    Ok(ResultCube {
        cells,
        params: param_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::flatten;
    use ta_core::candle::{Bar, Series};

    #[test]
    fn unflatten_uses_param_major_index() {
        let a: Series = (0..2).map(|i| Bar::new(i, 0.0, 0.0, 0.0, 0.0, 0.0)).collect();
        let b: Series = (0..3).map(|i| Bar::new(i, 0.0, 0.0, 0.0, 0.0, 0.0)).collect();
        let flat = flatten(&[a, b]).unwrap();
        // record value = p * 100 + flat index within the param block
        let records: Vec<u32> = (0..2).flat_map(|p| (0..5).map(move |i| p * 100 + i)).collect();
        let cube = unflatten(&records, &flat, 2).unwrap();

        assert_eq!(cube.series_count(), 2);
        assert_eq!(cube.param_count(), 2);
        assert_eq!(cube[0][0], vec![0, 1]);
        assert_eq!(cube[0][1], vec![100, 101]);
        assert_eq!(cube[1][0], vec![2, 3, 4]);
        assert_eq!(cube[1][1], vec![102, 103, 104]);
        assert_eq!(cube.iter().count(), 4);
    }

    #[test]
    fn wrong_record_count_is_a_layout_error() {
        let a: Series = vec![Bar::new(0, 0.0, 0.0, 0.0, 0.0, 0.0)];
        let flat = flatten(&[a]).unwrap();
        assert!(matches!(unflatten(&[1u8, 2, 3], &flat, 2), Err(CalcError::Layout(_))));
    }
}
