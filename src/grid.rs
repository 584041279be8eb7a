//! Candidate grid generation.
//!
//! Expands three `RackDimensionRange`s into the lazy Cartesian product of
//! rack sizes. Length varies slowest, height fastest. Iterators are cheap to
//! clone, and rebuilding one from the same ranges yields the same sequence.

use crate::error::SearchError;
use crate::model::{Axis, RackDimensionRange, RackDimensions, RackRanges, ValidationError};

/// Lazy sequence of the grid values of one axis.
#[derive(Clone, Debug)]
pub struct AxisValues {
    range: RackDimensionRange,
    next: usize,
    count: usize,
}

impl AxisValues {
    pub fn new(range: RackDimensionRange) -> Result<Self, ValidationError> {
        range.validate()?;
        Ok(Self {
            range,
            next: 0,
            count: range.value_count(),
        })
    }
}

impl Iterator for AxisValues {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        if self.next >= self.count {
            return None;
        }
        let value = self.range.value_at(self.next);
        self.next += 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.count - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for AxisValues {}

/// Lazy Cartesian product of the three axis sequences.
///
/// Works like an odometer: the height sequence restarts for every width,
/// the width sequence for every length.
///
/// # Examples
/// ```
/// use rack_planner::grid::CandidateGrid;
/// use rack_planner::model::{RackDimensionRange, RackRanges};
///
/// let ranges = RackRanges::new(
///     RackDimensionRange::new(1.0, 2.0, 0.5).unwrap(),
///     RackDimensionRange::single(1.0).unwrap(),
///     RackDimensionRange::new(4.0, 5.0, 1.0).unwrap(),
/// );
/// let grid = CandidateGrid::new(&ranges).unwrap();
/// assert_eq!(grid.len(), 6);
/// ```
#[derive(Clone, Debug)]
pub struct CandidateGrid {
    width_axis: AxisValues,
    height_axis: AxisValues,
    lengths: AxisValues,
    widths: AxisValues,
    heights: AxisValues,
    length: Option<f64>,
    width: Option<f64>,
    remaining: usize,
    total: usize,
}

impl CandidateGrid {
    /// Validates the ranges and prepares the grid without evaluating it.
    pub fn new(ranges: &RackRanges) -> Result<Self, SearchError> {
        ranges.validate()?;
        let values_for = |axis: Axis| {
            AxisValues::new(*ranges.get(axis))
                .map_err(|source| SearchError::InvalidRange { axis, source })
        };
        let width_axis = values_for(Axis::Width)?;
        let height_axis = values_for(Axis::Height)?;
        let total = ranges.combination_count();
        Ok(Self {
            lengths: values_for(Axis::Length)?,
            widths: width_axis.clone(),
            heights: height_axis.clone(),
            width_axis,
            height_axis,
            length: None,
            width: None,
            remaining: total,
            total,
        })
    }

    /// Number of combinations in the full grid, independent of progress.
    pub fn total(&self) -> usize {
        self.total
    }
}

impl Iterator for CandidateGrid {
    type Item = RackDimensions;

    fn next(&mut self) -> Option<RackDimensions> {
        if self.remaining == 0 {
            return None;
        }
        loop {
            if let (Some(length), Some(width)) = (self.length, self.width) {
                if let Some(height) = self.heights.next() {
                    self.remaining -= 1;
                    return Some(RackDimensions {
                        length,
                        width,
                        height,
                    });
                }
                self.width = self.widths.next();
                self.heights = self.height_axis.clone();
                continue;
            }

            self.length = self.lengths.next();
            self.length?;
            self.widths = self.width_axis.clone();
            self.width = self.widths.next();
            self.heights = self.height_axis.clone();
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for CandidateGrid {}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(min: f64, max: f64, step: f64) -> RackDimensionRange {
        RackDimensionRange::new(min, max, step).unwrap()
    }

    #[test]
    fn axis_sequence_matches_count_formula() {
        let cases = [(1.0, 10.0, 0.5), (0.5, 5.0, 0.1), (2.0, 2.0, 0.1), (1.0, 3.7, 0.4)];
        for (min, max, step) in cases {
            let values: Vec<f64> = AxisValues::new(range(min, max, step)).unwrap().collect();
            let expected = (((max - min) / step) + 1e-6).floor() as usize + 1;
            assert_eq!(values.len(), expected);
            assert_eq!(values[0], min);
            assert!(*values.last().unwrap() <= max);
        }
    }

    #[test]
    fn axis_sequence_includes_rounded_boundary() {
        let values: Vec<f64> = AxisValues::new(range(0.1, 0.3, 0.1)).unwrap().collect();
        assert_eq!(values.len(), 3);
        assert!((values[2] - 0.3).abs() < 1e-12);
    }

    #[test]
    fn axis_rejects_zero_step() {
        let broken = RackDimensionRange {
            min: 1.0,
            max: 2.0,
            step: 0.0,
        };
        assert!(AxisValues::new(broken).is_err());
    }

    #[test]
    fn grid_is_cartesian_product_in_order() {
        let ranges = RackRanges::new(range(1.0, 2.0, 1.0), range(3.0, 4.0, 1.0), range(5.0, 6.0, 1.0));
        let triples: Vec<(f64, f64, f64)> = CandidateGrid::new(&ranges)
            .unwrap()
            .map(|d| (d.length, d.width, d.height))
            .collect();
        assert_eq!(
            triples,
            vec![
                (1.0, 3.0, 5.0),
                (1.0, 3.0, 6.0),
                (1.0, 4.0, 5.0),
                (1.0, 4.0, 6.0),
                (2.0, 3.0, 5.0),
                (2.0, 3.0, 6.0),
                (2.0, 4.0, 5.0),
                (2.0, 4.0, 6.0),
            ]
        );
    }

    #[test]
    fn grid_is_restartable() {
        let ranges = RackRanges::new(range(1.0, 3.0, 0.5), range(0.8, 1.2, 0.2), range(4.0, 8.0, 2.0));
        let first: Vec<RackDimensions> = CandidateGrid::new(&ranges).unwrap().collect();
        let second: Vec<RackDimensions> = CandidateGrid::new(&ranges).unwrap().collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 5 * 3 * 3);

        let grid = CandidateGrid::new(&ranges).unwrap();
        let cloned: Vec<RackDimensions> = grid.clone().collect();
        assert_eq!(cloned, first);
        assert_eq!(grid.total(), 45);
    }

    #[test]
    fn partially_consumed_grid_reports_remaining_length() {
        let ranges = RackRanges::new(range(1.0, 2.0, 1.0), range(3.0, 5.0, 1.0), range(6.0, 7.0, 1.0));
        let mut grid = CandidateGrid::new(&ranges).unwrap();
        assert_eq!(grid.len(), 12);
        for _ in 0..7 {
            grid.next();
        }
        assert_eq!(grid.len(), 5);
        assert_eq!(grid.total(), 12);
        assert_eq!(grid.by_ref().count(), 5);
        assert!(grid.next().is_none());
    }

    #[test]
    fn grid_rejects_invalid_range_up_front() {
        let ranges = RackRanges::new(
            range(1.0, 2.0, 0.5),
            RackDimensionRange {
                min: 2.0,
                max: 1.0,
                step: 0.5,
            },
            range(4.0, 5.0, 1.0),
        );
        match CandidateGrid::new(&ranges) {
            Err(SearchError::InvalidRange { axis, .. }) => assert_eq!(axis, Axis::Width),
            other => panic!("expected InvalidRange, got {:?}", other.map(|g| g.total())),
        }
    }
}
