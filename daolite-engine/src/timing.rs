// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! The per-group timing produced by every stage.
//!
//! A [`TimingArray`] holds one `(start, finish)` row per processing group in
//! the order the groups are processed. All values are microseconds relative
//! to the start of the frame.
//!
//! Rows always satisfy:
//!  - `start <= finish`
//!  - `start[i] >= finish[i - 1]` (groups are processed back-to-back)

use std::fmt;
use std::ops::Index;

use serde::Serialize;

use crate::invalid_config;
use crate::types::LatencyResult;

/// One processing group.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct GroupTiming {
    pub start: f64,
    pub finish: f64,
}

impl GroupTiming {
    #[must_use]
    pub fn duration(&self) -> f64 {
        self.finish - self.start
    }
}

/// Ordered `(start, finish)` rows for the groups of a stage.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TimingArray {
    rows: Vec<GroupTiming>,
}

impl TimingArray {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            rows: Vec::with_capacity(capacity),
        }
    }

    /// A timing with a single group.
    #[must_use]
    pub fn single(start: f64, finish: f64) -> Self {
        Self {
            rows: vec![GroupTiming { start, finish }],
        }
    }

    /// Build a timing from raw rows, checking the ordering rules.
    pub fn from_rows(rows: &[(f64, f64)]) -> LatencyResult<Self> {
        let mut timing = Self::with_capacity(rows.len());
        for &(start, finish) in rows {
            timing.try_push(start, finish)?;
        }
        Ok(timing)
    }

    /// Append a group, checking it does not break the ordering rules.
    pub fn try_push(&mut self, start: f64, finish: f64) -> LatencyResult {
        if !start.is_finite() || !finish.is_finite() {
            return invalid_config!("non-finite group timing ({start}, {finish})");
        }
        if start > finish {
            return invalid_config!("group starts at {start} after it finishes at {finish}");
        }
        if let Some(prev) = self.rows.last() {
            if start < prev.finish {
                return invalid_config!(
                    "group starts at {start} before previous group finishes at {}",
                    prev.finish
                );
            }
        }
        self.rows.push(GroupTiming { start, finish });
        Ok(())
    }

    /// Append a group that will start once the previous group and its input
    /// are both ready, taking `duration` microseconds.
    ///
    /// Returns the finish time of the new group.
    pub fn push_after(&mut self, ready: f64, duration: f64) -> f64 {
        let start = match self.rows.last() {
            Some(prev) => prev.finish.max(ready),
            None => ready,
        };
        let finish = start + duration.max(0.0);
        self.rows.push(GroupTiming { start, finish });
        finish
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn rows(&self) -> &[GroupTiming] {
        &self.rows
    }

    pub fn iter(&self) -> impl Iterator<Item = &GroupTiming> {
        self.rows.iter()
    }

    #[must_use]
    pub fn starts(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.start).collect()
    }

    #[must_use]
    pub fn finishes(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.finish).collect()
    }

    #[must_use]
    pub fn first_start(&self) -> Option<f64> {
        self.rows.first().map(|r| r.start)
    }

    #[must_use]
    pub fn last_finish(&self) -> Option<f64> {
        self.rows.last().map(|r| r.finish)
    }

    /// Time between the first group starting and the last group finishing.
    #[must_use]
    pub fn span(&self) -> f64 {
        match (self.first_start(), self.last_finish()) {
            (Some(start), Some(finish)) => finish - start,
            _ => 0.0,
        }
    }

    /// Sum of the time spent processing groups.
    #[must_use]
    pub fn busy_time(&self) -> f64 {
        self.rows.iter().map(GroupTiming::duration).sum()
    }

    /// Combine the timings of several upstream stages into the single timing
    /// that a downstream stage waits on.
    ///
    /// When all inputs have the same number of groups the result holds the
    /// element-wise latest start and finish. Otherwise the downstream stage
    /// waits for everything: a single group from the latest first start to
    /// the latest last finish.
    #[must_use]
    pub fn combine(inputs: &[&TimingArray]) -> TimingArray {
        let inputs: Vec<&TimingArray> = inputs.iter().copied().filter(|t| !t.is_empty()).collect();
        match inputs.as_slice() {
            [] => TimingArray::new(),
            [only] => (*only).clone(),
            [first, rest @ ..] => {
                if rest.iter().all(|t| t.len() == first.len()) {
                    let rows = (0..first.len())
                        .map(|i| GroupTiming {
                            start: inputs.iter().map(|t| t.rows[i].start).fold(f64::MIN, f64::max),
                            finish: inputs
                                .iter()
                                .map(|t| t.rows[i].finish)
                                .fold(f64::MIN, f64::max),
                        })
                        .collect();
                    TimingArray { rows }
                } else {
                    let start = inputs
                        .iter()
                        .filter_map(|t| t.first_start())
                        .fold(f64::MIN, f64::max);
                    let finish = inputs
                        .iter()
                        .filter_map(|t| t.last_finish())
                        .fold(f64::MIN, f64::max);
                    TimingArray::single(start, finish.max(start))
                }
            }
        }
    }
}

impl Index<usize> for TimingArray {
    type Output = GroupTiming;

    fn index(&self, index: usize) -> &Self::Output {
        &self.rows[index]
    }
}

impl fmt::Display for TimingArray {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[")?;
        for (i, row) in self.rows.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "({:.3}, {:.3})", row.start, row.finish)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn from_rows_checks_order() {
        assert!(TimingArray::from_rows(&[(0.0, 1.0), (1.0, 3.0)]).is_ok());
        assert!(TimingArray::from_rows(&[(2.0, 1.0)]).is_err());
        assert!(TimingArray::from_rows(&[(0.0, 2.0), (1.0, 3.0)]).is_err());
        assert!(TimingArray::from_rows(&[(0.0, f64::NAN)]).is_err());
    }

    #[test]
    fn push_after_waits_for_both() {
        let mut timing = TimingArray::new();
        assert_relative_eq!(timing.push_after(5.0, 2.0), 7.0);
        // Input ready before previous group done
        assert_relative_eq!(timing.push_after(6.0, 1.0), 8.0);
        // Input ready after previous group done
        assert_relative_eq!(timing.push_after(10.0, 1.0), 11.0);
        assert_eq!(timing.starts(), vec![5.0, 7.0, 10.0]);
        assert_relative_eq!(timing.span(), 6.0);
        assert_relative_eq!(timing.busy_time(), 4.0);
    }

    #[test]
    fn combine_equal_lengths() {
        let a = TimingArray::from_rows(&[(0.0, 2.0), (2.0, 4.0)]).unwrap();
        let b = TimingArray::from_rows(&[(1.0, 1.5), (3.0, 5.0)]).unwrap();
        let combined = TimingArray::combine(&[&a, &b]);
        assert_eq!(combined.len(), 2);
        assert_eq!(combined[0], GroupTiming { start: 1.0, finish: 2.0 });
        assert_eq!(combined[1], GroupTiming { start: 3.0, finish: 5.0 });
    }

    #[test]
    fn combine_different_lengths() {
        let a = TimingArray::from_rows(&[(0.0, 2.0), (2.0, 4.0)]).unwrap();
        let b = TimingArray::single(1.0, 7.0);
        let combined = TimingArray::combine(&[&a, &b]);
        assert_eq!(combined, TimingArray::single(1.0, 7.0));
    }

    #[test]
    fn combine_nothing() {
        assert!(TimingArray::combine(&[]).is_empty());
    }

    #[test]
    fn display() {
        let timing = TimingArray::from_rows(&[(0.0, 1.5)]).unwrap();
        assert_eq!(timing.to_string(), "[(0.000, 1.500)]");
    }
}
