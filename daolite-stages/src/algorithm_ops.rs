// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Operation and memory counts of the kernels used by the stages.
//!
//! Every kernel returns a [`Cost`]: the number of arithmetic operations and
//! the number of bits moved through memory. Memory is counted in 32-bit
//! words.

use std::iter::Sum;
use std::ops::{Add, Mul};

use daolite_hardware::ComputeResource;

/// Width of one memory element.
pub const BITS_PER_WORD: f64 = 32.0;

/// Arithmetic and memory footprint of a piece of work.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Cost {
    pub ops: f64,
    pub bits: f64,
}

impl Cost {
    #[must_use]
    pub fn new(ops: f64, bits: f64) -> Self {
        Self { ops, bits }
    }

    /// A cost whose memory footprint is given in 32-bit words.
    #[must_use]
    pub fn words(ops: f64, words: f64) -> Self {
        Self {
            ops,
            bits: words * BITS_PER_WORD,
        }
    }

    /// Time in µs on `resource` with both parts at their peak rates.
    #[must_use]
    pub fn time_on(&self, resource: &ComputeResource) -> f64 {
        resource.total_time(self.bits, self.ops)
    }

    /// Time in µs on `resource` with the compute and memory parts sped up
    /// separately.
    #[must_use]
    pub fn scaled_time_on(&self, resource: &ComputeResource, flop_scale: f64, mem_scale: f64) -> f64 {
        resource.load_time(self.bits) / mem_scale + resource.calc_time(self.ops) / flop_scale
    }
}

impl Add for Cost {
    type Output = Cost;

    fn add(self, rhs: Cost) -> Cost {
        Cost {
            ops: self.ops + rhs.ops,
            bits: self.bits + rhs.bits,
        }
    }
}

impl Mul<f64> for Cost {
    type Output = Cost;

    fn mul(self, rhs: f64) -> Cost {
        Cost {
            ops: self.ops * rhs,
            bits: self.bits * rhs,
        }
    }
}

impl Sum for Cost {
    fn sum<I: Iterator<Item = Cost>>(iter: I) -> Cost {
        iter.fold(Cost::default(), |acc, c| acc + c)
    }
}

/// 2-D FFT of an `m x n` array.
#[must_use]
pub fn fft(m: f64, n: f64) -> Cost {
    Cost::words(5.0 * m * n * m.log2(), 2.0 * m * n)
}

/// Complex conjugate of an `m x n` array.
#[must_use]
pub fn conjugate(m: f64, n: f64) -> Cost {
    Cost::words(m * n, m * n)
}

/// Element-wise product of two `m x n` arrays.
#[must_use]
pub fn mmm(m: f64, n: f64) -> Cost {
    Cost::words(m * n, 2.0 * m * n)
}

/// Product of an `m x n` matrix with a vector, with double-buffered input
/// and output.
#[must_use]
pub fn mvm(m: f64, n: f64) -> Cost {
    Cost::words(2.0 * m * n, 4.0 * m * n)
}

/// Merge sort of `n` elements.
#[must_use]
pub fn merge_sort(n: f64) -> Cost {
    if n <= 1.0 {
        return Cost::words(0.0, 2.0 * n);
    }
    Cost::words(2.0 * n * n.log2(), 2.0 * n)
}

/// Square-difference correlation of an `m x m` image against an `n x n`
/// reference.
#[must_use]
pub fn square_diff(m: f64, n: f64) -> Cost {
    let a = 2.0 * n * n - 1.0;
    let b = m - n + 1.0;
    Cost::words(a * b * b + n * n * b * b, m * m + n * n)
}

/// Centre-of-gravity of an `n x n` sub-aperture.
#[must_use]
pub fn centroid(n: f64) -> Cost {
    Cost::words(5.0 * n * n - 1.0, n * n)
}
