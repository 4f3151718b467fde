// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Types shared by every part of the DaoLITE latency estimator.
//!
//! - [`types`] holds the single [`LatencyError`](types::LatencyError) type
//!   returned by all fallible operations along with helper macros.
//! - [`timing`] holds the [`TimingArray`](timing::TimingArray): the ordered
//!   `(start, finish)` pairs, in microseconds, that every pipeline stage
//!   produces.
//!
//! The estimator is an analytic model: nothing in it is concurrent, and all
//! times are pipeline-relative microseconds.

pub mod test_helpers;
pub mod timing;
pub mod types;
