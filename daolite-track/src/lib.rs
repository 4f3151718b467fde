// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! This crate provides the _track_ capabilities for the DaoLITE latency
//! estimator.
//!
//! _Track_ means text-based human-readable messages emitted at various levels
//! of verbosity (from `Trace` through to `Error`) by named, hierarchical
//! [`Entities`](crate::entity::Entity). Every stage of a pipeline owns an
//! entity, so the output of a single stage can be selected with a regular
//! expression on its full name (e.g. `top::pipeline::Centroider`).
//!
//! Messages are emitted with the [`trace`], [`debug`], [`info`], [`warn`] and
//! [`error`] macros which only format their arguments when the entity is
//! enabled at that level.

// Enable warnings for missing documentation
#![warn(missing_docs)]

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

pub use log;

pub mod builder;
pub mod entity;
pub mod test_helpers;

/// Include the trackers.
pub mod tracker;
pub use tracker::{Track, Tracker};

/// A type alias for objects that receive _log_ events.
pub type Writer = Box<dyn std::io::Write>;
type SharedWriter = Rc<RefCell<Writer>>;

/// Unique identifier given to each [`Entity`](crate::entity::Entity).
#[derive(Copy, Clone, Default, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct Id(pub u64);

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The root Id from which all other Ids are derived
pub const ROOT: Id = Id(1);

/// Take the command-line string and convert it to a Level
///
/// Unknown strings fall back to `Warn`.
#[must_use]
pub fn str_to_level(lvl: &str) -> log::Level {
    log::Level::from_str(lvl).unwrap_or(log::Level::Warn)
}

/// Base macro for log messages of all levels.
///
/// The message is only formatted if the [`Tracker`] reports that the entity
/// is enabled at the requested level.
#[macro_export]
macro_rules! log_base {
    ($entity:expr ; $lvl:expr, $($arg:tt)+) => (
        if $entity.tracker.is_entity_enabled($entity.id, $lvl) {
            $entity.tracker.log($entity.id, $lvl, format_args!($($arg)+));
        }
    );
}

/// The `trace` macro provides a wrapper for [`log_base`] at level
/// `log::Level::Trace`
#[macro_export]
macro_rules! trace {
    ($entity:expr ; $($arg:tt)+) => (
        $crate::log_base!($entity ; $crate::log::Level::Trace, $($arg)+);
    );
}

/// The `debug` macro provides a wrapper for [`log_base`] at level
/// `log::Level::Debug`
#[macro_export]
macro_rules! debug {
    ($entity:expr ; $($arg:tt)+) => (
        $crate::log_base!($entity ; $crate::log::Level::Debug, $($arg)+);
    );
}

/// The `info` macro provides a wrapper for [`log_base`] at level
/// `log::Level::Info`
#[macro_export]
macro_rules! info {
    ($entity:expr ; $($arg:tt)+) => (
        $crate::log_base!($entity ; $crate::log::Level::Info, $($arg)+);
    );
}

/// The `warn` macro provides a wrapper for [`log_base`] at level
/// `log::Level::Warn`
#[macro_export]
macro_rules! warn {
    ($entity:expr ; $($arg:tt)+) => (
        $crate::log_base!($entity ; $crate::log::Level::Warn, $($arg)+);
    );
}

/// The `error` macro provides a wrapper for [`log_base`] at level
/// `log::Level::Error`
#[macro_export]
macro_rules! error {
    ($entity:expr ; $($arg:tt)+) => (
        $crate::log_base!($entity ; $crate::log::Level::Error, $($arg)+);
    );
}
