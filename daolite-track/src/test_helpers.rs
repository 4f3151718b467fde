// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! This module provides helper functions for testing logging output
//!
//! The aim of this module is to provide commonly-used functions that enable
//! the testing of the output that should appear from logging macros.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use regex::Regex;

use crate::tracker::{EntityManager, TextTracker};
use crate::{Id, Track, Tracker};

/// A tracker that keeps track events.
pub struct TestTracker {
    events: RefCell<Vec<String>>,

    unique_id: Cell<u64>,
}

impl TestTracker {
    /// Create a new [`Tracker`](crate::Tracker) for the tests.
    ///
    /// This keeps the track events in memory for checking later.
    #[must_use]
    pub fn new(initial_id: u64) -> Self {
        Self {
            events: RefCell::new(Vec::new()),
            unique_id: Cell::new(initial_id),
        }
    }

    fn add_event(&self, event: String) {
        println!("{event}");
        self.events.borrow_mut().push(event);
    }

    /// Return a copy of the events recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<String> {
        self.events.borrow().clone()
    }
}

impl Track for TestTracker {
    fn unique_id(&self) -> Id {
        let id = self.unique_id.get();
        self.unique_id.set(id + 1);
        Id(id)
    }

    fn is_entity_enabled(&self, _id: Id, _level: log::Level) -> bool {
        true
    }

    fn add_entity(&self, _id: Id, _entity_name: &str) {
        // Do nothing
    }

    fn log(&self, id: Id, level: log::Level, msg: std::fmt::Arguments) {
        self.add_event(format!("{id}:{level}: {msg}"));
    }

    fn shutdown(&self) {
        // Do nothing
    }
}

/// Initialise a recording tracker for tests
///
/// # Arguments
///
/// * `start_id` - The ID value to be set as the starting value
///
/// # Examples
///
/// ```
/// use daolite_track::test_helpers;
///
/// let (test_tracker, tracker) = daolite_track::test_init!(10);
/// let top = daolite_track::entity::toplevel(&tracker, "top");
/// daolite_track::info!(top ; "hello");
/// test_helpers::check_and_clear(&test_tracker, &["10:INFO: hello"]);
/// ```
#[macro_export]
macro_rules! test_init {
    ($start_id:expr) => {{
        let test_tracker = std::rc::Rc::new($crate::test_helpers::TestTracker::new($start_id));
        let tracker: $crate::Tracker = test_tracker.clone();
        (test_tracker, tracker)
    }};
}

/// Create a tracker for a test which writes to stdout at `Warn` level unless
/// the `DAOLITE_TEST_LEVEL` environment variable names another level.
///
/// The `full_filepath` (normally `file!()`) is only used to label output.
#[must_use]
pub fn create_tracker(full_filepath: &str) -> Tracker {
    let level = std::env::var("DAOLITE_TEST_LEVEL")
        .map(|lvl| crate::str_to_level(&lvl))
        .unwrap_or(log::Level::Warn);
    let entity_manager = EntityManager::new(level);
    let writer = Box::new(std::io::stdout());
    let tracker: Tracker = Rc::new(TextTracker::new(entity_manager, writer));
    if level >= log::Level::Debug {
        println!("Tracking {full_filepath} at {level}");
    }
    tracker
}

/// Check and clear the _log_ output
///
/// This function asserts that the logging output lines seen since the start or
/// the last time this function was called are expected.
///
/// It then also clears the _log_ output recorded so far.
///
/// # Arguments
///
/// * `tracker`  - A reference to the [`TestTracker`] being used in the test.
/// * `expected` - An array of expected regular expressions that the logging
///   output will be matched against.
pub fn check_and_clear(tracker: &TestTracker, expected: &[&str]) {
    let mut log_contents_ref = tracker.events.borrow_mut();

    println!("Checking {:?} matches {:?}", expected, *log_contents_ref);

    // Check that there are the same number of strings produced as expected
    let num_strings = expected.len();
    assert_eq!(num_strings, log_contents_ref.len());

    for (i, log_expect) in expected.iter().enumerate() {
        let re = Regex::new(log_expect).unwrap();
        let actual = &log_contents_ref[i];
        println!("Checking {i}: {log_expect:?} matches {actual:?}");
        assert!(re.is_match(actual));
    }

    log_contents_ref.clear();
}
