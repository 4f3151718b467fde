// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

use std::rc::Rc;

use daolite_track::entity::{Entity, toplevel};
use daolite_track::test_helpers::create_tracker;

/// Create the top-level entity that a test hangs its stages and pipelines
/// from.
#[must_use]
pub fn start_test(full_filepath: &str) -> Rc<Entity> {
    toplevel(&create_tracker(full_filepath), "top")
}
