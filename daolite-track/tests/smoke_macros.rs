// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

use daolite_track::entity::{Entity, toplevel};
use daolite_track::test_helpers::check_and_clear;
use daolite_track::{debug, error, info, test_init, trace, warn};

#[test]
fn levels() {
    let (test_tracker, tracker) = test_init!(100);
    let top = toplevel(&tracker, "top");

    trace!(top ; "t {}", 1);
    debug!(top ; "d {}", 2);
    info!(top ; "i {}", 3);
    warn!(top ; "w {}", 4);
    error!(top ; "e {}", 5);

    check_and_clear(
        &test_tracker,
        &[
            "100:TRACE: t 1",
            "100:DEBUG: d 2",
            "100:INFO: i 3",
            "100:WARN: w 4",
            "100:ERROR: e 5",
        ],
    );
}

#[test]
fn hierarchy() {
    let (test_tracker, tracker) = test_init!(1);
    let top = toplevel(&tracker, "top");
    let pipeline = std::rc::Rc::new(Entity::new(&top, "pipeline"));
    let stage = Entity::new(&pipeline, "Camera");

    assert_eq!(stage.full_name(), "top::pipeline::Camera");
    assert_eq!(format!("{stage}"), "top::pipeline::Camera");

    check_and_clear(
        &test_tracker,
        &["2:TRACE: created top::pipeline", "3:TRACE: created top::pipeline::Camera"],
    );
}

#[test]
fn dev_null_is_silent() {
    let tracker = daolite_track::tracker::dev_null_tracker();
    let top = toplevel(&tracker, "top");
    assert!(!top.tracker.is_entity_enabled(top.id, daolite_track::log::Level::Error));
}
