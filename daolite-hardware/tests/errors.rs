// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

use daolite_hardware::{ComputeResourceBuilder, HardwareRegistry};

#[test]
#[should_panic(expected = "cores must be positive")]
fn zero_cores() {
    ComputeResourceBuilder::new("broken")
        .cores(0.0)
        .build()
        .unwrap();
}

#[test]
#[should_panic(expected = "memory_frequency must be positive")]
fn negative_memory_frequency() {
    ComputeResourceBuilder::new("broken")
        .memory_frequency(-3.2e9)
        .build()
        .unwrap();
}

#[test]
#[should_panic(expected = "network_fudge must be positive")]
fn nan_fudge() {
    ComputeResourceBuilder::new("broken")
        .network_fudge(f64::NAN)
        .build()
        .unwrap();
}

#[test]
#[should_panic(expected = "time_in_driver must not be negative")]
fn negative_driver_time() {
    ComputeResourceBuilder::new("broken")
        .time_in_driver(-1.0)
        .build()
        .unwrap();
}

#[test]
#[should_panic(expected = "Duplicate resource name 'node'")]
fn duplicate_name() {
    let mut registry = HardwareRegistry::new();
    registry
        .add_from_str(
            "
resources:
  - name: node
  - name: node
",
        )
        .unwrap();
}

#[test]
#[should_panic(expected = "unknown field")]
fn unknown_attribute() {
    let mut registry = HardwareRegistry::new();
    registry
        .add_from_str(
            "
resources:
  - name: node
    threads: 4
",
        )
        .unwrap();
}

#[test]
fn invalid_file_adds_nothing() {
    let mut registry = HardwareRegistry::new();
    let result = registry.add_from_str(
        "
resources:
  - name: good
  - name: bad
    cores: -1
",
    );
    assert!(result.is_err());
    assert!(registry.is_empty());
}

#[test]
#[should_panic(expected = "Unable to read")]
fn missing_file() {
    let mut registry = HardwareRegistry::new();
    registry
        .add_from_file(std::path::Path::new("/does/not/exist.yaml"))
        .unwrap();
}
