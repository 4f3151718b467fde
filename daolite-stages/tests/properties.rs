// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

use approx::assert_relative_eq;
use daolite_engine::timing::TimingArray;
use daolite_hardware::test_helpers::reference_resource;
use daolite_stages::{
    CalibrationParams, CameraParams, CentroiderParams, ControlParams, NetworkParams,
    ReconstructionParams, Stage, StageTiming, TransferMode,
};

fn check_ordering(timing: &TimingArray) {
    for (i, row) in timing.iter().enumerate() {
        assert!(row.finish >= row.start, "row {i} finishes before it starts");
        if i > 0 {
            assert!(row.start >= timing[i - 1].finish, "row {i} overlaps row {}", i - 1);
        }
    }
}

fn check_causality(timing: &TimingArray, upstream: &TimingArray) {
    if timing.len() == upstream.len() {
        for i in 0..timing.len() {
            assert!(timing[i].start >= upstream[i].finish, "row {i} starts before its input");
        }
    }
    assert!(timing.first_start().unwrap() >= upstream.first_start().unwrap());
}

#[test]
fn camera_reference_scenario() {
    let resource = reference_resource();
    let timing = CameraParams::new(16384)
        .with_group(4)
        .timing(&resource, None)
        .unwrap();
    assert_eq!(timing.len(), 4);
    assert_relative_eq!(timing[0].start, 500.0);
    let finishes = timing.finishes();
    for pair in finishes.windows(2) {
        assert!(pair[1] > pair[0]);
    }
    check_ordering(&timing);
}

#[test]
fn chain_is_ordered_and_causal() {
    let resource = reference_resource();
    let camera = CameraParams::new(128 * 128)
        .with_group(8)
        .timing(&resource, None)
        .unwrap();
    let calibration = CalibrationParams::new(128 * 128)
        .timing(&resource, Some(&camera))
        .unwrap();
    let centroider = CentroiderParams::new(400, 8)
        .with_group(8)
        .timing(&resource, Some(&calibration))
        .unwrap();
    let reconstruction = ReconstructionParams::new(800, 500)
        .with_group(8)
        .timing(&resource, Some(&centroider))
        .unwrap();
    let control = ControlParams::new(500)
        .timing(&resource, Some(&reconstruction))
        .unwrap();
    let network = NetworkParams::new(500 * 32)
        .timing(&resource, Some(&control))
        .unwrap();

    let stages = [
        (&calibration, &camera),
        (&centroider, &calibration),
        (&reconstruction, &centroider),
        (&control, &reconstruction),
        (&network, &control),
    ];
    for (timing, upstream) in stages {
        check_ordering(timing);
        check_causality(timing, upstream);
    }
    assert_relative_eq!(control[0].start, reconstruction.last_finish().unwrap());
}

#[test]
fn different_group_counts_stay_causal() {
    let resource = reference_resource();
    let camera = CameraParams::new(10_000)
        .with_group(3)
        .timing(&resource, None)
        .unwrap();
    let centroider = CentroiderParams::new(300, 6)
        .with_group(7)
        .timing(&resource, Some(&camera))
        .unwrap();
    check_ordering(&centroider);
    // The last group needs the last camera group
    assert!(centroider[6].start >= camera[2].finish);
    // The first group only needs the first camera group
    assert!(centroider[0].start >= camera[0].finish);
}

fn span_of(stage: Stage, upstream: &TimingArray) -> f64 {
    stage.timing(&reference_resource(), Some(upstream)).unwrap().span()
}

#[test]
fn larger_workloads_never_faster() {
    let upstream = TimingArray::from_rows(&[(0.0, 1.0), (1.0, 2.0), (2.0, 3.0), (3.0, 4.0)]).unwrap();
    for small_large in [(100, 200), (1000, 50_000)] {
        let (small, large) = small_large;
        let pairs: Vec<(Stage, Stage)> = vec![
            (
                CameraParams::new(small).with_group(4).into(),
                CameraParams::new(large).with_group(4).into(),
            ),
            (
                CalibrationParams::new(small).into(),
                CalibrationParams::new(large).into(),
            ),
            (
                CentroiderParams::new(small, 8).with_group(4).into(),
                CentroiderParams::new(large, 8).with_group(4).into(),
            ),
            (
                ReconstructionParams::new(small, 100).with_group(4).into(),
                ReconstructionParams::new(large, 100).with_group(4).into(),
            ),
            (ControlParams::new(small).into(), ControlParams::new(large).into()),
            (NetworkParams::new(small).into(), NetworkParams::new(large).into()),
            (
                NetworkParams::new(small)
                    .with_mode(TransferMode::Pcie {
                        generation: 3,
                        lanes: 8,
                    })
                    .into(),
                NetworkParams::new(large)
                    .with_mode(TransferMode::Pcie {
                        generation: 3,
                        lanes: 8,
                    })
                    .into(),
            ),
        ];
        for (a, b) in pairs {
            let kind = a.kind();
            assert!(
                span_of(b, &upstream) >= span_of(a, &upstream),
                "{kind} got faster with more work"
            );
        }
    }
}

#[test]
fn scale_divides_processing_time() {
    let resource = reference_resource();
    let s = 2.5;

    let base = CalibrationParams::new(4096).with_group(1);
    let t1 = base.clone().timing(&resource, None).unwrap()[0].duration();
    let ts = base.with_scale(s).timing(&resource, None).unwrap()[0].duration();
    assert_relative_eq!(ts, t1 / s, max_relative = 1e-12);

    let base = CentroiderParams::new(200, 10).with_group(1);
    let t1 = base.clone().timing(&resource, None).unwrap()[0].duration();
    let ts = base.with_scale(s).timing(&resource, None).unwrap()[0].duration();
    assert_relative_eq!(ts, t1 / s, max_relative = 1e-12);

    let base = ReconstructionParams::new(200, 100).with_group(1);
    let t1 = base.clone().timing(&resource, None).unwrap()[0].duration();
    let ts = base.with_scale(s).timing(&resource, None).unwrap()[0].duration();
    assert_relative_eq!(ts, t1 / s, max_relative = 1e-12);

    let base = ControlParams::new(1000);
    let t1 = base.clone().timing(&resource, None).unwrap()[0].duration();
    let ts = base.with_scale(s).timing(&resource, None).unwrap()[0].duration();
    assert_relative_eq!(ts - 8.0, (t1 - 8.0) / s, max_relative = 1e-9);
}

#[test]
#[should_panic(expected = "group must be non-zero")]
fn zero_groups() {
    CentroiderParams::new(100, 8)
        .with_group(0)
        .timing(&reference_resource(), None)
        .unwrap();
}

#[test]
#[should_panic(expected = "group must be non-zero")]
fn zero_camera_groups() {
    CameraParams::new(100)
        .with_group(0)
        .timing(&reference_resource(), None)
        .unwrap();
}

#[test]
#[should_panic(expected = "scale must be positive")]
fn negative_scale() {
    ReconstructionParams::new(100, 8)
        .with_scale(-1.0)
        .timing(&reference_resource(), None)
        .unwrap();
}

#[test]
fn agenda_drives_centroider_groups() {
    let resource = reference_resource();
    let camera = TimingArray::from_rows(&[(0.0, 10.0), (10.0, 20.0), (20.0, 30.0)]).unwrap();
    let p = CentroiderParams::new(60, 8).with_agenda(vec![0, 20, 40]);
    let timing = p.timing(&resource, Some(&camera)).unwrap();
    assert_eq!(timing.len(), 3);
    assert_relative_eq!(timing[0].duration(), 0.0);
    assert_relative_eq!(timing[1].duration(), p.group_time(&resource, 20));
    assert_relative_eq!(timing[2].duration(), p.group_time(&resource, 40));
    assert!(timing[2].start >= 30.0);
}

#[test]
fn uniform_sizing_uses_workers() {
    let resource = reference_resource();
    let p = CentroiderParams::new(100, 8).with_group(5).with_workers(2);
    let timing = p.timing(&resource, None).unwrap();
    // ceil(100 / (5 * 2)) sub-apertures per group
    assert_relative_eq!(timing[0].duration(), p.group_time(&resource, 10));
}

#[test]
fn pure_and_repeatable() {
    let resource = reference_resource();
    let upstream = TimingArray::from_rows(&[(0.0, 1.0), (1.0, 2.0)]).unwrap();
    let stage: Stage = CentroiderParams::new(64, 6).with_group(2).into();
    let a = stage.timing(&resource, Some(&upstream)).unwrap();
    let b = stage.timing(&resource, Some(&upstream)).unwrap();
    assert_eq!(a, b);
}
