//! # Mission Control Benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::time::Instant;

use comms_if::{pose::Pose, tc::Direction};
use turtle_lib::{
    mission_ctrl::{steer, MissionCtrl, Params},
    pose_model::PoseModel,
};

fn mission_ctrl_benchmark(c: &mut Criterion) {
    let params = Params::default();

    // A square loop around the arena
    let waypoints = vec![
        [8.0, 0.0],
        [8.0, 8.0],
        [-8.0, 8.0],
        [-8.0, -8.0],
        [8.0, -8.0],
        [8.0, 0.0],
    ];

    c.bench_function("steer", |b| {
        let pose = Pose::new(1.0, -2.0, 0.3);
        b.iter(|| steer(black_box(&pose), black_box([4.0, 4.0]), &params))
    });

    c.bench_function("mission_tick", |b| {
        let mut ctrl = MissionCtrl::new(params.clone());
        let mut model = PoseModel::new();
        ctrl.start(waypoints.clone(), Direction::Forward, Instant::now()).unwrap();

        b.iter(|| {
            // Restart the loop once the mission finishes so every iteration is a real tick
            if !ctrl.is_running() {
                ctrl = MissionCtrl::new(params.clone());
                model = PoseModel::new();
                ctrl.start(waypoints.clone(), Direction::Forward, Instant::now()).unwrap();
            }

            let out = ctrl.step(&model.snapshot());
            model.apply_velocity(out.cmd, ctrl.dt_s());
        })
    });

    c.bench_function("full_mission", |b| {
        b.iter(|| {
            let mut ctrl = MissionCtrl::new(params.clone());
            let mut model = PoseModel::new();
            ctrl.start(waypoints.clone(), Direction::Reverse, Instant::now()).unwrap();

            while ctrl.is_running() {
                let out = ctrl.step(&model.snapshot());
                model.apply_velocity(out.cmd, ctrl.dt_s());
            }

            black_box(model.snapshot())
        })
    });
}

criterion_group!(benches, mission_ctrl_benchmark);
criterion_main!(benches);
