//! Benchmarks for per-frame rule evaluation.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use bodyvision_core::{AngleSet, Joint, KeypointSet, PixelPoint, PoseMode, VISIBILITY_THRESHOLD};
use bodyvision_rules::evaluator::PoseRuleEvaluator;
use bodyvision_rules::status::classify_status;

fn create_test_frame() -> KeypointSet {
    let positions = [
        (Joint::LeftShoulder, 300, 150),
        (Joint::RightShoulder, 340, 150),
        (Joint::LeftElbow, 300, 230),
        (Joint::RightElbow, 345, 230),
        (Joint::LeftWrist, 380, 230),
        (Joint::RightWrist, 350, 310),
        (Joint::LeftHip, 305, 330),
        (Joint::RightHip, 325, 330),
        (Joint::LeftKnee, 300, 430),
        (Joint::RightKnee, 330, 430),
        (Joint::LeftAnkle, 305, 530),
        (Joint::RightAnkle, 330, 530),
    ];

    positions
        .iter()
        .fold(KeypointSet::empty(), |set, (joint, x, y)| {
            set.with(*joint, PixelPoint::new(*x, *y, 0.9))
        })
}

fn benchmark_pose_modes(c: &mut Criterion) {
    let evaluator = PoseRuleEvaluator::default();
    let keypoints = create_test_frame();
    let angles = AngleSet::from_keypoints(&keypoints, VISIBILITY_THRESHOLD);

    for mode in PoseMode::ALL {
        c.bench_function(&format!("evaluate_{}", mode), |b| {
            b.iter(|| evaluator.evaluate(black_box(mode), black_box(&keypoints), &angles, 640))
        });
    }
}

fn benchmark_angles(c: &mut Criterion) {
    let keypoints = create_test_frame();

    c.bench_function("angle_set_from_keypoints", |b| {
        b.iter(|| AngleSet::from_keypoints(black_box(&keypoints), VISIBILITY_THRESHOLD))
    });
}

fn benchmark_status(c: &mut Criterion) {
    let message = "Posicao incorreta:\n• Braco frontal deve estar contraido entre 70-130° (atual: 60°)";

    c.bench_function("classify_status", |b| {
        b.iter(|| classify_status(black_box(message)))
    });
}

criterion_group!(benches, benchmark_pose_modes, benchmark_angles, benchmark_status);
criterion_main!(benches);
