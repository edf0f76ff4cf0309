use criterion::{black_box, criterion_group, criterion_main, Criterion};
use glam::{Quat, Vec3};
use marionette_animation_core::Curve;

const KEYS: usize = 512;
const FRAMES: usize = 4096;

fn vec3_curve() -> Curve<Vec3> {
    let times: Vec<f32> = (0..KEYS).map(|i| i as f32 / 30.0).collect();
    let values: Vec<Vec3> = times
        .iter()
        .map(|t| Vec3::new(t.sin(), t.cos(), *t))
        .collect();
    Curve::linear(&times, &values).expect("valid curve")
}

fn quat_curve() -> Curve<Quat> {
    let times: Vec<f32> = (0..KEYS).map(|i| i as f32 / 30.0).collect();
    let values: Vec<Quat> = times.iter().map(|t| Quat::from_rotation_y(*t)).collect();
    Curve::linear(&times, &values).expect("valid curve")
}

fn frame_times(duration: f32) -> Vec<f32> {
    (0..FRAMES)
        .map(|f| duration * f as f32 / FRAMES as f32)
        .collect()
}

fn bench_sampling(c: &mut Criterion) {
    let translation = vec3_curve();
    let rotation = quat_curve();
    let times = frame_times(translation.end());

    c.bench_function("vec3_binary_search", |b| {
        b.iter(|| {
            for t in &times {
                black_box(translation.sample(black_box(*t)));
            }
        })
    });

    c.bench_function("vec3_cursor", |b| {
        b.iter(|| {
            let mut cursor = translation.cursor();
            for t in &times {
                black_box(cursor.sample(black_box(*t)));
            }
        })
    });

    c.bench_function("quat_cursor", |b| {
        b.iter(|| {
            let mut cursor = rotation.cursor();
            for t in &times {
                black_box(cursor.sample(black_box(*t)));
            }
        })
    });
}

criterion_group!(benches, bench_sampling);
criterion_main!(benches);
