//! Frame and query benchmarks over scenes of scattered mobiles.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use cellspace::{BoundingBox, Direction, FixedVec2, Shape, Space, Transform, FIXED_ONE};

const ARENA: i32 = 2000;

fn make_space(n: usize) -> Space {
    let mut rng = StdRng::seed_from_u64(7);
    let mut space = Space::default();

    // Solid border so nothing leaves the arena.
    for (x, y, w, h) in [
        (0, -ARENA / 2, ARENA, 8),
        (0, ARENA / 2, ARENA, 8),
        (-ARENA / 2, 0, 8, ARENA),
        (ARENA / 2, 0, 8, ARENA),
    ] {
        let shape = Shape::centered_box(w * FIXED_ONE, h * FIXED_ONE);
        let locator = space.create_hitbox(shape.clone(), Transform::at(FixedVec2::from_ints(x, y)));
        let id = space.create_object(locator).unwrap();
        let solid = space.create_hitbox(shape, Transform::default());
        space.set_solid_hitbox(id, Some(solid)).unwrap();
        space.set_surfaces(id, [true; 4]).unwrap();
        space.add_object(id).unwrap();
    }

    for _ in 0..n {
        let half = ARENA / 2 - 20;
        let position = FixedVec2::from_ints(rng.gen_range(-half..half), rng.gen_range(-half..half));
        let shape = Shape::centered_box(6 * FIXED_ONE, 6 * FIXED_ONE);
        let locator = space.create_hitbox(shape.clone(), Transform::at(position));
        let collision = space.create_hitbox(shape.clone(), Transform::default());
        let id = space.create_mobile_object(locator, collision).unwrap();
        let solid = space.create_hitbox(shape, Transform::default());
        space.set_solid_hitbox(id, Some(solid)).unwrap();
        space.set_surfaces(id, [true; 4]).unwrap();
        space.set_movement_priority(id, rng.gen_range(0..4)).unwrap();
        space
            .set_velocity(id, FixedVec2::new(rng.gen_range(-FIXED_ONE * 3..FIXED_ONE * 3), rng.gen_range(-FIXED_ONE * 3..FIXED_ONE * 3)))
            .unwrap();
        if rng.gen_bool(0.25) {
            space.set_pressing(id, Some(Direction::Down)).unwrap();
        }
        space.add_object(id).unwrap();
    }
    space
}

fn bench_advance_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("advance_frame");
    for &n in &[100usize, 500, 1000, 5000] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            let mut space = make_space(n);
            b.iter(|| black_box(space.advance_frame()));
        });
    }
    group.finish();
}

fn bench_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("queries");
    let mut space = make_space(1000);
    let view = BoundingBox::new(-200 * FIXED_ONE, -200 * FIXED_ONE, 200 * FIXED_ONE, 200 * FIXED_ONE);

    group.bench_function("objects_within_rectangle", |b| {
        b.iter(|| black_box(space.objects_within_rectangle(&view)));
    });
    group.bench_function("nearest_object", |b| {
        b.iter(|| black_box(space.nearest_object(FixedVec2::from_ints(37, -81), |_, _| true)));
    });
    group.finish();
}

criterion_group!(benches, bench_advance_frame, bench_queries);
criterion_main!(benches);
