use criterion::{criterion_group, criterion_main, Criterion};

use janus::cubie::FullCube;
use janus::mask::{home_corner_mask, home_edge_mask};
use janus::moves::MoveTables;
use janus::Naso;

fn bench_masks(c: &mut Criterion) {
    let mut group = c.benchmark_group("Mask Moves");
    group.bench_function("corner_twist", |b| {
        let mask = home_corner_mask().twist(0).twist(8);
        b.iter(|| mask.twist(1))
    });
    group.bench_function("edge_twist", |b| {
        let mask = home_edge_mask().twist(0).twist(8);
        b.iter(|| mask.twist(1))
    });
    group.bench_function("full_cube_twist", |b| {
        let cube = FullCube::home().twist(0).twist(8);
        b.iter(|| cube.twist(1))
    });
    group.finish();
}

fn bench_table_twists(c: &mut Criterion) {
    let tables = MoveTables::new(Naso::Aequivalens);
    let mut cube = tables.home_cube();
    for twist in [0u8, 7, 14, 2, 9] {
        cube = tables.cube_twist(&cube, twist);
    }

    c.bench_function("table_cube_twist", |b| {
        let mut twist = 0u8;
        b.iter(|| {
            twist = (twist + 1) % 18;
            tables.cube_twist(&cube, twist)
        })
    });
}

criterion_group!(benches, bench_masks, bench_table_twists);
criterion_main!(benches);
