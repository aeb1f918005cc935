use criterion::{criterion_group, criterion_main, Criterion};
use taylorgreen::grid::{Grid, Resolution};
use taylorgreen::norm::{error_with, Norm, WeightedL2};
use taylorgreen::reference::TaylorGreen;
use taylorgreen::run::SimulationRun;

const SIZES: [(usize, usize); 2] = [(128, 64), (512, 256)];

pub fn bench_reference(c: &mut Criterion) {
    let mut group = c.benchmark_group("Reference");
    group.significance_level(0.1).sample_size(10);
    let solution = TaylorGreen::new(0.1).unwrap();
    for (nx, nz) in SIZES.iter() {
        let grid = Grid::uniform(*nx, 1, *nz, [1., 1., 0.5]).unwrap();
        let name = format!("Size: {} x {}", *nx, *nz);
        group.bench_function(&name, |b| {
            b.iter(|| solution.evaluate_on(&grid, 0.1).unwrap())
        });
    }
    group.finish();
}

pub fn bench_norm(c: &mut Criterion) {
    let mut group = c.benchmark_group("Norm");
    group.significance_level(0.1).sample_size(10);
    let solution = TaylorGreen::new(0.1).unwrap();
    for (nx, nz) in SIZES.iter() {
        let grid = Grid::uniform(*nx, 1, *nz, [1., 1., 0.5]).unwrap();
        let reference = solution.evaluate_on(&grid, 0.1).unwrap();
        let mut run = SimulationRun::new("bench", Resolution::new(*nx, *nz), 1, grid);
        for field in solution.evaluate_on(&reference.grid, 0.11).unwrap().fields.into_values() {
            run.insert(field).unwrap();
        }
        let name = format!("Rms: {} x {}", *nx, *nz);
        group.bench_function(&name, |b| {
            b.iter(|| error_with(&run, &reference, &Norm::default()).unwrap())
        });
        let name = format!("WeightedL2: {} x {}", *nx, *nz);
        let norm = Norm::from(WeightedL2);
        group.bench_function(&name, |b| {
            b.iter(|| error_with(&run, &reference, &norm).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_reference, bench_norm);
criterion_main!(benches);
