use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sparse::{solve, SolverConfig, SparseMatrix};

fn tridiagonal_system(n: usize) -> (SparseMatrix, Vec<f64>) {
    let mut a = SparseMatrix::new(n, n);
    for i in 0..n {
        a.set(i, i, 2.0);
        if i > 0 {
            a.set(i, i - 1, -1.0);
        }
        if i + 1 < n {
            a.set(i, i + 1, -1.0);
        }
    }
    let b = vec![1.0; n];
    (a, b)
}

fn bench_solve(c: &mut Criterion) {
    let (a, b) = tridiagonal_system(512);
    c.bench_function("solve tridiagonal 512", |bencher| {
        bencher.iter(|| solve(black_box(&a), black_box(&b), &SolverConfig::default()))
    });
}

criterion_group!(benches, bench_solve);
criterion_main!(benches);
