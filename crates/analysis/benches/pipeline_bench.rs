//! Benchmarks for SSA construction and encoding, plus the full pipeline
//! when Z3 is installed.
//!
//! Benchmark groups:
//! - `encode_*`: AST -> SSA -> SMT-LIB text, no solver involved
//! - `e2e_*`: assertion check through the subprocess solver

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use minilang_fv_analysis::{
    Expr as E, InputDecl, Program, Stmt as S, Verifier, VerifyConfig, build_ssa, encode,
};
use minilang_fv_solver::SolverConfig;

// ---------------------------------------------------------------------------
// Program constructors
// ---------------------------------------------------------------------------

/// `n` chained conditionals over three accumulators.
fn make_branchy(n: usize) -> Program {
    let mut body = vec![
        S::assign("a", E::int(0)),
        S::assign("b", E::int(1)),
        S::assign("c", E::var("x")),
    ];
    for k in 0..n as i64 {
        body.push(S::if_else(
            E::gt(E::var("c"), E::int(k)),
            vec![
                S::assign("a", E::add(E::var("a"), E::var("b"))),
                S::assign("c", E::sub(E::var("c"), E::int(1))),
            ],
            vec![S::assign("b", E::mul(E::var("b"), E::int(2)))],
        ));
    }
    body.push(S::assert(E::gt(E::var("b"), E::int(0))));
    Program::new(vec![InputDecl::scalar("x")], body)
}

/// Nested symbolic loops writing an array.
fn make_nested_loops() -> Program {
    Program::new(
        vec![InputDecl::scalar("n"), InputDecl::scalar("m")],
        vec![S::for_loop(
            vec![S::assign("i", E::int(0))],
            E::lt(E::var("i"), E::var("n")),
            vec![S::assign("i", E::add(E::var("i"), E::int(1)))],
            vec![S::for_loop(
                vec![S::assign("j", E::int(0))],
                E::lt(E::var("j"), E::var("m")),
                vec![S::assign("j", E::add(E::var("j"), E::int(1)))],
                vec![S::array_write(
                    "grid",
                    E::add(E::mul(E::var("i"), E::int(16)), E::var("j")),
                    E::div(E::var("i"), E::add(E::var("j"), E::int(1))),
                )],
            )],
        )],
    )
}

// ---------------------------------------------------------------------------
// Encoding only
// ---------------------------------------------------------------------------

fn bench_encode_branchy(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_branchy");
    for n in [8, 32, 128] {
        let program = make_branchy(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &program, |b, p| {
            b.iter(|| {
                let ssa = build_ssa(p, 10).unwrap();
                encode(&ssa).to_script().to_string()
            });
        });
    }
    group.finish();
}

fn bench_encode_nested_loops(c: &mut Criterion) {
    let program = make_nested_loops();
    let mut group = c.benchmark_group("encode_nested_loops");
    for bound in [2, 4, 8] {
        group.bench_with_input(BenchmarkId::from_parameter(bound), &bound, |b, &k| {
            b.iter(|| encode(&build_ssa(&program, k).unwrap()).dump());
        });
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// End to end
// ---------------------------------------------------------------------------

fn bench_e2e_branchy(c: &mut Criterion) {
    let verifier = match SolverConfig::auto_detect()
        .map_err(Into::into)
        .and_then(|s| Verifier::with_solver(s, VerifyConfig::default()))
    {
        Ok(v) => v,
        Err(e) => {
            eprintln!("Z3 not available, skipping E2E bench: {e}");
            return;
        }
    };
    let program = make_branchy(16);
    c.bench_function("e2e_branchy_16", |b| {
        b.iter(|| verifier.check_assertions(&program).unwrap());
    });
}

criterion_group!(encode_benches, bench_encode_branchy, bench_encode_nested_loops);
criterion_group!(e2e_benches, bench_e2e_branchy);
criterion_main!(encode_benches, e2e_benches);
