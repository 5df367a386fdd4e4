//! Benchmarks for resolver-output interpretation.
//!
//! Performance targets:
//! - Single conflict sentence: < 50μs
//! - 50-line solver explanation: < 1ms
//! - Uninterpretable text (catch-all path): < 200μs

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use phep3_compat::{interpret_solver_failure, parse_solver_error};
use std::hint::black_box;

const SINGLE: &str = "× No solution found when resolving dependencies:\n\
    ╰─▶ Because pyhc-core==0.0.7 depends on numpy<2 and you require numpy>=2.0,<2.3.0, we can conclude that your requirements and pyhc-core[tests]==0.0.7 are incompatible.";

const CATCH_ALL: &str = "error: No solution found when resolving dependencies:\n  The requested version numpy>=3.0 does not exist\nhint: check the index\n";

fn generate_explanation(lines: usize) -> String {
    let mut text = String::from("× No solution found when resolving dependencies:\n");
    for i in 0..lines {
        text.push_str(&format!(
            "  ╰─▶ And because pkg{i}==1.0 depends on dep{i}<{i}.0 and you require dep{i}>={i}.5, we can conclude incompatibility.\n"
        ));
    }
    text
}

fn bench_parse_solver_error(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_solver_error");

    group.bench_function("single_conflict", |b| {
        b.iter(|| parse_solver_error(black_box(SINGLE), None))
    });

    group.bench_function("catch_all", |b| {
        b.iter(|| parse_solver_error(black_box(CATCH_ALL), None))
    });

    for lines in [10, 50] {
        let text = generate_explanation(lines);
        group.bench_with_input(BenchmarkId::new("explanation", lines), &text, |b, text| {
            b.iter(|| parse_solver_error(black_box(text), Some("pkg0")))
        });
    }

    group.finish();
}

fn bench_interpret_failure(c: &mut Criterion) {
    let platform = "error: nvidia-nccl-cu12==2.20.5 has no wheels with a matching platform tag";
    c.bench_function("interpret_platform_failure", |b| {
        b.iter(|| interpret_solver_failure(black_box(platform), None))
    });
}

criterion_group!(benches, bench_parse_solver_error, bench_interpret_failure);
criterion_main!(benches);
