use formula_expr::run_benchmarks;

fn main() {
    // `cargo bench -p formula-expr` runs this binary; `perf_bench` prints the same suite as JSON.
    for r in run_benchmarks() {
        println!(
            "{:<36} p95={:>8.3}ms  target={:>8.3}ms  {}",
            r.name,
            r.p95_ms,
            r.target_ms,
            if r.passed { "PASS" } else { "FAIL" }
        );
    }
}
