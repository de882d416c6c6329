use formula_expr::run_benchmarks;

fn main() {
    let results = run_benchmarks();
    match serde_json::to_string_pretty(&results) {
        Ok(json) => println!("{json}"),
        Err(err) => {
            eprintln!("failed to serialize benchmark results: {err}");
            std::process::exit(2);
        }
    }
    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }
}
