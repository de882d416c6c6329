use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use formula_expr::{compile, Binding, Expression, Frame, Vm};

const GROWTH: &str = "1.2*72.2*(1-(1-(x/72.2)^(1/3))*exp(-0.0427))^3";

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile");
    for formula in [
        "x*2+1",
        GROWTH,
        "if(x>10 and y<30, polygon(x, 0,0, 20,0.5, 60,1), 0)",
    ] {
        group.throughput(Throughput::Bytes(formula.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(formula), formula, |b, f| {
            b.iter(|| {
                let mut locals = Vec::new();
                compile(black_box(f), &mut locals, None, Binding::Lax)
            })
        });
    }
    group.finish();
}

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");

    let mut locals = Vec::new();
    let program =
        compile(GROWTH, &mut locals, None, Binding::Lax).expect("compile benchmark formula");
    let mut vm = Vm::new();
    let mut sum = 0.0;
    group.bench_function("vm", |b| {
        b.iter(|| {
            let values = [black_box(33.0)];
            vm.eval(&program, Frame::new(&values, &mut sum))
        })
    });

    let mut direct = Expression::new(GROWTH);
    group.bench_function("expression_direct", |b| {
        b.iter(|| direct.evaluate(black_box(33.0)))
    });

    let mut linear = Expression::new(GROWTH);
    linear.linearize(0.0, 60.0, 1000).expect("linearize benchmark formula");
    group.bench_function("expression_linearized", |b| {
        b.iter(|| linear.evaluate(black_box(33.0)))
    });

    group.finish();
}

criterion_group!(benches, bench_compile, bench_evaluate);
criterion_main!(benches);
