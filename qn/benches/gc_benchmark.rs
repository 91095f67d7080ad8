use criterion::{Criterion, black_box, criterion_group, criterion_main};
use qn::{Context, ContextCreateInfo, Obj};

fn create_context() -> Context {
    // large enough that collections stay rare compared to allocations
    Context::new(ContextCreateInfo {
        size: 1024 * 1024,
        ..Default::default()
    })
    .expect("create context")
}

fn bench_cons_churn(c: &mut Criterion) {
    let mut ctx = create_context();

    c.bench_function("cons_churn_100", |b| {
        b.iter(|| {
            let mark = ctx.save();
            let mut list = Obj::NIL;
            for i in 0..100 {
                let value = ctx.number(i as f32).expect("number");
                list = ctx.cons(value, list).expect("cons");
                ctx.restore(mark);
                ctx.push_root(list).expect("root");
            }
            ctx.restore(mark);
            black_box(list)
        })
    });
}

fn bench_full_collection(c: &mut Criterion) {
    let mut ctx = create_context();
    let mut list = Obj::NIL;
    for i in 0..10_000 {
        let value = ctx.number(i as f32).expect("number");
        list = ctx.cons(value, list).expect("cons");
        ctx.reset_roots();
        ctx.push_root(list).expect("root");
    }

    c.bench_function("collect_10000_live", |b| {
        b.iter(|| black_box(ctx.collect()))
    });
}

fn bench_intern_hit(c: &mut Criterion) {
    let mut ctx = create_context();
    for i in 0..200 {
        let mark = ctx.save();
        ctx.symbol(&format!("symbol-{}", i)).expect("symbol");
        ctx.restore(mark);
    }

    c.bench_function("intern_hit_200", |b| {
        b.iter(|| black_box(ctx.symbol("symbol-0").expect("symbol")))
    });
}

criterion_group!(
    benches,
    bench_cons_churn,
    bench_full_collection,
    bench_intern_hit
);
criterion_main!(benches);
