use criterion::{black_box, criterion_group, criterion_main, Criterion};

use weft::{Method, Response, Scope};

async fn ok() -> Response {
    Response::new(200)
}

fn build_router() -> weft::Router {
    let mut root = Scope::root();
    for i in 0..200 {
        root = root
            .route(Method::Get, &format!("/resource{i}/{{id}}"), ok)
            .unwrap();
    }
    root = root
        .route(Method::Get, "/api/v1/x", ok)
        .unwrap()
        .route(Method::Get, "/api/v1/{x}", ok)
        .unwrap()
        .route(Method::Get, "/api/v1/x/y", ok)
        .unwrap()
        .route(Method::Get, "/api/v1/x/{y}", ok)
        .unwrap()
        .route(Method::Get, "/api/v1/{x}/y", ok)
        .unwrap()
        .route(Method::Get, "/api/v1/{x}/{y}", ok)
        .unwrap();
    root.finish().unwrap()
}

fn bench_static_match(c: &mut Criterion) {
    let router = build_router();
    c.bench_function("router_lookup_static_tail", |b| {
        b.iter(|| black_box(router.lookup(Method::Get, "/api/v1/x/y")));
    });
}

fn bench_param_match(c: &mut Criterion) {
    let router = build_router();
    c.bench_function("router_lookup_param_capture", |b| {
        b.iter(|| black_box(router.lookup(Method::Get, "/resource150/abcdef")));
    });
}

fn bench_miss(c: &mut Criterion) {
    let router = build_router();
    c.bench_function("router_lookup_miss", |b| {
        b.iter(|| black_box(router.lookup(Method::Get, "/no/such/route")));
    });
}

criterion_group!(benches, bench_static_match, bench_param_match, bench_miss);
criterion_main!(benches);
