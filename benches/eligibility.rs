use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hyper::header::ACCEPT;
use hyper::{Request, Uri};
use jsontape::eligibility::is_eligible;
use jsontape::fixture::last_path_segment;

fn bench_eligibility(c: &mut Criterion) {
    let mut group = c.benchmark_group("eligibility");

    let eligible = Request::builder()
        .uri("https://api.example.com/v1/users/posts")
        .header(ACCEPT, "application/json")
        .body(Bytes::new())
        .unwrap();
    let ineligible = Request::builder()
        .uri("https://api.example.com/v1/users/posts")
        .header(ACCEPT, "text/html")
        .body(Bytes::new())
        .unwrap();

    group.bench_function("eligible", |b| b.iter(|| is_eligible(black_box(&eligible))));
    group.bench_function("ineligible", |b| {
        b.iter(|| is_eligible(black_box(&ineligible)))
    });

    group.finish();
}

fn bench_last_path_segment(c: &mut Criterion) {
    let uri: Uri = "https://api.example.com/v1/users/42/posts/?page=3"
        .parse()
        .unwrap();

    c.bench_function("last_path_segment", |b| {
        b.iter(|| last_path_segment(black_box(&uri)))
    });
}

criterion_group!(benches, bench_eligibility, bench_last_path_segment);
criterion_main!(benches);
