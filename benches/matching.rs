use criterion::{criterion_group, criterion_main, Criterion};
use slserv_proto::mode::parse_channel_modes;
use slservd::security::wildcard_match;

fn bench_wildcard(c: &mut Criterion) {
    c.bench_function("wildcard_user_host", |b| {
        b.iter(|| {
            wildcard_match(
                std::hint::black_box("*!*@*.dialup.example.net"),
                std::hint::black_box("troll!ident@pool-42.dialup.example.net"),
            )
        })
    });
    c.bench_function("wildcard_no_match", |b| {
        b.iter(|| {
            wildcard_match(
                std::hint::black_box("spam?er@10.0.*"),
                std::hint::black_box("ident@host.example.com"),
            )
        })
    });
}

fn bench_mode_parse(c: &mut Criterion) {
    let args = vec!["sekrit".to_string(), "25".to_string(), "nick".to_string()];
    c.bench_function("parse_mode_string", |b| {
        b.iter(|| parse_channel_modes(std::hint::black_box("+ntkl-s+o"), std::hint::black_box(&args)))
    });
}

criterion_group!(benches, bench_wildcard, bench_mode_parse);
criterion_main!(benches);
