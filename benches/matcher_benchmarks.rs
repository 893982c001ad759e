// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Performance Benchmarks for the Multi-Pattern Matcher
 * Throughput of one-pass signature scanning over large bodies
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use haavi_engine::matcher::{MultiIn, MultiRe};

fn build_body(kilobytes: usize) -> String {
    let mut body = String::with_capacity(kilobytes * 1024);
    while body.len() < kilobytes * 1024 {
        body.push_str("<div class=\"row\">ordinary page content with nothing to report</div>\n");
    }
    body.push_str("<b>Warning</b>: division by zero in /var/www/index.php\nStack trace:\n");
    body
}

fn bench_multi_in(c: &mut Criterion) {
    let mut group = c.benchmark_group("multi_in_query");

    for pattern_count in [10, 100, 500] {
        let mut literals: Vec<String> =
            (0..pattern_count).map(|i| format!("SIGNATURE-{:05}", i)).collect();
        literals.push("<b>Warning</b>: ".to_string());
        literals.push("Stack trace:".to_string());
        let matcher = MultiIn::new(literals);
        let body = build_body(1024);

        group.bench_with_input(
            BenchmarkId::new("1mb_body", pattern_count),
            &pattern_count,
            |b, _| {
                b.iter(|| {
                    let hits = matcher.query(black_box(&body));
                    assert_eq!(hits.len(), 2);
                    hits
                })
            },
        );
    }
    group.finish();
}

fn bench_multi_re(c: &mut Criterion) {
    let bank = MultiRe::new([
        (r"<address>(.*?)</address>", "Apache"),
        (r"<b>Version Information:</b>&nbsp;(.*?)\n", "ASP .NET"),
    ])
    .unwrap();
    let mut body = build_body(256);
    body.push_str("<address>Apache/2.2.3 (CentOS) Server at moth Port 80</address>");

    c.bench_function("multi_re_query_256kb", |b| {
        b.iter(|| bank.query(black_box(&body)))
    });
}

criterion_group!(benches, bench_multi_in, bench_multi_re);
criterion_main!(benches);
