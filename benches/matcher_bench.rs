
use std::hint::black_box;
use std::sync::Arc;

use canonical::{decompose_url, normalize_name, NormalizerConfig};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use matcher::{
    encode, rank, trigram_similarity, CandidateRecord, MatchRequest, Matcher, OutputFormat,
    PreparedQuery,
};

const WORDS: &[&str] = &[
    "acme", "globex", "initech", "umbrella", "stark", "wayne", "cyberdyne", "tyrell", "wonka",
    "soylent", "hooli", "vandelay", "massive", "dynamic", "widgets", "labs", "holdings",
];

/// Deterministic candidate rows; every third row has no domain.
fn candidates(count: usize) -> Vec<CandidateRecord> {
    (0..count)
        .map(|i| {
            let first = WORDS[i % WORDS.len()];
            let second = WORDS[(i / WORDS.len()) % WORDS.len()];
            let key = format!("{first} {second} {i}");
            CandidateRecord {
                id: i as u64 + 1,
                account_id: format!("acct-{i}"),
                name: key.clone(),
                normalized_key: key,
                domain: (i % 3 != 0).then(|| format!("{first}{i}.com")),
            }
        })
        .collect()
}

fn bench_similarity(c: &mut Criterion) {
    let mut group = c.benchmark_group("trigram_similarity");
    for (label, a, b) in [
        ("short", "acme", "acne"),
        ("medium", "acme widgets international", "acme widget intl"),
        (
            "long",
            "the united consolidated widget and sprocket manufacturing",
            "united consolidated widgets sprockets manufacturers",
        ),
    ] {
        group.bench_function(label, |bench| {
            bench.iter(|| trigram_similarity(black_box(a), black_box(b)));
        });
    }
    group.finish();
}

fn bench_normalize(c: &mut Criterion) {
    let cfg = NormalizerConfig::default();
    let folded = NormalizerConfig {
        fold_diacritics: true,
    };
    c.bench_function("normalize_name", |b| {
        b.iter(|| normalize_name(black_box("A.C.M.E.   Widgets,  LLC"), &cfg));
    });
    c.bench_function("normalize_name_folded", |b| {
        b.iter(|| normalize_name(black_box("Müller & Söhne Café GmbH"), &folded));
    });
    c.bench_function("decompose_url", |b| {
        b.iter(|| decompose_url(black_box("https://www.Acme.com/about/team?x=1")));
    });
}

fn bench_rank_scale(c: &mut Criterion) {
    let mut group = c.benchmark_group("rank_scale");
    let query = PreparedQuery::new("acme widgets", Some("acme1.com".to_string()));

    for size in [100usize, 1_000, 10_000] {
        let rows = candidates(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &rows, |b, rows| {
            b.iter(|| rank(black_box(&query), black_box(rows), 10, 0.0).expect("rank"));
        });
    }
    group.finish();
}

fn bench_search_and_encode(c: &mut Criterion) {
    let matcher = Matcher::new(Arc::new(candidates(1_000)));
    let request = MatchRequest::new("Acme Widgets, Inc.", "www.acme1.com").with_limit(25);

    let mut group = c.benchmark_group("search");
    for format in [OutputFormat::Json, OutputFormat::Csv] {
        group.bench_function(format.to_string(), |b| {
            b.iter(|| {
                let ranked = matcher.search(black_box(&request)).expect("search");
                encode(&ranked, format)
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_similarity,
    bench_normalize,
    bench_rank_scale,
    bench_search_and_encode
);
criterion_main!(benches);
