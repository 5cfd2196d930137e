use std::sync::Arc;
use std::thread;

use corpmatch::{CompanyEntry, MatchRequest, Pipeline};

fn entry(i: usize) -> CompanyEntry {
    CompanyEntry::new(format!("Company {i} Inc"), format!("acct-{i}"))
        .with_url(format!("company{i}.com"))
}

#[test]
fn overlapping_ingests_create_each_company_once() {
    let pipeline = Arc::new(Pipeline::in_memory());
    let batch: Vec<CompanyEntry> = (0..50).map(entry).collect();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let pipeline = Arc::clone(&pipeline);
            let batch = batch.clone();
            thread::spawn(move || pipeline.ingest(&batch).expect("ingest"))
        })
        .collect();

    let created: usize = handles
        .into_iter()
        .map(|h| h.join().expect("thread").companies_created)
        .sum();

    assert_eq!(created, 50);
    let stats = pipeline.registry().stats().unwrap();
    assert_eq!(stats.companies, 50);
    assert_eq!(stats.urls, 50);
    assert_eq!(stats.links, 50);
}

#[test]
fn searches_run_alongside_ingest() {
    let pipeline = Arc::new(Pipeline::in_memory());
    pipeline.ingest(&[entry(0)]).expect("seed");

    let writer = {
        let pipeline = Arc::clone(&pipeline);
        thread::spawn(move || {
            for i in 1..40 {
                pipeline.ingest(&[entry(i)]).expect("ingest");
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let pipeline = Arc::clone(&pipeline);
            thread::spawn(move || {
                for _ in 0..25 {
                    let result = pipeline
                        .search_ranked(&MatchRequest::new("company 0", "company0.com"))
                        .expect("search");
                    // The seeded row is always present and always first.
                    assert_eq!(result.matches[0].candidate.account_id, "acct-0");
                    assert_eq!(result.matches[0].aggregate, 1.0);
                }
            })
        })
        .collect();

    writer.join().expect("writer");
    for reader in readers {
        reader.join().expect("reader");
    }
    assert_eq!(pipeline.registry().stats().unwrap().companies, 40);
}

#[test]
fn shared_pipeline_gives_identical_answers_across_threads() {
    let pipeline = Arc::new(Pipeline::in_memory());
    pipeline
        .ingest(&(0..20).map(entry).collect::<Vec<_>>())
        .expect("seed");

    let handles: Vec<_> = (0..6)
        .map(|_| {
            let pipeline = Arc::clone(&pipeline);
            thread::spawn(move || {
                let result = pipeline
                    .search_ranked(&MatchRequest::new("company 1", "").with_limit(5))
                    .expect("search");
                result
                    .matches
                    .iter()
                    .map(|m| (m.candidate.id, m.aggregate))
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let results: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().expect("thread"))
        .collect();
    assert_eq!(results[0].len(), 5);
    assert!(results.iter().all(|r| r == &results[0]));
}
