use corpmatch::{
    CompanyEntry, ConfigLoadError, CorpmatchConfig, IngestError, MatchError, Pipeline,
    PipelineError, RegistryError, SearchParams,
};

fn params(name: &str, url: &str) -> SearchParams {
    SearchParams {
        name: Some(name.into()),
        url: Some(url.into()),
        ..SearchParams::default()
    }
}

fn seeded() -> Pipeline {
    let pipeline = Pipeline::in_memory();
    pipeline
        .ingest(&[
            CompanyEntry::new("Acme", "A1").with_url("acme.com"),
            CompanyEntry::new("Globex", "A2"),
        ])
        .expect("seed");
    pipeline
}

fn match_error(result: Result<corpmatch::EncodedMatches, PipelineError>) -> MatchError {
    match result {
        Err(PipelineError::Match(err)) => err,
        other => panic!("expected match error, got {other:?}"),
    }
}

#[test]
fn suffix_only_name_without_url_has_no_signals() {
    let pipeline = seeded();
    let err = match_error(pipeline.search(&params("Inc.", "")));
    assert!(matches!(err, MatchError::NoSignals));
}

#[test]
fn unparsable_url_alone_has_no_signals() {
    let pipeline = seeded();
    let err = match_error(pipeline.search(&params("", "http://[::1")));
    assert!(matches!(err, MatchError::NoSignals));
}

#[test]
fn unparsable_url_with_name_still_searches() {
    let pipeline = seeded();
    let encoded = pipeline
        .search(&params("acme", "http://[::1"))
        .expect("name signal remains");
    let corpmatch::EncodedMatches::Structured(doc) = encoded else {
        panic!("json is the default format");
    };
    assert_eq!(doc.matches.len(), 1);
    assert_eq!(doc.matches[0].score.url, None);
}

#[test]
fn invalid_limits_are_rejected() {
    let pipeline = seeded();
    for bad in ["0", "-3", "ten", "1.5", ""] {
        let err = match_error(pipeline.search(&SearchParams {
            limit: Some(bad.into()),
            ..params("acme", "")
        }));
        assert!(matches!(err, MatchError::InvalidLimit(_)), "limit {bad:?}");
    }
}

#[test]
fn large_limits_are_accepted() {
    let pipeline = seeded();
    let encoded = pipeline
        .search(&SearchParams {
            limit: Some("5000".into()),
            ..params("acme", "")
        })
        .expect("no upper bound by default");
    let corpmatch::EncodedMatches::Structured(doc) = encoded else {
        panic!("json is the default format");
    };
    assert!(!doc.matches.is_empty());
}

#[test]
fn invalid_thetas_are_rejected() {
    let pipeline = seeded();
    for bad in ["high", "NaN", "inf", ""] {
        let err = match_error(pipeline.search(&SearchParams {
            theta: Some(bad.into()),
            ..params("acme", "")
        }));
        assert!(matches!(err, MatchError::InvalidTheta(_)), "theta {bad:?}");
    }
}

#[test]
fn parameter_errors_win_over_missing_signals() {
    let pipeline = seeded();
    let err = match_error(pipeline.search(&SearchParams {
        limit: Some("0".into()),
        ..SearchParams::default()
    }));
    assert!(matches!(err, MatchError::InvalidLimit(_)));
}

#[test]
fn unknown_format_is_rejected() {
    let pipeline = seeded();
    let err = match_error(pipeline.search(&SearchParams {
        format: Some("xml".into()),
        ..params("acme", "")
    }));
    assert!(matches!(err, MatchError::InvalidFormat(f) if f == "xml"));
}

#[test]
fn ingest_rejects_bad_entries_without_writing() {
    let pipeline = Pipeline::in_memory();
    let err = pipeline
        .ingest(&[
            CompanyEntry::new("Acme", "A1"),
            CompanyEntry::new("Globex", ""),
        ])
        .unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Ingest(IngestError::MissingAccountId { index: 1 })
    ));
    assert_eq!(pipeline.registry().stats().unwrap().companies, 0);
}

#[test]
fn registry_errors_surface_through_pipeline() {
    let pipeline = seeded();

    let err = pipeline.update_company(2, Some("ACME, Inc."), None).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Registry(RegistryError::DuplicateKey(ref key)) if key == "acme"
    ));

    let err = pipeline.delete_company(42).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Registry(RegistryError::CompanyNotFound(42))
    ));

    assert!(pipeline.company(42).unwrap().is_none());
}

#[test]
fn invalid_config_is_rejected_before_opening_storage() {
    let mut cfg = CorpmatchConfig::default();
    cfg.registry.backend = "redb".into();
    cfg.registry.path = None;

    let err = Pipeline::from_config(&cfg).err().expect("config error");
    assert!(matches!(
        err,
        PipelineError::Config(ConfigLoadError::Validation(_))
    ));

    let err = CorpmatchConfig::from_yaml("version: \"9\"\n").unwrap_err();
    assert!(matches!(err, ConfigLoadError::UnsupportedVersion(_)));
}

#[test]
fn errors_render_readable_messages() {
    let err = PipelineError::from(MatchError::NoSignals);
    assert_eq!(
        err.to_string(),
        "match failure: name or url query params missing"
    );
    assert!(std::error::Error::source(&err).is_some());
}
