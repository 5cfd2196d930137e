//! Rendering of ranked matches as structured records or delimited text.
//!
//! The encoder neither filters nor reorders: it renders exactly the
//! [`RankedMatches`] it is given.

use serde::Serialize;

use crate::types::{EvaluatedSignals, OutputFormat, RankedMatch, RankedMatches};

/// Header line of the delimited text encoding.
pub const TEXT_HEADER: &str = "ID,Account ID,Name,URL,Average Score,Name Score,URL Score";

/// `{"matches": [...]}` document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructuredMatches {
    pub matches: Vec<StructuredMatch>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructuredMatch {
    pub id: u64,
    pub account_id: String,
    /// Domain of the matched row, `null` for a company without URLs.
    pub url: Option<String>,
    pub name: String,
    pub score: StructuredScore,
}

/// Rounded scores. `name` and `url` are omitted when the request did not
/// evaluate that signal, and `null` when it did but the row has no value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructuredScore {
    pub average: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<Option<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<Option<f64>>,
}

/// Encoded search result.
#[derive(Debug, Clone, PartialEq)]
pub enum EncodedMatches {
    Structured(StructuredMatches),
    Text(String),
}

impl EncodedMatches {
    pub fn format(&self) -> OutputFormat {
        match self {
            EncodedMatches::Structured(_) => OutputFormat::Json,
            EncodedMatches::Text(_) => OutputFormat::Csv,
        }
    }

    pub fn content_type(&self) -> &'static str {
        self.format().content_type()
    }
}

/// Render `matches` in `format`.
pub fn encode(matches: &RankedMatches, format: OutputFormat) -> EncodedMatches {
    match format {
        OutputFormat::Json => EncodedMatches::Structured(encode_structured(matches)),
        OutputFormat::Csv => EncodedMatches::Text(encode_text(matches)),
    }
}

pub fn encode_structured(matches: &RankedMatches) -> StructuredMatches {
    let signals = matches.signals;
    StructuredMatches {
        matches: matches
            .matches
            .iter()
            .map(|m| structured_match(m, signals))
            .collect(),
    }
}

fn structured_match(m: &RankedMatch, signals: EvaluatedSignals) -> StructuredMatch {
    StructuredMatch {
        id: m.candidate.id,
        account_id: m.candidate.account_id.clone(),
        url: m.candidate.domain.clone(),
        name: m.candidate.name.clone(),
        score: StructuredScore {
            average: round3(m.aggregate),
            name: signals.name.then(|| m.scores.name.map(round3)),
            url: signals.domain.then(|| m.scores.domain.map(round3)),
        },
    }
}

/// Comma-separated text: header plus one line per match, every line
/// newline-terminated.
///
/// Fields are not quoted or escaped, so a comma inside an account id or a
/// domain shifts the columns of that line.
pub fn encode_text(matches: &RankedMatches) -> String {
    let signals = matches.signals;
    let mut out = String::with_capacity(64 * (matches.len() + 1));
    out.push_str(TEXT_HEADER);
    out.push('\n');

    for m in &matches.matches {
        let fields = [
            m.candidate.id.to_string(),
            m.candidate.account_id.clone(),
            m.candidate.name.clone(),
            m.candidate.domain.clone().unwrap_or_default(),
            format_score(Some(m.aggregate)),
            if signals.name {
                format_score(m.scores.name)
            } else {
                String::new()
            },
            if signals.domain {
                format_score(m.scores.domain)
            } else {
                String::new()
            },
        ];
        out.push_str(&fields.join(","));
        out.push('\n');
    }
    out
}

/// Round half away from zero to three decimals.
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

// Shortest round-trip form with a trailing `.0` on integral values: 1.0, 0.5, 0.333.
fn format_score(value: Option<f64>) -> String {
    value.map(|v| format!("{:?}", round3(v))).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SignalScores;
    use registry::CandidateRecord;
    use serde_json::json;

    fn hit(id: u64, domain: Option<&str>, name: Option<f64>, dom: Option<f64>) -> RankedMatch {
        let scores = SignalScores { name, domain: dom };
        RankedMatch {
            candidate: CandidateRecord {
                id,
                account_id: format!("A{id}"),
                name: "acme".into(),
                normalized_key: "acme".into(),
                domain: domain.map(str::to_string),
            },
            scores,
            aggregate: scores.aggregate().unwrap_or(0.0),
        }
    }

    #[test]
    fn structured_includes_only_evaluated_signals() {
        let matches = RankedMatches {
            signals: EvaluatedSignals {
                name: true,
                domain: false,
            },
            matches: vec![hit(1, Some("acme.com"), Some(1.0 / 3.0), None)],
        };

        let value = serde_json::to_value(encode_structured(&matches)).unwrap();
        assert_eq!(
            value,
            json!({
                "matches": [{
                    "id": 1,
                    "account_id": "A1",
                    "url": "acme.com",
                    "name": "acme",
                    "score": {"average": 0.333, "name": 0.333}
                }]
            })
        );
    }

    #[test]
    fn structured_renders_missing_row_values_as_null() {
        let matches = RankedMatches {
            signals: EvaluatedSignals {
                name: true,
                domain: true,
            },
            matches: vec![hit(7, None, Some(1.0), None)],
        };

        let value = serde_json::to_value(encode_structured(&matches)).unwrap();
        assert_eq!(value["matches"][0]["url"], serde_json::Value::Null);
        assert_eq!(
            value["matches"][0]["score"],
            json!({"average": 1.0, "name": 1.0, "url": null})
        );
    }

    #[test]
    fn text_leaves_unevaluated_scores_empty() {
        let matches = RankedMatches {
            signals: EvaluatedSignals {
                name: true,
                domain: false,
            },
            matches: vec![
                hit(1, None, Some(1.0), None),
                hit(2, Some("acme.io"), Some(0.5), None),
            ],
        };

        assert_eq!(
            encode_text(&matches),
            "ID,Account ID,Name,URL,Average Score,Name Score,URL Score\n\
             1,A1,acme,,1.0,1.0,\n\
             2,A2,acme,acme.io,0.5,0.5,\n"
        );
    }

    #[test]
    fn text_with_both_signals() {
        let matches = RankedMatches {
            signals: EvaluatedSignals {
                name: true,
                domain: true,
            },
            matches: vec![hit(3, Some("acme.com"), Some(2.0 / 3.0), Some(0.0))],
        };
        assert_eq!(
            encode_text(&matches),
            format!("{TEXT_HEADER}\n3,A3,acme,acme.com,0.333,0.667,0.0\n")
        );
    }

    #[test]
    fn empty_result_is_header_only() {
        let empty = RankedMatches::default();
        assert_eq!(encode_text(&empty), format!("{TEXT_HEADER}\n"));
        assert_eq!(
            serde_json::to_value(encode_structured(&empty)).unwrap(),
            json!({"matches": []})
        );
    }

    #[test]
    fn encode_dispatches_on_format() {
        let empty = RankedMatches::default();
        assert!(matches!(
            encode(&empty, OutputFormat::Json),
            EncodedMatches::Structured(_)
        ));
        let text = encode(&empty, OutputFormat::Csv);
        assert_eq!(text.content_type(), "text/csv; charset=utf-8");
    }

    #[test]
    fn rounding_to_three_places() {
        assert_eq!(round3(0.12345), 0.123);
        assert_eq!(round3(0.9996), 1.0);
        assert_eq!(format_score(Some(1.0)), "1.0");
        assert_eq!(format_score(Some(0.5)), "0.5");
        assert_eq!(format_score(None), "");
    }
}
