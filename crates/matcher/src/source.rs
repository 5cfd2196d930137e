use registry::{CandidateQuery, CandidateRecord, CompanyRegistry};

use crate::types::MatchError;

/// Supplies the candidate superset a search ranks in-process.
pub trait CandidateSource: Send + Sync {
    fn candidates(&self, query: &CandidateQuery) -> Result<Vec<CandidateRecord>, MatchError>;
}

impl CandidateSource for CompanyRegistry {
    fn candidates(&self, query: &CandidateQuery) -> Result<Vec<CandidateRecord>, MatchError> {
        Ok(CompanyRegistry::candidates(self, query)?)
    }
}

/// A fixed candidate list, handy for tests and benchmarks.
impl CandidateSource for Vec<CandidateRecord> {
    fn candidates(&self, query: &CandidateQuery) -> Result<Vec<CandidateRecord>, MatchError> {
        Ok(self
            .iter()
            .filter(|c| !query.require_domain || c.domain.is_some())
            .cloned()
            .collect())
    }
}
