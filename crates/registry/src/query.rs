use crate::{decode, CompanyRecord, CompanyRegistry, RegistryError, UrlRecord, COMPANY_PREFIX};
use serde::{Deserialize, Serialize};

/// One row of the company ⟕ url outer join, as scored by the matcher.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct CandidateRecord {
    /// Company id.
    pub id: u64,
    pub account_id: String,
    /// Display name. Stored normalized, so equal to `normalized_key`.
    pub name: String,
    pub normalized_key: String,
    /// Domain of one linked URL, `None` for a company without URLs.
    pub domain: Option<String>,
}

impl CandidateRecord {
    fn from_parts(company: &CompanyRecord, url: Option<&UrlRecord>) -> Self {
        Self {
            id: company.id,
            account_id: company.account_id.clone(),
            name: company.name.clone(),
            normalized_key: company.name.clone(),
            domain: url.map(|u| u.domain.clone()),
        }
    }
}

/// Narrows the candidate superset returned by [`CompanyRegistry::candidates`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CandidateQuery {
    /// Skip companies that have no linked URL.
    pub require_domain: bool,
}

impl CandidateQuery {
    /// Every row of the join.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_require_domain(mut self, require_domain: bool) -> Self {
        self.require_domain = require_domain;
        self
    }
}

impl CompanyRegistry {
    /// Outer-join rows: one per linked URL, or a single row with no domain
    /// for a company without URLs. Ordered by company id, then url id.
    pub fn candidates(&self, query: &CandidateQuery) -> Result<Vec<CandidateRecord>, RegistryError> {
        let mut companies: Vec<CompanyRecord> = Vec::new();
        self.backend.scan_prefix(COMPANY_PREFIX, &mut |_, raw| {
            companies.push(decode(raw)?);
            Ok(())
        })?;

        let mut rows = Vec::with_capacity(companies.len());
        for company in &companies {
            let urls = self.urls_for(company.id)?;
            if urls.is_empty() {
                if !query.require_domain {
                    rows.push(CandidateRecord::from_parts(company, None));
                }
                continue;
            }
            rows.extend(
                urls.iter()
                    .map(|url| CandidateRecord::from_parts(company, Some(url))),
            );
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> CompanyRegistry {
        let registry = CompanyRegistry::in_memory();
        let (acme, _) = registry.find_or_create_company("acme", "a1").unwrap();
        let (globex, _) = registry.find_or_create_company("globex", "a2").unwrap();
        registry.find_or_create_company("initech", "a3").unwrap();

        let (acme_com, _) = registry.find_or_create_url("acme.com", "").unwrap();
        let (acme_io, _) = registry.find_or_create_url("acme.io", "/").unwrap();
        let (globex_com, _) = registry.find_or_create_url("globex.com", "").unwrap();
        registry.associate(acme.id, acme_com.id).unwrap();
        registry.associate(acme.id, acme_io.id).unwrap();
        registry.associate(globex.id, globex_com.id).unwrap();
        registry
    }

    #[test]
    fn candidates_are_an_outer_join() {
        let rows = seeded().candidates(&CandidateQuery::all()).unwrap();
        let flat: Vec<(u64, Option<&str>)> =
            rows.iter().map(|r| (r.id, r.domain.as_deref())).collect();

        assert_eq!(
            flat,
            vec![
                (1, Some("acme.com")),
                (1, Some("acme.io")),
                (2, Some("globex.com")),
                (3, None),
            ]
        );
        assert!(rows.iter().all(|r| r.name == r.normalized_key));
    }

    #[test]
    fn require_domain_skips_unlinked_companies() {
        let rows = seeded()
            .candidates(&CandidateQuery::all().with_require_domain(true))
            .unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.domain.is_some()));
    }

    #[test]
    fn empty_registry_has_no_candidates() {
        let registry = CompanyRegistry::in_memory();
        assert!(registry.candidates(&CandidateQuery::all()).unwrap().is_empty());
    }
}
