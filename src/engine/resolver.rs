//! Fuzzy Request Resolver: Matches human queries to requests.
//!
//! Lookup order: numeric id, exact WIP number, normalised registration, then
//! a scored fuzzy match across WIP, registration and work description.

use super::repo::RequestRepo;
use super::types::Request;
use anyhow::{bail, Result};
use rusqlite::Connection;
use std::collections::HashSet;

const MIN_FUZZY_SCORE: f64 = 0.3;
/// Fuzzy candidates closer than this to the best score are a tie.
const TIE_MARGIN: f64 = 0.1;
/// Rough ceiling of `calculate_score`, used to scale confidence.
const MAX_FUZZY_SCORE: f64 = 3.0;
/// Only exact lookups report full confidence.
const MAX_FUZZY_CONFIDENCE: f64 = 0.99;

pub struct ResolveResult {
    pub request: Request,
    pub confidence: f64,
}

pub struct RequestResolver<'a> {
    repo: RequestRepo<'a>,
    strict: bool,
}

impl<'a> RequestResolver<'a> {
    /// Creates a new resolver.
    #[must_use]
    pub fn new(conn: &'a Connection) -> Self {
        Self {
            repo: RequestRepo::new(conn),
            strict: false,
        }
    }

    /// Creates a resolver in strict mode (no fuzzy step).
    #[must_use]
    pub fn strict(conn: &'a Connection) -> Self {
        Self {
            repo: RequestRepo::new(conn),
            strict: true,
        }
    }

    /// Resolves a user query into a request.
    ///
    /// # Errors
    /// Returns an error if no match is found or the query is ambiguous.
    pub fn resolve(&self, query: &str) -> Result<ResolveResult> {
        let query = query.trim();
        if let Ok(id) = query.parse::<i64>() {
            if let Some(request) = self.repo.get(id)? {
                return Ok(ResolveResult {
                    request,
                    confidence: 1.0,
                });
            }
        }

        let requests = self.repo.list()?;

        let by_wip: Vec<_> = requests
            .iter()
            .filter(|r| r.vehicle_job_id.eq_ignore_ascii_case(query))
            .collect();
        if let Some(request) = single(&by_wip, query)? {
            return Ok(ResolveResult {
                request,
                confidence: 1.0,
            });
        }

        let wanted = normalise_registration(query);
        let by_reg: Vec<_> = requests
            .iter()
            .filter(|r| normalise_registration(&r.registration) == wanted)
            .collect();
        if let Some(request) = single(&by_reg, query)? {
            return Ok(ResolveResult {
                request,
                confidence: 1.0,
            });
        }

        if self.strict {
            bail!("No exact match for '{query}' in strict mode.");
        }
        fuzzy_resolve(requests, query)
    }
}

/// Returns the only candidate, errors on more than one.
fn single(candidates: &[&Request], query: &str) -> Result<Option<Request>> {
    match candidates {
        [] => Ok(None),
        [only] => Ok(Some((*only).clone())),
        many => {
            let ids: Vec<_> = many.iter().map(|r| r.id.to_string()).collect();
            bail!(
                "'{query}' matches several requests (ids {}); use the id",
                ids.join(", ")
            )
        }
    }
}

fn fuzzy_resolve(requests: Vec<Request>, query: &str) -> Result<ResolveResult> {
    let query_lower = query.to_lowercase();
    let words: Vec<_> = query_lower.split_whitespace().collect();

    let mut matches: Vec<_> = requests
        .into_iter()
        .map(|r| (calculate_score(&r, &query_lower, &words), r))
        .filter(|(s, _)| *s > MIN_FUZZY_SCORE)
        .collect();

    matches.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.id.cmp(&b.1.id)));

    let Some(top) = matches.first().map(|(score, _)| *score) else {
        bail!("No request matches '{query}'");
    };
    let tied: Vec<_> = matches
        .iter()
        .filter(|(score, _)| top - score < TIE_MARGIN)
        .map(|(_, r)| r.id.to_string())
        .collect();
    if tied.len() > 1 {
        bail!(
            "'{query}' matches several requests (ids {}); use the id",
            tied.join(", ")
        );
    }

    let (score, request) = matches.swap_remove(0);
    let confidence = (score / MAX_FUZZY_SCORE).min(MAX_FUZZY_CONFIDENCE);
    tracing::debug!(request_id = request.id, score, confidence, "fuzzy match");
    Ok(ResolveResult {
        request,
        confidence,
    })
}

/// Uppercases and strips whitespace, so "ab12 cde" equals "AB12CDE".
#[must_use]
pub fn normalise_registration(reg: &str) -> String {
    reg.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase()
}

/// Calculates a match score between a request and a query.
fn calculate_score(request: &Request, query: &str, query_words: &[&str]) -> f64 {
    let wip_lower = request.vehicle_job_id.to_lowercase();
    let reg_lower = request.registration.to_lowercase();
    let work_lower = request.work_description.to_lowercase();

    let mut score = 0.0;

    if wip_lower.contains(query) {
        score += 0.8;
    }
    if reg_lower.contains(query) {
        score += 0.8;
    }
    if work_lower.contains(query) {
        score += 0.7;
    }

    for word in query_words {
        if reg_lower.contains(word) {
            score += 0.3;
        }
        if work_lower.contains(word) {
            score += 0.25;
        }
    }

    if wip_lower.starts_with(query) {
        score += 0.5;
    }

    score += string_similarity(&work_lower, query) * 0.4;

    score
}

#[allow(clippy::cast_precision_loss)]
fn string_similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let a_chars: HashSet<char> = a.chars().collect();
    let b_chars: HashSet<char> = b.chars().collect();

    let intersection = a_chars.intersection(&b_chars).count();
    let union = a_chars.union(&b_chars).count();

    if union == 0 {
        return 0.0;
    }

    intersection as f64 / union as f64
}
