use anyhow::{Context, Result};
use serde::Serialize;
use std::time::Duration;

use crate::error::TaxcatError;

pub mod azure;
pub mod watson;

/// The two entity kinds that map onto taxonomies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Organization,
    Person,
}

/// Organization found by the Organization/Person extractor: one record per
/// match that carries a Wikipedia-linkage score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrganizationMatch {
    pub name: String,
    #[serde(rename = "WikiScore")]
    pub wiki_score: f64,
    #[serde(rename = "EntityScore")]
    pub entity_score: f64,
}

/// Person found by the Organization/Person extractor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonMatch {
    pub name: String,
    #[serde(rename = "EntityScore")]
    pub entity_score: f64,
}

/// Entity found by the general entity/concept extractor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredEntity {
    pub name: String,
    pub relevance: f64,
}

/// Organizations and people extracted from one service response.
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted<O, P> {
    pub organizations: Vec<O>,
    pub people: Vec<P>,
}

impl<O, P> Default for Extracted<O, P> {
    fn default() -> Self {
        Self {
            organizations: Vec::new(),
            people: Vec::new(),
        }
    }
}

pub type AzureEntities = Extracted<OrganizationMatch, PersonMatch>;
pub type WatsonEntities = Extracted<ScoredEntity, ScoredEntity>;

impl AzureEntities {
    /// Distinct organization names, first occurrence first.
    pub fn organization_names(&self) -> Vec<String> {
        unique_names(self.organizations.iter().map(|o| o.name.as_str()))
    }

    /// Distinct person names, first occurrence first.
    pub fn person_names(&self) -> Vec<String> {
        unique_names(self.people.iter().map(|p| p.name.as_str()))
    }
}

fn unique_names<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for name in names {
        if !out.iter().any(|n| n == name) {
            out.push(name.to_string());
        }
    }
    out
}

/// Build the HTTP client used by the service wrappers and the REST host. Without `timeout_secs`
/// reqwest applies no overall timeout.
pub(crate) fn build_client(timeout_secs: Option<u64>) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder().user_agent("taxcat/0.1.0");
    if let Some(secs) = timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    builder.build().context("failed to build reqwest client")
}

/// Return the body of a successful response, or a `ServiceStatus` error.
pub(crate) async fn read_success_body(
    service: &'static str,
    response: reqwest::Response,
) -> Result<String> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(TaxcatError::ServiceStatus {
            service,
            status: status.as_u16(),
            body,
        }
        .into());
    }

    response
        .text()
        .await
        .with_context(|| format!("failed to read {} response body", service))
}
