use anyhow::{Context, Result};
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{build_client, read_success_body, AzureEntities, EntityKind, OrganizationMatch, PersonMatch};
use crate::error::TaxcatError;

pub const SERVICE: &str = "azure";

/// Client for the Text Analytics "entities" endpoint (Organization/Person extraction).
pub struct AzureClient {
    url: String,
    api_key: String,
    client: reqwest::Client,
}

impl AzureClient {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        Self::with_timeout(url, api_key, None)
    }

    pub fn with_timeout(
        url: impl Into<String>,
        api_key: impl Into<String>,
        timeout_secs: Option<u64>,
    ) -> Result<Self> {
        Ok(Self {
            url: url.into(),
            api_key: api_key.into(),
            client: build_client(timeout_secs)?,
        })
    }

    pub fn from_config(config: &common::AzureConfig, api_key: &str) -> Result<Self> {
        Self::with_timeout(config.url(), api_key, config.timeout_seconds)
    }

    /// Submit `text` as a single English document and return the raw response body.
    /// The caller is responsible for preparing the text (see `text::prepare_for_azure`).
    pub async fn analyze(&self, text: &str) -> Result<String> {
        let req_body = EntitiesRequest {
            documents: vec![Document {
                id: "1",
                language: "en",
                text,
            }],
        };
        let payload = serde_json::to_string(&req_body).context("failed to encode Azure request")?;
        debug!("azure: posting {} bytes to {}", payload.len(), self.url);

        let response = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "text/json")
            .header("Ocp-Apim-Subscription-Key", &self.api_key)
            .body(payload)
            .send()
            .await
            .context("Azure HTTP request failed")?;

        read_success_body(SERVICE, response).await
    }
}

#[derive(Debug, Serialize)]
struct EntitiesRequest<'a> {
    documents: Vec<Document<'a>>,
}

#[derive(Debug, Serialize)]
struct Document<'a> {
    id: &'a str,
    language: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct EntitiesResponse {
    documents: Vec<DocumentResult>,
    #[serde(default)]
    errors: Vec<DocumentError>,
}

#[derive(Debug, Deserialize)]
struct DocumentResult {
    #[serde(default)]
    entities: Vec<Entity>,
}

#[derive(Debug, Deserialize)]
struct DocumentError {
    #[serde(default)]
    id: Option<String>,
    message: String,
}

#[derive(Debug, Deserialize)]
struct Entity {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    // absent and null both mean "no matches"
    #[serde(default)]
    matches: Option<Vec<Match>>,
}

impl Entity {
    fn matches(&self) -> &[Match] {
        self.matches.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Match {
    #[serde(default)]
    wikipedia_score: Option<f64>,
    #[serde(default)]
    entity_type_score: Option<f64>,
}

fn entity_kind(kind: &str) -> Option<EntityKind> {
    match kind {
        "Organization" => Some(EntityKind::Organization),
        "Person" => Some(EntityKind::Person),
        _ => None,
    }
}

/// Decode an entities response into organizations and people.
///
/// Only the first document is read. An entity is kept only when its first match
/// carries an `entityTypeScore`; entities without one are skipped on purpose.
/// Each organization yields one record per match that has a `wikipediaScore`,
/// paired with the first match's entity score, and identical records collapse
/// into one. People are not deduplicated.
pub fn parse_azure_response(body: &str) -> Result<AzureEntities> {
    let response: EntitiesResponse =
        serde_json::from_str(body).map_err(|e| TaxcatError::malformed(SERVICE, e.to_string()))?;

    let Some(document) = response.documents.first() else {
        let reason = match response.errors.first() {
            Some(err) => format!(
                "no documents returned (document {}: {})",
                err.id.as_deref().unwrap_or("?"),
                err.message
            ),
            None => "no documents returned".to_string(),
        };
        return Err(TaxcatError::malformed(SERVICE, reason).into());
    };

    let mut out = AzureEntities::default();
    for entity in &document.entities {
        let Some(kind) = entity_kind(&entity.kind) else {
            continue;
        };
        let Some(entity_score) = entity.matches().first().and_then(|m| m.entity_type_score) else {
            debug!("azure: skipping {:?} {}: no entityTypeScore on first match", kind, entity.name);
            continue;
        };

        match kind {
            EntityKind::Organization => {
                for wiki_score in entity.matches().iter().filter_map(|m| m.wikipedia_score) {
                    let record = OrganizationMatch {
                        name: entity.name.clone(),
                        wiki_score,
                        entity_score,
                    };
                    if !out.organizations.contains(&record) {
                        out.organizations.push(record);
                    }
                }
            }
            EntityKind::Person => out.people.push(PersonMatch {
                name: entity.name.clone(),
                entity_score,
            }),
        }
    }

    info!(
        "azure: {} organization records, {} people",
        out.organizations.len(),
        out.people.len()
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(entities: &str) -> String {
        format!(r#"{{"documents":[{{"id":"1","entities":{}}}],"errors":[]}}"#, entities)
    }

    #[test]
    fn test_organization_and_person_are_extracted() {
        let json = body(
            r#"[
                {"name":"Toyota Prius","type":"Organization","matches":[
                    {"wikipediaScore":0.31,"entityTypeScore":0.88,"text":"Toyota Prius","offset":21,"length":12}
                ]},
                {"name":"Henry Ford","type":"Person","matches":[
                    {"entityTypeScore":0.99,"text":"Henry Ford","offset":0,"length":10}
                ]},
                {"name":"Monday","type":"DateTime","matches":[{"entityTypeScore":0.8}]}
            ]"#,
        );

        let parsed = parse_azure_response(&json).expect("parse");
        assert_eq!(
            parsed.organizations,
            vec![OrganizationMatch { name: "Toyota Prius".into(), wiki_score: 0.31, entity_score: 0.88 }]
        );
        assert_eq!(
            parsed.people,
            vec![PersonMatch { name: "Henry Ford".into(), entity_score: 0.99 }]
        );
    }

    #[test]
    fn test_one_org_record_per_wikipedia_match_using_first_entity_score() {
        let json = body(
            r#"[{"name":"WIDE Project","type":"Organization","matches":[
                {"wikipediaScore":0.5,"entityTypeScore":0.7},
                {"entityTypeScore":0.2},
                {"wikipediaScore":0.6,"entityTypeScore":0.1}
            ]}]"#,
        );

        let parsed = parse_azure_response(&json).expect("parse");
        assert_eq!(
            parsed.organizations,
            vec![
                OrganizationMatch { name: "WIDE Project".into(), wiki_score: 0.5, entity_score: 0.7 },
                OrganizationMatch { name: "WIDE Project".into(), wiki_score: 0.6, entity_score: 0.7 },
            ]
        );
    }

    #[test]
    fn test_identical_org_records_collapse_but_differing_ones_survive() {
        let json = body(
            r#"[
                {"name":"Acme","type":"Organization","matches":[{"wikipediaScore":0.5,"entityTypeScore":0.9}]},
                {"name":"Acme","type":"Organization","matches":[{"wikipediaScore":0.5,"entityTypeScore":0.9}]},
                {"name":"Acme","type":"Organization","matches":[{"wikipediaScore":0.4,"entityTypeScore":0.9}]},
                {"name":"Acme","type":"Organization","matches":[{"wikipediaScore":0.5,"entityTypeScore":0.8}]},
                {"name":"Acme Corp","type":"Organization","matches":[{"wikipediaScore":0.5,"entityTypeScore":0.9}]}
            ]"#,
        );

        let parsed = parse_azure_response(&json).expect("parse");
        assert_eq!(parsed.organizations.len(), 4);
        assert_eq!(parsed.organizations[0].wiki_score, 0.5);
        assert_eq!(parsed.organizations[1].wiki_score, 0.4);
        assert_eq!(parsed.organizations[2].entity_score, 0.8);
        assert_eq!(parsed.organizations[3].name, "Acme Corp");
    }

    #[test]
    fn test_people_are_not_deduplicated() {
        let json = body(
            r#"[
                {"name":"Henry Ford","type":"Person","matches":[{"entityTypeScore":0.9}]},
                {"name":"Henry Ford","type":"Person","matches":[{"entityTypeScore":0.9}]}
            ]"#,
        );

        let parsed = parse_azure_response(&json).expect("parse");
        assert_eq!(parsed.people.len(), 2);
    }

    #[test]
    fn test_entities_without_score_on_first_match_are_skipped() {
        let json = body(
            r#"[
                {"name":"No Matches Inc","type":"Organization","matches":[]},
                {"name":"Missing","type":"Organization","matches":[
                    {"wikipediaScore":0.5},
                    {"wikipediaScore":0.6,"entityTypeScore":0.9}
                ]},
                {"name":"Nobody","type":"Person","matches":[{"wikipediaScore":0.3}]},
                {"name":"Nothing","type":"Person"},
                {"name":"Ghost","type":"Organization","matches":null}
            ]"#,
        );

        let parsed = parse_azure_response(&json).expect("parse");
        assert!(parsed.organizations.is_empty());
        assert!(parsed.people.is_empty());
    }

    #[test]
    fn test_null_matches_do_not_drop_the_rest_of_the_document() {
        let json = body(
            r#"[
                {"name":"Ghost","type":"Organization","matches":null},
                {"name":"Henry Ford","type":"Person","matches":[{"entityTypeScore":0.9}]}
            ]"#,
        );

        let parsed = parse_azure_response(&json).expect("parse");
        assert!(parsed.organizations.is_empty());
        assert_eq!(
            parsed.people,
            vec![PersonMatch { name: "Henry Ford".into(), entity_score: 0.9 }]
        );
    }

    #[test]
    fn test_malformed_bodies_are_reported_as_such() {
        for bad in ["not json", r#"{"errors":[]}"#, r#"{"documents":{}}"#] {
            let err = parse_azure_response(bad).unwrap_err();
            assert!(
                matches!(err.downcast_ref::<TaxcatError>(), Some(TaxcatError::MalformedResponse { .. })),
                "expected malformed response for {bad}"
            );
        }
    }

    #[test]
    fn test_service_errors_surface_when_no_document_came_back() {
        let json = r#"{"documents":[],"errors":[{"id":"1","message":"Invalid language code."}]}"#;
        let err = parse_azure_response(json).unwrap_err();
        assert!(err.to_string().contains("Invalid language code."));
    }
}
