use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{build_client, read_success_body, EntityKind, ScoredEntity, WatsonEntities};
use crate::error::TaxcatError;

pub const SERVICE: &str = "watson";

const ENTITY_LIMIT: u32 = 50;
const CONCEPT_LIMIT: u32 = 8;

/// Client for the Natural Language Understanding "analyze" endpoint.
pub struct WatsonClient {
    url: String,
    version: String,
    api_key: String,
    client: reqwest::Client,
}

impl WatsonClient {
    pub fn new(
        url: impl Into<String>,
        version: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self> {
        Self::with_timeout(url, version, api_key, None)
    }

    pub fn with_timeout(
        url: impl Into<String>,
        version: impl Into<String>,
        api_key: impl Into<String>,
        timeout_secs: Option<u64>,
    ) -> Result<Self> {
        Ok(Self {
            url: url.into(),
            version: version.into(),
            api_key: api_key.into(),
            client: build_client(timeout_secs)?,
        })
    }

    pub fn from_config(config: &common::WatsonConfig, api_key: &str) -> Result<Self> {
        Self::with_timeout(config.url(), config.version(), api_key, config.timeout_seconds)
    }

    /// Request entity and concept extraction for `text`, returning the raw response body.
    /// The text is sent exactly as given.
    pub async fn analyze(&self, text: &str) -> Result<String> {
        let req_body = AnalyzeRequest {
            text,
            features: Features {
                entities: EntitiesFeature {
                    emotion: false,
                    sentiment: false,
                    limit: ENTITY_LIMIT,
                },
                concepts: ConceptsFeature {
                    limit: CONCEPT_LIMIT,
                },
            },
        };
        debug!("watson: posting {} chars to {}", text.chars().count(), self.url);

        // Basic auth with the literal user "apikey"
        let response = self
            .client
            .post(&self.url)
            .query(&[("version", self.version.as_str())])
            .basic_auth("apikey", Some(&self.api_key))
            .json(&req_body)
            .send()
            .await
            .context("Watson HTTP request failed")?;

        read_success_body(SERVICE, response).await
    }
}

#[derive(Debug, Serialize)]
struct AnalyzeRequest<'a> {
    text: &'a str,
    features: Features,
}

#[derive(Debug, Serialize)]
struct Features {
    entities: EntitiesFeature,
    concepts: ConceptsFeature,
}

#[derive(Debug, Serialize)]
struct EntitiesFeature {
    emotion: bool,
    sentiment: bool,
    limit: u32,
}

#[derive(Debug, Serialize)]
struct ConceptsFeature {
    limit: u32,
}

#[derive(Debug, Deserialize)]
struct AnalyzeResponse {
    entities: Vec<Entity>,
    #[serde(default)]
    concepts: Vec<Concept>,
}

#[derive(Debug, Deserialize)]
struct Entity {
    #[serde(rename = "type")]
    kind: String,
    text: String,
    relevance: f64,
}

#[derive(Debug, Deserialize)]
struct Concept {
    text: String,
    relevance: f64,
}

fn entity_kind(kind: &str) -> Option<EntityKind> {
    match kind {
        "Company" | "Organization" => Some(EntityKind::Organization),
        "Person" => Some(EntityKind::Person),
        _ => None,
    }
}

/// Decode an analyze response. Every matching entity occurrence becomes one
/// record; nothing is merged or deduplicated.
pub fn parse_watson_response(body: &str) -> Result<WatsonEntities> {
    let response: AnalyzeResponse =
        serde_json::from_str(body).map_err(|e| TaxcatError::malformed(SERVICE, e.to_string()))?;

    let mut out = WatsonEntities::default();
    for entity in response.entities {
        let record = ScoredEntity {
            name: entity.text,
            relevance: entity.relevance,
        };
        match entity_kind(&entity.kind) {
            Some(EntityKind::Organization) => out.organizations.push(record),
            Some(EntityKind::Person) => out.people.push(record),
            None => {}
        }
    }

    if let Some(top) = response.concepts.first() {
        debug!("watson: top concept {} ({})", top.text, top.relevance);
    }
    info!(
        "watson: {} organizations, {} people, {} concepts",
        out.organizations.len(),
        out.people.len(),
        response.concepts.len()
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_companies_and_organizations_are_both_organizations() {
        let json = r#"{
            "language": "en",
            "entities": [
                {"type":"Company","text":"Toyota","relevance":0.91,"count":2},
                {"type":"Organization","text":"WIDE Project","relevance":0.52,"count":1},
                {"type":"Person","text":"Henry Ford","relevance":0.83,"count":1},
                {"type":"Location","text":"Detroit","relevance":0.4,"count":1}
            ],
            "concepts": [{"text":"Automobile","relevance":0.9,"dbpedia_resource":"http://dbpedia.org/resource/Automobile"}]
        }"#;

        let parsed = parse_watson_response(json).expect("parse");
        assert_eq!(
            parsed.organizations,
            vec![
                ScoredEntity { name: "Toyota".into(), relevance: 0.91 },
                ScoredEntity { name: "WIDE Project".into(), relevance: 0.52 },
            ]
        );
        assert_eq!(parsed.people, vec![ScoredEntity { name: "Henry Ford".into(), relevance: 0.83 }]);
    }

    #[test]
    fn test_repeated_entities_are_kept() {
        let json = r#"{"entities":[
            {"type":"Company","text":"Toyota","relevance":0.9},
            {"type":"Company","text":"Toyota","relevance":0.9}
        ]}"#;
        let parsed = parse_watson_response(json).expect("parse");
        assert_eq!(parsed.organizations.len(), 2);
    }

    #[test]
    fn test_missing_entities_key_is_malformed() {
        let err = parse_watson_response(r#"{"concepts":[]}"#).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TaxcatError>(),
            Some(TaxcatError::MalformedResponse { service: "watson", .. })
        ));
    }

    #[test]
    fn test_request_body_has_expected_features() {
        let req = AnalyzeRequest {
            text: "hello",
            features: Features {
                entities: EntitiesFeature { emotion: false, sentiment: false, limit: ENTITY_LIMIT },
                concepts: ConceptsFeature { limit: CONCEPT_LIMIT },
            },
        };
        let value = serde_json::to_value(&req).expect("serialize");
        assert_eq!(
            value,
            serde_json::json!({
                "text": "hello",
                "features": {
                    "entities": {"emotion": false, "sentiment": false, "limit": 50},
                    "concepts": {"limit": 8}
                }
            })
        );
    }
}
