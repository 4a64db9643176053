use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, info};

use super::{HostPlatform, Taxonomy, Term};
use crate::analysis::build_client;
use crate::error::TaxcatError;
use crate::text::strip_tags;

const PER_PAGE: &str = "100";

/// Host adapter for the WordPress REST API, authenticated with an
/// application password.
///
/// Custom taxonomies are expected under their own name, i.e.
/// `/wp-json/wp/v2/organization` and `/wp-json/wp/v2/people`.
pub struct WpRest {
    base_url: String,
    username: String,
    password: String,
    client: reqwest::Client,
}

impl WpRest {
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self> {
        Self::with_timeout(base_url, username, password, None)
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        timeout_secs: Option<u64>,
    ) -> Result<Self> {
        let base_url = base_url.into();
        url::Url::parse(&base_url).with_context(|| format!("invalid WordPress base URL: {}", base_url))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            username: username.into(),
            password: password.into(),
            client: build_client(timeout_secs)?,
        })
    }

    pub fn from_config(config: &common::RestHostConfig, password: String) -> Result<Self> {
        Self::with_timeout(
            config.base_url.clone(),
            config.username.clone(),
            password,
            config.timeout_seconds,
        )
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/wp-json/wp/v2/{}", self.base_url, path)
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .get(self.api_url(path))
            .basic_auth(&self.username, Some(&self.password))
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .post(self.api_url(path))
            .basic_auth(&self.username, Some(&self.password))
    }

    /// Id of the term called `name`, creating it when the taxonomy has none.
    async fn resolve_term_id(&self, taxonomy: Taxonomy, name: &str) -> Result<u64> {
        let response = self
            .get(taxonomy.as_str())
            .query(&[("search", name), ("per_page", PER_PAGE)])
            .send()
            .await
            .context("WordPress term search failed")?;
        let candidates: Vec<RestTerm> = expect_success(response, "term search")
            .await?
            .json()
            .await
            .context("failed to decode term search response")?;

        // names come back HTML-escaped ("Ben &amp; Jerry's")
        if let Some(found) = candidates.iter().find(|t| strip_tags(&t.name) == name) {
            debug!("rest: {} term {:?} exists as {}", taxonomy, name, found.id);
            return Ok(found.id);
        }

        let response = self
            .post(taxonomy.as_str())
            .json(&serde_json::json!({ "name": name }))
            .send()
            .await
            .context("WordPress term creation failed")?;

        if response.status() == StatusCode::BAD_REQUEST {
            let body = response.text().await.unwrap_or_default();
            if let Ok(err) = serde_json::from_str::<RestError>(&body) {
                if err.code == "term_exists" {
                    if let Some(id) = err.data.and_then(|d| d.term_id) {
                        return Ok(id);
                    }
                }
            }
            return Err(TaxcatError::Host(format!("term creation rejected (400): {}", body)).into());
        }

        let created: RestTerm = expect_success(response, "term creation")
            .await?
            .json()
            .await
            .context("failed to decode created term")?;
        info!("rest: created {} term {:?} ({})", taxonomy, name, created.id);
        Ok(created.id)
    }
}

async fn expect_success(response: reqwest::Response, what: &str) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(TaxcatError::Host(format!("{} failed with status {}: {}", what, status, body)).into())
}

#[derive(Debug, Deserialize)]
struct RestPost {
    content: RestContent,
}

#[derive(Debug, Deserialize)]
struct RestContent {
    #[serde(default)]
    raw: Option<String>,
    #[serde(default)]
    rendered: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RestTerm {
    id: u64,
    name: String,
    #[serde(default)]
    slug: String,
    #[serde(default)]
    taxonomy: String,
}

#[derive(Debug, Deserialize)]
struct RestError {
    code: String,
    #[serde(default)]
    data: Option<RestErrorData>,
}

#[derive(Debug, Deserialize)]
struct RestErrorData {
    #[serde(default)]
    term_id: Option<u64>,
}

#[async_trait::async_trait]
impl HostPlatform for WpRest {
    async fn fetch_post_content(&self, post_id: u64) -> Result<String> {
        let response = self
            .get(&format!("posts/{}", post_id))
            .query(&[("context", "edit")])
            .send()
            .await
            .context("WordPress post request failed")?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(TaxcatError::PostNotFound(post_id).into());
        }

        let post: RestPost = expect_success(response, "post fetch")
            .await?
            .json()
            .await
            .context("failed to decode WordPress post")?;

        let content = post
            .content
            .raw
            .or(post.content.rendered)
            .ok_or_else(|| TaxcatError::Host(format!("post {} has no content field", post_id)))?;
        info!("rest: fetched post {} ({} chars)", post_id, content.chars().count());
        Ok(content)
    }

    async fn list_terms(&self, post_id: u64, taxonomy: Taxonomy) -> Result<Vec<Term>> {
        let post = post_id.to_string();
        let response = self
            .get(taxonomy.as_str())
            .query(&[("post", post.as_str()), ("per_page", PER_PAGE)])
            .send()
            .await
            .context("WordPress term listing failed")?;

        let terms: Vec<RestTerm> = expect_success(response, "term listing")
            .await?
            .json()
            .await
            .context("failed to decode term listing")?;

        Ok(terms
            .into_iter()
            .map(|t| Term {
                term_id: t.id,
                name: strip_tags(&t.name),
                slug: t.slug,
                taxonomy: t.taxonomy,
            })
            .collect())
    }

    async fn replace_terms(&self, post_id: u64, taxonomy: Taxonomy, names: &[String]) -> Result<()> {
        let mut ids = Vec::with_capacity(names.len());
        for name in names {
            ids.push(self.resolve_term_id(taxonomy, name).await?);
        }

        // a single post update swaps the whole set
        let mut body = serde_json::Map::new();
        body.insert(taxonomy.as_str().to_string(), serde_json::json!(ids));

        let response = self
            .post(&format!("posts/{}", post_id))
            .json(&body)
            .send()
            .await
            .context("WordPress post update failed")?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(TaxcatError::PostNotFound(post_id).into());
        }
        expect_success(response, "post update").await?;

        info!("rest: post {} now has {} {} terms", post_id, ids.len(), taxonomy);
        Ok(())
    }
}
