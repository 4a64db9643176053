use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod rest;
pub mod wpcli;

/// Taxonomies this tool manages on a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Taxonomy {
    Organization,
    People,
}

impl Taxonomy {
    pub const ALL: [Taxonomy; 2] = [Taxonomy::Organization, Taxonomy::People];

    /// Name of the taxonomy as registered on the host platform.
    pub fn as_str(&self) -> &'static str {
        match self {
            Taxonomy::Organization => "organization",
            Taxonomy::People => "people",
        }
    }
}

impl fmt::Display for Taxonomy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A term attached to a post, as reported by the host platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Term {
    pub term_id: u64,
    pub name: String,
    pub slug: String,
    pub taxonomy: String,
}

/// Operations needed from the content platform hosting the post.
#[async_trait::async_trait]
pub trait HostPlatform: Send + Sync {
    /// Raw body (HTML or text) of the post. Unknown ids are an error.
    async fn fetch_post_content(&self, post_id: u64) -> Result<String>;

    /// Terms of `taxonomy` currently attached to the post.
    async fn list_terms(&self, post_id: u64, taxonomy: Taxonomy) -> Result<Vec<Term>>;

    /// Make the post's `taxonomy` terms exactly `names`, creating missing terms by name.
    /// An empty slice clears the taxonomy.
    async fn replace_terms(&self, post_id: u64, taxonomy: Taxonomy, names: &[String]) -> Result<()>;
}

/// Build the host adapter selected by `host.adapter` (default "wp-cli").
/// `lookup` resolves secrets such as the REST application password.
pub fn create_host_platform<F>(
    config: &common::HostConfig,
    lookup: &F,
) -> Result<Box<dyn HostPlatform>>
where
    F: Fn(&str) -> Option<String>,
{
    let adapter = config.adapter.as_deref().unwrap_or("wp-cli");
    match adapter {
        "wp-cli" => {
            let cli_config = config.wp_cli.clone().unwrap_or_default();
            Ok(Box::new(wpcli::WpCli::from_config(&cli_config)))
        }
        "rest" => {
            let rest_config = config
                .rest
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("host.adapter = \"rest\" requires a [host.rest] section"))?;
            let password = common::require_secret(lookup, rest_config.password_env())?;
            let host = rest::WpRest::from_config(rest_config, password)
                .context("failed to initialize WordPress REST adapter")?;
            Ok(Box::new(host))
        }
        _ => anyhow::bail!("Unknown host adapter type: {}", adapter),
    }
}
