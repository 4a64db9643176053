use anyhow::{Context, Result};
use tokio::process::Command;
use tracing::{debug, info};

use super::{HostPlatform, Taxonomy, Term};
use crate::error::TaxcatError;

/// Host adapter shelling out to the `wp` command line tool.
///
/// Every value is passed as its own argv entry; nothing goes through a shell,
/// so term names with quotes or spaces need no escaping.
#[derive(Debug, Clone)]
pub struct WpCli {
    binary: String,
    wordpress_path: Option<String>,
}

impl WpCli {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            wordpress_path: None,
        }
    }

    pub fn with_wordpress_path(mut self, path: impl Into<String>) -> Self {
        self.wordpress_path = Some(path.into());
        self
    }

    pub fn from_config(config: &common::WpCliConfig) -> Self {
        let cli = Self::new(config.binary.clone().unwrap_or_else(|| "wp".to_string()));
        match &config.wordpress_path {
            Some(path) => cli.with_wordpress_path(path.clone()),
            None => cli,
        }
    }

    /// Full argv for a `wp` invocation, global options last.
    pub fn command_args(&self, args: Vec<String>) -> Vec<String> {
        let mut full = args;
        if let Some(path) = &self.wordpress_path {
            full.push(format!("--path={}", path));
        }
        full
    }

    async fn run(&self, args: Vec<String>) -> Result<String> {
        let argv = self.command_args(args);
        debug!("wp-cli: {} {}", self.binary, argv.join(" "));

        let output = Command::new(&self.binary)
            .args(&argv)
            .output()
            .await
            .with_context(|| format!("failed to run `{}`", self.binary))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(TaxcatError::Host(format!("`wp {}` failed: {}", argv.join(" "), stderr)).into());
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

pub fn post_get_args(post_id: u64) -> Vec<String> {
    vec![
        "post".into(),
        "get".into(),
        post_id.to_string(),
        "--field=post_content".into(),
        "--format=json".into(),
    ]
}

pub fn term_list_args(post_id: u64, taxonomy: Taxonomy) -> Vec<String> {
    vec![
        "post".into(),
        "term".into(),
        "list".into(),
        post_id.to_string(),
        taxonomy.as_str().into(),
        "--format=json".into(),
        "--fields=term_id,name,slug,taxonomy".into(),
    ]
}

/// `post term set` replaces the whole set in one call but needs at least one
/// term, so an empty set becomes `post term remove --all`.
pub fn term_replace_args(post_id: u64, taxonomy: Taxonomy, names: &[String]) -> Vec<String> {
    let mut args: Vec<String> = vec!["post".into(), "term".into()];
    if names.is_empty() {
        args.extend(["remove".into(), post_id.to_string(), taxonomy.as_str().into(), "--all".into()]);
    } else {
        args.extend(["set".into(), post_id.to_string(), taxonomy.as_str().into()]);
        args.extend(names.iter().cloned());
    }
    args
}

#[async_trait::async_trait]
impl HostPlatform for WpCli {
    async fn fetch_post_content(&self, post_id: u64) -> Result<String> {
        let stdout = match self.run(post_get_args(post_id)).await {
            Ok(out) => out,
            Err(e) => {
                if e.to_string().contains("Could not find the post") {
                    return Err(TaxcatError::PostNotFound(post_id).into());
                }
                return Err(e);
            }
        };

        let content: String = serde_json::from_str(stdout.trim())
            .with_context(|| format!("unexpected `wp post get` output for post {}", post_id))?;
        info!("wp-cli: fetched post {} ({} chars)", post_id, content.chars().count());
        Ok(content)
    }

    async fn list_terms(&self, post_id: u64, taxonomy: Taxonomy) -> Result<Vec<Term>> {
        let stdout = self.run(term_list_args(post_id, taxonomy)).await?;
        if stdout.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(stdout.trim())
            .with_context(|| format!("unexpected `wp post term list` output for post {}", post_id))
    }

    async fn replace_terms(&self, post_id: u64, taxonomy: Taxonomy, names: &[String]) -> Result<()> {
        self.run(term_replace_args(post_id, taxonomy, names)).await?;
        info!("wp-cli: post {} now has {} {} terms", post_id, names.len(), taxonomy);
        Ok(())
    }
}
