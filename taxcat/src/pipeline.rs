use anyhow::{Context, Result};
use common::{Config, Secrets};
use tracing::info;

use crate::analysis::azure::{parse_azure_response, AzureClient};
use crate::analysis::watson::{parse_watson_response, WatsonClient};
use crate::analysis::{AzureEntities, WatsonEntities};
use crate::host::HostPlatform;
use crate::report::ResultsFile;
use crate::taxonomy::write_taxonomies;
use crate::text::prepare_for_azure;

/// Everything a run extracted, for printing.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub post_id: u64,
    pub azure: AzureEntities,
    pub watson: WatsonEntities,
}

/// One post in, taxonomy terms and a results file out.
pub struct Pipeline {
    azure: AzureClient,
    watson: WatsonClient,
    results: ResultsFile,
}

impl Pipeline {
    pub fn new(azure: AzureClient, watson: WatsonClient, results: ResultsFile) -> Self {
        Self {
            azure,
            watson,
            results,
        }
    }

    pub fn from_config(config: &Config, secrets: &Secrets) -> Result<Self> {
        Ok(Self::new(
            AzureClient::from_config(&config.azure, &secrets.azure_key)?,
            WatsonClient::from_config(&config.watson, &secrets.watson_key)?,
            ResultsFile::new(config.report.results_path()),
        ))
    }

    /// Validate both service secrets through `lookup` before building anything.
    pub fn from_lookup<F>(config: &Config, lookup: &F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secrets = Secrets::resolve(config, lookup)?;
        Self::from_config(config, &secrets)
    }

    pub fn results(&self) -> &ResultsFile {
        &self.results
    }

    /// Run the whole enrichment for `post_id`.
    ///
    /// Steps run strictly in order and the first error aborts the run. Any
    /// failure before the taxonomy step leaves the post untouched.
    pub async fn run<H: HostPlatform + ?Sized>(&self, host: &H, post_id: u64) -> Result<RunReport> {
        self.results.reset().await?;

        let content = host
            .fetch_post_content(post_id)
            .await
            .with_context(|| format!("failed to fetch post {}", post_id))?;

        let watson_raw = self.watson.analyze(&content).await?;
        let azure_raw = self.azure.analyze(&prepare_for_azure(&content)).await?;

        let azure = parse_azure_response(&azure_raw)?;
        let watson = parse_watson_response(&watson_raw)?;

        write_taxonomies(host, post_id, &azure).await?;
        self.results.append_response(&watson_raw).await?;

        info!(
            "pipeline: post {} tagged with {} organizations and {} people",
            post_id,
            azure.organization_names().len(),
            azure.person_names().len()
        );

        Ok(RunReport {
            post_id,
            azure,
            watson,
        })
    }
}
