use anyhow::Result;
use tracing::info;

use crate::analysis::AzureEntities;
use crate::error::TaxcatError;
use crate::host::{HostPlatform, Taxonomy};

/// Replace the post's `organization` and `people` terms with the names found
/// by the Organization/Person extractor.
///
/// Organizations are written first. If the people step fails the organization
/// terms stay updated; the returned `TermWrite` error names the taxonomy that
/// was not written.
pub async fn write_taxonomies<H: HostPlatform + ?Sized>(
    host: &H,
    post_id: u64,
    entities: &AzureEntities,
) -> Result<()> {
    let plan = [
        (Taxonomy::Organization, entities.organization_names()),
        (Taxonomy::People, entities.person_names()),
    ];

    for (taxonomy, names) in plan {
        host.replace_terms(post_id, taxonomy, &names)
            .await
            .map_err(|source| TaxcatError::TermWrite {
                post_id,
                taxonomy,
                source,
            })?;
        info!("taxonomy: post {} {} = {:?}", post_id, taxonomy, names);
    }

    Ok(())
}
