// Run a local text or HTML file through both text-analysis services and print
// what would be written, without touching any post.
//
//   cargo run --bin analyze_text -- article.html

use common::{Config, Secrets};
use std::path::Path;
use taxcat::analysis::azure::{parse_azure_response, AzureClient};
use taxcat::analysis::watson::{parse_watson_response, WatsonClient};
use taxcat::report::print_entity_tables;
use taxcat::text::prepare_for_azure;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_writer(std::io::stderr)
        .init();

    dotenv::dotenv().ok();

    let path = std::env::args()
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("usage: analyze_text <FILE>"))?;
    let content = tokio::fs::read_to_string(&path).await?;

    let config = Config::load_with_defaults(
        Some(Path::new("config.default.toml")),
        Some(Path::new("config.toml")),
    )
    .await?;
    let secrets = Secrets::from_env(&config)?;

    println!("\n{}", "=".repeat(60));
    println!("Analyzing: {}", path);
    println!("Azure:  {}", config.azure.url());
    println!("Watson: {}", config.watson.url());
    println!("{}", "=".repeat(60));

    let azure = AzureClient::from_config(&config.azure, &secrets.azure_key)?;
    let watson = WatsonClient::from_config(&config.watson, &secrets.watson_key)?;

    let prepared = prepare_for_azure(&content);
    println!("\n[Azure] sending {} chars", prepared.chars().count());
    let azure_entities = parse_azure_response(&azure.analyze(&prepared).await?)?;

    println!("[Watson] sending {} chars", content.chars().count());
    let watson_entities = parse_watson_response(&watson.analyze(&content).await?)?;

    println!("\nOrganizations");
    print_entity_tables(&mut std::io::stdout(), &azure_entities, &watson_entities)?;

    println!("\nOrganization terms: {:?}", azure_entities.organization_names());
    println!("People terms:       {:?}", azure_entities.person_names());
    Ok(())
}
