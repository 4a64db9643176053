use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::analysis::{AzureEntities, WatsonEntities};
use crate::host::Term;

/// First line of every results file.
pub const RESULTS_HEADER: &str = "Results Below\n\n";

/// The results file holding the latest raw general-extractor response.
/// Its contents only ever describe the current run.
#[derive(Debug, Clone)]
pub struct ResultsFile {
    path: PathBuf,
}

impl ResultsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Truncate the file down to the header.
    pub async fn reset(&self) -> Result<()> {
        tokio::fs::write(&self.path, RESULTS_HEADER)
            .await
            .with_context(|| format!("failed to reset results file {}", self.path.display()))
    }

    /// Append `raw_json` pretty-printed with a four-space indent.
    pub async fn append_response(&self, raw_json: &str) -> Result<()> {
        let value: serde_json::Value =
            serde_json::from_str(raw_json).context("results payload is not valid JSON")?;

        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        value
            .serialize(&mut ser)
            .context("failed to pretty-print results payload")?;

        let mut file = tokio::fs::OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .await
            .with_context(|| format!("failed to open results file {}", self.path.display()))?;
        file.write_all(&buf)
            .await
            .with_context(|| format!("failed to write results file {}", self.path.display()))?;
        file.flush().await?;

        info!("report: wrote {} bytes to {}", buf.len(), self.path.display());
        Ok(())
    }
}

/// Pick `columns` out of each serialized record, in order. Missing fields render empty.
pub fn records_to_rows<T: Serialize>(records: &[T], columns: &[&str]) -> Vec<Vec<String>> {
    records
        .iter()
        .map(|record| {
            let value = serde_json::to_value(record).unwrap_or(serde_json::Value::Null);
            columns
                .iter()
                .map(|column| match value.get(*column) {
                    Some(serde_json::Value::String(s)) => s.clone(),
                    Some(serde_json::Value::Null) | None => String::new(),
                    Some(other) => other.to_string(),
                })
                .collect()
        })
        .collect()
}

/// Render a bordered ASCII table:
///
/// ```text
/// +------+-----------+
/// | name | relevance |
/// +------+-----------+
/// | Acme | 0.9       |
/// +------+-----------+
/// ```
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(index, header)| {
            rows.iter()
                .filter_map(|row| row.get(index))
                .map(|cell| cell.chars().count())
                .max()
                .unwrap_or(0)
                .max(header.chars().count())
        })
        .collect();

    let border = format!(
        "+{}+",
        widths
            .iter()
            .map(|w| "-".repeat(w + 2))
            .collect::<Vec<_>>()
            .join("+")
    );

    let line = |cells: Vec<&str>| -> String {
        let inner = cells
            .iter()
            .zip(widths.iter())
            .map(|(cell, width)| {
                let pad = width - cell.chars().count();
                format!(" {}{} ", cell, " ".repeat(pad))
            })
            .collect::<Vec<_>>()
            .join("|");
        format!("|{}|", inner)
    };

    let mut lines = Vec::with_capacity(rows.len() + 4);
    lines.push(border.clone());
    lines.push(line(headers.to_vec()));
    lines.push(border.clone());
    for row in rows {
        let cells = (0..headers.len())
            .map(|i| row.get(i).map(String::as_str).unwrap_or(""))
            .collect();
        lines.push(line(cells));
    }
    lines.push(border);
    lines.join("\n")
}

/// Print the organization tables of both services.
pub fn print_entity_tables<W: Write>(
    out: &mut W,
    azure: &AzureEntities,
    watson: &WatsonEntities,
) -> std::io::Result<()> {
    let azure_columns = ["name", "WikiScore", "EntityScore"];
    writeln!(
        out,
        "{}",
        render_table(&azure_columns, &records_to_rows(&azure.organizations, &azure_columns))
    )?;

    let watson_columns = ["name", "relevance"];
    writeln!(
        out,
        "{}",
        render_table(&watson_columns, &records_to_rows(&watson.organizations, &watson_columns))
    )?;
    Ok(())
}

/// Print a post's terms for one taxonomy.
pub fn print_term_table<W: Write>(out: &mut W, terms: &[Term]) -> std::io::Result<()> {
    let columns = ["term_id", "name", "slug", "taxonomy"];
    writeln!(out, "{}", render_table(&columns, &records_to_rows(terms, &columns)))
}
