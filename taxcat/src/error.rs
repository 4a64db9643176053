use thiserror::Error;

use crate::host::Taxonomy;

/// Failure kinds callers may want to tell apart. Everything else travels as
/// plain `anyhow` context.
#[derive(Debug, Error)]
pub enum TaxcatError {
    #[error("{service} API error {status}: {body}")]
    ServiceStatus {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("{service} returned a malformed response: {reason}")]
    MalformedResponse { service: &'static str, reason: String },

    #[error("post {0} not found on host platform")]
    PostNotFound(u64),

    #[error("host platform error: {0}")]
    Host(String),

    #[error("failed to replace `{taxonomy}` terms on post {post_id}")]
    TermWrite {
        post_id: u64,
        taxonomy: Taxonomy,
        #[source]
        source: anyhow::Error,
    },
}

impl TaxcatError {
    pub fn malformed(service: &'static str, reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            service,
            reason: reason.into(),
        }
    }
}
