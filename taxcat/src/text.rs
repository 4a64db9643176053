use scraper::Html;
use tracing::{debug, warn};

/// Upper bound on the text handed to the Organization/Person extractor.
pub const AZURE_MAX_CHARS: usize = 5000;

/// Cleaned posts shorter than this are replaced by [`SHORT_TEXT_PLACEHOLDER`].
pub const AZURE_MIN_CHARS: usize = 50;

/// Sent instead of the post body when there is too little text to analyse.
pub const SHORT_TEXT_PLACEHOLDER: &str = "Failed to send post to Azure endpoint, either post_content is to short or empty, or other error has occured";

/// Drop every tag from `html`, keeping only text nodes.
pub fn strip_tags(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    fragment.root_element().text().collect()
}

/// Prepare a raw post body for the Organization/Person extractor: plain text,
/// at most [`AZURE_MAX_CHARS`] characters, and the placeholder when the
/// result is shorter than [`AZURE_MIN_CHARS`].
pub fn prepare_for_azure(content: &str) -> String {
    let plain = strip_tags(content);
    let text = truncate_chars(&plain, AZURE_MAX_CHARS);

    let chars = text.chars().count();
    if chars < AZURE_MIN_CHARS {
        warn!("text: post has only {} chars of plain text, sending placeholder", chars);
        return SHORT_TEXT_PLACEHOLDER.to_string();
    }

    debug!("text: prepared {} chars for entity extraction", chars);
    text.to_string()
}

/// Cut `s` after `max` characters, never inside a code point.
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
