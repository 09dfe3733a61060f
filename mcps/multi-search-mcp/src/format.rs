//! Text rendering of search results
//!
//! Output shape:
//!
//! ```text
//! Web Search Results for 'rust ownership' (via Google):
//!
//! 1. **What is Ownership?**
//!    Ownership is a set of rules...
//!    https://doc.rust-lang.org/book/ch04-01-what-is-ownership.html
//!
//! 2. ...
//! ```

use crate::types::SearchResult;

pub const ELLIPSIS: &str = "...";

/// Shorten `result.snippet` to exactly `max_len` characters ending in "..."
/// when it is longer than `max_len`. A `max_len` of 0 disables truncation.
///
/// Limits shorter than the ellipsis get a plain cut with no "...".
/// Lengths count chars, so multi-byte text is never split mid-character.
pub fn truncate_snippet(result: &mut SearchResult, max_len: usize) {
    if max_len == 0 || result.snippet.chars().count() <= max_len {
        return;
    }

    let (keep, suffix) = if max_len < ELLIPSIS.len() {
        (max_len, "")
    } else {
        (max_len - ELLIPSIS.len(), ELLIPSIS)
    };
    let cut = result
        .snippet
        .char_indices()
        .nth(keep)
        .map_or(result.snippet.len(), |(idx, _)| idx);
    result.snippet.truncate(cut);
    result.snippet.push_str(suffix);
}

pub fn truncate_all(results: &mut [SearchResult], max_len: usize) {
    for result in results {
        truncate_snippet(result, max_len);
    }
}

/// Render results as a numbered list under a header naming the query and,
/// when given, the provider that answered.
pub fn format_results(results: &[SearchResult], query: &str, provider: Option<&str>) -> String {
    let header = match provider {
        Some(label) => format!("Web Search Results for '{}' (via {}):", query, label),
        None => format!("Web Search Results for '{}':", query),
    };

    let entries: Vec<String> = results
        .iter()
        .enumerate()
        .map(|(i, r)| format!("{}. **{}**\n   {}\n   {}\n", i + 1, r.title, r.snippet, r.link))
        .collect();

    format!("{}\n\n{}", header, entries.join("\n"))
}

/// Reply used when every provider came back empty or failed
pub fn no_results_message(query: &str) -> String {
    format!(
        "No results found for query: {}. All available search engines were tried.",
        query
    )
}
