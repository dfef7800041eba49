//! Recent-post retrieval through the generation backend.
//!
//! The backend is asked, with a search tool bound, for the handle's
//! recent posts as a JSON array. Models routinely wrap or mangle that
//! array, so extraction mirrors the pipeline's parsing posture: salvage
//! the bracketed JSON first, fall back to numbered-line scanning, and
//! treat an empty result as a valid answer rather than an error.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use llm_gateway::{GatewayError, GenerationClient, ToolSpec};

/// One retrieved post.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Post {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub date: String,
}

fn json_array_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[[\s\S]*\]").unwrap())
}

fn search_tool() -> ToolSpec {
    ToolSpec::new(
        "search_posts",
        "Search the social platform for a user's most recent posts",
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {"type": "string", "description": "Search query, e.g. from:username"},
                "max_results": {"type": "integer"}
            },
            "required": ["query"]
        }),
    )
}

/// Fetch up to `max_results` recent posts for `handle`. Returns an empty
/// list when none are found; only backend unavailability is an error.
pub async fn fetch_recent_posts(
    client: &GenerationClient,
    handle: &str,
    max_results: usize,
) -> Result<Vec<Post>, GatewayError> {
    let handle = handle.trim_start_matches('@');
    let prompt = format!(
        "Search for the most recent {max_results} posts from:{handle}. \
         Return the results as a JSON array of objects, each with 'id', \
         'text', and 'date' fields."
    );

    let content = client.complete(&prompt, None, &[search_tool()]).await?;
    Ok(parse_posts(&content))
}

/// Extract posts from the completion text. Pure; used directly by tests.
pub fn parse_posts(content: &str) -> Vec<Post> {
    if let Some(found) = json_array_re().find(content) {
        if let Ok(posts) = serde_json::from_str::<Vec<Post>>(found.as_str()) {
            return posts
                .into_iter()
                .filter(|p| !p.text.trim().is_empty())
                .collect();
        }
    }

    // Numbered-line fallback: `1. "text"` with Date:/ID: continuation
    // lines.
    let mut posts: Vec<Post> = Vec::new();
    let mut current = Post::default();
    for line in content.lines() {
        let line = line.trim();
        let numbered = line
            .chars()
            .next()
            .map(|c| c.is_ascii_digit())
            .unwrap_or(false)
            && line.contains('.');

        if numbered {
            if !current.text.is_empty() {
                posts.push(std::mem::take(&mut current));
            }
            if let Some((_, text)) = line.split_once(": ") {
                current.text = text.trim_matches('"').to_string();
            }
        } else if let Some((_, date)) = line.split_once("Date:") {
            current.date = date.trim().to_string();
        } else if let Some((_, id)) = line.split_once("ID:") {
            current.id = id.trim().to_string();
        }
    }
    if !current.text.is_empty() {
        posts.push(current);
    }

    posts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_posts_json_array() {
        let content = r#"Here are the posts:
[
  {"id": "1", "text": "Loving my new smartphone", "date": "2024-12-01"},
  {"id": "2", "text": "Great workout today", "date": "2024-12-02"}
]"#;

        let posts = parse_posts(content);
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].text, "Loving my new smartphone");
        assert_eq!(posts[1].date, "2024-12-02");
    }

    #[test]
    fn test_parse_posts_numbered_lines() {
        let content = "1. Post: \"Loving my new smartphone\"\n   Date: 2024-12-01\n   ID: 1\n2. Post: \"Great workout\"\n   Date: 2024-12-02\n   ID: 2";

        let posts = parse_posts(content);
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].text, "Loving my new smartphone");
        assert_eq!(posts[0].id, "1");
        assert_eq!(posts[1].text, "Great workout");
    }

    #[test]
    fn test_parse_posts_nothing_found() {
        assert!(parse_posts("I could not find any posts.").is_empty());
    }

    #[test]
    fn test_parse_posts_skips_empty_text() {
        let content = r#"[{"id": "1", "text": "", "date": ""}, {"id": "2", "text": "hi", "date": ""}]"#;
        let posts = parse_posts(content);
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].text, "hi");
    }
}
