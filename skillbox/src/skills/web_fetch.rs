//! Web fetching skill built on `reqwest` and regex-based extraction.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use reqwest::header::CONTENT_TYPE;
use serde_json::json;

use crate::error::SkillError;
use crate::model::{Params, params_from};
use crate::skill::Skill;

use super::http;

static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<a\s+[^>]*href=["']([^"']+)["']"#).expect("valid regex"));
static SCRIPT_STYLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script[^>]*>.*?</script>|<style[^>]*>.*?</style>").expect("valid regex")
});
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Fetch web pages and extract basic content.
///
/// Actions:
/// - `fetch`: retrieve a URL and return status, content type and body
/// - `extract_links`: all `<a href>` targets on a page
/// - `extract_text`: the page body with markup stripped
///
/// Requests honor the optional `timeout` (seconds) and `headers`
/// parameters; redirects are followed.
#[derive(Debug, Clone, Copy)]
#[non_exhaustive]
pub struct WebFetchSkill {
    /// Timeout applied when the request carries no `timeout` parameter.
    pub default_timeout_secs: u64,
}

impl Default for WebFetchSkill {
    fn default() -> Self {
        Self {
            default_timeout_secs: http::DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl WebFetchSkill {
    /// Create a web fetch skill with the default timeout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, secs: u64) -> Self {
        self.default_timeout_secs = secs;
        self
    }

    async fn fetch(&self, url: &str, parameters: &Params) -> Result<Params, SkillError> {
        let response = http::get(url, parameters, self.default_timeout_secs).await?;
        let final_url = response.url().to_string();
        let status_code = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let content = response.text().await?;

        Ok(params_from(json!({
            "url": final_url,
            "status_code": status_code,
            "content_type": content_type,
            "content_length": content.chars().count(),
            "content": content,
        })))
    }

    async fn extract_links(&self, url: &str, parameters: &Params) -> Result<Params, SkillError> {
        let response = http::get(url, parameters, self.default_timeout_secs).await?;
        let final_url = response.url().to_string();
        let body = response.text().await?;
        let links = links_from_html(&body);

        Ok(params_from(json!({
            "url": final_url,
            "link_count": links.len(),
            "links": links,
        })))
    }

    async fn extract_text(&self, url: &str, parameters: &Params) -> Result<Params, SkillError> {
        let response = http::get(url, parameters, self.default_timeout_secs).await?;
        let final_url = response.url().to_string();
        let body = response.text().await?;
        let text = text_from_html(&body);

        Ok(params_from(json!({
            "url": final_url,
            "text_length": text.chars().count(),
            "text": text,
        })))
    }
}

/// Extract all `<a href="...">` targets.
fn links_from_html(html: &str) -> Vec<String> {
    LINK_RE
        .captures_iter(html)
        .map(|c| c[1].to_string())
        .collect()
}

/// Strip script/style blocks and markup, then normalize whitespace.
fn text_from_html(html: &str) -> String {
    let without_blocks = SCRIPT_STYLE_RE.replace_all(html, "");
    let without_tags = TAG_RE.replace_all(&without_blocks, " ");
    WHITESPACE_RE
        .replace_all(&without_tags, " ")
        .trim()
        .to_string()
}

#[async_trait]
impl Skill for WebFetchSkill {
    fn name(&self) -> &str {
        "web-fetch"
    }

    fn description(&self) -> String {
        "Fetch web pages and extract links or plain text".to_string()
    }

    fn actions(&self) -> Vec<&'static str> {
        vec!["fetch", "extract_links", "extract_text"]
    }

    async fn process(&self, action: &str, parameters: &Params) -> Result<Params, SkillError> {
        let url = http::required_url(parameters)?;
        match action {
            "fetch" => self.fetch(url, parameters).await,
            "extract_links" => self.extract_links(url, parameters).await,
            "extract_text" => self.extract_text(url, parameters).await,
            other => Err(SkillError::unknown_action(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html>
<head><title>Fixture</title><style>body { color: red; }</style></head>
<body>
  <script>console.log("ignored");</script>
  <h1>Heading</h1>
  <p>Some <b>bold</b> text.</p>
  <a href="https://example.com/a">first</a>
  <a class="nav" href="/relative">second</a>
</body>
</html>"#;

    #[test]
    fn links_are_extracted_in_document_order() {
        let links = links_from_html(PAGE);
        assert_eq!(links, vec!["https://example.com/a", "/relative"]);
    }

    #[test]
    fn text_strips_markup_scripts_and_styles() {
        let text = text_from_html(PAGE);
        assert!(text.contains("Heading"));
        assert!(text.contains("Some bold text."));
        assert!(!text.contains("console.log"));
        assert!(!text.contains("color: red"));
        assert!(!text.contains('<'));
    }

    #[tokio::test]
    async fn missing_url_is_rejected_before_any_request() {
        let skill = WebFetchSkill::new();
        let err = skill.process("fetch", &Params::new()).await.unwrap_err();
        assert!(matches!(err, SkillError::MissingParameter(_)));
    }

    #[tokio::test]
    async fn unknown_action_is_rejected_before_any_request() {
        let skill = WebFetchSkill::new();
        let err = skill
            .process(
                "post",
                &crate::model::params_from(serde_json::json!({"url": "https://example.com"})),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SkillError::UnknownAction(_)));
    }

    #[test]
    fn timeout_builder() {
        let skill = WebFetchSkill::new().with_timeout(3);
        assert_eq!(skill.default_timeout_secs, 3);
    }
}
