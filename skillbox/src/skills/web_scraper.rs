//! Web scraping skill: structured extraction via CSS selectors.

use async_trait::async_trait;
use scraper::{Html, Selector};
use serde_json::{Map, Value, json};

use crate::error::SkillError;
use crate::model::{Params, params_from};
use crate::skill::Skill;

use super::http;

/// Scrape web pages for structured content.
///
/// Actions:
/// - `extract_meta`: page title, meta description and Open Graph tags
/// - `extract_elements`: elements matching a CSS `selector` parameter
#[derive(Debug, Clone, Copy)]
#[non_exhaustive]
pub struct WebScraperSkill {
    /// Timeout applied when the request carries no `timeout` parameter.
    pub default_timeout_secs: u64,
}

impl Default for WebScraperSkill {
    fn default() -> Self {
        Self {
            default_timeout_secs: http::DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl WebScraperSkill {
    /// Create a web scraper skill with the default timeout.
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

    async fn fetch_html(
        &self,
        url: &str,
        parameters: &Params,
    ) -> Result<(String, String), SkillError> {
        let response = http::get(url, parameters, self.default_timeout_secs).await?;
        let final_url = response.url().to_string();
        let body = response.text().await?;
        Ok((final_url, body))
    }
}

/// Parse a CSS selector, mapping failures onto the skill error taxonomy.
fn parse_selector(selector: &str) -> Result<Selector, SkillError> {
    Selector::parse(selector)
        .map_err(|e| SkillError::invalid("selector", format!("malformed CSS selector: {e}")))
}

fn meta_from_html(html: &str, final_url: &str) -> Params {
    let document = Html::parse_document(html);

    let title = parse_selector("title")
        .ok()
        .and_then(|sel| {
            document
                .select(&sel)
                .next()
                .map(|el| el.text().collect::<String>().trim().to_string())
        })
        .unwrap_or_default();

    let description = parse_selector(r#"meta[name="description"]"#)
        .ok()
        .and_then(|sel| {
            document
                .select(&sel)
                .next()
                .and_then(|el| el.value().attr("content"))
                .map(str::to_string)
        })
        .unwrap_or_default();

    let mut og_tags = Map::new();
    if let Ok(sel) = parse_selector("meta[property]") {
        for element in document.select(&sel) {
            let Some(property) = element.value().attr("property") else {
                continue;
            };
            if property.starts_with("og:") {
                let content = element.value().attr("content").unwrap_or_default();
                og_tags.insert(property.to_string(), Value::String(content.to_string()));
            }
        }
    }

    params_from(json!({
        "url": final_url,
        "title": title,
        "description": description,
        "og_tags": og_tags,
    }))
}

fn elements_from_html(
    html: &str,
    selector: &str,
    final_url: &str,
) -> Result<Params, SkillError> {
    let parsed = parse_selector(selector)?;
    let document = Html::parse_document(html);

    let elements: Vec<Value> = document
        .select(&parsed)
        .map(|element| {
            let attrs: Map<String, Value> = element
                .value()
                .attrs()
                .map(|(name, value)| (name.to_string(), Value::String(value.to_string())))
                .collect();
            json!({
                "tag": element.value().name(),
                "text": element.text().collect::<String>().trim(),
                "attrs": attrs,
            })
        })
        .collect();

    Ok(params_from(json!({
        "url": final_url,
        "selector": selector,
        "element_count": elements.len(),
        "elements": elements,
    })))
}

#[async_trait]
impl Skill for WebScraperSkill {
    fn name(&self) -> &str {
        "web-scraper"
    }

    fn description(&self) -> String {
        "Scrape web pages for metadata and CSS-selected elements".to_string()
    }

    fn actions(&self) -> Vec<&'static str> {
        vec!["extract_meta", "extract_elements"]
    }

    async fn process(&self, action: &str, parameters: &Params) -> Result<Params, SkillError> {
        let url = http::required_url(parameters)?;
        match action {
            "extract_meta" => {
                let (final_url, body) = self.fetch_html(url, parameters).await?;
                Ok(meta_from_html(&body, &final_url))
            }
            "extract_elements" => {
                let selector = parameters
                    .get("selector")
                    .and_then(Value::as_str)
                    .filter(|s| !s.is_empty())
                    .ok_or_else(|| SkillError::missing("selector"))?;
                // Reject malformed selectors before touching the network.
                parse_selector(selector)?;
                let (final_url, body) = self.fetch_html(url, parameters).await?;
                elements_from_html(&body, selector, &final_url)
            }
            other => Err(SkillError::unknown_action(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html>
<head>
  <title> Fixture Page </title>
  <meta name="description" content="A small fixture">
  <meta property="og:title" content="Fixture">
  <meta property="og:type" content="website">
  <meta property="unrelated" content="skipped">
</head>
<body>
  <div class="item" data-id="1">First</div>
  <div class="item" data-id="2">Second</div>
  <div class="other">Ignored</div>
</body>
</html>"#;

    #[test]
    fn meta_extraction_collects_title_description_and_og_tags() {
        let result = meta_from_html(PAGE, "https://example.com/");

        assert_eq!(result.get("title"), Some(&json!("Fixture Page")));
        assert_eq!(result.get("description"), Some(&json!("A small fixture")));
        let og_tags = result.get("og_tags").and_then(Value::as_object).unwrap();
        assert_eq!(og_tags.get("og:title"), Some(&json!("Fixture")));
        assert_eq!(og_tags.get("og:type"), Some(&json!("website")));
        assert!(!og_tags.contains_key("unrelated"));
    }

    #[test]
    fn element_extraction_returns_tag_text_and_attrs() {
        let result = elements_from_html(PAGE, "div.item", "https://example.com/").unwrap();

        assert_eq!(result.get("element_count"), Some(&json!(2)));
        let elements = result.get("elements").and_then(Value::as_array).unwrap();
        assert_eq!(elements[0]["tag"], json!("div"));
        assert_eq!(elements[0]["text"], json!("First"));
        assert_eq!(elements[0]["attrs"]["data-id"], json!("1"));
        assert_eq!(elements[1]["text"], json!("Second"));
    }

    #[test]
    fn malformed_selector_is_rejected() {
        let err = elements_from_html(PAGE, "div[", "https://example.com/").unwrap_err();
        assert!(matches!(err, SkillError::InvalidParameter { .. }));
    }

    #[tokio::test]
    async fn extract_elements_requires_a_selector() {
        let skill = WebScraperSkill::new();
        let err = skill
            .process(
                "extract_elements",
                &params_from(json!({"url": "https://example.com"})),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SkillError::MissingParameter(_)));
    }

    #[tokio::test]
    async fn unknown_action_is_rejected() {
        let skill = WebScraperSkill::new();
        let err = skill
            .process(
                "extract_tables",
                &params_from(json!({"url": "https://example.com"})),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SkillError::UnknownAction(_)));
    }
}
