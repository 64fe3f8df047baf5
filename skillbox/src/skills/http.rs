//! Shared HTTP plumbing for the web skills.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use serde_json::Value;

use crate::error::SkillError;
use crate::model::Params;

pub(crate) const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_USER_AGENT: &str = concat!("skillbox/", env!("CARGO_PKG_VERSION"));

/// Pull and validate the `url` parameter.
pub(crate) fn required_url(parameters: &Params) -> Result<&str, SkillError> {
    let url = parameters
        .get("url")
        .and_then(Value::as_str)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| SkillError::missing("url"))?;
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(SkillError::invalid(
            "url",
            "must start with http:// or https://",
        ));
    }
    Ok(url)
}

/// Default headers merged with any overrides from the `headers` parameter.
fn request_headers(parameters: &Params) -> Result<HeaderMap, SkillError> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));

    let Some(overrides) = parameters.get("headers").and_then(Value::as_object) else {
        return Ok(headers);
    };
    for (name, value) in overrides {
        let name = HeaderName::try_from(name.as_str())
            .map_err(|_| SkillError::invalid("headers", format!("bad header name '{name}'")))?;
        let value = value
            .as_str()
            .and_then(|v| HeaderValue::from_str(v).ok())
            .ok_or_else(|| {
                SkillError::invalid("headers", format!("bad value for header '{name}'"))
            })?;
        headers.insert(name, value);
    }
    Ok(headers)
}

/// Perform a GET request, honoring the optional `timeout` (seconds) and
/// `headers` parameters. Redirects are followed.
pub(crate) async fn get(
    url: &str,
    parameters: &Params,
    default_timeout_secs: u64,
) -> Result<reqwest::Response, SkillError> {
    let timeout = parameters
        .get("timeout")
        .and_then(Value::as_u64)
        .unwrap_or(default_timeout_secs);

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout))
        .default_headers(request_headers(parameters)?)
        .build()?;

    Ok(client.get(url).send().await?)
}
