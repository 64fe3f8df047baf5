//! Request and response data model shared by skills, registries and
//! pipelines.
//!
//! All types here are JSON-serializable: they form the wire contract at the
//! process boundary. [`SkillRequest`] and [`SkillResponse`] round-trip
//! losslessly through their wire representation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// String-keyed mapping of arbitrary JSON values, used for parameters,
/// results and pass-through context.
pub type Params = serde_json::Map<String, Value>;

/// Convert a `serde_json::json!` object literal into [`Params`].
///
/// Non-object values yield an empty map.
#[must_use]
pub fn params_from(value: Value) -> Params {
    match value {
        Value::Object(map) => map,
        _ => Params::new(),
    }
}

/// Input for a single skill execution.
///
/// Constructed once and treated as immutable by the core; `context` is
/// opaque pass-through data that the framework never interprets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillRequest {
    /// The action to perform.
    pub action: String,
    /// Action parameters.
    #[serde(default)]
    pub parameters: Params,
    /// Opaque execution context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Params>,
}

impl SkillRequest {
    /// Create a request for `action` with empty parameters.
    #[must_use]
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            parameters: Params::new(),
            context: None,
        }
    }

    /// Set the action parameters.
    #[must_use]
    pub fn with_parameters(mut self, parameters: Params) -> Self {
        self.parameters = parameters;
        self
    }

    /// Attach opaque context, forwarded untouched alongside the request.
    #[must_use]
    pub fn with_context(mut self, context: Params) -> Self {
        self.context = Some(context);
        self
    }
}

/// Metadata attached to every [`SkillResponse`] by the execution envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseMetadata {
    /// Wall-clock duration of the `process` call in milliseconds. Never
    /// negative.
    pub execution_time_ms: f64,
    /// Name of the skill that produced the response.
    pub skill: String,
    /// Version of the skill that produced the response.
    pub version: String,
    /// Forward-compatible extra metadata keys.
    #[serde(flatten)]
    pub extra: Params,
}

/// Outcome of a single skill execution.
///
/// Exactly one of `result` / `error` is populated, matching `success`.
/// Shaped only by the execution envelope — skill domain logic returns plain
/// result mappings and never constructs responses itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillResponse {
    /// Whether the action succeeded.
    pub success: bool,
    /// Action result data, present iff `success`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Params>,
    /// Error message, present iff not `success`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Execution metadata.
    pub metadata: ResponseMetadata,
}

impl SkillResponse {
    pub(crate) fn ok(result: Params, metadata: ResponseMetadata) -> Self {
        Self {
            success: true,
            result: Some(result),
            error: None,
            metadata,
        }
    }

    pub(crate) fn failure(error: impl Into<String>, metadata: ResponseMetadata) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(error.into()),
            metadata,
        }
    }
}

/// Static capability metadata for a skill, returned by
/// [`Skill::describe`](crate::skill::Skill::describe) without invoking any
/// domain logic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillDescriptor {
    /// Unique skill name.
    pub name: String,
    /// Skill version string.
    pub version: String,
    /// Human-readable description.
    pub description: String,
    /// Supported actions, when statically known.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn params_from_object() {
        let params = params_from(json!({"text": "hello", "n": 3}));
        assert_eq!(params.get("text"), Some(&json!("hello")));
        assert_eq!(params.get("n"), Some(&json!(3)));
    }

    #[test]
    fn params_from_non_object_is_empty() {
        assert!(params_from(json!([1, 2, 3])).is_empty());
        assert!(params_from(json!("text")).is_empty());
    }

    #[test]
    fn request_builder() {
        let request = SkillRequest::new("analyze")
            .with_parameters(params_from(json!({"text": "hi"})))
            .with_context(params_from(json!({"user_id": "u1"})));
        assert_eq!(request.action, "analyze");
        assert_eq!(request.parameters.get("text"), Some(&json!("hi")));
        assert!(request.context.is_some());
    }

    #[test]
    fn request_round_trip() {
        let request = SkillRequest::new("analyze")
            .with_parameters(params_from(json!({"text": "hi"})));
        let encoded = serde_json::to_string(&request).unwrap();
        let decoded: SkillRequest = serde_json::from_str(&encoded).unwrap();
        assert_eq!(request, decoded);
    }

    #[test]
    fn response_round_trip() {
        let response = SkillResponse::ok(
            params_from(json!({"word_count": 2})),
            ResponseMetadata {
                execution_time_ms: 1.5,
                skill: "text-analyzer".to_string(),
                version: "1.0.0".to_string(),
                extra: Params::new(),
            },
        );
        let encoded = serde_json::to_string(&response).unwrap();
        let decoded: SkillResponse = serde_json::from_str(&encoded).unwrap();
        assert_eq!(response, decoded);
    }

    #[test]
    fn failure_response_round_trip() {
        let response = SkillResponse::failure(
            "unknown action: fly",
            ResponseMetadata {
                execution_time_ms: 0.2,
                skill: "math".to_string(),
                version: "1.0.0".to_string(),
                extra: params_from(json!({"attempt": 1})),
            },
        );
        let encoded = serde_json::to_value(&response).unwrap();
        // The flattened extra key sits next to the fixed metadata keys.
        assert_eq!(encoded["metadata"]["attempt"], json!(1));
        assert!(encoded.get("result").is_none());

        let decoded: SkillResponse = serde_json::from_value(encoded).unwrap();
        assert_eq!(response, decoded);
    }

    #[test]
    fn wire_shape_omits_absent_fields() {
        let response = SkillResponse::ok(
            Params::new(),
            ResponseMetadata {
                execution_time_ms: 0.0,
                skill: "s".to_string(),
                version: "1".to_string(),
                extra: Params::new(),
            },
        );
        let encoded = serde_json::to_value(&response).unwrap();
        assert!(encoded.get("error").is_none());
        assert!(encoded.get("result").is_some());
    }
}
