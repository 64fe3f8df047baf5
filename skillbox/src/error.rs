//! Error types for the skillbox framework.
//!
//! Each concern carries its own `thiserror` enum: [`SkillError`] for skill
//! domain logic, [`RegistryError`] for name lookups, and [`PipelineError`]
//! for pipeline bookkeeping. Domain errors never cross the execution
//! envelope — they are converted into failure responses there.

/// Error type for skill domain logic.
///
/// Returned by [`Skill::process`](crate::skill::Skill::process) when a
/// request cannot be satisfied. The execution envelope converts these into
/// `success = false` responses; they never propagate past it.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SkillError {
    /// A required parameter was absent or empty.
    #[error("missing required parameter: {0}")]
    MissingParameter(String),

    /// A parameter was present but malformed.
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter {
        /// Name of the offending parameter.
        name: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// The requested action is not provided by this skill.
    #[error("unknown action: {0}")]
    UnknownAction(String),

    /// Domain logic failed.
    #[error("{0}")]
    Execution(String),

    /// HTTP transport failure.
    #[cfg(feature = "web")]
    #[error("http: {0}")]
    Http(#[from] reqwest::Error),
}

impl SkillError {
    /// Create a missing-parameter error.
    #[inline]
    pub fn missing(name: impl Into<String>) -> Self {
        Self::MissingParameter(name.into())
    }

    /// Create an invalid-parameter error.
    #[inline]
    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create an unknown-action error.
    #[inline]
    pub fn unknown_action(action: impl Into<String>) -> Self {
        Self::UnknownAction(action.into())
    }

    /// Create an execution error.
    #[inline]
    pub fn execution(msg: impl Into<String>) -> Self {
        Self::Execution(msg.into())
    }
}

/// Result type alias for skill domain logic.
pub type SkillResult<T> = std::result::Result<T, SkillError>;

/// Error type for registry operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// A skill with the same name is already registered. Existing entries
    /// are never overwritten.
    #[error("skill '{0}' is already registered")]
    Duplicate(String),

    /// No skill is registered under the given name.
    #[error("no skill registered under name '{0}'")]
    NotFound(String),
}

/// Result type alias for registry operations.
pub type RegistryResult<T> = std::result::Result<T, RegistryError>;

/// Error type describing why a pipeline stopped early.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PipelineError {
    /// A step referenced a skill name the registry does not hold. The step
    /// never executed, so no step result is recorded for it.
    #[error("step {step}: failed to resolve skill '{name}': {source}")]
    Resolution {
        /// Zero-based index of the unresolvable step.
        step: usize,
        /// The name that failed to resolve.
        name: String,
        /// The underlying registry failure.
        source: RegistryError,
    },

    /// A step referenced a skill by name but the pipeline has no registry.
    #[error("step {step}: skill '{name}' is referenced by name, but the pipeline has no registry")]
    NoRegistry {
        /// Zero-based index of the unresolvable step.
        step: usize,
        /// The name that could not be resolved.
        name: String,
    },

    /// A step's skill reported failure; the remaining steps were skipped.
    #[error("step {step} ({skill}/{action}) failed: {message}")]
    StepFailed {
        /// Zero-based index of the failed step.
        step: usize,
        /// Name of the skill that failed.
        skill: String,
        /// The action that was requested.
        action: String,
        /// The error reported by the skill's response.
        message: String,
    },

    /// Execution was cancelled at a step boundary.
    #[error("pipeline execution was interrupted")]
    Interrupted,
}

// Wire representation: the display string.
impl serde::Serialize for PipelineError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skill_error_helpers() {
        let err = SkillError::missing("text");
        assert!(matches!(err, SkillError::MissingParameter(_)));
        assert_eq!(err.to_string(), "missing required parameter: text");

        let err = SkillError::invalid("selector", "malformed");
        assert_eq!(err.to_string(), "invalid parameter 'selector': malformed");

        let err = SkillError::unknown_action("fly");
        assert_eq!(err.to_string(), "unknown action: fly");
    }

    #[test]
    fn registry_error_display() {
        let err = RegistryError::Duplicate("math".to_string());
        assert_eq!(err.to_string(), "skill 'math' is already registered");

        let err = RegistryError::NotFound("math".to_string());
        assert_eq!(err.to_string(), "no skill registered under name 'math'");
    }

    #[test]
    fn pipeline_error_serializes_as_string() {
        let err = PipelineError::Resolution {
            step: 1,
            name: "missing".to_string(),
            source: RegistryError::NotFound("missing".to_string()),
        };
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(
            json,
            serde_json::Value::String(
                "step 1: failed to resolve skill 'missing': \
                 no skill registered under name 'missing'"
                    .to_string()
            )
        );
    }
}
