//! The skill contract and its execution envelope.
//!
//! A [`Skill`] is a named, versioned unit of capability selected by an
//! action string. Implementations provide [`Skill::process`] — the domain
//! logic — and inherit [`Skill::execute`], the envelope every caller and
//! pipeline goes through. The envelope times the call, validates the
//! request, and converts every failure into a structured response:
//! nothing above it fails on behalf of a skill's domain logic.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use futures::FutureExt;
use tracing::{debug, warn};

use crate::error::SkillError;
use crate::model::{Params, ResponseMetadata, SkillDescriptor, SkillRequest, SkillResponse};

/// Shared handle to a skill.
///
/// Skills are reference-counted so a single instance can live in several
/// registries and pipelines at once; they are expected to be stateless or
/// internally synchronized.
pub type SharedSkill = Arc<dyn Skill>;

/// A named, versioned unit of capability invoked by action + parameters.
///
/// Implementations only supply domain logic via [`process`](Self::process);
/// timing, validation and failure shaping belong to the provided
/// [`execute`](Self::execute) envelope. The `Send + Sync` bound plus the
/// shared `&self` receiver make concurrent `execute` calls on one instance
/// safe; skills with interior mutable state synchronize it themselves.
#[async_trait]
pub trait Skill: Send + Sync {
    /// Unique name identifying this skill within a registry.
    fn name(&self) -> &str;

    /// Skill version string.
    fn version(&self) -> &str {
        "1.0.0"
    }

    /// Human-readable description of the capability.
    fn description(&self) -> String {
        String::new()
    }

    /// Supported actions, when statically known. An empty vector means the
    /// action set is not declared.
    fn actions(&self) -> Vec<&'static str> {
        Vec::new()
    }

    /// Perform the domain logic for `action`.
    ///
    /// Fails with a [`SkillError`] when the request cannot be satisfied
    /// (unknown action, missing or invalid parameter, domain failure).
    /// Must not measure time or shape responses.
    async fn process(&self, action: &str, parameters: &Params) -> Result<Params, SkillError>;

    /// Execute a request through the envelope.
    ///
    /// Never fails: domain errors and panics raised inside
    /// [`process`](Self::process) are converted into `success = false`
    /// responses with a descriptive message. The wall-clock duration of the
    /// call is recorded in `metadata.execution_time_ms`.
    async fn execute(&self, request: SkillRequest) -> SkillResponse {
        let started = Instant::now();

        if request.action.is_empty() {
            return SkillResponse::failure(
                "missing required field: action",
                envelope_metadata(self.name(), self.version(), started),
            );
        }

        let outcome = AssertUnwindSafe(self.process(&request.action, &request.parameters))
            .catch_unwind()
            .await;

        let metadata = envelope_metadata(self.name(), self.version(), started);

        match outcome {
            Ok(Ok(result)) => {
                debug!(
                    skill = self.name(),
                    action = %request.action,
                    elapsed_ms = metadata.execution_time_ms,
                    "skill execution succeeded"
                );
                SkillResponse::ok(result, metadata)
            }
            Ok(Err(err)) => {
                warn!(
                    skill = self.name(),
                    action = %request.action,
                    error = %err,
                    "skill execution failed"
                );
                SkillResponse::failure(err.to_string(), metadata)
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                warn!(
                    skill = self.name(),
                    action = %request.action,
                    panic = %message,
                    "skill execution panicked"
                );
                SkillResponse::failure(format!("skill panicked: {message}"), metadata)
            }
        }
    }

    /// Static capability metadata. Never invokes [`process`](Self::process).
    fn describe(&self) -> SkillDescriptor {
        SkillDescriptor {
            name: self.name().to_string(),
            version: self.version().to_string(),
            description: self.description(),
            actions: self.actions().iter().map(|a| (*a).to_string()).collect(),
        }
    }
}

fn envelope_metadata(name: &str, version: &str, started: Instant) -> ResponseMetadata {
    ResponseMetadata {
        execution_time_ms: started.elapsed().as_secs_f64() * 1000.0,
        skill: name.to_string(),
        version: version.to_string(),
        extra: Params::new(),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
