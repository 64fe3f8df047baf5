//! Sequential, fail-fast composition of skills.
//!
//! A [`SkillPipeline`] chains steps, each invoking one skill through the
//! execution envelope. Steps run strictly in declared order — never
//! concurrently, since each step's input may depend on the previous step's
//! output. The first failure aborts the remainder: no retries, no
//! recovery, no silent skipping.
//!
//! Data flows between steps through an optional [`ParameterMapper`]; when a
//! step has none, the previous step's result is passed through unchanged as
//! its parameters.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::PipelineError;
use crate::model::{Params, SkillRequest, SkillResponse};
use crate::registry::SkillRegistry;
use crate::skill::{SharedSkill, Skill};

/// Pure function computing a step's parameters from the previous step's
/// result and the original initial parameters.
pub type ParameterMapper = Arc<dyn Fn(&Params, &Params) -> Params + Send + Sync>;

/// Reference to the skill a pipeline step invokes.
#[derive(Clone)]
pub enum SkillRef {
    /// A direct skill handle.
    Instance(SharedSkill),
    /// A name resolved against the pipeline's registry at execution time.
    Named(String),
}

impl SkillRef {
    /// Wrap a concrete skill as a direct reference.
    pub fn instance<S: Skill + 'static>(skill: S) -> Self {
        Self::Instance(Arc::new(skill))
    }

    /// Reference a skill by registry name.
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    fn display_name(&self) -> &str {
        match self {
            Self::Instance(skill) => skill.name(),
            Self::Named(name) => name,
        }
    }
}

impl fmt::Debug for SkillRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instance(skill) => f.debug_tuple("Instance").field(&skill.name()).finish(),
            Self::Named(name) => f.debug_tuple("Named").field(name).finish(),
        }
    }
}

impl From<SharedSkill> for SkillRef {
    fn from(skill: SharedSkill) -> Self {
        Self::Instance(skill)
    }
}

impl From<&str> for SkillRef {
    fn from(name: &str) -> Self {
        Self::Named(name.to_string())
    }
}

impl From<String> for SkillRef {
    fn from(name: String) -> Self {
        Self::Named(name)
    }
}

/// One step of a pipeline: a skill reference, an action, and an optional
/// parameter mapper. Order among steps is significant and fixed at
/// construction.
#[derive(Clone)]
pub struct PipelineStep {
    /// The skill to invoke.
    pub skill: SkillRef,
    /// The action to request.
    pub action: String,
    /// Parameter mapper; identity pass-through of the previous result when
    /// absent.
    pub mapper: Option<ParameterMapper>,
}

impl fmt::Debug for PipelineStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineStep")
            .field("skill", &self.skill)
            .field("action", &self.action)
            .field("has_mapper", &self.mapper.is_some())
            .finish()
    }
}

/// Outcome of one executed step.
#[derive(Debug, Clone, Serialize)]
pub struct StepResult {
    /// Zero-based position of the step.
    pub index: usize,
    /// Name of the skill that ran.
    pub skill: String,
    /// The action that was requested.
    pub action: String,
    /// The full response produced by the envelope.
    pub response: SkillResponse,
}

/// Per-step timing entry in [`PipelineMetadata`].
#[derive(Debug, Clone, Serialize)]
pub struct StepTiming {
    /// Zero-based position of the step.
    pub step_index: usize,
    /// Name of the skill that ran.
    pub skill: String,
    /// The action that was requested.
    pub action: String,
    /// Envelope-measured duration of the step in milliseconds.
    pub execution_time_ms: f64,
}

/// Aggregated bookkeeping for a pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineMetadata {
    /// Name given to the pipeline at construction.
    pub pipeline_name: String,
    /// Wall-clock duration of the whole run in milliseconds; covers step
    /// execution plus inter-step mapping overhead.
    pub total_execution_time_ms: f64,
    /// Number of declared steps.
    pub step_count: usize,
    /// Number of steps that actually executed.
    pub steps_executed: usize,
    /// Envelope timing for each executed step.
    pub per_step_times: Vec<StepTiming>,
}

/// Aggregated result of a pipeline run.
#[derive(Debug, Serialize)]
pub struct PipelineResult {
    /// True when every declared step ran and succeeded.
    pub success: bool,
    /// Results for the steps that actually executed, in order.
    pub steps: Vec<StepResult>,
    /// Result of the last step; present only on success of the whole
    /// pipeline.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_result: Option<Params>,
    /// Why the pipeline stopped early, when it did.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<PipelineError>,
    /// Index of the step that failed or could not be resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_step: Option<usize>,
    /// Aggregated timing and bookkeeping.
    pub metadata: PipelineMetadata,
}

/// Cooperative cancellation flag checked at step boundaries.
///
/// Cloned handles share one flag. Cancellation takes effect before the next
/// step starts; a step already in flight is never force-terminated by the
/// pipeline.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a token in the not-cancelled state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// True once [`cancel`](Self::cancel) has been called on any clone.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Run-level options for [`SkillPipeline::execute_with`].
#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    /// Opaque context forwarded untouched on every step's request.
    pub context: Option<Params>,
    /// Cancellation flag checked between steps.
    pub cancel: Option<CancelToken>,
}

/// Descriptor of one step, for introspection.
#[derive(Debug, Clone, Serialize)]
pub struct StepDescriptor {
    /// Zero-based position of the step.
    pub index: usize,
    /// Skill name or direct instance name.
    pub skill: String,
    /// The action the step requests.
    pub action: String,
    /// Whether the step carries a parameter mapper.
    pub has_mapper: bool,
}

/// Descriptor of a pipeline, for introspection.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineDescriptor {
    /// The pipeline's name.
    pub name: String,
    /// Number of declared steps.
    pub step_count: usize,
    /// Per-step descriptors.
    pub steps: Vec<StepDescriptor>,
}

/// Ordered, fail-fast chain of skill invocations with inter-step data
/// mapping.
///
/// Built fluently by appending steps; executed with
/// [`execute`](Self::execute). Steps reference skills directly or by name;
/// named references are resolved against the pipeline's registry when the
/// step is about to run.
pub struct SkillPipeline {
    name: String,
    registry: Option<Arc<SkillRegistry>>,
    steps: Vec<PipelineStep>,
}

impl fmt::Debug for SkillPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SkillPipeline")
            .field("name", &self.name)
            .field("steps", &self.steps.len())
            .field("has_registry", &self.registry.is_some())
            .finish()
    }
}

impl SkillPipeline {
    /// Create an empty pipeline without a registry. Every step must carry a
    /// direct skill handle.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            registry: None,
            steps: Vec::new(),
        }
    }

    /// Create an empty pipeline that resolves named steps against
    /// `registry`.
    #[must_use]
    pub fn with_registry(name: impl Into<String>, registry: Arc<SkillRegistry>) -> Self {
        Self {
            name: name.into(),
            registry: Some(registry),
            steps: Vec::new(),
        }
    }

    /// The pipeline's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of declared steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the pipeline has no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The declared steps, in order.
    #[must_use]
    pub fn steps(&self) -> &[PipelineStep] {
        &self.steps
    }

    /// Append a step invoking `action` on `skill`, passing the previous
    /// step's result through unchanged. Returns the pipeline for fluent
    /// chaining.
    #[must_use]
    pub fn add_step(mut self, skill: impl Into<SkillRef>, action: impl Into<String>) -> Self {
        self.steps.push(PipelineStep {
            skill: skill.into(),
            action: action.into(),
            mapper: None,
        });
        self
    }

    /// Append a step whose parameters are computed by `mapper` from the
    /// previous step's result and the original initial parameters.
    #[must_use]
    pub fn add_mapped_step<F>(
        mut self,
        skill: impl Into<SkillRef>,
        action: impl Into<String>,
        mapper: F,
    ) -> Self
    where
        F: Fn(&Params, &Params) -> Params + Send + Sync + 'static,
    {
        self.steps.push(PipelineStep {
            skill: skill.into(),
            action: action.into(),
            mapper: Some(Arc::new(mapper)),
        });
        self
    }

    /// Describe the pipeline for introspection.
    #[must_use]
    pub fn describe(&self) -> PipelineDescriptor {
        PipelineDescriptor {
            name: self.name.clone(),
            step_count: self.steps.len(),
            steps: self
                .steps
                .iter()
                .enumerate()
                .map(|(index, step)| StepDescriptor {
                    index,
                    skill: step.skill.display_name().to_string(),
                    action: step.action.clone(),
                    has_mapper: step.mapper.is_some(),
                })
                .collect(),
        }
    }

    /// Execute the pipeline with default run options.
    pub async fn execute(&self, initial_parameters: Params) -> PipelineResult {
        self.execute_with(initial_parameters, RunConfig::default())
            .await
    }

    /// Execute the pipeline sequentially, stopping at the first failure.
    ///
    /// The first step receives `initial_parameters`; each later step
    /// receives its mapper's output, or the previous step's result
    /// unchanged when it has no mapper. Cancellation is checked before
    /// every step; a step already running is awaited to completion.
    pub async fn execute_with(
        &self,
        initial_parameters: Params,
        config: RunConfig,
    ) -> PipelineResult {
        let started = Instant::now();

        if self.steps.is_empty() {
            return PipelineResult {
                success: true,
                steps: Vec::new(),
                final_result: None,
                error: None,
                failed_step: None,
                metadata: self.run_metadata(started, &[]),
            };
        }

        let initial = initial_parameters;
        let mut executed: Vec<StepResult> = Vec::with_capacity(self.steps.len());
        let mut current = initial.clone();

        for (index, step) in self.steps.iter().enumerate() {
            if config.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
                warn!(pipeline = %self.name, step = index, "pipeline interrupted");
                return self.aborted(executed, index, PipelineError::Interrupted, started);
            }

            let skill = match self.resolve(index, &step.skill).await {
                Ok(skill) => skill,
                Err(err) => {
                    warn!(pipeline = %self.name, step = index, error = %err, "skill resolution failed");
                    return self.aborted(executed, index, err, started);
                }
            };

            let parameters = match &step.mapper {
                Some(mapper) => mapper(&current, &initial),
                None => std::mem::take(&mut current),
            };

            debug!(
                pipeline = %self.name,
                step = index,
                skill = skill.name(),
                action = %step.action,
                "executing step"
            );

            let request = SkillRequest {
                action: step.action.clone(),
                parameters,
                context: config.context.clone(),
            };
            let response = skill.execute(request).await;

            let success = response.success;
            let error_message = response.error.clone();
            let result = response.result.clone();
            executed.push(StepResult {
                index,
                skill: skill.name().to_string(),
                action: step.action.clone(),
                response,
            });

            if !success {
                let err = PipelineError::StepFailed {
                    step: index,
                    skill: skill.name().to_string(),
                    action: step.action.clone(),
                    message: error_message.unwrap_or_else(|| "unknown error".to_string()),
                };
                warn!(pipeline = %self.name, step = index, error = %err, "pipeline aborted");
                return self.aborted(executed, index, err, started);
            }

            current = result.unwrap_or_default();
        }

        let metadata = self.run_metadata(started, &executed);
        debug!(
            pipeline = %self.name,
            steps = executed.len(),
            total_ms = metadata.total_execution_time_ms,
            "pipeline completed"
        );
        PipelineResult {
            success: true,
            steps: executed,
            final_result: Some(current),
            error: None,
            failed_step: None,
            metadata,
        }
    }

    async fn resolve(
        &self,
        step: usize,
        skill: &SkillRef,
    ) -> Result<SharedSkill, PipelineError> {
        match skill {
            SkillRef::Instance(skill) => Ok(Arc::clone(skill)),
            SkillRef::Named(name) => match &self.registry {
                Some(registry) => {
                    registry
                        .get(name)
                        .await
                        .map_err(|source| PipelineError::Resolution {
                            step,
                            name: name.clone(),
                            source,
                        })
                }
                None => Err(PipelineError::NoRegistry {
                    step,
                    name: name.clone(),
                }),
            },
        }
    }

    fn aborted(
        &self,
        executed: Vec<StepResult>,
        failed_step: usize,
        error: PipelineError,
        started: Instant,
    ) -> PipelineResult {
        let metadata = self.run_metadata(started, &executed);
        PipelineResult {
            success: false,
            steps: executed,
            final_result: None,
            error: Some(error),
            failed_step: Some(failed_step),
            metadata,
        }
    }

    fn run_metadata(&self, started: Instant, executed: &[StepResult]) -> PipelineMetadata {
        PipelineMetadata {
            pipeline_name: self.name.clone(),
            total_execution_time_ms: started.elapsed().as_secs_f64() * 1000.0,
            step_count: self.steps.len(),
            steps_executed: executed.len(),
            per_step_times: executed
                .iter()
                .map(|step| StepTiming {
                    step_index: step.index,
                    skill: step.skill.clone(),
                    action: step.action.clone(),
                    execution_time_ms: step.response.metadata.execution_time_ms,
                })
                .collect(),
        }
    }
}
