//! Skillbox is a small in-process extension framework for building
//! applications out of composable "skills".
//!
//! A skill is a named, versioned unit of capability invoked by an action
//! string and a parameter mapping. Skillbox provides three collaborating
//! pieces around that contract:
//!
//! - **Skill contract & envelope** ([`skill`]) — the [`Skill`] trait plus
//!   the `execute` envelope that times every call and converts every
//!   failure into a structured response.
//! - **Registry** ([`registry`]) — a thread-safe name → skill table with
//!   snapshot enumeration, for lookup by name.
//! - **Pipeline** ([`pipeline`]) — an ordered, fail-fast chain of skill
//!   invocations with inter-step data mapping.
//! - **Built-in skills** ([`skills`]) — text analysis, math evaluation and
//!   (feature-gated) web fetching and scraping.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use serde_json::json;
//! use skillbox::prelude::*;
//! use skillbox::skills::MathSkill;
//!
//! #[tokio::main]
//! async fn main() {
//!     let registry = Arc::new(SkillRegistry::new());
//!     registry.register(MathSkill::new()).await.unwrap();
//!
//!     let pipeline = SkillPipeline::with_registry("calc", registry)
//!         .add_step("math", "evaluate");
//!
//!     let result = pipeline
//!         .execute(params_from(json!({"expression": "2+2"})))
//!         .await;
//!     assert!(result.success);
//! }
//! ```
//!
//! # Features
//!
//! - `web` (default) — enables [`skills::WebFetchSkill`] via `reqwest`
//! - `scrape` — enables [`skills::WebScraperSkill`] via `scraper`

pub mod error;
pub mod model;
pub mod pipeline;
pub mod registry;
pub mod skill;
pub mod skills;

pub use error::{PipelineError, RegistryError, SkillError};
pub use model::{Params, SkillDescriptor, SkillRequest, SkillResponse, params_from};
pub use pipeline::{
    CancelToken, ParameterMapper, PipelineResult, PipelineStep, RunConfig, SkillPipeline,
    SkillRef, StepResult,
};
pub use registry::SkillRegistry;
pub use skill::{SharedSkill, Skill};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{
        PipelineError, RegistryError, RegistryResult, SkillError, SkillResult,
    };
    pub use crate::model::{
        Params, ResponseMetadata, SkillDescriptor, SkillRequest, SkillResponse, params_from,
    };
    pub use crate::pipeline::{
        CancelToken, ParameterMapper, PipelineMetadata, PipelineResult, PipelineStep, RunConfig,
        SkillPipeline, SkillRef, StepResult, StepTiming,
    };
    pub use crate::registry::SkillRegistry;
    pub use crate::skill::{SharedSkill, Skill};
    pub use crate::skills::{BUILTIN_SKILL_NAMES, register_builtin};
}
