//! Built-in skills implementing the skill contract.
//!
//! Text analysis and math evaluation are always available; the web skills
//! pull optional HTTP and HTML dependencies and sit behind the `web` and
//! `scrape` features.

mod math;
mod text_analyzer;

#[cfg(feature = "web")]
mod http;
#[cfg(feature = "web")]
mod web_fetch;
#[cfg(feature = "scrape")]
mod web_scraper;

pub use math::MathSkill;
pub use text_analyzer::TextAnalyzerSkill;
#[cfg(feature = "web")]
pub use web_fetch::WebFetchSkill;
#[cfg(feature = "scrape")]
pub use web_scraper::WebScraperSkill;

use crate::error::RegistryResult;
use crate::registry::SkillRegistry;

/// Names of the built-in skills.
pub const BUILTIN_SKILL_NAMES: &[&str] = &["text-analyzer", "math", "web-fetch", "web-scraper"];

/// Register every built-in skill available under the enabled features.
///
/// # Errors
///
/// [`crate::error::RegistryError::Duplicate`] if one of the built-in names
/// is already taken in `registry`.
pub async fn register_builtin(registry: &SkillRegistry) -> RegistryResult<()> {
    registry.register(TextAnalyzerSkill::new()).await?;
    registry.register(MathSkill::new()).await?;
    #[cfg(feature = "web")]
    registry.register(WebFetchSkill::new()).await?;
    #[cfg(feature = "scrape")]
    registry.register(WebScraperSkill::new()).await?;
    Ok(())
}
