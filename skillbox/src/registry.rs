//! Thread-safe name → skill lookup table.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{RegistryError, RegistryResult};
use crate::model::SkillDescriptor;
use crate::skill::{SharedSkill, Skill};

/// Thread-safe registry mapping unique skill names to shared skill
/// instances.
///
/// All operations serialize through one read-write lock: mutations are
/// exclusive with each other and with reads, so concurrent registration and
/// lookup never observe a partially updated mapping. Enumeration returns
/// owned snapshots that are unaffected by later mutation.
///
/// Names are case-sensitive and unique; registering a duplicate is
/// rejected, never silently overwritten. Entries keep their insertion
/// order.
///
/// There is no process-wide default registry: construct one at startup and
/// pass it (typically as an `Arc`) to whichever components need it.
#[derive(Default)]
pub struct SkillRegistry {
    skills: RwLock<IndexMap<String, SharedSkill>>,
}

impl fmt::Debug for SkillRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SkillRegistry").finish_non_exhaustive()
    }
}

impl SkillRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a skill under its own name.
    ///
    /// # Errors
    ///
    /// [`RegistryError::Duplicate`] if a skill with the same name is
    /// already registered.
    pub async fn register<S: Skill + 'static>(&self, skill: S) -> RegistryResult<()> {
        self.register_shared(Arc::new(skill)).await
    }

    /// Register an already-shared skill handle.
    ///
    /// Useful when one instance should live in several registries.
    ///
    /// # Errors
    ///
    /// [`RegistryError::Duplicate`] if a skill with the same name is
    /// already registered.
    pub async fn register_shared(&self, skill: SharedSkill) -> RegistryResult<()> {
        let name = skill.name().to_string();
        let mut skills = self.skills.write().await;
        if skills.contains_key(&name) {
            return Err(RegistryError::Duplicate(name));
        }
        debug!(skill = %name, "registered skill");
        skills.insert(name, skill);
        Ok(())
    }

    /// Look up a skill by name.
    ///
    /// # Errors
    ///
    /// [`RegistryError::NotFound`] if no skill is registered under `name`.
    pub async fn get(&self, name: &str) -> RegistryResult<SharedSkill> {
        let skills = self.skills.read().await;
        skills
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    /// Remove and return a skill.
    ///
    /// Removing an unknown name is an error, not a silent no-op, so
    /// mutation outcomes stay observable.
    ///
    /// # Errors
    ///
    /// [`RegistryError::NotFound`] if no skill is registered under `name`.
    pub async fn unregister(&self, name: &str) -> RegistryResult<SharedSkill> {
        let mut skills = self.skills.write().await;
        // shift_remove keeps the insertion order of the remaining entries.
        let removed = skills
            .shift_remove(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;
        debug!(skill = %name, "unregistered skill");
        Ok(removed)
    }

    /// Whether a skill is registered under `name`.
    pub async fn contains(&self, name: &str) -> bool {
        self.skills.read().await.contains_key(name)
    }

    /// Number of registered skills.
    pub async fn len(&self) -> usize {
        self.skills.read().await.len()
    }

    /// Whether the registry holds no skills.
    pub async fn is_empty(&self) -> bool {
        self.skills.read().await.is_empty()
    }

    /// Remove all registered skills.
    pub async fn clear(&self) {
        self.skills.write().await.clear();
    }

    /// Snapshot of all registered names, in insertion order.
    ///
    /// The returned vector is owned and unaffected by later mutation of the
    /// registry.
    pub async fn skill_names(&self) -> Vec<String> {
        self.skills.read().await.keys().cloned().collect()
    }

    /// Descriptors for every registered skill, in insertion order.
    pub async fn describe_all(&self) -> Vec<SkillDescriptor> {
        self.skills
            .read()
            .await
            .values()
            .map(|skill| skill.describe())
            .collect()
    }
}
