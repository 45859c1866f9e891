use crate::error::RegistryError;
use crate::playbook::Playbook;
use std::sync::Arc;

/// Append-only, name-keyed playbook registry.
///
/// Registration order is the fallback arm order when no ranker output is
/// usable.
#[derive(Default, Clone)]
pub struct PlaybookRegistry {
    entries: Vec<Arc<dyn Playbook>>,
}

impl PlaybookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, playbook: Arc<dyn Playbook>) -> Result<(), RegistryError> {
        let name = playbook.name();
        if name.trim().is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if self.contains(name) {
            return Err(RegistryError::Duplicate(name.to_string()));
        }
        self.entries.push(playbook);
        Ok(())
    }

    /// Builder-style registration.
    pub fn with(mut self, playbook: Arc<dyn Playbook>) -> Result<Self, RegistryError> {
        self.register(playbook)?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Playbook>> {
        self.entries.iter().find(|p| p.name() == name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|p| p.name() == name)
    }

    /// Names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|p| p.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
