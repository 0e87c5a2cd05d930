use super::{PrincipalSecret, PrincipalStore};
use crate::core::KerberosPrincipal;
use crate::Result;
use std::collections::HashMap;

/// Store kept in memory, filled by the caller at startup.
#[derive(Debug, Default)]
pub struct MemoryStore {
    secrets: HashMap<KerberosPrincipal, PrincipalSecret>,
}

impl MemoryStore {
    pub fn new() -> Self {
        return Self::default();
    }

    pub fn len(&self) -> usize {
        return self.secrets.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.secrets.is_empty();
    }
}

impl PrincipalStore for MemoryStore {
    fn id(&self) -> &str {
        return "Memory";
    }

    fn get_secret(
        &self,
        principal: &KerberosPrincipal,
    ) -> Result<Option<PrincipalSecret>> {
        return Ok(self.secrets.get(principal).cloned());
    }

    fn add(
        &mut self,
        principal: KerberosPrincipal,
        secret: PrincipalSecret,
    ) -> Result<()> {
        self.secrets.insert(principal, secret);
        return Ok(());
    }
}
