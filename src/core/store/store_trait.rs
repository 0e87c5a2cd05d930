use crate::core::messages::EncryptionKey;
use crate::core::KerberosPrincipal;
use crate::Result;

/// Long term secret of a principal.
#[derive(Clone, PartialEq, Eq)]
pub enum PrincipalSecret {
    /// Password, keys are derived on demand for the requested etype.
    Password(String),
    /// Key already derived, only usable for its own etype.
    Key(EncryptionKey),
}

impl std::fmt::Debug for PrincipalSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrincipalSecret::Password(_) => write!(f, "Password(<redacted>)"),
            PrincipalSecret::Key(key) => write!(f, "Key({:?})", key),
        }
    }
}

/// Lookup of the secrets of the principals known to the KDC.
pub trait PrincipalStore: Send + Sync {
    fn id(&self) -> &str;

    /// Retrieves the secret of the principal, `None` if it is unknown.
    fn get_secret(
        &self,
        principal: &KerberosPrincipal,
    ) -> Result<Option<PrincipalSecret>>;

    /// Add or replace the secret of a principal.
    fn add(
        &mut self,
        principal: KerberosPrincipal,
        secret: PrincipalSecret,
    ) -> Result<()>;
}
