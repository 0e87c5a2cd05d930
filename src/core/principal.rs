use crate::core::messages::{new_nt_principal, new_nt_srv_inst, PrincipalName};
use crate::error::{Error, ProtocolError};
use std::convert::TryFrom;
use std::fmt;

// Principal name packaged with its realm
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct KerberosPrincipal {
    pub name: PrincipalName,
    pub realm: String,
}

impl KerberosPrincipal {
    pub fn new(name: PrincipalName, realm: String) -> Self {
        return Self { name, realm };
    }

    /// Name components joined without separators, as used to salt the
    /// string-to-key function.
    pub fn salt_name(&self) -> String {
        return self.name.name_string.concat();
    }
}

impl fmt::Display for KerberosPrincipal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.realm)
    }
}

/// Parses `name@REALM`. A name with several components, like
/// `krbtgt/EXAMPLE.COM`, is a service instance.
impl TryFrom<&str> for KerberosPrincipal {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let (name, realm) = match value.rfind('@') {
            Some(at) => (&value[..at], &value[at + 1..]),
            None => ("", ""),
        };

        if name.is_empty()
            || realm.is_empty()
            || name.split('/').any(|part| part.is_empty())
        {
            return Err(ProtocolError::invalid(
                "principal",
                format!("'{}' must be <name>@<realm>", value),
            ))?;
        }

        let name = if name.contains('/') {
            new_nt_srv_inst(name)
        } else {
            new_nt_principal(name)
        };

        return Ok(Self::new(name, realm.to_string()));
    }
}

impl TryFrom<&String> for KerberosPrincipal {
    type Error = Error;

    fn try_from(value: &String) -> Result<Self, Self::Error> {
        return Self::try_from(value.as_str());
    }
}

impl TryFrom<String> for KerberosPrincipal {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        return Self::try_from(&value);
    }
}
