//! Identifier newtypes
//!
//! Type-safe wrappers so registry keys and tenant ids cannot be swapped.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Key of a vendor profile in the registry (e.g. `sp_richards`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VendorId(String);

impl VendorId {
    /// Create a vendor id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derive a registry key from a display name.
    ///
    /// Lowercases, keeps ASCII alphanumerics and collapses everything else
    /// into single underscores.
    #[must_use]
    pub fn slugify(name: &str) -> Self {
        let mut slug = String::with_capacity(name.len());
        let mut pending_sep = false;
        for c in name.chars() {
            if c.is_ascii_alphanumeric() {
                if pending_sep && !slug.is_empty() {
                    slug.push('_');
                }
                pending_sep = false;
                slug.push(c.to_ascii_lowercase());
            } else {
                pending_sep = true;
            }
        }
        Self(slug)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for VendorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VendorId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for VendorId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for VendorId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Unique identifier for a tenant of the commerce platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(Uuid);

impl TenantId {
    /// Create a new random TenantId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a TenantId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID value.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for TenantId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TenantId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl From<Uuid> for TenantId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(VendorId::slugify("Acme Supply Co.").as_str(), "acme_supply_co");
        assert_eq!(VendorId::slugify("  S.P. Richards  ").as_str(), "s_p_richards");
        assert!(VendorId::slugify("!!!").is_empty());
    }

    #[test]
    fn test_vendor_id_serializes_transparently() {
        let id = VendorId::new("essendant");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"essendant\"");
    }

    #[test]
    fn test_tenant_id_parse() {
        let id = TenantId::new();
        let parsed: TenantId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }
}
