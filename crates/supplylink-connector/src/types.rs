//! Vendor connector type definitions
//!
//! Enums describing protocols, data domains and vendor lifecycle.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Integration protocol a vendor exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolType {
    /// REST-style HTTP API
    #[default]
    Api,
    /// SFTP file drop
    Sftp,
    /// EDI document exchange
    Edi,
    /// Push-based webhooks
    Webhook,
    /// Vendor-specific HTTP API described entirely by configuration
    Custom,
}

impl ProtocolType {
    /// Get all protocol types.
    #[must_use]
    pub fn all() -> &'static [ProtocolType] {
        &[
            ProtocolType::Api,
            ProtocolType::Sftp,
            ProtocolType::Edi,
            ProtocolType::Webhook,
            ProtocolType::Custom,
        ]
    }

    /// Get the string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ProtocolType::Api => "api",
            ProtocolType::Sftp => "sftp",
            ProtocolType::Edi => "edi",
            ProtocolType::Webhook => "webhook",
            ProtocolType::Custom => "custom",
        }
    }
}

impl fmt::Display for ProtocolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProtocolType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "api" | "rest" => Ok(ProtocolType::Api),
            "sftp" => Ok(ProtocolType::Sftp),
            "edi" => Ok(ProtocolType::Edi),
            "webhook" => Ok(ProtocolType::Webhook),
            "custom" => Ok(ProtocolType::Custom),
            _ => Err(ParseEnumError::new(
                "protocol type",
                s,
                "api, sftp, edi, webhook, custom",
            )),
        }
    }
}

/// Authentication mode declared by a vendor profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuthenticationMode {
    #[default]
    ApiKey,
    #[serde(rename = "oauth2")]
    OAuth2,
    Bearer,
    Basic,
    SftpPassword,
    SftpKey,
    Edi,
    Custom,
    None,
}

impl AuthenticationMode {
    /// Get the string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthenticationMode::ApiKey => "api_key",
            AuthenticationMode::OAuth2 => "oauth2",
            AuthenticationMode::Bearer => "bearer",
            AuthenticationMode::Basic => "basic",
            AuthenticationMode::SftpPassword => "sftp_password",
            AuthenticationMode::SftpKey => "sftp_key",
            AuthenticationMode::Edi => "edi",
            AuthenticationMode::Custom => "custom",
            AuthenticationMode::None => "none",
        }
    }
}

impl fmt::Display for AuthenticationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Wire format of a data domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DataFormat {
    #[default]
    Json,
    Xml,
    Csv,
    Edi,
}

/// A data domain that can be fetched and synced independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataDomain {
    Products,
    Inventory,
    Pricing,
    Orders,
}

impl DataDomain {
    /// All domains in connection-test order.
    #[must_use]
    pub fn all() -> &'static [DataDomain] {
        &[
            DataDomain::Products,
            DataDomain::Inventory,
            DataDomain::Pricing,
            DataDomain::Orders,
        ]
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            DataDomain::Products => "products",
            DataDomain::Inventory => "inventory",
            DataDomain::Pricing => "pricing",
            DataDomain::Orders => "orders",
        }
    }
}

impl fmt::Display for DataDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle status of a registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum VendorStatus {
    /// Profile can be used to build connectors
    Active,
    /// Profile is kept but not offered
    Inactive,
    /// Profile is being evaluated
    #[default]
    Testing,
}

impl VendorStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            VendorStatus::Active => "active",
            VendorStatus::Inactive => "inactive",
            VendorStatus::Testing => "testing",
        }
    }
}

impl fmt::Display for VendorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for VendorStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(VendorStatus::Active),
            "inactive" => Ok(VendorStatus::Inactive),
            "testing" => Ok(VendorStatus::Testing),
            _ => Err(ParseEnumError::new(
                "vendor status",
                s,
                "active, inactive, testing",
            )),
        }
    }
}

/// Integration method a vendor profile supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntegrationMethod {
    Api,
    Sftp,
    Edi,
    Webhook,
}

impl IntegrationMethod {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            IntegrationMethod::Api => "api",
            IntegrationMethod::Sftp => "sftp",
            IntegrationMethod::Edi => "edi",
            IntegrationMethod::Webhook => "webhook",
        }
    }
}

impl From<ProtocolType> for IntegrationMethod {
    fn from(protocol: ProtocolType) -> Self {
        match protocol {
            ProtocolType::Api | ProtocolType::Custom => IntegrationMethod::Api,
            ProtocolType::Sftp => IntegrationMethod::Sftp,
            ProtocolType::Edi => IntegrationMethod::Edi,
            ProtocolType::Webhook => IntegrationMethod::Webhook,
        }
    }
}

impl fmt::Display for IntegrationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Vendor type carried on the owning service's vendor record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VendorType {
    /// S.P. Richards (OAuth2 REST API)
    SpRichards,
    /// Essendant (API-key REST API)
    Essendant,
    /// Ingram Micro (no connector yet)
    IngramMicro,
    /// TD Synnex (SFTP file exchange)
    Synnex,
    /// Any vendor described purely by configuration
    Universal,
    /// Catch-all
    Other,
}

impl VendorType {
    #[must_use]
    pub fn all() -> &'static [VendorType] {
        &[
            VendorType::SpRichards,
            VendorType::Essendant,
            VendorType::IngramMicro,
            VendorType::Synnex,
            VendorType::Universal,
            VendorType::Other,
        ]
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            VendorType::SpRichards => "sp_richards",
            VendorType::Essendant => "essendant",
            VendorType::IngramMicro => "ingram_micro",
            VendorType::Synnex => "synnex",
            VendorType::Universal => "universal",
            VendorType::Other => "other",
        }
    }
}

impl fmt::Display for VendorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for VendorType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "sp_richards" => Ok(VendorType::SpRichards),
            "essendant" => Ok(VendorType::Essendant),
            "ingram_micro" => Ok(VendorType::IngramMicro),
            "synnex" => Ok(VendorType::Synnex),
            "universal" => Ok(VendorType::Universal),
            "other" => Ok(VendorType::Other),
            _ => Err(ParseEnumError::new(
                "vendor type",
                s,
                "sp_richards, essendant, ingram_micro, synnex, universal, other",
            )),
        }
    }
}

/// Error parsing one of the enums in this module from a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
    expected: &'static str,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str, expected: &'static str) -> Self {
        Self {
            kind,
            value: value.to_string(),
            expected,
        }
    }
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid {} '{}', expected one of: {}",
            self.kind, self.value, self.expected
        )
    }
}

impl std::error::Error for ParseEnumError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_type_roundtrip() {
        for protocol in ProtocolType::all() {
            let parsed: ProtocolType = protocol.as_str().parse().unwrap();
            assert_eq!(parsed, *protocol);
        }
        assert_eq!("REST".parse::<ProtocolType>().unwrap(), ProtocolType::Api);
    }

    #[test]
    fn test_protocol_type_invalid() {
        let err = "ftp".parse::<ProtocolType>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid protocol type 'ftp', expected one of: api, sftp, edi, webhook, custom"
        );
    }

    #[test]
    fn test_vendor_type_parse() {
        assert_eq!(
            "SP-Richards".parse::<VendorType>().unwrap(),
            VendorType::SpRichards
        );
        for vendor_type in VendorType::all() {
            assert_eq!(
                vendor_type.as_str().parse::<VendorType>().unwrap(),
                *vendor_type
            );
        }
        assert!("acme".parse::<VendorType>().is_err());
    }

    #[test]
    fn test_authentication_mode_serialization() {
        let json = serde_json::to_string(&AuthenticationMode::OAuth2).unwrap();
        assert_eq!(json, "\"oauth2\"");
        let json = serde_json::to_string(&AuthenticationMode::SftpKey).unwrap();
        assert_eq!(json, "\"sftp_key\"");
    }

    #[test]
    fn test_integration_method_from_protocol() {
        assert_eq!(
            IntegrationMethod::from(ProtocolType::Custom),
            IntegrationMethod::Api
        );
        assert_eq!(
            IntegrationMethod::from(ProtocolType::Edi),
            IntegrationMethod::Edi
        );
    }

    #[test]
    fn test_vendor_status_default() {
        assert_eq!(VendorStatus::default(), VendorStatus::Testing);
        assert_eq!(
            "ACTIVE".parse::<VendorStatus>().unwrap(),
            VendorStatus::Active
        );
    }
}
