//! Integration templates and the onboarding wizard schema.
//!
//! Descriptive metadata only: a UI renders these to collect a
//! [`VendorConnectionRequest`](crate::VendorConnectionRequest).

use serde::Serialize;
use serde_json::{json, Value};

use supplylink_connector::config::{DataFormats, VendorConfig, VendorFeatures};
use supplylink_connector::mapping::fields;
use supplylink_connector::types::{AuthenticationMode, DataFormat, ProtocolType};

/// Starting point for a common integration shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntegrationTemplate {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub protocol: ProtocolType,
    pub authentication: AuthenticationMode,
    pub default_config: VendorConfig,
    pub required_fields: Vec<&'static str>,
}

/// Input widget for a wizard field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Textarea,
    Secret,
    Url,
    Number,
    Toggle,
    Select,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WizardField {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Choices for [`FieldKind::Select`].
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<&'static str>,
}

impl WizardField {
    fn new(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            label,
            kind,
            required: false,
            default: None,
            options: Vec::new(),
        }
    }

    fn required(mut self) -> Self {
        self.required = true;
        self
    }

    fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    fn options(mut self, options: &[&'static str]) -> Self {
        self.options = options.to_vec();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WizardStep {
    pub id: &'static str,
    pub title: &'static str,
    pub fields: Vec<WizardField>,
}

/// REST API, OAuth2 API, SFTP, EDI and webhook templates.
pub fn integration_templates() -> Vec<IntegrationTemplate> {
    let mut sftp = VendorConfig::new(ProtocolType::Sftp, AuthenticationMode::SftpPassword);
    sftp.data_formats = DataFormats::uniform(DataFormat::Csv);

    let mut edi = VendorConfig::new(ProtocolType::Edi, AuthenticationMode::Edi);
    edi.data_formats = DataFormats::uniform(DataFormat::Edi);
    edi.features.order_management = true;

    let webhook = VendorConfig::new(ProtocolType::Webhook, AuthenticationMode::None).with_features(
        VendorFeatures {
            catalog: false,
            webhooks: true,
            ..VendorFeatures::default()
        },
    );

    vec![
        IntegrationTemplate {
            id: "rest_api",
            name: "REST API",
            description: "JSON API authenticated with an API key",
            protocol: ProtocolType::Api,
            authentication: AuthenticationMode::ApiKey,
            default_config: VendorConfig::new(ProtocolType::Api, AuthenticationMode::ApiKey),
            required_fields: vec!["name", "base_url", "api_key"],
        },
        IntegrationTemplate {
            id: "oauth2_api",
            name: "OAuth2 API",
            description: "JSON API using OAuth2 client credentials",
            protocol: ProtocolType::Api,
            authentication: AuthenticationMode::OAuth2,
            default_config: VendorConfig::new(ProtocolType::Api, AuthenticationMode::OAuth2)
                .with_features(VendorFeatures {
                    order_management: true,
                    ..VendorFeatures::default()
                }),
            required_fields: vec!["name", "base_url", "client_id", "client_secret", "token_url"],
        },
        IntegrationTemplate {
            id: "sftp",
            name: "SFTP File Exchange",
            description: "Catalog and inventory files dropped on an SFTP server",
            protocol: ProtocolType::Sftp,
            authentication: AuthenticationMode::SftpPassword,
            default_config: sftp,
            required_fields: vec!["name", "host", "username", "password"],
        },
        IntegrationTemplate {
            id: "edi",
            name: "EDI",
            description: "Electronic data interchange with a trading partner",
            protocol: ProtocolType::Edi,
            authentication: AuthenticationMode::Edi,
            default_config: edi,
            required_fields: vec!["name", "partner_id", "sender_id", "receiver_id"],
        },
        IntegrationTemplate {
            id: "webhook",
            name: "Webhook",
            description: "Vendor pushes updates to a registered endpoint",
            protocol: ProtocolType::Webhook,
            authentication: AuthenticationMode::None,
            default_config: webhook,
            required_fields: vec!["name", "base_url"],
        },
    ]
}

/// Template by id.
pub fn template(id: &str) -> Option<IntegrationTemplate> {
    integration_templates().into_iter().find(|t| t.id == id)
}

/// Ordered wizard steps for a protocol.
pub fn wizard_steps(protocol: ProtocolType) -> Vec<WizardStep> {
    let mut steps = vec![WizardStep {
        id: "basics",
        title: "Vendor details",
        fields: vec![
            WizardField::new("name", "Vendor name", FieldKind::Text).required(),
            WizardField::new("description", "Description", FieldKind::Textarea),
        ],
    }];

    match protocol {
        ProtocolType::Api | ProtocolType::Custom => {
            steps.push(WizardStep {
                id: "connection",
                title: "API endpoints",
                fields: vec![
                    WizardField::new("base_url", "Base URL", FieldKind::Url).required(),
                    path_field("products", "Products path"),
                    path_field("inventory", "Inventory path"),
                    path_field("pricing", "Pricing path"),
                    path_field("orders", "Orders path"),
                ],
            });
            steps.push(WizardStep {
                id: "authentication",
                title: "Authentication",
                fields: vec![
                    WizardField::new("auth_type", "Authentication type", FieldKind::Select)
                        .required()
                        .default_value(json!("api_key"))
                        .options(&["api_key", "oauth2", "bearer", "basic"]),
                    WizardField::new("api_key", "API key", FieldKind::Secret),
                    WizardField::new("client_id", "Client ID", FieldKind::Text),
                    WizardField::new("client_secret", "Client secret", FieldKind::Secret),
                    WizardField::new("token_url", "Token URL", FieldKind::Url),
                    WizardField::new("token", "Bearer token", FieldKind::Secret),
                    WizardField::new("username", "Username", FieldKind::Text),
                    WizardField::new("password", "Password", FieldKind::Secret),
                ],
            });
            steps.push(WizardStep {
                id: "mapping",
                title: "Field mapping",
                fields: [fields::SKU, fields::NAME, fields::PRICE, fields::QUANTITY]
                    .into_iter()
                    .map(|canonical| {
                        WizardField::new(canonical, mapping_label(canonical), FieldKind::Text)
                            .default_value(json!(canonical))
                    })
                    .collect(),
            });
            steps.push(WizardStep {
                id: "options",
                title: "Limits and features",
                fields: vec![
                    WizardField::new("requests_per_minute", "Requests per minute", FieldKind::Number),
                    WizardField::new("real_time_inventory", "Real-time inventory", FieldKind::Toggle)
                        .default_value(json!(false)),
                    WizardField::new("real_time_pricing", "Real-time pricing", FieldKind::Toggle)
                        .default_value(json!(false)),
                    WizardField::new("order_management", "Order management", FieldKind::Toggle)
                        .default_value(json!(false)),
                ],
            });
        }
        ProtocolType::Sftp => {
            steps.push(WizardStep {
                id: "connection",
                title: "SFTP server",
                fields: vec![
                    WizardField::new("host", "Host", FieldKind::Text).required(),
                    WizardField::new("port", "Port", FieldKind::Number).default_value(json!(22)),
                ],
            });
            steps.push(WizardStep {
                id: "authentication",
                title: "Login",
                fields: vec![
                    WizardField::new("username", "Username", FieldKind::Text).required(),
                    WizardField::new("password", "Password", FieldKind::Secret),
                    WizardField::new("private_key", "Private key", FieldKind::Secret),
                    WizardField::new("passphrase", "Key passphrase", FieldKind::Secret),
                ],
            });
        }
        ProtocolType::Edi => {
            steps.push(WizardStep {
                id: "identifiers",
                title: "Trading partner",
                fields: vec![
                    WizardField::new("partner_id", "Partner ID", FieldKind::Text).required(),
                    WizardField::new("sender_id", "Sender ID", FieldKind::Text).required(),
                    WizardField::new("receiver_id", "Receiver ID", FieldKind::Text).required(),
                ],
            });
        }
        ProtocolType::Webhook => {
            steps.push(WizardStep {
                id: "connection",
                title: "Webhook endpoint",
                fields: vec![WizardField::new("base_url", "Endpoint URL", FieldKind::Url).required()],
            });
        }
    }

    steps
}

fn path_field(name: &'static str, label: &'static str) -> WizardField {
    WizardField::new(name, label, FieldKind::Text).default_value(json!(format!("/{name}")))
}

fn mapping_label(canonical: &str) -> &'static str {
    match canonical {
        fields::SKU => "SKU field",
        fields::NAME => "Name field",
        fields::PRICE => "Price field",
        _ => "Quantity field",
    }
}
