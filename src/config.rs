//! Configuration types.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::form::skip::SkipRule;

/// Template identifiers for each document the form can produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateConfig {
    /// Residential lease.
    pub lease: String,
    /// Commission agreement, tenant side.
    pub commission_tenant: String,
    /// Commission agreement, landlord side.
    pub commission_landlord: String,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            lease: "template.docx".to_string(),
            commission_tenant: "template_okaz.docx".to_string(),
            commission_landlord: "template_sob.docx".to_string(),
        }
    }
}

/// Form service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormConfig {
    /// Where rendered documents are written.
    pub output_dir: PathBuf,
    pub templates: TemplateConfig,
    /// Optional JSON file with per-deployment schema overrides.
    pub overrides_path: Option<PathBuf>,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./out"),
            templates: TemplateConfig::default(),
            overrides_path: None,
        }
    }
}

impl FormConfig {
    /// Read configuration from `LEASE_FORM_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unset or empty keys keep defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let output_dir = get("LEASE_FORM_OUTPUT_DIR").map_or(defaults.output_dir, PathBuf::from);
        if output_dir.is_file() {
            return Err(ConfigError::InvalidValue {
                key: "LEASE_FORM_OUTPUT_DIR".into(),
                message: format!("{} is a file, not a directory", output_dir.display()),
            });
        }

        let templates = TemplateConfig {
            lease: get("LEASE_FORM_TEMPLATE").unwrap_or(defaults.templates.lease),
            commission_tenant: get("LEASE_FORM_TEMPLATE_TENANT")
                .unwrap_or(defaults.templates.commission_tenant),
            commission_landlord: get("LEASE_FORM_TEMPLATE_LANDLORD")
                .unwrap_or(defaults.templates.commission_landlord),
        };

        Ok(Self {
            output_dir,
            templates,
            overrides_path: get("LEASE_FORM_OVERRIDES").map(PathBuf::from),
        })
    }

    /// Load the overrides file, or empty overrides when none is configured.
    pub fn load_overrides(&self) -> Result<SchemaOverrides, ConfigError> {
        match &self.overrides_path {
            Some(path) => SchemaOverrides::from_file(path),
            None => Ok(SchemaOverrides::default()),
        }
    }
}

/// Per-deployment adjustments to the canonical lease schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaOverrides {
    /// Output key renames applied to the assembled context.
    #[serde(default)]
    pub renames: BTreeMap<String, String>,
    /// Skip rules added to the default policy.
    #[serde(default)]
    pub skip_rules: Vec<SkipRule>,
}

impl SchemaOverrides {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw)
            .map_err(|e| ConfigError::ParseError(format!("{}: {e}", path.display())))
    }
}
