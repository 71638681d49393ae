//! Rendering seam — turns an assembled context into a document file.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::Serialize;

use crate::config::TemplateConfig;
use crate::error::RenderError;

use super::assemble::Context;
use super::session::Answers;

/// Which document to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateId {
    Lease,
    CommissionTenant,
    CommissionLandlord,
}

impl TemplateId {
    /// Output file stem for documents whose name does not depend on answers.
    pub fn fixed_file_stem(&self) -> Option<&'static str> {
        match self {
            Self::Lease => None,
            Self::CommissionTenant => Some("договор_комиссия_наниматель"),
            Self::CommissionLandlord => Some("договор_комиссия_собственник"),
        }
    }
}

/// `договор_{landlord surname}_{tenant surname}`.
pub fn lease_file_stem(answers: &Answers) -> String {
    let surname = |key: &str| {
        answers
            .get(key)
            .and_then(|a| a.as_text())
            .and_then(|name| name.split_whitespace().next())
            .unwrap_or("unknown")
            .to_string()
    };
    format!("договор_{}_{}", surname("ar_name"), surname("naim_name"))
}

/// Output file stem for `template` given the answers it was built from.
pub fn file_stem(template: TemplateId, answers: &Answers) -> String {
    template
        .fixed_file_stem()
        .map_or_else(|| lease_file_stem(answers), str::to_string)
}

/// Produces a document from a context.
///
/// Implementations may ignore context keys their template does not use.
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(
        &self,
        context: &Context,
        template: TemplateId,
        file_stem: &str,
    ) -> Result<PathBuf, RenderError>;
}

#[derive(Serialize)]
struct Snapshot<'a> {
    template: &'a str,
    document: TemplateId,
    context: &'a Context,
}

/// Writes the context as pretty JSON next to the name of its template.
///
/// Stands in for a document template engine; the output can be fed to one.
pub struct SnapshotRenderer {
    output_dir: PathBuf,
    templates: TemplateConfig,
}

impl SnapshotRenderer {
    pub fn new(output_dir: impl Into<PathBuf>, templates: TemplateConfig) -> Self {
        Self {
            output_dir: output_dir.into(),
            templates,
        }
    }

    fn template_name(&self, template: TemplateId) -> Result<&str, RenderError> {
        let name = match template {
            TemplateId::Lease => &self.templates.lease,
            TemplateId::CommissionTenant => &self.templates.commission_tenant,
            TemplateId::CommissionLandlord => &self.templates.commission_landlord,
        };
        if name.is_empty() {
            return Err(RenderError::TemplateMissing {
                template: format!("{template:?}"),
            });
        }
        Ok(name)
    }
}

#[async_trait]
impl Renderer for SnapshotRenderer {
    async fn render(
        &self,
        context: &Context,
        template: TemplateId,
        file_stem: &str,
    ) -> Result<PathBuf, RenderError> {
        let snapshot = Snapshot {
            template: self.template_name(template)?,
            document: template,
            context,
        };
        let body = serde_json::to_string_pretty(&snapshot)?;

        tokio::fs::create_dir_all(&self.output_dir).await?;
        let path = self.output_dir.join(format!("{file_stem}.json"));
        tokio::fs::write(&path, body).await?;

        tracing::info!(path = %path.display(), ?template, "Document rendered");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::session::Answer;

    #[test]
    fn lease_stem_uses_surnames() {
        let mut answers = Answers::new();
        answers.insert("ar_name".into(), Answer::text("Иванов Иван"));
        answers.insert("naim_name".into(), Answer::Blank);
        assert_eq!(lease_file_stem(&answers), "договор_Иванов_unknown");
        assert_eq!(
            file_stem(TemplateId::CommissionTenant, &answers),
            "договор_комиссия_наниматель"
        );
    }

    #[tokio::test]
    async fn snapshot_renderer_writes_json() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = SnapshotRenderer::new(dir.path().join("out"), TemplateConfig::default());
        let mut context = Context::new();
        context.insert("contract_number".into(), "А123".into());

        let path = renderer
            .render(&context, TemplateId::Lease, "договор_a_b")
            .await
            .unwrap();
        assert!(path.ends_with("договор_a_b.json"));

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["template"], "template.docx");
        assert_eq!(written["document"], "lease");
        assert_eq!(written["context"]["contract_number"], "А123");
    }

    #[tokio::test]
    async fn missing_template_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let templates = TemplateConfig {
            commission_landlord: String::new(),
            ..TemplateConfig::default()
        };
        let renderer = SnapshotRenderer::new(dir.path(), templates);
        let err = renderer
            .render(&Context::new(), TemplateId::CommissionLandlord, "x")
            .await
            .unwrap_err();
        assert!(matches!(err, RenderError::TemplateMissing { .. }));
    }
}
