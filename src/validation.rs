//! Default frontmatter validator
//!
//! Checks the frontmatter keys the orchestrator itself reads. Problems are
//! reported as warnings; the offending values are then ignored downstream.

use serde_json::Value;

use crate::config::{HandlebarsDirective, ProjectConfig};
use crate::domain::ports::DocumentValidator;
use crate::models::{Diagnostic, Document};
use crate::parser::json_type_name;

#[derive(Debug, Clone, Copy, Default)]
pub struct FrontmatterValidator;

impl FrontmatterValidator {
    pub fn check(&self, document: &Document) -> Vec<Diagnostic> {
        let Some(front_matter) = document.metadata.front_matter.as_ref() else {
            return Vec::new();
        };
        let mut diagnostics = Vec::new();
        let mut warn = |key: &str, message: String| {
            diagnostics.push(
                Diagnostic::warning(message).with_tags(["validator", "frontmatter", key]),
            );
        };

        if let Some(description) = front_matter.get("description") {
            if !description.is_string() {
                warn(
                    "description",
                    format!(
                        "'description' should be a string, found {}",
                        json_type_name(description)
                    ),
                );
            }
        }

        if let Some(globs) = front_matter.get("globs") {
            let valid = match globs {
                Value::String(_) => true,
                Value::Array(items) => items.iter().all(Value::is_string),
                _ => false,
            };
            if !valid {
                warn(
                    "globs",
                    "'globs' should be a string or a list of strings".to_string(),
                );
            }
        }

        for (key, section) in front_matter {
            let Value::Object(section) = section else {
                if key == "rule" {
                    warn(
                        "rule",
                        format!("'rule' should be a mapping, found {}", json_type_name(section)),
                    );
                }
                continue;
            };

            if let Some(handlebars) = section.get("handlebars") {
                if HandlebarsDirective::from_value(handlebars).is_none() {
                    warn(
                        key,
                        format!(
                            "'{key}.handlebars' should be true, false or a settings mapping; it is ignored"
                        ),
                    );
                }
            }
            if key == "rule" {
                if let Some(template) = section.get("template") {
                    if !template.is_boolean() {
                        warn(
                            "rule",
                            format!(
                                "'rule.template' should be a boolean, found {}",
                                json_type_name(template)
                            ),
                        );
                    }
                }
            } else if let Some(format) = section.get("outputFormat") {
                if !format.is_string() {
                    warn(
                        key,
                        format!("'{key}.outputFormat' should be a string; it is ignored"),
                    );
                }
            }
        }

        diagnostics
    }
}

impl DocumentValidator for FrontmatterValidator {
    fn validate(
        &self,
        mut document: Document,
        _project_config: Option<&ProjectConfig>,
    ) -> anyhow::Result<Document> {
        let diagnostics = self.check(&document);
        document.diagnostics.extend(diagnostics);
        Ok(document)
    }
}
