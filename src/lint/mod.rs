//! Surface linting.
//!
//! Walks every document in a surface tree and reports structured findings.
//! A per-file failure never aborts the walk; it becomes an error finding for
//! that file and the walk continues.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::export::ExportSchema;
use crate::loader::{classify, CommandFile, DocumentKind, SurfaceLoader};
use crate::resource::{ApiDecl, CollectionRegistry};
use crate::schema::Param;

/// How bad a finding is. Errors fail the lint run; warnings do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// One problem in one file.
#[derive(Debug, Clone, Serialize)]
pub struct Finding {
    pub path: PathBuf,
    pub severity: Severity,
    pub message: String,
}

/// Result of linting a whole surface tree.
#[derive(Debug, Default, Serialize)]
pub struct LintReport {
    pub files_checked: usize,
    pub findings: Vec<Finding>,
}

impl LintReport {
    pub fn error_count(&self) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity == Severity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity == Severity::Warning)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    fn error(&mut self, path: &Path, message: impl Into<String>) {
        self.findings.push(Finding {
            path: path.to_path_buf(),
            severity: Severity::Error,
            message: message.into(),
        });
    }

    fn warning(&mut self, path: &Path, message: impl Into<String>) {
        self.findings.push(Finding {
            path: path.to_path_buf(),
            severity: Severity::Warning,
            message: message.into(),
        });
    }
}

/// Lints every document kind a surface tree contains.
pub struct SurfaceLinter {
    registry: CollectionRegistry,
}

impl SurfaceLinter {
    pub fn new(registry: CollectionRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &CollectionRegistry {
        &self.registry
    }

    /// Lint the whole tree under the loader's root.
    pub fn lint_surface(&self, loader: &mut SurfaceLoader) -> LintReport {
        let mut report = LintReport::default();
        let files = match loader.discover() {
            Ok(files) => files,
            Err(e) => {
                report.error(loader.root(), e.to_string());
                return report;
            }
        };

        for path in files {
            report.files_checked += 1;
            self.lint_file(loader, &path, &mut report);
        }
        report
    }

    fn lint_file(&self, loader: &mut SurfaceLoader, path: &Path, report: &mut LintReport) {
        let value = match loader.load_raw(path) {
            Ok(value) => value,
            Err(e) => {
                report.error(path, e.to_string());
                return;
            }
        };

        match classify(path, &value) {
            DocumentKind::Command => match loader.command_from_value(path, value) {
                Ok(file) => self.lint_command(&file, report),
                Err(e) => report.error(path, e.to_string()),
            },
            DocumentKind::Group => {
                if let Err(e) = serde_yaml::from_value::<crate::schema::GroupSpec>(value) {
                    report.error(path, format!("invalid group spec: {e}"));
                }
            }
            DocumentKind::Collections => match serde_yaml::from_value::<ApiDecl>(value) {
                Ok(api) => {
                    // Re-register into a scratch registry so template errors
                    // surface here with the file that declared them.
                    let mut scratch = CollectionRegistry::new();
                    if let Err(e) = scratch.insert_api(api) {
                        report.error(path, e.to_string());
                    }
                }
                Err(e) => report.error(path, format!("invalid collections file: {e}")),
            },
            DocumentKind::Resources => self.lint_resources(path, value, report),
            DocumentKind::ExportSchema => match ExportSchema::from_value(path, value) {
                Ok(schema) => {
                    for problem in schema.lint() {
                        report.warning(path, problem);
                    }
                }
                Err(e) => report.error(path, e.to_string()),
            },
        }
    }

    fn lint_resources(
        &self,
        path: &Path,
        value: serde_yaml::Value,
        report: &mut LintReport,
    ) {
        let mapping = match value.as_mapping() {
            Some(mapping) => mapping,
            None => {
                report.error(path, "resources.yaml must be a mapping of specs");
                return;
            }
        };
        for (key, spec_value) in mapping {
            let name = key.as_str().unwrap_or("<non-string key>").to_string();
            match serde_yaml::from_value::<crate::resource::ResourceSpec>(spec_value.clone()) {
                Ok(spec) => {
                    for problem in spec.validate() {
                        report.error(path, format!("spec [{name}]: {problem}"));
                    }
                    if !self.registry.is_empty() {
                        for problem in self.registry.check_resource_spec(&spec) {
                            report.error(path, format!("spec [{name}]: {problem}"));
                        }
                    }
                }
                Err(e) => report.error(path, format!("spec [{name}]: {e}")),
            }
        }
    }

    fn lint_command(&self, file: &CommandFile, report: &mut LintReport) {
        for (i, variant) in file.variants.iter().enumerate() {
            let label = if file.variants.len() > 1 {
                format!("variant {}: ", i + 1)
            } else {
                String::new()
            };

            for problem in variant.spec.validate(file.command_type) {
                report.error(&file.path, format!("{label}{problem}"));
            }

            if self.registry.is_empty() {
                continue;
            }

            if let Some(request) = &variant.spec.request {
                if self.registry.get(&request.collection).is_none() {
                    report.error(
                        &file.path,
                        format!("{label}request references unknown collection [{}]",
                            request.collection),
                    );
                }
            }
            if let Some(async_) = &variant.spec.async_ {
                if self.registry.get(&async_.collection).is_none() {
                    report.error(
                        &file.path,
                        format!(
                            "{label}async references unknown collection [{}]",
                            async_.collection
                        ),
                    );
                }
            }

            let disable_check = variant
                .spec
                .request
                .as_ref()
                .map(|r| r.disable_resource_check)
                .unwrap_or(false);
            if !disable_check {
                for resource in resource_params(&variant.spec) {
                    for problem in self.registry.check_resource_spec(&resource.resource_spec) {
                        report.error(&file.path, format!("{label}{problem}"));
                    }
                }
            }
        }
    }
}

/// All resource arguments a spec declares, including nested group params.
fn resource_params(spec: &crate::schema::CommandSpec) -> Vec<&crate::schema::ResourceParam> {
    fn walk<'a>(params: &'a [Param], out: &mut Vec<&'a crate::schema::ResourceParam>) {
        for param in params {
            match param {
                Param::Resource(resource) => out.push(resource),
                Param::Group { group } => walk(&group.params, out),
                Param::Arg(_) => {}
            }
        }
    }
    let mut out = Vec::new();
    if let Some(resource) = &spec.arguments.resource {
        out.push(resource);
    }
    walk(&spec.arguments.params, &mut out);
    out
}
