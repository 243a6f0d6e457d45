//! Implements `veneer lint`: whole-surface validation.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use console::style;

use crate::config::Config;
use crate::lint::{LintReport, Severity, SurfaceLinter};
use crate::loader::SurfaceLoader;
use crate::resource::CollectionRegistry;

/// Options for the lint command
#[derive(Debug, Clone)]
pub struct LintOptions {
    /// Surface root to lint
    pub root: PathBuf,
    /// Emit the report as JSON instead of styled text
    pub json: bool,
    /// Report warnings as errors
    pub strict: bool,
}

/// Execute the lint command
pub fn execute_lint(options: LintOptions, config: Config) -> Result<()> {
    let data_root = config.data_root(&options.root);
    let registry = CollectionRegistry::load_dir(&data_root)
        .with_context(|| format!("loading collections under {}", data_root.display()))?;
    let mut loader = SurfaceLoader::new(&options.root, &data_root);

    let report = SurfaceLinter::new(registry).lint_surface(&mut loader);

    if options.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, &options.root);
    }

    let failed = report.has_errors() || (options.strict && report.warning_count() > 0);
    if failed {
        std::process::exit(1);
    }
    Ok(())
}

fn print_report(report: &LintReport, root: &Path) {
    for finding in &report.findings {
        let glyph = match finding.severity {
            Severity::Error => style("✗").red(),
            Severity::Warning => style("!").yellow(),
        };
        let path = finding.path.strip_prefix(root).unwrap_or(&finding.path);
        println!("{} {}: {}", glyph, path.display(), finding.message);
    }

    if report.has_errors() {
        println!(
            "{} {} files checked: {} errors, {} warnings",
            style("✗").red(),
            report.files_checked,
            report.error_count(),
            report.warning_count()
        );
    } else {
        println!(
            "{} {} files checked: {} warnings",
            style("✓").green(),
            report.files_checked,
            report.warning_count()
        );
    }
}
