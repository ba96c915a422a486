//! `expertkit validate` — Run a WAT artifact through the validation pipeline.

use std::path::Path;

use expertkit_config::{AppConfig, ValidationConfig};
use expertkit_validation::{ArtifactLimits, ArtifactPipeline, Severity, ValidationError, ValidationReport};

pub fn run(
    module: &Path,
    input: &Path,
    entry_point: Option<String>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let source = super::read_file(module)?;
    let input = super::read_file(input)?;

    let report = validate_artifact(&config.validation, entry_point, &source, &input)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if report.passed() {
        Ok(())
    } else {
        Err("Artifact failed validation".into())
    }
}

/// Build a pipeline from the config, optionally overriding the entry point,
/// and validate `source` on `input`.
pub fn validate_artifact(
    config: &ValidationConfig,
    entry_point: Option<String>,
    source: &str,
    input: &str,
) -> Result<ValidationReport, ValidationError> {
    let limits = ArtifactLimits {
        max_fuel: config.max_fuel,
        max_memory_bytes: config.max_memory_bytes,
    };
    let entry_point = entry_point.unwrap_or_else(|| config.entry_point.clone());
    let pipeline = ArtifactPipeline::wasm(limits, entry_point)?;
    Ok(pipeline.validate(source, input))
}

pub fn print_report(report: &ValidationReport) {
    println!("🔍 Validation report");
    for entry in report.entries() {
        let marker = match entry.severity {
            Severity::Info => "✅",
            Severity::Warning => "⚠️ ",
            Severity::Error => "❌",
        };
        println!("   {marker} {}", entry.message);
    }

    if report.passed() {
        println!();
        match serde_json::to_string_pretty(report.output()) {
            Ok(output) => println!("{output}"),
            Err(e) => println!("   (output not printable: {e})"),
        }
    }
}
