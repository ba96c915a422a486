//! `expertkit transform` — Run the two-phase JSON transformer.

use std::path::Path;
use std::sync::Arc;

use expertkit_config::AppConfig;
use expertkit_providers::OpenAiCompatProvider;
use expertkit_transformer::{JsonTransformer, TransformOutcome};
use tracing::info;

use super::validate::print_report;

pub async fn run(source: &Path, schema: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    // Fail early with setup instructions when no key is configured
    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    EXPERTKIT_API_KEY = 'sk-...'");
        eprintln!("    OPENAI_API_KEY    = 'sk-...'");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let source_json = super::read_file(source)?;
    serde_json::from_str::<serde_json::Value>(&source_json)
        .map_err(|e| format!("{} is not valid JSON: {e}", source.display()))?;
    let target_schema = super::read_file(schema)?;

    let provider = OpenAiCompatProvider::from_config(&config.provider, config.api_key.as_deref())?;
    let transformer = JsonTransformer::from_config(&config, Arc::new(provider))?;

    info!(source = %source.display(), schema = %schema.display(), "Running transformer");
    let outcome = transformer.run(&source_json, &target_schema).await?;

    print_outcome(&outcome);

    if let Some(path) = output {
        std::fs::write(path, outcome.code.module_source())
            .map_err(|e| format!("Failed to write {}: {e}", path.display()))?;
        println!("\n💾 Module written to {}", path.display());
    }

    if outcome.passed() {
        Ok(())
    } else {
        Err(format!(
            "Transform code failed validation after {} attempt(s)",
            outcome.attempts
        )
        .into())
    }
}

fn print_outcome(outcome: &TransformOutcome) {
    println!("🗺️  Mappings ({})", outcome.mapping.data_type_analysis);
    for m in &outcome.mapping.mappings {
        println!("   {} → {}", m.source_path, m.target_path);
        println!("      {}", m.rationale);
    }
    println!();
    println!("🧩 Generated module (attempts: {})", outcome.attempts);
    println!("   {}", outcome.code.rationale);
    println!();
    print_report(&outcome.report);
}
