//! `expertkit config` — Configuration management commands.

use expertkit_config::AppConfig;

pub fn default() {
    print!("{}", AppConfig::default_toml());
}

pub fn validate() -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Validating configuration...");

    // load() already rejects invalid values; only soft problems remain here.
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            println!("   ❌ Config error: {e}");
            return Err(e.into());
        }
    };
    println!("   ✅ Config parsed successfully");

    let warnings = warnings(&config);
    if warnings.is_empty() {
        println!("   ✅ All checks passed");
    } else {
        println!();
        for w in &warnings {
            println!("   ⚠️  {w}");
        }
    }

    println!();
    println!("   Provider:    {} ({})", config.provider.name, config.provider.api_url);
    println!(
        "   Mapping:     {} @ {}",
        config.mapping.model, config.mapping.temperature
    );
    println!(
        "   Transform:   {} @ {}",
        config.transform.model, config.transform.temperature
    );
    println!("   Entry point: {}", config.validation.entry_point);
    println!("   Attempts:    {}", config.correction.max_attempts);

    Ok(())
}

fn warnings(config: &AppConfig) -> Vec<&'static str> {
    let mut warnings = Vec::new();
    if !config.has_api_key() {
        warnings.push("No API key set (set EXPERTKIT_API_KEY or OPENAI_API_KEY env var)");
    }
    if config.transform.temperature > 0.0 {
        warnings.push("Transform temperature above 0.0 makes generated code non-deterministic");
    }
    if config.provider.request_timeout_secs == 0 {
        warnings.push("Provider requests have no timeout");
    }
    warnings
}

pub fn show() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    // Never print the key itself.
    if config.api_key.is_some() {
        config.api_key = Some("[REDACTED]".into());
    }
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

pub fn path() {
    let config_path = AppConfig::config_dir().join("config.toml");
    println!("{}", config_path.display());
}
