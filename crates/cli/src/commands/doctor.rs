//! `fieldhand doctor`: diagnose system health.

use fieldhand_config::AppConfig;
use fieldhand_database::FarmDatabase;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 Fieldhand Doctor: System Diagnostics");
    println!("=======================================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("  ✅ Config file found at {}", config_path.display());
    } else {
        println!("  ⚠️  No config file, using defaults (run `fieldhand onboard`)");
    }

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Config valid (provider: {}, model: {})", config.provider, config.model);
            config
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            println!("\n  ⚠️  Fix the config before running further checks.");
            return Ok(());
        }
    };

    if config.has_api_key() {
        println!("  ✅ API key configured");
    } else {
        println!("  ❌ No API key: set OPENAI_API_KEY or add api_key to config.toml");
        issues += 1;
    }

    match fieldhand_providers::build_from_config(&config) {
        Ok(provider) => println!("  ✅ Provider '{}' ready", provider.name()),
        Err(e) => {
            println!("  ❌ Provider not usable: {e}");
            issues += 1;
        }
    }

    match FarmDatabase::new(&config.database.path, config.database.max_connections).await {
        Ok(db) => match db.row_counts().await {
            Ok(counts) if counts.crops == 0 && counts.wages == 0 => {
                println!("  ⚠️  Database {} is empty: run `fieldhand init-db`", config.database.path);
                issues += 1;
            }
            Ok(counts) => println!(
                "  ✅ Database {} ({} crop rows, {} wage rows)",
                config.database.path, counts.crops, counts.wages
            ),
            Err(e) => {
                println!("  ❌ Database query failed: {e}");
                issues += 1;
            }
        },
        Err(e) => {
            println!("  ❌ Database unavailable: {e}");
            issues += 1;
        }
    }

    if config.weather.api_key.is_some() {
        println!("  ✅ Weather API key configured");
    } else {
        println!("  ⚠️  No OPENWEATHERMAP_API_KEY: the Weather Checker tool will fail");
        issues += 1;
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
