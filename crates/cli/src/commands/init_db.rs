//! `fieldhand init-db`: create the farm schema and import CSV data.

use std::path::PathBuf;

use fieldhand_config::AppConfig;
use fieldhand_database::FarmDatabase;

pub async fn run(
    crops: Option<PathBuf>,
    wages: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let db = FarmDatabase::new(&config.database.path, config.database.max_connections).await?;
    println!("✅ Schema ready in {}", config.database.path);

    if let Some(path) = crops {
        let imported = db.import_crops_csv(&path).await?;
        println!("✅ Imported {imported} crop rows from {}", path.display());
    }

    if let Some(path) = wages {
        let imported = db.import_wages_csv(&path).await?;
        println!("✅ Imported {imported} wage rows from {}", path.display());
    }

    let counts = db.row_counts().await?;
    println!("\n  Crops: {} rows", counts.crops);
    println!("  Wages: {} rows\n", counts.wages);

    Ok(())
}
