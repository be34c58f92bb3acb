use std::path::Path;
use std::sync::Arc;

use pos_search::Result;
use pos_search::config::Config;
use pos_search::services::ImportService;
use pos_search::storage::LocalStore;

pub async fn run(store: Arc<LocalStore>, config: &Config, file: &Path, json: bool) -> Result<()> {
    let service = ImportService::new(store, config.import.reconciler()?);
    let report = service.import_file(file).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Imported {} products from {}", report.inserted, file.display());
    }
    Ok(())
}
