use std::sync::Arc;

use serde::Serialize;

use pos_search::Result;
use pos_search::domain::Collection;
use pos_search::storage::LocalStore;

#[derive(Serialize)]
struct StatusResponse {
    store: Option<String>,
    products: usize,
    parties: usize,
}

pub async fn run(store: Arc<LocalStore>, json: bool) -> Result<()> {
    let status = StatusResponse {
        store: store.path().map(|p| p.display().to_string()),
        products: store.count(Collection::Products).await,
        parties: store.count(Collection::Parties).await,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!(
            "Store: {}",
            status.store.as_deref().unwrap_or("(in memory)")
        );
        println!("Products: {}", status.products);
        println!("Parties: {}", status.parties);
    }
    Ok(())
}
