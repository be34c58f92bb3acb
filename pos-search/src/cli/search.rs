use std::sync::Arc;

use serde::Serialize;

use pos_search::Result;
use pos_search::config::Config;
use pos_search::domain::{Collection, IndexSchema, Record, SearchMode, Value};
use pos_search::ports::CollectionStore;
use pos_search::services::SearchController;
use pos_search::storage::LocalStore;

#[derive(Serialize)]
struct SearchResponse<'a> {
    term: &'a str,
    collection: Collection,
    mode: SearchMode,
    count: usize,
    results: &'a [Record],
}

pub async fn run(
    store: Arc<LocalStore>,
    config: &Config,
    term: String,
    collection: Collection,
    mode: SearchMode,
    json: bool,
) -> Result<()> {
    let mut controller = SearchController::spawn(
        IndexSchema::for_collection(collection),
        store.observe(collection),
        config.search.settings(),
    );

    // an empty collection never gets an index
    if mode == SearchMode::Fast && !controller.snapshot().is_empty() {
        controller.wait_for_index().await;
    }
    controller.set_mode(mode);
    controller.set_term(term);

    let response = SearchResponse {
        term: controller.term(),
        collection,
        mode,
        count: controller.results().len(),
        results: controller.results(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print_results(&response);
    }
    Ok(())
}

fn print_results(response: &SearchResponse<'_>) {
    if response.results.is_empty() {
        println!("No {} found for: \"{}\"", response.collection, response.term);
        return;
    }

    println!();
    println!(
        "Query: \"{}\" ({} search in {})",
        response.term, response.mode, response.collection
    );
    println!("Found: {} results", response.count);
    println!();

    for record in response.results {
        let id = record.id.map(|id| id.to_string()).unwrap_or_default();
        let name = record.get("name").map(Value::to_string).unwrap_or_default();
        println!("[{id}] {name}");

        let details: Vec<String> = record
            .fields
            .iter()
            .filter(|(field, value)| field.as_str() != "name" && value.is_truthy())
            .map(|(field, value)| format!("{field}: {value}"))
            .collect();
        if !details.is_empty() {
            println!("    {}", details.join(" | "));
        }
    }
    println!();
}
