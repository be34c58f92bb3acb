use std::sync::Arc;

use pos_search::Result;
use pos_search::domain::{Collection, Party, Record};
use pos_search::ports::CollectionStore;
use pos_search::storage::LocalStore;

pub async fn run(store: Arc<LocalStore>, party: Party, json: bool) -> Result<()> {
    let name = party.name.clone();
    let id = store.add(Collection::Parties, Record::from(party)).await?;

    if json {
        let record = store.get(Collection::Parties, id).await?;
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        println!("Added party {id}: {name}");
    }
    Ok(())
}
