use std::sync::Arc;

use pos_search::Result;
use pos_search::domain::{Collection, RecordId};
use pos_search::ports::CollectionStore;
use pos_search::storage::LocalStore;

pub async fn run(
    store: Arc<LocalStore>,
    collection: Collection,
    id: RecordId,
    json: bool,
) -> Result<()> {
    store.delete(collection, id).await?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "removed": id, "collection": collection })
        );
    } else {
        println!("Removed {id} from {collection}");
    }
    Ok(())
}
