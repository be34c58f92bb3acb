pub mod store;

pub use store::{CollectionStore, Snapshot};
