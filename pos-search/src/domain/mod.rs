pub mod collection;
pub mod party;
pub mod product;
pub mod record;
pub mod search;
pub mod synonyms;
pub mod value;

pub use collection::Collection;
pub use party::{Party, PartyKind};
pub use product::{Product, ProductField};
pub use record::{RawRow, Record, RecordId};
pub use search::{FieldHits, IndexSchema, SearchMode, SearchQuery};
pub use synonyms::SynonymDictionary;
pub use value::Value;
