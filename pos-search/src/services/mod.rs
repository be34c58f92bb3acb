pub mod import;
pub mod index;
pub mod reconciler;
pub mod search;
pub mod sheet;

pub use import::{ImportReport, ImportService};
pub use index::DocumentIndex;
pub use reconciler::{HeaderReconciler, ImportDefaults};
pub use search::{SearchController, SearchSettings, SearchState};
pub use sheet::SheetFormat;
