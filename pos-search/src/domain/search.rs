use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Collection, RecordId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub term: String,
    pub mode: SearchMode,
}

impl SearchQuery {
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            mode: SearchMode::default(),
        }
    }

    #[must_use]
    pub const fn with_mode(mut self, mode: SearchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Whitespace-only terms mean "show the default listing".
    pub fn is_blank(&self) -> bool {
        self.term.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Prefix matching through the document index.
    #[default]
    Fast,
    /// Case-insensitive substring scan over every field of the snapshot.
    Accurate,
}

impl SearchMode {
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Fast => Self::Accurate,
            Self::Accurate => Self::Fast,
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fast => f.write_str("fast"),
            Self::Accurate => f.write_str("accurate"),
        }
    }
}

impl std::str::FromStr for SearchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fast" | "fuzzy" => Ok(Self::Fast),
            "accurate" | "exact" => Ok(Self::Accurate),
            _ => Err(format!("Unknown search mode: {s}")),
        }
    }
}

/// Ids matched within one indexed field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldHits {
    pub field: String,
    pub ids: Vec<RecordId>,
}

/// The fields a document index tokenizes, fixed when the index is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSchema {
    fields: Vec<String>,
}

impl IndexSchema {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn products() -> Self {
        Self::new(["name", "batch", "hsn", "manufacturer"])
    }

    pub fn parties() -> Self {
        Self::new(["name", "gstin", "phone", "email"])
    }

    pub fn for_collection(collection: Collection) -> Self {
        match collection {
            Collection::Products => Self::products(),
            Collection::Parties => Self::parties(),
        }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }
}
