use std::fmt;

use serde::{Deserialize, Serialize};

/// Named record collections held by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Products,
    Parties,
}

impl Collection {
    pub const ALL: [Self; 2] = [Self::Products, Self::Parties];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Parties => "parties",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Collection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "products" | "product" | "inventory" => Ok(Self::Products),
            "parties" | "party" => Ok(Self::Parties),
            _ => Err(format!("Unknown collection: {s}")),
        }
    }
}
