use std::fmt;

use serde::{Deserialize, Serialize};

use super::Record;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    pub name: String,
    pub gstin: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    #[serde(rename = "type", default)]
    pub kind: PartyKind,
}

impl Party {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

impl From<Party> for Record {
    fn from(p: Party) -> Self {
        Self::new()
            .with_field("name", p.name)
            .with_field("gstin", p.gstin)
            .with_field("phone", p.phone)
            .with_field("email", p.email)
            .with_field("address", p.address)
            .with_field("type", p.kind.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PartyKind {
    #[default]
    Wholesale,
    Retail,
}

impl PartyKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Wholesale => "WHOLESALE",
            Self::Retail => "RETAIL",
        }
    }
}

impl fmt::Display for PartyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PartyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "wholesale" => Ok(Self::Wholesale),
            "retail" => Ok(Self::Retail),
            _ => Err(format!("Unknown party type: {s}")),
        }
    }
}
