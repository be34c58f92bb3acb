use indexmap::IndexMap;

use crate::error::{PosSearchError, Result};

/// Canonical field name to the header spellings accepted for it.
///
/// Alias order is the tie-break: when two aliases of the same field match
/// different columns, the earlier alias wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SynonymDictionary {
    entries: IndexMap<String, Vec<String>>,
}

const INVENTORY: &[(&str, &[&str])] = &[
    (
        "name",
        &[
            "Product Name",
            "Item Name",
            "Description",
            "Item",
            "Medicine",
            "Name",
            "Product",
            "Particulars",
        ],
    ),
    ("batch", &["Batch No", "Batch", "Lot", "B.No", "BNo", "Lot No"]),
    (
        "expiry",
        &["Expiry Date", "Exp Date", "Expiry", "Exp", "Validity", "Valid Upto"],
    ),
    ("hsn", &["HSN Code", "HSN", "SAC", "HSN/SAC"]),
    (
        "mrp",
        &["MRP", "M.R.P.", "Max Price", "Maximum Retail Price", "M.R.P"],
    ),
    (
        "purchaseRate",
        &[
            "Purchase Rate",
            "P.Rate",
            "Cost",
            "Buy Price",
            "CP",
            "Cost Price",
            "Rate (Pur)",
            "P Rate",
        ],
    ),
    (
        "saleRate",
        &[
            "Sale Rate",
            "Selling Price",
            "Rate",
            "S.Rate",
            "SP",
            "Sell Price",
            "Rate (Sale)",
            "Billing Rate",
        ],
    ),
    (
        "stock",
        &[
            "Quantity",
            "Qty",
            "Stock",
            "Balance",
            "Opening Stock",
            "Cl. Stock",
            "Closing Stock",
            "Units",
        ],
    ),
    ("gstRate", &["GST", "Tax", "GST %", "Tax Slab", "IGST", "Tax Rate"]),
    (
        "manufacturer",
        &["Mfg", "Company", "Brand", "Manufacturer", "Make", "Mkt by"],
    ),
];

impl SynonymDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Header spellings commonly found in pharmacy and retail stock exports.
    pub fn inventory() -> Self {
        let mut dict = Self::new();
        for (field, aliases) in INVENTORY {
            dict.extend(*field, aliases.iter().copied());
        }
        dict
    }

    /// Appends aliases to a field, creating the entry if needed. Existing
    /// aliases keep their priority.
    pub fn extend<I, S>(&mut self, field: impl Into<String>, aliases: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entry = self.entries.entry(field.into()).or_default();
        for alias in aliases {
            let alias = alias.into();
            if !entry.contains(&alias) {
                entry.push(alias);
            }
        }
    }

    pub fn aliases(&self, field: &str) -> Option<&[String]> {
        self.entries.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Every field the caller relies on needs at least one alias.
    pub fn validate<'a>(&self, required: impl IntoIterator<Item = &'a str>) -> Result<()> {
        for field in required {
            if self.aliases(field).is_none_or(<[String]>::is_empty) {
                return Err(PosSearchError::Config(format!(
                    "synonym dictionary has no aliases for field '{field}'"
                )));
            }
        }
        Ok(())
    }
}
