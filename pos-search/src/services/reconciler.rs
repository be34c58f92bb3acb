//! Maps arbitrarily named spreadsheet columns onto the canonical product
//! schema.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Product, ProductField, RawRow, SynonymDictionary, Value};
use crate::error::Result;

/// Days between the spreadsheet serial-date epoch and 1970-01-01.
const SERIAL_EPOCH_OFFSET: f64 = 25569.0;
const MS_PER_DAY: f64 = 86_400_000.0;
/// Largest timestamp magnitude a calendar date is produced for.
const MAX_TIMESTAMP_MS: f64 = 8.64e15;

/// Values used when a row has no usable column for a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportDefaults {
    pub name: String,
    pub batch: String,
    pub hsn: String,
    pub manufacturer: String,
    pub gst_rate: f64,
    pub expiry: String,
}

impl Default for ImportDefaults {
    fn default() -> Self {
        Self {
            name: "Unknown Item".to_string(),
            batch: "N/A".to_string(),
            hsn: "3004".to_string(),
            manufacturer: String::new(),
            gst_rate: 5.0,
            expiry: "2025-12-31".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HeaderReconciler {
    /// Canonical field name and its aliases, already normalized.
    fields: Vec<(String, Vec<String>)>,
    defaults: ImportDefaults,
}

impl HeaderReconciler {
    pub fn new(dictionary: &SynonymDictionary, defaults: ImportDefaults) -> Result<Self> {
        dictionary.validate(ProductField::ALL.iter().map(|f| f.as_str()))?;
        Ok(Self::build(dictionary, defaults))
    }

    /// Built-in inventory synonyms and defaults.
    pub fn inventory() -> Self {
        Self::build(&SynonymDictionary::inventory(), ImportDefaults::default())
    }

    fn build(dictionary: &SynonymDictionary, defaults: ImportDefaults) -> Self {
        let fields = dictionary
            .fields()
            .map(|field| {
                let aliases = dictionary
                    .aliases(field)
                    .unwrap_or_default()
                    .iter()
                    .map(|a| normalize_header(a))
                    .collect();
                (field.to_string(), aliases)
            })
            .collect();
        Self { fields, defaults }
    }

    /// Finds the cell for `field`: aliases are tried in priority order and
    /// the first column (left to right) matching an alias wins.
    pub fn resolve<'r>(&self, row: &'r RawRow, field: &str) -> Option<&'r Value> {
        let headers = normalized_headers(row);
        self.resolve_normalized(&headers, field)
    }

    fn resolve_normalized<'r>(
        &self,
        headers: &[(String, &'r Value)],
        field: &str,
    ) -> Option<&'r Value> {
        let (_, aliases) = self.fields.iter().find(|(name, _)| name == field)?;
        aliases.iter().find_map(|alias| {
            headers
                .iter()
                .find(|(header, _)| header == alias)
                .map(|(_, value)| *value)
        })
    }

    pub fn reconcile(&self, row: &RawRow) -> Product {
        let headers = normalized_headers(row);
        let cell = |field: ProductField| self.resolve_normalized(&headers, field.as_str());
        let text = |field: ProductField, default: &str| {
            cell(field)
                .filter(|v| v.is_truthy())
                .map_or_else(|| default.to_string(), ToString::to_string)
        };

        let mut gst_rate = coerce_number(cell(ProductField::GstRate));
        if gst_rate == 0.0 {
            gst_rate = self.defaults.gst_rate;
        }

        Product {
            name: text(ProductField::Name, &self.defaults.name),
            batch: text(ProductField::Batch, &self.defaults.batch),
            hsn: text(ProductField::Hsn, &self.defaults.hsn),
            manufacturer: text(ProductField::Manufacturer, &self.defaults.manufacturer),
            mrp: coerce_number(cell(ProductField::Mrp)),
            purchase_rate: coerce_number(cell(ProductField::PurchaseRate)),
            sale_rate: coerce_number(cell(ProductField::SaleRate)),
            stock: coerce_number(cell(ProductField::Stock)),
            gst_rate,
            expiry: coerce_expiry(cell(ProductField::Expiry), &self.defaults.expiry),
        }
    }
}

fn normalized_headers(row: &RawRow) -> Vec<(String, &Value)> {
    row.iter()
        .map(|(header, value)| (normalize_header(header), value))
        .collect()
}

/// Lowercases and drops everything that is not an ASCII letter or digit,
/// so `"M.R.P."`, `"mrp"` and `"MRP "` compare equal.
pub fn normalize_header(header: &str) -> String {
    header
        .to_lowercase()
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect()
}

/// Lenient numeric read of a cell. Currency symbols, thousands separators
/// and units are stripped; anything that still does not start with a number
/// becomes `0.0`.
pub fn coerce_number(value: Option<&Value>) -> f64 {
    let raw = value.map_or_else(|| "undefined".to_string(), ToString::to_string);
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    parse_leading_float(&cleaned).unwrap_or(0.0)
}

/// Parses the longest `[-]digits[.digits]` prefix, ignoring trailing junk
/// such as a second decimal point.
fn parse_leading_float(s: &str) -> Option<f64> {
    let bytes = s.as_bytes();
    let mut end = usize::from(bytes.first() == Some(&b'-'));
    let int_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    let mut digits = end - int_start;

    if bytes.get(end) == Some(&b'.') {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while bytes.get(frac_end).is_some_and(u8::is_ascii_digit) {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if frac_end > frac_start {
            end = frac_end;
        }
    }

    if digits == 0 {
        return None;
    }
    s[..end].parse().ok()
}

/// Numeric cells are spreadsheet serial dates and become `YYYY-MM-DD`;
/// other non-empty cells pass through as text.
pub fn coerce_expiry(value: Option<&Value>, placeholder: &str) -> String {
    match value {
        Some(Value::Number(serial)) => {
            serial_to_date(*serial).unwrap_or_else(|| placeholder.to_string())
        }
        Some(v) if v.is_truthy() => v.to_string(),
        _ => placeholder.to_string(),
    }
}

#[allow(clippy::cast_possible_truncation)] // range-checked against MAX_TIMESTAMP_MS
fn serial_to_date(serial: f64) -> Option<String> {
    let ms = ((serial - SERIAL_EPOCH_OFFSET) * MS_PER_DAY).trunc();
    if !ms.is_finite() || ms.abs() > MAX_TIMESTAMP_MS {
        return None;
    }
    DateTime::<Utc>::from_timestamp_millis(ms as i64).map(|dt| dt.format("%Y-%m-%d").to_string())
}
